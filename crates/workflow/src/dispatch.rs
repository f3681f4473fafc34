//! Terminal step: turn the details message and a finished session into
//! the ordered list of outbound messages.

use {reelpost_config::PublishConfig, thiserror::Error};

use crate::{
    caption::{self, CaptionFields, FormatError},
    media::MediaRef,
    outbound::{Outbound, Publication},
    plan::{self, PlanError},
    state::ModeSession,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// The details message did not have a title and a season line.
    MalformedDetails,
    /// The caption template could not be rendered.
    Template,
    /// A batch referenced a video that was never received.
    MissingMedia,
    /// The messaging platform rejected a send.
    Transport,
}

/// Any fault while building or sending a publication. The cycle is aborted
/// and the message is shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DispatchFault {
    pub kind: FaultKind,
    pub message: String,
}

impl DispatchFault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(source: impl std::fmt::Display) -> Self {
        Self::new(FaultKind::Transport, source.to_string())
    }

    /// Text sent to the user when a cycle is aborted.
    #[must_use]
    pub fn user_notice(&self) -> String {
        format!("❌ {}\nUse /start", self.message)
    }
}

impl From<FormatError> for DispatchFault {
    fn from(err: FormatError) -> Self {
        Self::new(FaultKind::Template, err.to_string())
    }
}

impl From<PlanError> for DispatchFault {
    fn from(err: PlanError) -> Self {
        let kind = match err {
            PlanError::MissingMedia { .. } => FaultKind::MissingMedia,
            PlanError::NoQualities => FaultKind::Template,
        };
        Self::new(kind, err.to_string())
    }
}

/// How delivery of a publication ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Published { episodes: usize, messages: usize },
    Aborted { fault: DispatchFault, delivered: usize },
}

/// Title and season from the details message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Details {
    pub title: String,
    /// Digits of the second line, zero-padded to at least two characters.
    pub season: String,
}

impl Details {
    /// Parse "Title\nSeason 2" style text. Non-digits on the season line
    /// are dropped, so "Season 2" becomes "02" and "S10" becomes "10".
    pub fn parse(text: &str) -> Result<Self, DispatchFault> {
        let mut lines = text.trim().lines();
        let (Some(title), Some(season)) = (lines.next(), lines.next()) else {
            return Err(DispatchFault::new(
                FaultKind::MalformedDetails,
                "details need two lines: the title, then the season number",
            ));
        };
        let digits: String = season.chars().filter(char::is_ascii_digit).collect();
        Ok(Self {
            title: title.trim().to_string(),
            season: format!("{digits:0>2}"),
        })
    }
}

/// Build the publication for a finished session.
///
/// Per episode: an optional banner, every video with its caption, then the
/// sticker if one is registered. The promotional message follows the last
/// episode.
pub fn compose(
    session: &ModeSession,
    details: &Details,
    template: &str,
    sticker: Option<&MediaRef>,
    publish: &PublishConfig,
) -> Result<Publication, DispatchFault> {
    let batches = plan::plan(session, &publish.qualities)?;
    let mut messages = Vec::with_capacity(session.received() + batches.len() * 2 + publish.promo_repeat);

    for batch in &batches {
        if publish.episode_banner {
            messages.push(Outbound::Html(format!(
                "<b>Episode {:02} Added...!</b>",
                batch.episode
            )));
        }
        for (video, quality) in batch.videos.iter().zip(&batch.qualities) {
            let caption = caption::render(template, &CaptionFields {
                title: &details.title,
                season: &details.season,
                episode: batch.episode,
                quality,
            })?;
            messages.push(Outbound::Video {
                video: video.clone(),
                caption,
            });
        }
        if let Some(sticker) = sticker {
            messages.push(Outbound::Sticker(sticker.clone()));
        }
    }

    messages.extend(
        std::iter::repeat_n(Outbound::Html(publish.promo_message.clone()), publish.promo_repeat),
    );

    Ok(Publication {
        episodes: batches.len(),
        messages,
    })
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, std::num::NonZeroU32};

    fn season(n: u32) -> ModeSession {
        ModeSession::Season {
            episode_count: NonZeroU32::new(n).unwrap(),
            videos: (0..n * 3).map(|i| MediaRef::new(format!("v{i}"))).collect(),
        }
    }

    #[rstest]
    #[case("MyShow\nSeason 2", "MyShow", "02")]
    #[case("  Foo  \n1", "Foo", "01")]
    #[case("Bar\nS10\nextra", "Bar", "10")]
    #[case("Baz\n123", "Baz", "123")]
    #[case("Qux\nnone", "Qux", "00")]
    fn parses_details(#[case] text: &str, #[case] title: &str, #[case] season: &str) {
        let details = Details::parse(text).unwrap();
        assert_eq!(details.title, title);
        assert_eq!(details.season, season);
    }

    #[rstest]
    #[case("only a title")]
    #[case("")]
    #[case("   \n  ")]
    fn rejects_single_line(#[case] text: &str) {
        let fault = Details::parse(text).unwrap_err();
        assert_eq!(fault.kind, FaultKind::MalformedDetails);
    }

    #[test]
    fn composes_in_episode_order_with_sticker_last() {
        let details = Details::parse("Foo\n1").unwrap();
        let sticker = MediaRef::new("stk");
        let publish = PublishConfig::default();
        let publication = compose(
            &season(2),
            &details,
            "{title} S{season}E{episode} {quality}",
            Some(&sticker),
            &publish,
        )
        .unwrap();

        assert_eq!(publication.episodes, 2);
        let kinds: Vec<_> = publication.messages.iter().map(Outbound::kind).collect();
        assert_eq!(kinds, vec![
            "html", "video", "video", "video", "sticker", "html", "video", "video", "video",
            "sticker", "html", "html", "html",
        ]);
        assert_eq!(
            publication.messages[0],
            Outbound::Html("<b>Episode 01 Added...!</b>".into())
        );
        assert_eq!(publication.messages[7], Outbound::Video {
            video: MediaRef::new("v4"),
            caption: "Foo S01E02 720p".into(),
        });
        assert_eq!(
            publication.messages.last(),
            Some(&Outbound::Html(publish.promo_message.clone()))
        );
    }

    #[test]
    fn banner_and_promo_follow_settings() {
        let publish = PublishConfig {
            episode_banner: false,
            promo_repeat: 0,
            ..Default::default()
        };
        let publication = compose(
            &season(1),
            &Details::parse("Foo\n1").unwrap(),
            "{title}{season}{episode}{quality}",
            None,
            &publish,
        )
        .unwrap();
        assert_eq!(publication.messages.len(), 3);
        assert!(
            publication
                .messages
                .iter()
                .all(|m| matches!(m, Outbound::Video { .. }))
        );
    }

    #[test]
    fn template_fault_aborts_composition() {
        let fault = compose(
            &season(1),
            &Details::parse("Foo\n1").unwrap(),
            "{title} {season} {episode} {quality} {year}",
            None,
            &PublishConfig::default(),
        )
        .unwrap_err();
        assert_eq!(fault.kind, FaultKind::Template);
        assert!(fault.message.contains("{year}"));
        assert!(fault.user_notice().ends_with("\nUse /start"));
    }
}
