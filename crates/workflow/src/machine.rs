//! The conversation state machine.
//!
//! [`Machine::handle`] is the only writer of [`SessionData`]. Commands act as
//! entry points from any state (a new mode command always restarts the
//! cycle); everything else is judged against the current state.

use std::num::NonZeroU32;

use {reelpost_config::PublishConfig, tracing::debug};

use crate::{
    Error, Result,
    caption::{self, CaptionFields, FormatError},
    dispatch::{self, Details},
    inbound::{Command, Content, Inbound},
    media::MediaRef,
    outbound::{Outbound, Reaction},
    state::{ChatSettings, ConversationState, Mode, ModeSession, PendingCount, Progress, SessionData},
};

const HELP: &str = "Bot is Alive!\n\
/setsticker – Reply to a sticker to register it\n\
/setformat – Override caption template\n\
/forepisode – 3 videos single episode\n\
/forseason – full season (3×N videos)\n\
/forspecificquality – one video per episode at chosen quality\n\
/formarge – merge separate 480p/720p/1080p lists\n\
/cancel – Abort current operation";

const CHOOSE_MODE: &str =
    "❌ Choose a mode: /forepisode, /forseason, /forspecificquality or /formarge.";
const IDLE_HINT: &str = "Nothing in progress. Use /start to see the commands.";
const STICKER_USAGE: &str = "❌ Reply to a sticker with /setsticker.";
const STICKER_SAVED: &str = "✅ Sticker saved!";
const FORMAT_USAGE: &str = "❌ Usage: /setformat <HTML with {title},{season},{episode},{quality}>";
const FORMAT_SAVED: &str = "✅ Format updated!";
const ASK_QUALITY: &str = "🎚 Which quality? (e.g., 720p)";
const ASK_COUNT: &str = "🔢 How many episodes?";
const ASK_MARGE_COUNT: &str = "📊 How many episodes?";
const POSITIVE_INTEGER: &str = "❌ Send a positive integer.";
const SEND_EPISODE_VIDEOS: &str = "📥 Send exactly 3 videos.";
const SEND_VIDEO: &str = "❌ Please send a video file.";
const ASK_DETAILS: &str = "📝 Now send details:\n1.Title\n2.Season";
const CANCELLED: &str = "🚫 Cancelled.";

type Step = (ConversationState, Reaction);

/// Drives one conversation at a time; holds only immutable defaults, so a
/// single instance serves every conversation.
#[derive(Debug, Clone)]
pub struct Machine {
    publish: PublishConfig,
}

impl Machine {
    /// Create a machine, rejecting defaults that could never publish.
    pub fn new(publish: PublishConfig) -> Result<Self> {
        if publish.qualities.is_empty() {
            return Err(Error::invalid_settings("the quality list is empty"));
        }
        caption::validate_template(&publish.caption_template)?;
        caption::render(&publish.caption_template, &CaptionFields {
            title: "Title",
            season: "01",
            episode: 1,
            quality: &publish.qualities[0],
        })?;
        Ok(Self { publish })
    }

    /// Apply one inbound message to a conversation.
    pub fn handle(&self, session: &mut SessionData, input: Inbound) -> Reaction {
        let state = std::mem::take(&mut session.state);
        let from = state.name();
        let kind = input.kind();
        let settings = &mut session.settings;

        let (next, reaction) = match input.content {
            Content::Command { command, argument } => {
                self.on_command(state, settings, command, &argument, input.replied_sticker)
            },
            content => self.on_content(state, settings, content, input.replied_sticker),
        };

        debug!(from, to = next.name(), input = kind, mode = ?next.mode().map(Mode::as_str), "conversation step");
        session.state = next;
        reaction
    }

    fn on_command(
        &self,
        state: ConversationState,
        settings: &mut ChatSettings,
        command: Command,
        argument: &str,
        replied_sticker: Option<MediaRef>,
    ) -> Step {
        match command {
            Command::Cancel => (ConversationState::Idle, Reaction::reply(CANCELLED)),
            Command::Start | Command::Help => (ConversationState::AwaitingMode, Reaction::reply(HELP)),
            Command::SetSticker => register_sticker(settings, replied_sticker),
            Command::SetFormat if argument.is_empty() => {
                (ConversationState::AwaitingFormat, Reaction::reply(FORMAT_USAGE))
            },
            Command::SetFormat => set_format(settings, argument),
            Command::Select(mode) => select_mode(mode),
            Command::Unknown(name) => {
                debug!(command = %name, state = state.name(), "unknown command");
                let mut messages = vec![Outbound::text(format!(
                    "❌ Unknown command /{name}. Use /start."
                ))];
                messages.extend(expectation(&state).map(Outbound::text));
                (state, Reaction::Reply(messages))
            },
        }
    }

    fn on_content(
        &self,
        state: ConversationState,
        settings: &mut ChatSettings,
        content: Content,
        replied_sticker: Option<MediaRef>,
    ) -> Step {
        match (state, content) {
            (ConversationState::AwaitingSticker, content) => {
                let direct = match content {
                    Content::Sticker(sticker) => Some(sticker),
                    _ => None,
                };
                register_sticker(settings, replied_sticker.or(direct))
            },
            (ConversationState::AwaitingFormat, Content::Text(text)) => set_format(settings, &text),
            (ConversationState::AwaitingCount(pending), Content::Text(text)) => {
                receive_count(pending, &text)
            },
            (ConversationState::AwaitingVideos(session), Content::Video(video)) => {
                receive_video(session, video)
            },
            (ConversationState::AwaitingDetails(session), Content::Text(text)) => {
                self.publish(&session, settings, &text)
            },
            (state, content) => {
                debug!(state = state.name(), input = ?content, "rejected input");
                let prompt = expectation(&state).unwrap_or(IDLE_HINT);
                (state, Reaction::reply(prompt))
            },
        }
    }

    /// Build the publication; any fault aborts the cycle with a notice.
    fn publish(&self, session: &ModeSession, settings: &ChatSettings, text: &str) -> Step {
        let template = settings
            .caption_template
            .as_deref()
            .unwrap_or(&self.publish.caption_template);

        let result = Details::parse(text).and_then(|details| {
            dispatch::compose(
                session,
                &details,
                template,
                settings.sticker.as_ref(),
                &self.publish,
            )
        });

        match result {
            Ok(publication) => (ConversationState::Idle, Reaction::Publish(publication)),
            Err(fault) => {
                debug!(kind = ?fault.kind, error = %fault, "publication aborted");
                (ConversationState::Idle, Reaction::reply(fault.user_notice()))
            },
        }
    }
}

/// The prompt restating what the current state expects.
fn expectation(state: &ConversationState) -> Option<&'static str> {
    match state {
        ConversationState::Idle => None,
        ConversationState::AwaitingMode => Some(CHOOSE_MODE),
        ConversationState::AwaitingSticker => Some(STICKER_USAGE),
        ConversationState::AwaitingFormat => Some(FORMAT_USAGE),
        ConversationState::AwaitingCount(PendingCount::SpecificQuality) => Some(ASK_QUALITY),
        ConversationState::AwaitingCount(_) => Some(POSITIVE_INTEGER),
        ConversationState::AwaitingVideos(_) => Some(SEND_VIDEO),
        ConversationState::AwaitingDetails(_) => Some(ASK_DETAILS),
    }
}

fn register_sticker(settings: &mut ChatSettings, sticker: Option<MediaRef>) -> Step {
    match sticker {
        Some(sticker) => {
            settings.sticker = Some(sticker);
            (ConversationState::Idle, Reaction::reply(STICKER_SAVED))
        },
        None => (ConversationState::AwaitingSticker, Reaction::reply(STICKER_USAGE)),
    }
}

fn set_format(settings: &mut ChatSettings, template: &str) -> Step {
    let template = template.trim();
    match caption::validate_template(template) {
        Ok(()) => {
            settings.caption_template = Some(template.to_string());
            (ConversationState::Idle, Reaction::reply(FORMAT_SAVED))
        },
        Err(FormatError::MissingPlaceholder(placeholder)) => (
            ConversationState::AwaitingFormat,
            Reaction::reply(format!("❌ Missing placeholder {placeholder}.")),
        ),
        Err(_) => (ConversationState::AwaitingFormat, Reaction::reply(FORMAT_USAGE)),
    }
}

/// Start a fresh cycle, discarding whatever the previous one collected.
fn select_mode(mode: Mode) -> Step {
    match mode {
        Mode::Episode => (
            ConversationState::AwaitingVideos(ModeSession::episode()),
            Reaction::reply(SEND_EPISODE_VIDEOS),
        ),
        Mode::Season => (
            ConversationState::AwaitingCount(PendingCount::Season),
            Reaction::reply(ASK_COUNT),
        ),
        Mode::Specific => (
            ConversationState::AwaitingCount(PendingCount::SpecificQuality),
            Reaction::reply(ASK_QUALITY),
        ),
        Mode::Marge => (
            ConversationState::AwaitingCount(PendingCount::Marge),
            Reaction::reply(ASK_MARGE_COUNT),
        ),
    }
}

fn receive_count(pending: PendingCount, text: &str) -> Step {
    let text = text.trim();
    let count = parse_episode_count(text);

    let session = match (pending, count) {
        (PendingCount::SpecificQuality, _) if text.is_empty() => {
            return (
                ConversationState::AwaitingCount(PendingCount::SpecificQuality),
                Reaction::reply(ASK_QUALITY),
            );
        },
        (PendingCount::SpecificQuality, _) => {
            return (
                ConversationState::AwaitingCount(PendingCount::SpecificCount {
                    quality: text.to_string(),
                }),
                Reaction::reply(ASK_COUNT),
            );
        },
        (pending, None) => {
            return (ConversationState::AwaitingCount(pending), Reaction::reply(POSITIVE_INTEGER));
        },
        (PendingCount::Season, Some(episode_count)) => ModeSession::Season {
            episode_count,
            videos: Vec::new(),
        },
        (PendingCount::SpecificCount { quality }, Some(episode_count)) => ModeSession::Specific {
            episode_count,
            quality,
            videos: Vec::new(),
        },
        (PendingCount::Marge, Some(episode_count)) => ModeSession::marge(episode_count),
    };

    let prompt = match &session {
        ModeSession::Marge { episode_count, stage, .. } => {
            format!("📥 Send all {episode_count} videos in {stage}.")
        },
        other => format!("📥 Send {} videos.", other.needed()),
    };
    (ConversationState::AwaitingVideos(session), Reaction::reply(prompt))
}

/// Digits only, at least 1.
fn parse_episode_count(text: &str) -> Option<NonZeroU32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<u32>().ok().and_then(NonZeroU32::new)
}

fn receive_video(mut session: ModeSession, video: MediaRef) -> Step {
    let progress = session.accept(video);
    let acknowledgement = match progress {
        Progress::Pending {
            tier: Some(tier),
            received,
            needed,
        }
        | Progress::Complete {
            tier: Some(tier),
            received,
            needed,
        } => format!("✅ {tier} videos: {received}/{needed}"),
        Progress::Pending {
            tier: None,
            received,
            needed,
        }
        | Progress::Complete {
            tier: None,
            received,
            needed,
        } => format!("✅ Received {received}/{needed} videos."),
        Progress::TierFilled { tier, received, .. } => {
            format!("✅ {tier} videos: {received}/{received}")
        },
    };

    let mut messages = vec![Outbound::text(acknowledgement)];
    match progress {
        Progress::Pending { .. } => (ConversationState::AwaitingVideos(session), Reaction::Reply(messages)),
        Progress::TierFilled { received, next, .. } => {
            messages.push(Outbound::text(format!(
                "📥 Now send all {received} videos in {next}."
            )));
            (ConversationState::AwaitingVideos(session), Reaction::Reply(messages))
        },
        Progress::Complete { .. } => {
            messages.push(Outbound::text(ASK_DETAILS));
            (ConversationState::AwaitingDetails(session), Reaction::Reply(messages))
        },
    }
}
