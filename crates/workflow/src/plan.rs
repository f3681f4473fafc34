//! Fan accumulated uploads back out into per-episode batches.

use thiserror::Error;

use crate::{
    media::MediaRef,
    state::{ModeSession, Tier, VIDEOS_PER_EPISODE},
};

/// Videos published together for one episode, with the quality label of
/// each video at the same position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeBatch {
    pub episode: u32,
    pub videos: Vec<MediaRef>,
    pub qualities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("no quality labels are configured")]
    NoQualities,

    #[error("episode {episode:02} has no {tier} video")]
    MissingMedia { episode: u32, tier: Tier },
}

/// Split a finished session into episode batches.
///
/// `qualities` is the configured label list used by Episode and Season mode;
/// Specific mode uses its stored quality and Marge mode its tier labels.
pub fn plan(session: &ModeSession, qualities: &[String]) -> Result<Vec<EpisodeBatch>, PlanError> {
    match session {
        ModeSession::Episode { videos } => {
            let videos: Vec<_> = videos.iter().take(VIDEOS_PER_EPISODE).cloned().collect();
            Ok(vec![batch(1, videos, qualities)?])
        },
        ModeSession::Season {
            episode_count,
            videos,
        } => (0..episode_count.get())
            .map(|idx| {
                let start = idx as usize * VIDEOS_PER_EPISODE;
                let chunk = videos
                    .iter()
                    .skip(start)
                    .take(VIDEOS_PER_EPISODE)
                    .cloned()
                    .collect();
                batch(idx + 1, chunk, qualities)
            })
            .collect(),
        ModeSession::Specific {
            quality, videos, ..
        } => Ok(videos
            .iter()
            .zip(1..)
            .map(|(video, episode)| EpisodeBatch {
                episode,
                videos: vec![video.clone()],
                qualities: vec![quality.clone()],
            })
            .collect()),
        ModeSession::Marge {
            episode_count,
            tiers,
            ..
        } => (1..=episode_count.get())
            .map(|episode| -> Result<EpisodeBatch, PlanError> {
                let videos = Tier::ALL
                    .into_iter()
                    .map(|tier| {
                        tiers
                            .get(tier)
                            .get(episode as usize - 1)
                            .cloned()
                            .ok_or(PlanError::MissingMedia { episode, tier })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(EpisodeBatch {
                    episode,
                    videos,
                    qualities: Tier::ALL.iter().map(|t| t.label().to_string()).collect(),
                })
            })
            .collect(),
    }
}

fn batch(episode: u32, videos: Vec<MediaRef>, qualities: &[String]) -> Result<EpisodeBatch, PlanError> {
    Ok(EpisodeBatch {
        episode,
        qualities: align_qualities(videos.len(), qualities)?,
        videos,
    })
}

/// One label per video: position `j` takes `qualities[j]`, and videos past
/// the end of the list reuse the last label.
pub fn align_qualities(count: usize, qualities: &[String]) -> Result<Vec<String>, PlanError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let last = qualities.last().ok_or(PlanError::NoQualities)?;
    Ok((0..count)
        .map(|j| qualities.get(j).unwrap_or(last).clone())
        .collect())
}
