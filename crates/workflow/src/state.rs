//! Conversation state and the per-mode accumulation of uploaded videos.

use std::{fmt, num::NonZeroU32};

use crate::media::MediaRef;

/// Number of videos (one per quality) that make up a full episode.
pub const VIDEOS_PER_EPISODE: usize = 3;

/// Publishing mode, chosen by one of the four mode commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// One episode, three videos.
    Episode,
    /// N episodes, three videos each, interleaved by episode.
    Season,
    /// N episodes, one video each at a single chosen quality.
    Specific,
    /// N episodes, uploaded as three separate per-quality lists.
    Marge,
}

impl Mode {
    pub const ALL: [Self; 4] = [Self::Episode, Self::Season, Self::Specific, Self::Marge];

    /// Slash command (without `/`) that selects this mode.
    #[must_use]
    pub fn command(self) -> &'static str {
        match self {
            Self::Episode => "forepisode",
            Self::Season => "forseason",
            Self::Specific => "forspecificquality",
            Self::Marge => "formarge",
        }
    }

    #[must_use]
    pub fn from_command(command: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.command() == command)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Episode => "episode",
            Self::Season => "season",
            Self::Specific => "specific",
            Self::Marge => "marge",
        }
    }
}

/// Quality tier collected in Marge mode, filled in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    P480,
    P720,
    P1080,
}

impl Tier {
    pub const ALL: [Self; 3] = [Self::P480, Self::P720, Self::P1080];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::P480 => "480p",
            Self::P720 => "720p",
            Self::P1080 => "1080p",
        }
    }

    /// Tier collected after this one, if any.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::P480 => Some(Self::P720),
            Self::P720 => Some(Self::P1080),
            Self::P1080 => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-tier video lists for Marge mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierLists([Vec<MediaRef>; 3]);

impl TierLists {
    #[must_use]
    pub fn get(&self, tier: Tier) -> &[MediaRef] {
        &self.0[tier.index()]
    }

    /// Append to a tier and return its new length.
    pub fn push(&mut self, tier: Tier, video: MediaRef) -> usize {
        let list = &mut self.0[tier.index()];
        list.push(video);
        list.len()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.0.iter().map(Vec::len).sum()
    }
}

/// What the AwaitingCount step is still waiting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingCount {
    Season,
    /// Specific mode asks for the quality label before the count.
    SpecificQuality,
    SpecificCount { quality: String },
    Marge,
}

/// Mode-scoped data of an active cycle. Each variant only carries the
/// fields its mode uses; the episode count is fixed once the variant exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeSession {
    Episode {
        videos: Vec<MediaRef>,
    },
    Season {
        episode_count: NonZeroU32,
        videos: Vec<MediaRef>,
    },
    Specific {
        episode_count: NonZeroU32,
        quality: String,
        videos: Vec<MediaRef>,
    },
    Marge {
        episode_count: NonZeroU32,
        stage: Tier,
        tiers: TierLists,
    },
}

/// Result of accepting one video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// More videos are needed for the current list.
    Pending {
        tier: Option<Tier>,
        received: usize,
        needed: usize,
    },
    /// A Marge tier is full; collection continues with `next`.
    TierFilled {
        tier: Tier,
        received: usize,
        next: Tier,
    },
    /// Every required video has arrived.
    Complete {
        tier: Option<Tier>,
        received: usize,
        needed: usize,
    },
}

impl ModeSession {
    #[must_use]
    pub fn episode() -> Self {
        Self::Episode { videos: Vec::new() }
    }

    #[must_use]
    pub fn marge(episode_count: NonZeroU32) -> Self {
        Self::Marge {
            episode_count,
            stage: Tier::P480,
            tiers: TierLists::default(),
        }
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        match self {
            Self::Episode { .. } => Mode::Episode,
            Self::Season { .. } => Mode::Season,
            Self::Specific { .. } => Mode::Specific,
            Self::Marge { .. } => Mode::Marge,
        }
    }

    #[must_use]
    pub fn episode_count(&self) -> Option<NonZeroU32> {
        match self {
            Self::Episode { .. } => None,
            Self::Season { episode_count, .. }
            | Self::Specific { episode_count, .. }
            | Self::Marge { episode_count, .. } => Some(*episode_count),
        }
    }

    /// Videos required for the list currently being filled. For Marge this
    /// is the size of one tier.
    #[must_use]
    pub fn needed(&self) -> usize {
        match self {
            Self::Episode { .. } => VIDEOS_PER_EPISODE,
            Self::Season { episode_count, .. } => {
                count_as_usize(*episode_count).saturating_mul(VIDEOS_PER_EPISODE)
            },
            Self::Specific { episode_count, .. } | Self::Marge { episode_count, .. } => {
                count_as_usize(*episode_count)
            },
        }
    }

    /// Total videos received so far across all lists.
    #[must_use]
    pub fn received(&self) -> usize {
        match self {
            Self::Episode { videos } | Self::Season { videos, .. } | Self::Specific { videos, .. } => {
                videos.len()
            },
            Self::Marge { tiers, .. } => tiers.total(),
        }
    }

    /// Record an uploaded video and report how far collection has come.
    ///
    /// Callers stop feeding videos once [`Progress::Complete`] is returned.
    pub fn accept(&mut self, video: MediaRef) -> Progress {
        let needed = self.needed();
        match self {
            Self::Episode { videos } | Self::Season { videos, .. } | Self::Specific { videos, .. } => {
                videos.push(video);
                let received = videos.len();
                if received >= needed {
                    Progress::Complete {
                        tier: None,
                        received,
                        needed,
                    }
                } else {
                    Progress::Pending {
                        tier: None,
                        received,
                        needed,
                    }
                }
            },
            Self::Marge { stage, tiers, .. } => {
                let tier = *stage;
                let received = tiers.push(tier, video);
                if received < needed {
                    return Progress::Pending {
                        tier: Some(tier),
                        received,
                        needed,
                    };
                }
                match tier.next() {
                    Some(next) => {
                        *stage = next;
                        Progress::TierFilled {
                            tier,
                            received,
                            next,
                        }
                    },
                    None => Progress::Complete {
                        tier: Some(tier),
                        received,
                        needed,
                    },
                }
            },
        }
    }
}

fn count_as_usize(count: NonZeroU32) -> usize {
    usize::try_from(count.get()).unwrap_or(usize::MAX)
}

/// Where a conversation is in the dialog. Exactly one is active per
/// conversation; mode-scoped data lives inside the variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingSticker,
    AwaitingFormat,
    AwaitingMode,
    AwaitingCount(PendingCount),
    AwaitingVideos(ModeSession),
    AwaitingDetails(ModeSession),
}

impl ConversationState {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingSticker => "awaiting_sticker",
            Self::AwaitingFormat => "awaiting_format",
            Self::AwaitingMode => "awaiting_mode",
            Self::AwaitingCount(_) => "awaiting_count",
            Self::AwaitingVideos(_) => "awaiting_videos",
            Self::AwaitingDetails(_) => "awaiting_details",
        }
    }

    /// Mode of the active cycle, if one is in progress.
    #[must_use]
    pub fn mode(&self) -> Option<Mode> {
        match self {
            Self::AwaitingCount(PendingCount::Season) => Some(Mode::Season),
            Self::AwaitingCount(PendingCount::SpecificQuality)
            | Self::AwaitingCount(PendingCount::SpecificCount { .. }) => Some(Mode::Specific),
            Self::AwaitingCount(PendingCount::Marge) => Some(Mode::Marge),
            Self::AwaitingVideos(session) | Self::AwaitingDetails(session) => Some(session.mode()),
            _ => None,
        }
    }
}

/// Chat-level settings that outlive a cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatSettings {
    /// Sticker sent after every episode batch.
    pub sticker: Option<MediaRef>,
    /// Overrides the configured default caption template.
    pub caption_template: Option<String>,
}

/// Everything the state machine reads and writes for one conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    pub settings: ChatSettings,
    pub state: ConversationState,
}
