use crate::media::MediaRef;

/// A message the bot wants to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Plain text, sent without a parse mode.
    Text(String),
    /// HTML-formatted text.
    Html(String),
    /// Re-send a stored video with an HTML caption.
    Video { video: MediaRef, caption: String },
    Sticker(MediaRef),
}

impl Outbound {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Short description for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Html(_) => "html",
            Self::Video { .. } => "video",
            Self::Sticker(_) => "sticker",
        }
    }
}

/// The ordered output of a completed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub episodes: usize,
    pub messages: Vec<Outbound>,
}

/// What the machine wants delivered after handling one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
    /// Prompts and acknowledgements. A failed send is logged and skipped.
    Reply(Vec<Outbound>),
    /// A publication. Sent strictly in order; the first failure aborts the
    /// rest and the user is told to restart.
    Publish(Publication),
}

impl Reaction {
    pub fn reply(text: impl Into<String>) -> Self {
        Self::Reply(vec![Outbound::text(text)])
    }

    #[must_use]
    pub fn messages(&self) -> &[Outbound] {
        match self {
            Self::Reply(messages) => messages,
            Self::Publish(publication) => &publication.messages,
        }
    }
}
