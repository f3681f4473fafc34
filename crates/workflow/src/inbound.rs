use crate::{media::MediaRef, state::Mode};

/// Slash commands understood by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    SetSticker,
    SetFormat,
    Select(Mode),
    Cancel,
    Unknown(String),
}

impl Command {
    /// Parse a `/command [argument]` message.
    ///
    /// A `@botname` suffix on the command is dropped; use
    /// [`addressed_elsewhere`] first to skip commands meant for other bots.
    /// Returns `None` when the text is not a command.
    #[must_use]
    pub fn parse(text: &str) -> Option<(Self, String)> {
        let body = text.trim_start().strip_prefix('/')?;
        let (head, argument) = match body.find(char::is_whitespace) {
            Some(idx) => (&body[..idx], body[idx..].trim()),
            None => (body, ""),
        };
        let name = head.split('@').next().unwrap_or(head).to_lowercase();
        if name.is_empty() {
            return None;
        }

        let command = match name.as_str() {
            "start" => Self::Start,
            "help" => Self::Help,
            "setsticker" => Self::SetSticker,
            "setformat" => Self::SetFormat,
            "cancel" => Self::Cancel,
            other => Mode::from_command(other).map_or_else(|| Self::Unknown(name.clone()), Self::Select),
        };
        Some((command, argument.to_string()))
    }
}

/// Whether a command carries an `@botname` suffix naming a different bot.
#[must_use]
pub fn addressed_elsewhere(text: &str, bot_username: Option<&str>) -> bool {
    let Some(body) = text.trim_start().strip_prefix('/') else {
        return false;
    };
    let head = body.split(char::is_whitespace).next().unwrap_or_default();
    match (head.split_once('@'), bot_username) {
        (Some((_, target)), Some(me)) => !target.eq_ignore_ascii_case(me),
        _ => false,
    }
}

/// Payload of an inbound message, reduced to what the dialog cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Command { command: Command, argument: String },
    Text(String),
    /// A video, or a document whose MIME type is `video/*`.
    Video(MediaRef),
    Sticker(MediaRef),
    /// Anything else (photo, voice, non-video document...), named for logs.
    Other(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub content: Content,
    /// Sticker of the message this one replies to, if any.
    pub replied_sticker: Option<MediaRef>,
}

impl Inbound {
    #[must_use]
    pub fn new(content: Content) -> Self {
        Self {
            content,
            replied_sticker: None,
        }
    }

    /// Classify plain text, recognising commands.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        match Command::parse(text) {
            Some((command, argument)) => Self::new(Content::Command { command, argument }),
            None => Self::new(Content::Text(text.to_string())),
        }
    }

    #[must_use]
    pub fn video(id: impl Into<MediaRef>) -> Self {
        Self::new(Content::Video(id.into()))
    }

    #[must_use]
    pub fn sticker(id: impl Into<MediaRef>) -> Self {
        Self::new(Content::Sticker(id.into()))
    }

    #[must_use]
    pub fn replying_to_sticker(mut self, sticker: impl Into<MediaRef>) -> Self {
        self.replied_sticker = Some(sticker.into());
        self
    }

    /// Short description for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match &self.content {
            Content::Command { .. } => "command",
            Content::Text(_) => "text",
            Content::Video(_) => "video",
            Content::Sticker(_) => "sticker",
            Content::Other(kind) => kind,
        }
    }
}
