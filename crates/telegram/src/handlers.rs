use {
    reelpost_sessions::ConversationKey,
    reelpost_workflow::{
        Content, DispatchOutcome, Inbound, MediaRef, Reaction, SessionData, deliver, inbound,
    },
    teloxide::{
        prelude::*,
        types::{MediaKind, MessageKind},
    },
    tracing::{debug, info, warn},
};

use crate::{error::Result, state::BotState};

/// Reduce a Telegram message to the conversation it belongs to and the
/// workflow input it carries.
///
/// Returns `None` for messages without a sender (channel posts) and for
/// commands addressed to another bot.
pub fn classify(msg: &Message, bot_username: Option<&str>) -> Option<(ConversationKey, Inbound)> {
    let user = msg.from.as_ref()?;
    let key = ConversationKey::new(msg.chat.id.0, user.id.0);

    let mut input = if let Some(text) = msg.text() {
        if inbound::addressed_elsewhere(text, bot_username) {
            debug!(chat_id = key.chat_id, "ignoring command for another bot");
            return None;
        }
        Inbound::from_text(text)
    } else if let Some(video) = extract_video(msg) {
        Inbound::new(Content::Video(video))
    } else if let Some(sticker) = msg.sticker() {
        Inbound::sticker(sticker.file.id.clone())
    } else {
        Inbound::new(Content::Other(describe_media_kind(msg)))
    };

    if let Some(sticker) = msg.reply_to_message().and_then(Message::sticker) {
        input = input.replying_to_sticker(sticker.file.id.clone());
    }

    Some((key, input))
}

/// A native video, or a document uploaded with a `video/*` MIME type.
fn extract_video(msg: &Message) -> Option<MediaRef> {
    if let Some(video) = msg.video() {
        return Some(MediaRef::new(video.file.id.clone()));
    }
    let document = msg.document()?;
    let is_video = document
        .mime_type
        .as_ref()
        .is_some_and(|mime| mime.essence_str().starts_with("video/"));
    is_video.then(|| MediaRef::new(document.file.id.clone()))
}

fn describe_media_kind(msg: &Message) -> &'static str {
    match &msg.kind {
        MessageKind::Common(common) => match &common.media_kind {
            MediaKind::Animation(_) => "animation",
            MediaKind::Audio(_) => "audio",
            MediaKind::Contact(_) => "contact",
            MediaKind::Document(_) => "document",
            MediaKind::Location(_) => "location",
            MediaKind::Photo(_) => "photo",
            MediaKind::Poll(_) => "poll",
            MediaKind::VideoNote(_) => "video note",
            MediaKind::Voice(_) => "voice",
            _ => "unsupported media",
        },
        _ => "service message",
    }
}

/// Reply sent instead of the acknowledgement when a settings change could
/// not be stored.
const SETTINGS_NOT_SAVED: &str = "❌ Could not save the chat settings. Please try again.";

/// Run one input through the state machine and deliver the reaction.
///
/// The conversation stays locked until delivery has finished, so a
/// publication is never interleaved with the handling of a later message
/// of the same conversation. Chat settings are shared by every user of a
/// chat and are loaded, handled and saved under the chat lock.
pub async fn process(state: &BotState, key: ConversationKey, input: Inbound) -> Result<()> {
    let kind = input.kind();
    let mut conversation = state.conversations.lock(key).await;
    let chat = state.conversations.lock_chat(key.chat_id).await;
    let settings = state.settings.load(key.chat_id).await?;

    let mut session = SessionData {
        settings,
        state: std::mem::take(&mut *conversation),
    };
    let before = session.settings.clone();
    let mut reaction = state.machine.handle(&mut session, input);
    *conversation = session.state;

    if session.settings != before
        && let Err(e) = state.settings.save(key.chat_id, &session.settings).await
    {
        warn!(conversation = %key, error = %e, "failed to save chat settings");
        reaction = Reaction::reply(SETTINGS_NOT_SAVED);
    }
    drop(chat);

    debug!(conversation = %key, input = kind, replies = reaction.messages().len(), "handled message");

    match deliver(&state.outbound, key.chat_id, reaction).await {
        Some(DispatchOutcome::Published { episodes, messages }) => {
            info!(conversation = %key, episodes, messages, "episodes published");
        },
        Some(DispatchOutcome::Aborted { fault, delivered }) => {
            warn!(conversation = %key, delivered, error = %fault, "publishing aborted");
        },
        None => {},
    }
    drop(conversation);
    Ok(())
}
