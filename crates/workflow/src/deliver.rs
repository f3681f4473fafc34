use {async_trait::async_trait, tracing::{info, warn}};

use crate::{
    dispatch::{DispatchFault, DispatchOutcome},
    outbound::{Outbound, Reaction},
};

/// Sends workflow messages to a chat.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, chat_id: i64, message: &Outbound) -> anyhow::Result<()>;
}

/// Deliver a reaction to `chat_id`.
///
/// Replies are best effort. A publication is sent strictly in order and
/// stops at the first failed send; the user then gets the fault notice.
/// Returns `None` for replies.
pub async fn deliver(transport: &dyn Transport, chat_id: i64, reaction: Reaction) -> Option<DispatchOutcome> {
    match reaction {
        Reaction::Reply(messages) => {
            for message in &messages {
                if let Err(e) = transport.send(chat_id, message).await {
                    warn!(chat_id, kind = message.kind(), error = %e, "failed to send reply");
                }
            }
            None
        },
        Reaction::Publish(publication) => {
            let total = publication.messages.len();
            for (delivered, message) in publication.messages.iter().enumerate() {
                if let Err(e) = transport.send(chat_id, message).await {
                    let fault = DispatchFault::transport(format!("{e:#}"));
                    warn!(
                        chat_id,
                        delivered,
                        total,
                        kind = message.kind(),
                        error = %fault,
                        "publication aborted"
                    );
                    let notice = Outbound::text(fault.user_notice());
                    if let Err(e) = transport.send(chat_id, &notice).await {
                        warn!(chat_id, error = %e, "failed to send abort notice");
                    }
                    return Some(DispatchOutcome::Aborted { fault, delivered });
                }
            }
            info!(chat_id, episodes = publication.episodes, messages = total, "publication delivered");
            Some(DispatchOutcome::Published {
                episodes: publication.episodes,
                messages: total,
            })
        },
    }
}
