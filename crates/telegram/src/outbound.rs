use {
    async_trait::async_trait,
    reelpost_workflow::{Outbound, Transport},
    std::{future::Future, time::Duration},
    teloxide::{
        RequestError,
        payloads::{SendMessageSetters, SendVideoSetters},
        prelude::*,
        types::{ChatId, InputFile, ParseMode},
    },
    tracing::{debug, warn},
};

const TELEGRAM_RETRY_AFTER_MAX_RETRIES: usize = 4;

/// Sends workflow messages through the Bot API.
///
/// Videos and stickers are re-sent by file id, so nothing is downloaded or
/// uploaded.
#[derive(Clone)]
pub struct TelegramOutbound {
    bot: Bot,
}

impl TelegramOutbound {
    #[must_use]
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    async fn send_outbound(&self, chat_id: i64, message: &Outbound) -> Result<(), RequestError> {
        let chat = ChatId(chat_id);
        match message {
            Outbound::Text(text) => {
                run_telegram_request_with_retry(chat_id, "send message", || {
                    let req = self.bot.send_message(chat, text.as_str());
                    async move { req.await }
                })
                .await?;
            },
            Outbound::Html(html) => {
                run_telegram_request_with_retry(chat_id, "send message (html)", || {
                    let req = self
                        .bot
                        .send_message(chat, html.as_str())
                        .parse_mode(ParseMode::Html);
                    async move { req.await }
                })
                .await?;
            },
            Outbound::Video { video, caption } => {
                run_telegram_request_with_retry(chat_id, "send video", || {
                    let req = self
                        .bot
                        .send_video(chat, InputFile::file_id(video.as_str()))
                        .caption(caption.as_str())
                        .parse_mode(ParseMode::Html);
                    async move { req.await }
                })
                .await?;
            },
            Outbound::Sticker(sticker) => {
                run_telegram_request_with_retry(chat_id, "send sticker", || {
                    let req = self
                        .bot
                        .send_sticker(chat, InputFile::file_id(sticker.as_str()));
                    async move { req.await }
                })
                .await?;
            },
        }
        debug!(chat_id, kind = message.kind(), "telegram message sent");
        Ok(())
    }
}

#[async_trait]
impl Transport for TelegramOutbound {
    async fn send(&self, chat_id: i64, message: &Outbound) -> anyhow::Result<()> {
        self.send_outbound(chat_id, message).await?;
        Ok(())
    }
}

/// Run a request, sleeping and retrying while Telegram answers with
/// `retry_after`, at most [`TELEGRAM_RETRY_AFTER_MAX_RETRIES`] times.
async fn run_telegram_request_with_retry<T, F, Fut>(
    chat_id: i64,
    operation: &'static str,
    mut request: F,
) -> Result<T, RequestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RequestError>>,
{
    let mut retries = 0usize;

    loop {
        match request().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let Some(wait) = retry_after_duration(&err) else {
                    return Err(err);
                };

                if retries >= TELEGRAM_RETRY_AFTER_MAX_RETRIES {
                    warn!(
                        chat_id,
                        operation,
                        retries,
                        max_retries = TELEGRAM_RETRY_AFTER_MAX_RETRIES,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limit persisted after retries"
                    );
                    return Err(err);
                }

                retries += 1;
                warn!(
                    chat_id,
                    operation,
                    retries,
                    max_retries = TELEGRAM_RETRY_AFTER_MAX_RETRIES,
                    retry_after_secs = wait.as_secs(),
                    "telegram rate limited, waiting before retry"
                );
                tokio::time::sleep(wait).await;
            },
        }
    }
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        std::sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        teloxide::types::Seconds,
    };

    #[test]
    fn retry_after_duration_extracts_wait() {
        let err = RequestError::RetryAfter(Seconds::from_seconds(42));
        assert_eq!(retry_after_duration(&err), Some(Duration::from_secs(42)));
    }

    #[test]
    fn retry_after_duration_ignores_other_errors() {
        let err = RequestError::Io(std::io::Error::other("boom"));
        assert_eq!(retry_after_duration(&err), None);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let result = run_telegram_request_with_retry(1, "test", || {
            let calls = Arc::clone(&calls);
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(RequestError::RetryAfter(Seconds::from_seconds(0)))
                } else {
                    Ok("sent")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "sent");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicUsize::new(0));
        let result: Result<(), _> = run_telegram_request_with_retry(1, "test", || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(RequestError::RetryAfter(Seconds::from_seconds(0)))
            }
        })
        .await;
        assert!(matches!(result, Err(RequestError::RetryAfter(_))));
        assert_eq!(
            calls.load(Ordering::SeqCst),
            TELEGRAM_RETRY_AFTER_MAX_RETRIES + 1
        );
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let result: Result<(), _> = run_telegram_request_with_retry(1, "test", || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(RequestError::Io(std::io::Error::other("reset")))
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
