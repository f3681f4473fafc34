use std::{sync::Arc, time::Duration};

use {
    reelpost_config::TelegramConfig,
    reelpost_workflow::Mode,
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tokio::task::JoinHandle,
    tracing::{debug, error, info, warn},
};

use crate::{
    error::{Error, Result},
    handlers,
    state::BotState,
    workers::ConversationWorkers,
};

/// Long-polling timeout passed to `getUpdates`, in seconds.
const POLL_TIMEOUT_SECS: u32 = 30;

/// Build the bot client, verify the token and prepare the bot for polling.
///
/// Returns the bot and its username.
pub async fn connect(config: &TelegramConfig) -> Result<(Bot, Option<String>)> {
    // The read timeout must outlast the long-polling timeout, otherwise the
    // client aborts getUpdates before Telegram answers.
    let client = teloxide::net::default_reqwest_settings()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .timeout(Duration::from_secs(config.read_timeout_secs))
        .build()?;
    let mut bot = Bot::with_client(config.token.expose_secret(), client);
    if let Some(url) = &config.api_url {
        let parsed = reqwest::Url::parse(url).map_err(|e| Error::ApiUrl {
            url: url.clone(),
            message: e.to_string(),
        })?;
        bot = bot.set_api_url(parsed);
    }

    let me = bot.get_me().await?;
    let bot_username = me.username.clone();

    // Delete any existing webhook so long polling works.
    bot.delete_webhook().send().await?;

    if let Err(e) = bot.set_my_commands(bot_commands()).await {
        warn!("failed to register bot commands: {e}");
    }

    info!(username = ?bot_username, "telegram bot connected (webhook cleared)");
    Ok((bot, bot_username))
}

/// Commands shown in the Telegram client's command menu.
pub fn bot_commands() -> Vec<BotCommand> {
    let mut commands = vec![
        BotCommand::new("start", "Show available commands"),
        BotCommand::new("setsticker", "Reply to a sticker to register it"),
        BotCommand::new("setformat", "Override caption template"),
    ];
    commands.extend(Mode::ALL.into_iter().map(|mode| {
        let description = match mode {
            Mode::Episode => "3 videos single episode",
            Mode::Season => "Full season (3×N videos)",
            Mode::Specific => "One video per episode at chosen quality",
            Mode::Marge => "Merge separate 480p/720p/1080p lists",
        };
        BotCommand::new(mode.command(), description)
    }));
    commands.push(BotCommand::new("cancel", "Abort current operation"));
    commands
}

/// Spawn the manual polling loop.
///
/// Updates are processed until `state.cancel` is cancelled; the returned
/// handle completes once the loop has stopped.
pub fn start_polling(state: Arc<BotState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("starting telegram manual polling loop");
        let mut workers = ConversationWorkers::new(Arc::clone(&state));
        let mut offset: i32 = 0;

        loop {
            let result = tokio::select! {
                _ = state.cancel.cancelled() => {
                    info!("telegram polling stopped");
                    break;
                },
                result = state
                    .bot
                    .get_updates()
                    .offset(offset)
                    .timeout(POLL_TIMEOUT_SECS)
                    .allowed_updates(vec![AllowedUpdate::Message])
                    .send() => result,
            };

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        match update.kind {
                            UpdateKind::Message(msg) => {
                                debug!(
                                    chat_id = msg.chat.id.0,
                                    message_id = msg.id.0,
                                    "received telegram message"
                                );
                                if let Some((key, input)) =
                                    handlers::classify(&msg, state.bot_username.as_deref())
                                {
                                    workers.dispatch(key, input);
                                }
                            },
                            other => {
                                debug!("ignoring non-message update: {other:?}");
                            },
                        }
                    }
                },
                Err(e) => {
                    // Another instance is polling with the same token.
                    if matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) {
                        error!("telegram polling disabled: another instance is already running with this token");
                        state.cancel.cancel();
                        break;
                    }

                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::select! {
                        _ = state.cancel.cancelled() => break,
                        _ = tokio::time::sleep(Duration::from_secs(5)) => {},
                    }
                },
            }
        }
    })
}
