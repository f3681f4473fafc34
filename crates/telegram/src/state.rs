use std::sync::Arc;

use {
    reelpost_sessions::{ChatSettingsStore, ConversationStore},
    reelpost_workflow::Machine,
    tokio_util::sync::CancellationToken,
};

use crate::outbound::TelegramOutbound;

/// Runtime state shared by the polling loop and every conversation worker.
pub struct BotState {
    pub bot: teloxide::Bot,
    /// Used to skip commands addressed to other bots in groups.
    pub bot_username: Option<String>,
    pub machine: Machine,
    pub conversations: ConversationStore,
    pub settings: Arc<dyn ChatSettingsStore>,
    pub outbound: TelegramOutbound,
    pub cancel: CancellationToken,
}

impl BotState {
    pub fn new(
        bot: teloxide::Bot,
        bot_username: Option<String>,
        machine: Machine,
        settings: Arc<dyn ChatSettingsStore>,
    ) -> Self {
        Self {
            outbound: TelegramOutbound::new(bot.clone()),
            bot,
            bot_username,
            machine,
            conversations: ConversationStore::new(),
            settings,
            cancel: CancellationToken::new(),
        }
    }
}
