use std::fmt;

/// Identifies one conversation: a user talking to the bot in a chat.
///
/// In a private chat both ids name the same person; in a group each member
/// gets an independent dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationKey {
    pub chat_id: i64,
    pub user_id: u64,
}

impl ConversationKey {
    #[must_use]
    pub fn new(chat_id: i64, user_id: u64) -> Self {
        Self { chat_id, user_id }
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chat_id, self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_members_are_distinct() {
        let a = ConversationKey::new(-100, 1);
        let b = ConversationKey::new(-100, 2);
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "-100:1");
    }
}
