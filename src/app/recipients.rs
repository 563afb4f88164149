//! Authorized recipient allow-list.
//!
//! Starts empty.  The first chat that talks to the bot is learned and stays
//! the sole member for the lifetime of the process; there is no removal.
//! The set type is general so notification fan-out already iterates over
//! every member.

/// Upper bound on learned recipients.
pub const MAX_RECIPIENTS: usize = 4;

#[derive(Debug, Default)]
pub struct AuthorizedRecipients {
    members: heapless::FnvIndexSet<i64, MAX_RECIPIENTS>,
}

impl AuthorizedRecipients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn `chat_id` if and only if the set is still empty.
    /// Returns `true` when the id was learned.
    pub fn learn_first(&mut self, chat_id: i64) -> bool {
        if !self.members.is_empty() {
            return false;
        }
        self.members.insert(chat_id).is_ok()
    }

    pub fn contains(&self, chat_id: i64) -> bool {
        self.members.contains(&chat_id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.members.iter().copied()
    }
}
