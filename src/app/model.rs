//! Domain values exchanged across the port boundary.

use serde::Deserialize;

/// One temperature/humidity sample.  Only the latest is retained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    /// Milliseconds since boot when the sample was taken.
    pub taken_at_ms: u64,
}

/// Chat kind as reported by the bot API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    #[default]
    Private,
    Group,
    Supergroup,
    /// Channels and anything newer the API may add.
    #[serde(other)]
    Other,
}

impl ChatType {
    pub fn is_group(self) -> bool {
        matches!(self, Self::Group | Self::Supergroup)
    }
}

/// An inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: u64,
    pub chat_id: i64,
    pub chat_type: ChatType,
    pub sender_name: String,
    pub text: String,
}

impl Event {
    /// Negative chat ids and group chat types both mark a group context.
    pub fn is_group(&self) -> bool {
        self.chat_id < 0 || self.chat_type.is_group()
    }
}

/// One entry of a fetch.  Updates that carry no message still consume
/// an id and must advance the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    Message(Event),
    Other { id: u64 },
}

impl Update {
    pub fn id(&self) -> u64 {
        match self {
            Self::Message(event) => event.id,
            Self::Other { id } => *id,
        }
    }
}
