//! Chat commands understood by the agent.
//!
//! Inbound text is parsed exactly once into a [`Command`] and then matched
//! exhaustively by the [`CommandRouter`](super::router::CommandRouter).

/// Prefix marking a bot command.
pub const COMMAND_PREFIX: char = '/';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Report temperature, humidity and relay state.
    Status,
    /// Operator override: energise the relay.
    On,
    /// De-energise the relay.
    Off,
    /// Help text.
    Start,
    /// Any other `/…` text.
    Unknown,
}

/// Per-event context the router needs to build a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    pub recipient: i64,
    pub requester_name: String,
    pub is_group: bool,
}

impl Command {
    /// Parse trimmed message text.
    ///
    /// Returns `None` for text that is not a command.  An `@<botname>`
    /// suffix (as appended by clients in group chats) is ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if !text.starts_with(COMMAND_PREFIX) {
            return None;
        }
        let name = match text.split_once('@') {
            Some((name, _bot)) => name,
            None => text,
        };
        Some(match name {
            "/status" => Self::Status,
            "/on" => Self::On,
            "/off" => Self::Off,
            "/start" => Self::Start,
            _ => Self::Unknown,
        })
    }
}
