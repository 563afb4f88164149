//! Outbound application events.
//!
//! The [`Supervisor`](super::supervisor::Supervisor) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them; in production they become log lines.

use crate::control::hysteresis::Decision;
use crate::error::{ChannelError, Error, SensorError};

use super::commands::Command;
use super::model::Reading;

/// Why the relay changed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayCause {
    /// Forced off during startup.
    Startup,
    /// Temperature dropped below the threshold.
    AutoOff,
    /// Operator command.
    Command,
    /// Fail-safe before the process stops.
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Initialisation finished; carries the cursor after the backlog drain.
    Started { cursor: Option<u64> },

    /// A fresh sensor sample.
    Reading(Reading),

    /// The sensor read failed; control is skipped this cycle.
    SensorFailed(SensorError),

    /// A control decision that has an externally visible effect.
    Decision { decision: Decision, temperature_c: f32 },

    RelayChanged { on: bool, cause: RelayCause },

    /// A fan-out notification finished.
    Notified { delivered: usize, failed: usize },

    /// The first chat was learned as the authorized recipient.
    RecipientAuthorized { chat_id: i64 },

    /// A chat outside the allow-list was refused.
    Unauthorized { chat_id: i64 },

    CommandHandled { chat_id: i64, command: Command },

    /// A reply could not be delivered.
    ReplyFailed { chat_id: i64, error: ChannelError },

    /// Fetching inbound updates failed; retried next cycle.
    FetchFailed(ChannelError),

    LinkLost,
    LinkRestored,
    /// Reconnect attempt timed out; sensing and control continue.
    LinkDown,

    /// An unexpected fault reached the loop boundary.
    CycleFault(Error),

    /// Periodic liveness marker.
    Heartbeat { cycles: u64 },
}
