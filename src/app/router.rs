//! Command router: inbound chat event → authorization → command → replies.
//!
//! ```text
//!  Event ──▶ group filter ──▶ allow-list ──▶ Command::parse ──▶ effect + reply
//! ```
//!
//! The router mutates only the allow-list, the relay, and the controller's
//! alert state.  Delivery of the produced replies is left to the caller, so
//! a failed send can never roll back an authorization or a relay change.

use core::fmt::Write as _;

use log::{info, warn};

use crate::control::hysteresis::HysteresisController;
use crate::error::RelayError;

use super::commands::{COMMAND_PREFIX, Command, CommandContext};
use super::events::{AppEvent, RelayCause};
use super::model::{Event, Reading};
use super::ports::{EventSink, RelayPort};
use super::recipients::AuthorizedRecipients;

pub const MSG_AUTHORIZED: &str = "✅ Authorized. You can now control the relay.";
pub const MSG_GROUP_AUTHORIZED: &str =
    "✅ Group authorized! All members can control the relay.\nSend /start to see available commands.";
pub const MSG_NOT_AUTHORIZED: &str = "❌ Not authorized.";
pub const MSG_UNKNOWN: &str = "❓ Unknown command. Send /start for help.";

/// One outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub chat_id: i64,
    pub text: String,
}

/// At most an authorization notice followed by the command's own reply.
pub type Replies = heapless::Vec<Reply, 2>;

/// Outcome of routing one event.
#[derive(Debug, Default)]
pub struct Routed {
    /// Replies to deliver, in order.
    pub replies: Replies,
    /// Relay write failure hit while executing the command.  Replies
    /// produced before it are still in `replies`.
    pub fault: Option<RelayError>,
}

pub struct CommandRouter {
    group_mode: bool,
}

impl CommandRouter {
    pub fn new(group_mode: bool) -> Self {
        Self { group_mode }
    }

    /// Route one inbound event.
    ///
    /// Filtered chatter, refusals and unknown commands are expressed through
    /// the replies.  A relay write failure is reported in
    /// [`Routed::fault`] next to whatever was produced before it.
    pub fn route(
        &self,
        event: &Event,
        recipients: &mut AuthorizedRecipients,
        relay: &mut impl RelayPort,
        controller: &mut HysteresisController,
        last_reading: Option<&Reading>,
        sink: &mut impl EventSink,
    ) -> Routed {
        let mut routed = Routed::default();
        let ctx = CommandContext {
            recipient: event.chat_id,
            requester_name: event.sender_name.clone(),
            is_group: self.group_mode && event.is_group(),
        };
        let text = event.text.trim();

        // Ordinary group conversation is not for us.
        if ctx.is_group && !text.starts_with(COMMAND_PREFIX) {
            return routed;
        }

        if recipients.learn_first(ctx.recipient) {
            info!("Router: learned authorized recipient {}", ctx.recipient);
            sink.emit(&AppEvent::RecipientAuthorized {
                chat_id: ctx.recipient,
            });
            let notice = if event.is_group() {
                MSG_GROUP_AUTHORIZED
            } else {
                MSG_AUTHORIZED
            };
            push(&mut routed.replies, ctx.recipient, notice.into());
        } else if !recipients.contains(ctx.recipient) {
            warn!("Router: refused chat {}", ctx.recipient);
            sink.emit(&AppEvent::Unauthorized {
                chat_id: ctx.recipient,
            });
            push(&mut routed.replies, ctx.recipient, MSG_NOT_AUTHORIZED.into());
            return routed;
        }

        let Some(command) = Command::parse(text) else {
            return routed;
        };

        match self.execute(command, &ctx, relay, controller, last_reading, sink) {
            Ok(reply) => {
                sink.emit(&AppEvent::CommandHandled {
                    chat_id: ctx.recipient,
                    command,
                });
                push(&mut routed.replies, ctx.recipient, reply);
            }
            Err(e) => {
                warn!("Router: {:?} from {} failed: {}", command, ctx.recipient, e);
                routed.fault = Some(e);
            }
        }
        routed
    }

    /// Apply `command` and build its reply text.
    fn execute(
        &self,
        command: Command,
        ctx: &CommandContext,
        relay: &mut impl RelayPort,
        controller: &mut HysteresisController,
        last_reading: Option<&Reading>,
        sink: &mut impl EventSink,
    ) -> Result<String, RelayError> {
        let reply = match command {
            Command::Status => status_text(ctx, last_reading, relay.is_on()),
            Command::On => {
                let was_on = relay.is_on();
                relay.set(true)?;
                controller.acknowledge();
                if !was_on {
                    sink.emit(&AppEvent::RelayChanged {
                        on: true,
                        cause: RelayCause::Command,
                    });
                }
                with_requester("🔌 Relay turned ON", ctx)
            }
            Command::Off => {
                let was_on = relay.is_on();
                relay.set(false)?;
                if was_on {
                    sink.emit(&AppEvent::RelayChanged {
                        on: false,
                        cause: RelayCause::Command,
                    });
                }
                with_requester("🔌 Relay turned OFF", ctx)
            }
            Command::Start => help_text(ctx, controller.threshold_c()),
            Command::Unknown => MSG_UNKNOWN.into(),
        };
        Ok(reply)
    }
}

fn push(replies: &mut Replies, chat_id: i64, text: String) {
    // Capacity matches the two replies a single event can produce.
    let _ = replies.push(Reply { chat_id, text });
}

fn with_requester(base: &str, ctx: &CommandContext) -> String {
    if ctx.is_group {
        format!("{} by {}", base, ctx.requester_name)
    } else {
        base.into()
    }
}

/// `/status` body.
pub fn status_text(ctx: &CommandContext, reading: Option<&Reading>, relay_on: bool) -> String {
    let mut msg = String::new();
    if ctx.is_group {
        let _ = writeln!(msg, "📊 Status for {}", ctx.requester_name);
    }
    match reading {
        Some(r) => {
            let _ = writeln!(msg, "🌡️ Temperature: {:.2}°C", r.temperature_c);
            let _ = writeln!(msg, "💧 Humidity: {:.2}%", r.humidity_pct);
        }
        None => {
            msg.push_str("🌡️ Temperature: n/a\n");
            msg.push_str("💧 Humidity: n/a\n");
        }
    }
    let _ = write!(msg, "🔌 Relay: {}", if relay_on { "ON" } else { "OFF" });
    msg
}

/// `/start` body.
pub fn help_text(ctx: &CommandContext, threshold_c: f32) -> String {
    let mut msg = String::from("🤖 ESP32 Temperature Monitor Bot\n\n");
    msg.push_str("Commands:\n");
    msg.push_str("/status - Get current readings\n");
    msg.push_str("/on - Turn relay ON\n");
    msg.push_str("/off - Turn relay OFF\n\n");
    let _ = writeln!(msg, "🚨 Alert threshold: {:.1}°C", threshold_c);
    if ctx.is_group {
        msg.push_str("\n👥 Group mode: Commands work for all members");
    }
    msg
}

/// Fan-out text for a threshold breach with the relay off.
pub fn alert_text(temperature_c: f32, threshold_c: f32) -> String {
    format!(
        "🚨 ALERT: Temperature {:.2}°C ≥ {:.1}°C\nPlease send /on to turn on cooling system",
        temperature_c, threshold_c
    )
}

/// Fan-out text after the relay was switched off automatically.
pub fn auto_off_text(temperature_c: f32) -> String {
    format!(
        "✅ AUTO-OFF: Temperature dropped to {:.2}°C\nRelay turned OFF automatically",
        temperature_c
    )
}
