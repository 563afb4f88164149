//! Threshold controller with relay-state hysteresis.
//!
//! The relay's own ON/OFF state is the hysteresis memory; there is no
//! separate dead-band.
//!
//! | temperature | relay | decision     | effect                         |
//! |-------------|-------|--------------|--------------------------------|
//! | ≥ T         | off   | `Alert`      | notify, ask operator for `/on` |
//! | ≥ T         | on    | `Controlled` | none                           |
//! | < T         | on    | `AutoOff`    | relay off, notify              |
//! | < T         | off   | `Normal`     | none                           |
//!
//! The controller never energises the relay.  Activation is operator
//! driven only; de-activation is always allowed once the condition clears.

use crate::app::model::Reading;

/// Outcome of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Alert,
    Controlled,
    AutoOff,
    Normal,
}

impl Decision {
    /// Relay level the caller must apply, if any.
    pub fn relay_target(self) -> Option<bool> {
        match self {
            Self::AutoOff => Some(false),
            Self::Alert | Self::Controlled | Self::Normal => None,
        }
    }

    /// Whether the caller fans a notification out to the recipients.
    pub fn notifies(self) -> bool {
        matches!(self, Self::Alert | Self::AutoOff)
    }
}

/// Derived alert status, recomputed from every fresh reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertState {
    #[default]
    Normal,
    Alerting,
    Controlled,
}

impl From<Decision> for AlertState {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Alert => Self::Alerting,
            Decision::Controlled => Self::Controlled,
            Decision::AutoOff | Decision::Normal => Self::Normal,
        }
    }
}

/// Pure decision function.
pub fn decide(temperature_c: f32, relay_on: bool, threshold_c: f32) -> Decision {
    match (temperature_c >= threshold_c, relay_on) {
        (true, false) => Decision::Alert,
        (true, true) => Decision::Controlled,
        (false, true) => Decision::AutoOff,
        (false, false) => Decision::Normal,
    }
}

pub struct HysteresisController {
    threshold_c: f32,
    alert_state: AlertState,
}

impl HysteresisController {
    pub fn new(threshold_c: f32) -> Self {
        Self {
            threshold_c,
            alert_state: AlertState::Normal,
        }
    }

    /// Evaluate a fresh reading against the current relay state.
    pub fn evaluate(&mut self, reading: &Reading, relay_on: bool) -> Decision {
        let decision = decide(reading.temperature_c, relay_on, self.threshold_c);
        self.alert_state = decision.into();
        decision
    }

    /// Operator switched the relay on: the pending alert is handled.
    pub fn acknowledge(&mut self) {
        self.alert_state = AlertState::Controlled;
    }

    pub fn alert_state(&self) -> AlertState {
        self.alert_state
    }

    pub fn threshold_c(&self) -> f32 {
        self.threshold_c
    }
}
