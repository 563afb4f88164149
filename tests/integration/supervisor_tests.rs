//! Integration tests: Supervisor → controller/router → mock ports.

use thermobot::app::commands::Command;
use thermobot::app::events::{AppEvent, RelayCause};
use thermobot::app::model::Update;
use thermobot::app::router::{
    MSG_AUTHORIZED, MSG_NOT_AUTHORIZED, MSG_UNKNOWN, alert_text, auto_off_text,
};
use thermobot::app::supervisor::Supervisor;
use thermobot::control::hysteresis::{AlertState, Decision};
use thermobot::error::{ChannelError, Error, RelayError, SensorError};

use crate::mock_hw::{
    MockChannel, MockClock, MockHardware, MockLink, RecordingSink, config, msg,
};

const OWNER: i64 = 12345;

struct Rig {
    sup: Supervisor,
    hw: MockHardware,
    link: MockLink,
    chan: MockChannel,
    sink: RecordingSink,
}

impl Rig {
    /// Started supervisor with an empty backlog; `batches` feed the
    /// following cycles in order.
    fn new(temps: &[f32], batches: Vec<Vec<Update>>) -> Self {
        let mut chan = MockChannel::new();
        chan.queue(Vec::new());
        for b in batches {
            chan.queue(b);
        }
        let mut rig = Self {
            sup: Supervisor::new(config()),
            hw: MockHardware::new(temps),
            link: MockLink::up(),
            chan,
            sink: RecordingSink::new(),
        };
        rig.sup
            .start(&mut rig.hw, &mut rig.link, &mut rig.chan, &mut rig.sink)
            .unwrap();
        rig
    }

    fn cycle(&mut self) {
        self.sup
            .run_cycle(&mut self.hw, &mut self.link, &mut self.chan, &mut self.sink)
            .unwrap();
    }
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn startup_forces_relay_off_and_skips_backlog() {
    let mut hw = MockHardware::new(&[22.0]);
    hw.relay_on = true;
    let mut link = MockLink::up();
    let mut chan = MockChannel::new();
    chan.queue(vec![msg(7, OWNER, "/on"), msg(8, OWNER, "/on")]);
    let mut sink = RecordingSink::new();

    let mut sup = Supervisor::new(config());
    sup.start(&mut hw, &mut link, &mut chan, &mut sink).unwrap();

    assert!(!hw.relay_on);
    assert_eq!(hw.relay_writes, vec![false]);
    assert_eq!(sup.cursor().last(), Some(8));
    assert!(sup.recipients().is_empty());
    assert!(chan.sent.is_empty());
    // The drain keeps polling until a batch comes back empty.
    assert_eq!(chan.offsets, vec![None, Some(9)]);
    assert!(sink.events.contains(&AppEvent::Started { cursor: Some(8) }));

    sup.run_cycle(&mut hw, &mut link, &mut chan, &mut sink).unwrap();
    assert_eq!(chan.offsets[2], Some(9));
    assert!(!hw.relay_on);
}

#[test]
fn startup_drains_a_backlog_spread_over_batches() {
    let mut hw = MockHardware::new(&[22.0]);
    let mut chan = MockChannel::new();
    chan.queue(vec![msg(1, OWNER, "/on"), msg(2, OWNER, "/on")]);
    chan.queue(vec![msg(3, 777, "/on"), Update::Other { id: 4 }]);
    chan.queue(vec![msg(5, OWNER, "/on")]);
    let mut sink = RecordingSink::new();

    let mut sup = Supervisor::new(config());
    sup.start(&mut hw, &mut MockLink::up(), &mut chan, &mut sink)
        .unwrap();

    assert_eq!(sup.cursor().last(), Some(5));
    assert_eq!(chan.offsets, vec![None, Some(3), Some(5), Some(6)]);
    assert!(sup.recipients().is_empty());
    assert!(!hw.relay_on);
    assert!(chan.sent.is_empty());
}

#[test]
fn startup_tolerates_missing_link() {
    let mut hw = MockHardware::new(&[22.0]);
    let mut link = MockLink::down();
    let mut chan = MockChannel::new();
    let mut sink = RecordingSink::new();

    let mut sup = Supervisor::new(config());
    sup.start(&mut hw, &mut link, &mut chan, &mut sink).unwrap();
    assert!(sink.events.contains(&AppEvent::LinkDown));
    assert_eq!(sup.cursor().last(), None);
}

#[test]
fn startup_fails_only_when_relay_cannot_be_driven() {
    let mut hw = MockHardware::new(&[22.0]);
    hw.relay_broken = true;
    let mut sup = Supervisor::new(config());
    let result = sup.start(
        &mut hw,
        &mut MockLink::up(),
        &mut MockChannel::new(),
        &mut RecordingSink::new(),
    );
    assert_eq!(result, Err(Error::Relay(RelayError::GpioWriteFailed)));
}

// ── Threshold scenarios ───────────────────────────────────────

#[test]
fn scenario_a_alert_notifies_and_leaves_relay_off() {
    let mut rig = Rig::new(&[25.0, 31.0], vec![vec![msg(1, OWNER, "/status")]]);
    rig.cycle();
    rig.cycle();

    assert!(!rig.hw.relay_on);
    assert_eq!(rig.hw.relay_writes, vec![false]);
    assert_eq!(rig.sup.alert_state(), AlertState::Alerting);
    let texts = rig.chan.texts_to(OWNER);
    assert_eq!(texts.len(), 3);
    assert_eq!(texts[0], MSG_AUTHORIZED);
    assert!(texts[1].contains("Temperature: 25.00°C"));
    assert_eq!(texts[2], alert_text(31.0, 30.0));
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            AppEvent::Decision {
                decision: Decision::Alert,
                ..
            }
        )),
        1
    );
}

#[test]
fn persistent_breach_alerts_every_cycle() {
    let mut rig = Rig::new(&[22.0, 31.0], vec![vec![msg(1, OWNER, "/start")]]);
    rig.cycle();
    let before = rig.chan.texts_to(OWNER).len();

    for _ in 0..3 {
        rig.cycle();
    }

    let alert = alert_text(31.0, 30.0);
    let texts = rig.chan.texts_to(OWNER);
    assert_eq!(texts.len(), before + 3);
    assert!(texts[before..].iter().all(|t| *t == alert));
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            AppEvent::Decision {
                decision: Decision::Alert,
                ..
            }
        )),
        3
    );
    assert!(!rig.hw.relay_on);
    assert_eq!(rig.sup.alert_state(), AlertState::Alerting);
}

#[test]
fn scenarios_b_and_c_controlled_then_auto_off() {
    let mut rig = Rig::new(&[31.0, 31.0, 29.0], vec![vec![msg(1, OWNER, "/on")]]);

    // Alert fires before anyone is authorized: nobody to notify.
    rig.cycle();
    assert!(rig.hw.relay_on);
    assert_eq!(rig.sup.alert_state(), AlertState::Controlled);

    // Controlled: relay stays on, nothing sent.
    rig.cycle();
    assert!(rig.hw.relay_on);
    assert_eq!(rig.chan.sent.len(), 2);

    // Drop below threshold: automatic OFF plus notification.
    rig.cycle();
    assert!(!rig.hw.relay_on);
    assert_eq!(rig.hw.relay_writes, vec![false, true, false]);
    assert_eq!(rig.sup.alert_state(), AlertState::Normal);
    assert_eq!(
        rig.chan.texts_to(OWNER),
        vec![MSG_AUTHORIZED, "🔌 Relay turned ON", auto_off_text(29.0).as_str()]
    );
    assert!(rig.sink.events.contains(&AppEvent::RelayChanged {
        on: false,
        cause: RelayCause::AutoOff
    }));
}

#[test]
fn repeated_evaluation_never_touches_relay() {
    let mut rig = Rig::new(&[20.0], vec![]);
    for _ in 0..5 {
        rig.cycle();
    }
    assert_eq!(rig.hw.relay_writes, vec![false]);
    assert!(rig.chan.sent.is_empty());
}

#[test]
fn failed_read_skips_control() {
    let mut rig = Rig::new(&[25.0], vec![]);
    rig.cycle();
    rig.hw.relay_on = true;
    rig.hw.readings.clear();
    rig.hw.push(Err(SensorError::Checksum));

    rig.cycle();
    assert!(rig.hw.relay_on, "no AutoOff on a failed read");
    assert_eq!(rig.hw.relay_writes, vec![false]);
    assert_eq!(rig.sup.last_reading().map(|r| r.temperature_c), Some(25.0));
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::SensorFailed(SensorError::Checksum))
    );
}

// ── Command scenarios ─────────────────────────────────────────

#[test]
fn scenario_d_group_chatter_is_ignored() {
    let mut rig = Rig::new(&[22.0], vec![vec![msg(1, -500, "hello")]]);
    rig.cycle();
    assert!(rig.chan.sent.is_empty());
    assert!(rig.sup.recipients().is_empty());
    assert_eq!(rig.sup.cursor().last(), Some(1));
}

#[test]
fn scenario_e_first_contact_gets_two_replies_in_order() {
    let mut rig = Rig::new(&[22.0], vec![vec![msg(1, OWNER, "/start")]]);
    rig.cycle();
    assert_eq!(rig.sup.recipients().iter().collect::<Vec<_>>(), vec![OWNER]);
    let texts = rig.chan.texts_to(OWNER);
    assert_eq!(texts.len(), 2);
    assert_eq!(texts[0], MSG_AUTHORIZED);
    assert!(texts[1].contains("/status - Get current readings"));
    assert!(texts[1].contains("Alert threshold: 30.0°C"));
}

#[test]
fn scenario_f_stranger_is_refused() {
    let mut rig = Rig::new(
        &[22.0],
        vec![vec![msg(1, OWNER, "/on"), msg(2, 999, "/off")]],
    );
    rig.cycle();
    assert!(rig.hw.relay_on);
    assert_eq!(rig.chan.texts_to(999), vec![MSG_NOT_AUTHORIZED]);
    assert!(!rig.sup.recipients().contains(999));
    assert!(rig.sink.events.contains(&AppEvent::Unauthorized { chat_id: 999 }));
}

#[test]
fn group_command_names_requester() {
    let mut rig = Rig::new(&[22.0], vec![vec![msg(1, -500, "/status@thermo_bot")]]);
    rig.cycle();
    let texts = rig.chan.texts_to(-500);
    assert_eq!(texts.len(), 2);
    assert!(texts[0].starts_with("✅ Group authorized!"));
    assert!(texts[1].starts_with("📊 Status for Ana\n"));
}

#[test]
fn unknown_command_gets_hint() {
    let mut rig = Rig::new(&[22.0], vec![vec![msg(1, OWNER, "/reboot")]]);
    rig.cycle();
    assert_eq!(rig.chan.texts_to(OWNER), vec![MSG_AUTHORIZED, MSG_UNKNOWN]);
    assert!(rig.sink.events.contains(&AppEvent::CommandHandled {
        chat_id: OWNER,
        command: Command::Unknown
    }));
}

#[test]
fn failed_reply_keeps_authorization_and_relay() {
    let mut rig = Rig::new(&[22.0], vec![vec![msg(1, OWNER, "/on")]]);
    rig.chan.failing_chats.insert(OWNER);
    rig.cycle();
    assert!(rig.sup.recipients().contains(OWNER));
    assert!(rig.hw.relay_on);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::ReplyFailed { chat_id: OWNER, .. })),
        2
    );
}

// ── Cursor ────────────────────────────────────────────────────

#[test]
fn cursor_reaches_max_id_and_processes_in_order() {
    let mut rig = Rig::new(
        &[22.0],
        vec![vec![
            msg(9, OWNER, "/off"),
            msg(3, OWNER, "/on"),
            Update::Other { id: 12 },
        ]],
    );
    rig.cycle();
    assert_eq!(rig.sup.cursor().last(), Some(12));
    // Id order: /on (3) before /off (9).
    assert!(!rig.hw.relay_on);
    assert_eq!(rig.hw.relay_writes, vec![false, true, false]);

    rig.cycle();
    assert_eq!(rig.chan.offsets.last(), Some(&Some(13)));
}

#[test]
fn fetch_failure_is_retried_next_cycle() {
    let mut rig = Rig::new(&[22.0], Vec::new());
    rig.chan.queue_error(ChannelError::Transport);
    rig.chan.queue(vec![msg(4, OWNER, "/status")]);

    rig.cycle();
    assert_eq!(rig.sup.cursor().last(), None);
    assert!(rig.chan.sent.is_empty());
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::FetchFailed(ChannelError::Transport))
    );

    rig.cycle();
    assert_eq!(rig.sup.cursor().last(), Some(4));
    assert_eq!(rig.chan.texts_to(OWNER).len(), 2);
}

// ── Fault containment ─────────────────────────────────────────

#[test]
fn fan_out_failure_does_not_stop_the_cycle() {
    let mut rig = Rig::new(
        &[22.0, 31.0],
        vec![vec![msg(1, OWNER, "/status")], vec![msg(2, OWNER, "/status")]],
    );
    rig.cycle();
    rig.chan.failing_chats.insert(OWNER);
    rig.cycle();
    assert!(rig.sink.events.contains(&AppEvent::Notified {
        delivered: 0,
        failed: 1
    }));
    // The command poll still ran after the failed fan-out.
    assert_eq!(rig.sup.cursor().last(), Some(2));
}

#[test]
fn offline_link_does_not_block_control() {
    let mut rig = Rig::new(&[29.0], vec![]);
    rig.link.connected = false;
    rig.link.reconnects = false;
    rig.hw.relay_on = true;

    rig.cycle();
    assert!(!rig.hw.relay_on, "AutoOff works without the network");
    assert_eq!(rig.link.attempts, 1);
    assert!(rig.sink.events.contains(&AppEvent::LinkLost));
    assert!(rig.sink.events.contains(&AppEvent::LinkDown));

    rig.link.reconnects = true;
    rig.cycle();
    assert!(rig.sink.events.contains(&AppEvent::LinkRestored));
}

#[test]
fn relay_fault_gets_backoff_and_loop_continues() {
    let mut rig = Rig::new(&[29.0], vec![]);
    rig.hw.relay_on = true;
    rig.hw.relay_broken = true;
    let clock = MockClock::default();

    let delay = rig
        .sup
        .supervise_cycle(&mut rig.hw, &mut rig.link, &mut rig.chan, &clock, &mut rig.sink);
    assert_eq!(delay, u64::from(rig.sup.config().fault_backoff_ms));
    assert!(rig.sink.events.contains(&AppEvent::CycleFault(Error::Relay(
        RelayError::GpioWriteFailed
    ))));

    rig.hw.relay_broken = false;
    let delay = rig
        .sup
        .supervise_cycle(&mut rig.hw, &mut rig.link, &mut rig.chan, &clock, &mut rig.sink);
    assert_eq!(delay, u64::from(rig.sup.config().cycle_interval_ms));
    assert!(!rig.hw.relay_on);
}

#[test]
fn relay_fault_on_first_contact_still_delivers_notice() {
    let mut rig = Rig::new(&[22.0], vec![vec![msg(1, OWNER, "/on"), msg(2, OWNER, "/status")]]);
    rig.hw.relay_broken = true;
    let clock = MockClock::default();

    let delay = rig
        .sup
        .supervise_cycle(&mut rig.hw, &mut rig.link, &mut rig.chan, &clock, &mut rig.sink);

    assert_eq!(delay, u64::from(rig.sup.config().fault_backoff_ms));
    assert!(rig.sup.recipients().contains(OWNER));
    assert_eq!(rig.chan.texts_to(OWNER), vec![MSG_AUTHORIZED]);
    // The faulting /on is consumed; /status waits for the next cycle.
    assert_eq!(rig.sup.cursor().last(), Some(1));
}

#[test]
fn heartbeat_follows_configured_period() {
    let mut cfg = config();
    cfg.heartbeat_every_cycles = 2;
    let mut hw = MockHardware::new(&[22.0]);
    let mut link = MockLink::up();
    let mut chan = MockChannel::new();
    let mut sink = RecordingSink::new();
    let mut sup = Supervisor::new(cfg);
    sup.start(&mut hw, &mut link, &mut chan, &mut sink).unwrap();
    for _ in 0..4 {
        sup.run_cycle(&mut hw, &mut link, &mut chan, &mut sink).unwrap();
    }
    assert_eq!(sup.cycles(), 4);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::Heartbeat { .. })),
        2
    );
}

#[test]
fn shutdown_turns_relay_off() {
    let mut rig = Rig::new(&[22.0], vec![vec![msg(1, OWNER, "/on")]]);
    rig.cycle();
    assert!(rig.hw.relay_on);
    rig.sup.shutdown(&mut rig.hw, &mut rig.sink);
    assert!(!rig.hw.relay_on);
    assert!(rig.sink.events.contains(&AppEvent::RelayChanged {
        on: false,
        cause: RelayCause::Shutdown
    }));
}
