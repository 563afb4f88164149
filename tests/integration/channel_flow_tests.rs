//! Integration tests: Supervisor over the real bot-API channel and the
//! simulated WiFi link.  Only the sensor/relay hardware is mocked.

use std::collections::VecDeque;

use thermobot::adapters::telegram::{
    API_BASE, HttpTransport, MAX_BODY_LEN, SimHttpTransport, TelegramChannel,
};
use thermobot::adapters::wifi::WifiAdapter;
use thermobot::app::events::AppEvent;
use thermobot::app::supervisor::Supervisor;
use thermobot::error::ChannelError;

use crate::mock_hw::{MockHardware, RecordingSink, config};

const TOKEN: &str = "123456:ABC-def";
const OK_SENT: &str = r#"{"ok":true,"result":{"message_id":1}}"#;

fn link() -> WifiAdapter {
    let mut wifi = WifiAdapter::new();
    wifi.set_credentials("TestNet", "password1").unwrap();
    wifi
}

#[test]
fn backlog_is_skipped_then_new_commands_are_answered() {
    let mut transport = SimHttpTransport::new();
    // Startup drain: two stale commands.
    transport.push_response(
        200,
        r#"{"ok":true,"result":[
            {"update_id":100,"message":{"chat":{"id":42,"type":"private"},"from":{"first_name":"Ana"},"text":"/on"}},
            {"update_id":101,"message":{"chat":{"id":42,"type":"private"},"text":"/on"}}
        ]}"#,
    );
    transport.push_response(200, r#"{"ok":true,"result":[]}"#);
    // First cycle: a fresh /status.
    transport.push_response(
        200,
        r#"{"ok":true,"result":[
            {"update_id":102,"message":{"chat":{"id":42,"type":"private"},"from":{"first_name":"Ana"},"text":"/status"}}
        ]}"#,
    );
    transport.push_response(200, OK_SENT);
    transport.push_response(200, OK_SENT);

    let mut channel = TelegramChannel::new(TOKEN, transport);
    let mut hw = MockHardware::new(&[23.5]);
    let mut wifi = link();
    let mut sink = RecordingSink::new();

    let mut sup = Supervisor::new(config());
    sup.start(&mut hw, &mut wifi, &mut channel, &mut sink).unwrap();
    assert_eq!(sup.cursor().last(), Some(101));
    assert!(!hw.relay_on);

    sup.run_cycle(&mut hw, &mut wifi, &mut channel, &mut sink)
        .unwrap();

    let reqs = channel.transport().requests();
    assert_eq!(reqs.len(), 5);
    assert_eq!(reqs[0], format!("{API_BASE}{TOKEN}/getUpdates?timeout=1&limit=4"));
    assert_eq!(
        reqs[1],
        format!("{API_BASE}{TOKEN}/getUpdates?timeout=1&offset=102&limit=4")
    );
    assert_eq!(
        reqs[2],
        format!("{API_BASE}{TOKEN}/getUpdates?timeout=5&offset=102&limit=4")
    );
    assert!(reqs[3].contains("/sendMessage?chat_id=42&text=%E2%9C%85%20Authorized."));
    assert!(reqs[4].contains("Temperature%3A%2023.50%C2%B0C%0A"));
    assert!(!hw.relay_on, "stale /on must not be replayed");
    assert_eq!(sup.cursor().last(), Some(102));
}

#[test]
fn api_outage_is_tolerated() {
    let mut transport = SimHttpTransport::new();
    transport.push_response(200, r#"{"ok":true,"result":[]}"#);
    transport.push_response(502, "Bad Gateway");
    transport.push_response(200, r#"{"ok":false,"description":"Conflict"}"#);

    let mut channel = TelegramChannel::new(TOKEN, transport);
    let mut hw = MockHardware::new(&[21.0]);
    let mut wifi = link();
    let mut sink = RecordingSink::new();

    let mut sup = Supervisor::new(config());
    sup.start(&mut hw, &mut wifi, &mut channel, &mut sink).unwrap();
    sup.run_cycle(&mut hw, &mut wifi, &mut channel, &mut sink)
        .unwrap();
    sup.run_cycle(&mut hw, &mut wifi, &mut channel, &mut sink)
        .unwrap();

    assert_eq!(sup.cursor().last(), None);
    assert_eq!(sup.cycles(), 2);
    assert_eq!(hw.reads, 2);
}

#[test]
fn lost_wifi_is_reconnected_within_the_cycle() {
    let mut channel = TelegramChannel::new(TOKEN, SimHttpTransport::new());
    let mut hw = MockHardware::new(&[21.0]);
    let mut wifi = link();
    let mut sink = RecordingSink::new();

    let mut sup = Supervisor::new(config());
    sup.start(&mut hw, &mut wifi, &mut channel, &mut sink).unwrap();

    wifi.sim_set_ap_available(false);
    wifi.sim_set_ap_available(true);
    sup.run_cycle(&mut hw, &mut wifi, &mut channel, &mut sink)
        .unwrap();

    assert!(sink.events.contains(&AppEvent::LinkLost));
    assert!(sink.events.contains(&AppEvent::LinkRestored));
}

// ── Paged delivery ────────────────────────────────────────────

/// Bot API stand-in that keeps a pending queue and honours `offset` and
/// `limit` the way the real server does.  Bodies over the receive buffer
/// fail the same way the device transport does.
#[derive(Default)]
struct BotServer {
    pending: VecDeque<(u64, String)>,
    polls: Vec<String>,
}

impl BotServer {
    fn post(&mut self, id: u64, chat: &str, text: &str) {
        self.pending.push_back((
            id,
            format!(r#"{{"update_id":{id},"message":{{"chat":{chat},"from":{{"first_name":"Ana"}},"text":"{text}"}}}}"#),
        ));
    }

    fn param(url: &str, name: &str) -> Option<u64> {
        let query = url.split_once('?')?.1;
        query
            .split('&')
            .find_map(|kv| kv.strip_prefix(name)?.strip_prefix('='))
            .and_then(|v| v.parse().ok())
    }
}

impl HttpTransport for BotServer {
    fn get(&mut self, url: &str, _timeout_secs: u32) -> Result<(u16, Vec<u8>), ChannelError> {
        if !url.contains("/getUpdates?") {
            return Ok((200, br#"{"ok":true,"result":{"message_id":1}}"#.to_vec()));
        }
        self.polls.push(url.into());
        if let Some(offset) = Self::param(url, "offset") {
            self.pending.retain(|(id, _)| *id >= offset);
        }
        let limit = Self::param(url, "limit").unwrap_or(100) as usize;
        let batch: Vec<&str> = self
            .pending
            .iter()
            .take(limit)
            .map(|(_, json)| json.as_str())
            .collect();
        let body = format!(r#"{{"ok":true,"result":[{}]}}"#, batch.join(","));
        if body.len() > MAX_BODY_LEN {
            return Err(ChannelError::TooLarge);
        }
        Ok((200, body.into_bytes()))
    }
}

#[test]
fn large_pending_queue_drains_across_cycles() {
    let mut channel = TelegramChannel::new(TOKEN, BotServer::default());
    // Above the threshold, so an operator /on holds.
    let mut hw = MockHardware::new(&[35.0]);
    let mut wifi = link();
    let mut sink = RecordingSink::new();

    let mut sup = Supervisor::new(config());
    sup.start(&mut hw, &mut wifi, &mut channel, &mut sink).unwrap();

    // Far more group chatter than one receive buffer holds, then a command.
    let chatter = "lorem ipsum dolor sit amet ".repeat(24);
    let server = channel.transport_mut();
    for id in 1..=60 {
        server.post(id, r#"{"id":-900,"type":"group"}"#, &chatter);
    }
    server.post(61, r#"{"id":42,"type":"private"}"#, "/on");
    let queued: usize = server.pending.iter().map(|(_, json)| json.len()).sum();
    assert!(queued > MAX_BODY_LEN);

    for _ in 0..20 {
        sup.run_cycle(&mut hw, &mut wifi, &mut channel, &mut sink)
            .unwrap();
    }

    assert_eq!(sup.cursor().last(), Some(61));
    assert!(hw.relay_on);
    assert!(sup.recipients().contains(42));
    assert!(!sink.events.iter().any(|e| matches!(e, AppEvent::FetchFailed(_))));
    assert!(channel.transport().polls.iter().all(|u| u.ends_with("&limit=4")));
}

#[test]
fn oversized_startup_backlog_is_fully_skipped() {
    let mut server = BotServer::default();
    let chatter = "x".repeat(600);
    for id in 1..=40 {
        server.post(id, r#"{"id":42,"type":"private"}"#, &chatter);
    }
    server.post(41, r#"{"id":42,"type":"private"}"#, "/on");

    let mut channel = TelegramChannel::new(TOKEN, server);
    let mut hw = MockHardware::new(&[21.0]);
    let mut wifi = link();
    let mut sink = RecordingSink::new();

    let mut sup = Supervisor::new(config());
    sup.start(&mut hw, &mut wifi, &mut channel, &mut sink).unwrap();
    assert_eq!(sup.cursor().last(), Some(41));

    sup.run_cycle(&mut hw, &mut wifi, &mut channel, &mut sink)
        .unwrap();
    assert!(!hw.relay_on, "stale /on must not be replayed");
    assert!(sup.recipients().is_empty());
}
