//! Telegram Bot API channel adapter.
//!
//! Implements [`ChannelPort`] over plain HTTPS GET requests:
//!
//! | Port call       | API method                                        |
//! |-----------------|---------------------------------------------------|
//! | `fetch_updates` | `getUpdates?timeout=<wait>[&offset=<n>]&limit=<k>` |
//! | `send`          | `sendMessage?chat_id=<id>&text=<escaped>`         |
//!
//! Responses are decoded with `serde_json` into [`Update`]s.  Only the
//! fields the agent needs are read; defaults fill in anything missing
//! (`chat.type` → private, sender → `"User"`, text → empty).  An update
//! with neither `message` nor `edited_message` still yields its id so the
//! cursor can move past it.
//!
//! A poll asks for at most [`MAX_UPDATES_PER_POLL`] updates so a batch fits
//! the receive buffer.  If a batch still overflows it (very long messages)
//! the poll is repeated for a single update, which always fits.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: [`EspHttpTransport`] — one
//!   `EspHttpConnection` per request with the certificate bundle attached.
//! - **all other targets**: [`SimHttpTransport`] — scripted responses and
//!   a request log for host-side tests.

use log::{debug, warn};
use serde::Deserialize;

use crate::app::model::{ChatType, Event, Update};
use crate::app::ports::ChannelPort;
use crate::error::ChannelError;

use super::utils::percent_escape;

pub const API_BASE: &str = "https://api.telegram.org/bot";

/// Responses larger than this are refused rather than buffered.  One
/// update carrying a maximum-length (4096 character) message fits.
pub const MAX_BODY_LEN: usize = 32 * 1024;

/// Upper bound on updates requested per `getUpdates` call.
pub const MAX_UPDATES_PER_POLL: u8 = 4;

/// Extra time granted on top of the long-poll wait before the HTTP
/// request itself is abandoned.
const REQUEST_SLACK_SECS: u32 = 10;

const DEFAULT_SENDER: &str = "User";

// ───────────────────────────────────────────────────────────────
// Transport seam
// ───────────────────────────────────────────────────────────────

/// Minimal HTTP GET used by the channel.
pub trait HttpTransport {
    /// Perform a GET and return the status code and the full body.
    fn get(&mut self, url: &str, timeout_secs: u32) -> Result<(u16, Vec<u8>), ChannelError>;
}

// ───────────────────────────────────────────────────────────────
// Wire format
// ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct RawUpdate {
    update_id: u64,
    #[serde(default)]
    message: Option<RawMessage>,
    #[serde(default)]
    edited_message: Option<RawMessage>,
}

#[derive(Deserialize)]
struct RawMessage {
    chat: RawChat,
    #[serde(default)]
    from: Option<RawUser>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct RawChat {
    id: i64,
    #[serde(rename = "type", default)]
    kind: ChatType,
}

#[derive(Deserialize)]
struct RawUser {
    #[serde(default)]
    first_name: Option<String>,
}

impl RawUpdate {
    fn into_update(self) -> Update {
        let id = self.update_id;
        match self.message.or(self.edited_message) {
            Some(m) => Update::Message(Event {
                id,
                chat_id: m.chat.id,
                chat_type: m.chat.kind,
                sender_name: m
                    .from
                    .and_then(|u| u.first_name)
                    .unwrap_or_else(|| DEFAULT_SENDER.into()),
                text: m.text.unwrap_or_default(),
            }),
            None => Update::Other { id },
        }
    }
}

fn unwrap_envelope<T>(body: &[u8]) -> Result<Option<T>, ChannelError>
where
    T: for<'de> Deserialize<'de>,
{
    let envelope: ApiResponse<T> =
        serde_json::from_slice(body).map_err(|_| ChannelError::Decode)?;
    if !envelope.ok {
        warn!(
            "Bot API rejected request: {}",
            envelope.description.as_deref().unwrap_or("no description")
        );
        return Err(ChannelError::Rejected);
    }
    Ok(envelope.result)
}

/// Decode a `getUpdates` response body.
pub fn decode_updates(body: &[u8]) -> Result<Vec<Update>, ChannelError> {
    let raw: Option<Vec<RawUpdate>> = unwrap_envelope(body)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(RawUpdate::into_update)
        .collect())
}

/// Check a `sendMessage` response body.
pub fn decode_send(body: &[u8]) -> Result<(), ChannelError> {
    unwrap_envelope::<serde::de::IgnoredAny>(body).map(|_| ())
}

// ───────────────────────────────────────────────────────────────
// URL construction
// ───────────────────────────────────────────────────────────────

pub fn updates_url(token: &str, offset: Option<u64>, wait_secs: u32, limit: u8) -> String {
    let mut url = format!("{API_BASE}{token}/getUpdates?timeout={wait_secs}");
    if let Some(offset) = offset {
        url.push_str(&format!("&offset={offset}"));
    }
    url.push_str(&format!("&limit={limit}"));
    url
}

pub fn send_url(token: &str, chat_id: i64, text: &str) -> String {
    format!(
        "{API_BASE}{token}/sendMessage?chat_id={chat_id}&text={}",
        percent_escape(text)
    )
}

// ───────────────────────────────────────────────────────────────
// Channel adapter
// ───────────────────────────────────────────────────────────────

pub struct TelegramChannel<T> {
    token: String,
    transport: T,
}

impl<T: HttpTransport> TelegramChannel<T> {
    pub fn new(token: &str, transport: T) -> Self {
        Self {
            token: token.into(),
            transport,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn call(&mut self, url: &str, wait_secs: u32) -> Result<Vec<u8>, ChannelError> {
        let (status, body) = self
            .transport
            .get(url, wait_secs.saturating_add(REQUEST_SLACK_SECS))?;
        if !(200..300).contains(&status) {
            return Err(ChannelError::HttpStatus(status));
        }
        Ok(body)
    }

    fn poll(
        &mut self,
        offset: Option<u64>,
        wait_secs: u32,
        limit: u8,
    ) -> Result<Vec<Update>, ChannelError> {
        let url = updates_url(&self.token, offset, wait_secs, limit);
        let body = self.call(&url, wait_secs)?;
        decode_updates(&body)
    }
}

impl<T: HttpTransport> ChannelPort for TelegramChannel<T> {
    fn fetch_updates(
        &mut self,
        offset: Option<u64>,
        wait_secs: u32,
    ) -> Result<Vec<Update>, ChannelError> {
        let updates = match self.poll(offset, wait_secs, MAX_UPDATES_PER_POLL) {
            Err(ChannelError::TooLarge) => {
                warn!("getUpdates: batch too large, fetching one update");
                // Updates are already pending; no need to wait again.
                self.poll(offset, 0, 1)?
            }
            other => other?,
        };
        if !updates.is_empty() {
            debug!("getUpdates: {} update(s) from offset {:?}", updates.len(), offset);
        }
        Ok(updates)
    }

    fn send(&mut self, chat_id: i64, text: &str) -> Result<(), ChannelError> {
        let url = send_url(&self.token, chat_id, text);
        let body = self.call(&url, 0)?;
        decode_send(&body)
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF transport
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct EspHttpTransport;

#[cfg(target_os = "espidf")]
impl HttpTransport for EspHttpTransport {
    fn get(&mut self, url: &str, timeout_secs: u32) -> Result<(u16, Vec<u8>), ChannelError> {
        use core::time::Duration;
        use embedded_svc::http::Status;
        use embedded_svc::http::client::Client as HttpClient;
        use embedded_svc::io::Read;
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

        let conf = Configuration {
            timeout: Some(Duration::from_secs(u64::from(timeout_secs))),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        };
        let connection = EspHttpConnection::new(&conf).map_err(|e| {
            warn!("HTTP: connection setup failed: {}", e);
            ChannelError::Transport
        })?;
        let mut client = HttpClient::wrap(connection);
        let request = client.get(url).map_err(|_| ChannelError::Transport)?;
        let mut response = request.submit().map_err(|_| ChannelError::Transport)?;
        let status = response.status();

        let mut body = Vec::new();
        let mut chunk = [0u8; 512];
        loop {
            let n = response.read(&mut chunk).map_err(|_| ChannelError::Transport)?;
            if n == 0 {
                break;
            }
            if body.len() + n > MAX_BODY_LEN {
                return Err(ChannelError::TooLarge);
            }
            body.extend_from_slice(&chunk[..n]);
        }
        Ok((status, body))
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation transport
// ───────────────────────────────────────────────────────────────

/// Scripted transport.  Replays queued responses in order; once the queue
/// is empty every request gets an empty successful `getUpdates` answer.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct SimHttpTransport {
    responses: std::collections::VecDeque<Result<(u16, Vec<u8>), ChannelError>>,
    requests: Vec<String>,
}

#[cfg(not(target_os = "espidf"))]
impl SimHttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&mut self, status: u16, body: &str) {
        self.responses.push_back(Ok((status, body.as_bytes().to_vec())));
    }

    pub fn push_failure(&mut self, error: ChannelError) {
        self.responses.push_back(Err(error));
    }

    /// Every URL requested so far.
    pub fn requests(&self) -> &[String] {
        &self.requests
    }
}

#[cfg(not(target_os = "espidf"))]
impl HttpTransport for SimHttpTransport {
    fn get(&mut self, url: &str, _timeout_secs: u32) -> Result<(u16, Vec<u8>), ChannelError> {
        self.requests.push(url.into());
        let (status, body) = self
            .responses
            .pop_front()
            .unwrap_or_else(|| Ok((200, br#"{"ok":true,"result":[]}"#.to_vec())))?;
        if body.len() > MAX_BODY_LEN {
            return Err(ChannelError::TooLarge);
        }
        Ok((status, body))
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
