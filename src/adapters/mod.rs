//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to                 |
//! |------------|--------------------|-----------------------------|
//! | `hardware` | SensorPort         | DHT22 on GPIO4              |
//! |            | RelayPort          | relay module on GPIO2       |
//! | `log_sink` | EventSink          | Serial log output           |
//! | `nvs`      | ConfigPort         | NVS / in-memory store       |
//! | `telegram` | ChannelPort        | Telegram Bot API over HTTPS |
//! | `time`     | ClockPort          | ESP32 system timer          |
//! | `wifi`     | LinkPort           | ESP-IDF WiFi STA            |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod telegram;
pub mod time;
pub mod utils;
pub mod wifi;
