//! Minimal runtime configuration helpers.
//! Defaults assume a local broker and a 1s poll cadence.

use std::time::Duration;

pub const DEFAULT_MQTT_BROKER: &str = "tcp://127.0.0.1:1883";
pub const DEFAULT_MQTT_CLIENT_ID: &str = "warmup2mqtt";
pub const DEFAULT_TOPIC_BASE: &str = "warmup";
pub const DEFAULT_POLL_SECS: u64 = 1;

#[derive(Debug, Clone)]
pub struct Config {
    /// Warmup account credentials, exchanged once for a bearer token.
    pub warmup_email: String,
    pub warmup_password: String,
    /// Broker uri, `tcp://host:port`.
    pub mqtt_broker: String,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    pub mqtt_client_id: String,
    /// QoS for outgoing messages (0..=2).
    pub mqtt_qos: u8,
    /// Set by the presence of MQTT_RETAIN.
    pub mqtt_retain: bool,
    /// Prefix of every outgoing topic.
    pub topic_base: String,
    /// Polling cadence of the monitor loop.
    pub poll_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let warmup_email = required("WARMUP_EMAIL")?;
        let warmup_password = required("WARMUP_PASSWORD")?;

        let mqtt_broker = optional("MQTT_BROKER").unwrap_or_else(|| DEFAULT_MQTT_BROKER.to_string());
        let mqtt_username = optional("MQTT_USERNAME");
        let mqtt_password = optional("MQTT_PASSWORD");
        let mqtt_client_id =
            optional("MQTT_CLIENT_ID").unwrap_or_else(|| DEFAULT_MQTT_CLIENT_ID.to_string());
        let mqtt_qos = match optional("MQTT_QOS") {
            Some(raw) => parse_qos(&raw)?,
            None => 0,
        };
        let mqtt_retain = std::env::var_os("MQTT_RETAIN").is_some();
        let topic_base = optional("MQTT_TOPIC_BASE").unwrap_or_else(|| DEFAULT_TOPIC_BASE.to_string());

        let poll_secs = optional("POLL_INTERVAL_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_POLL_SECS);

        Ok(Config {
            warmup_email,
            warmup_password,
            mqtt_broker,
            mqtt_username,
            mqtt_password,
            mqtt_client_id,
            mqtt_qos,
            mqtt_retain,
            topic_base,
            poll_interval: Duration::from_secs(poll_secs),
        })
    }
}

fn required(key: &str) -> Result<String, String> {
    optional(key).ok_or_else(|| format!("Missing required environment variable {}", key))
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_qos(raw: &str) -> Result<u8, String> {
    match raw.trim().parse::<u8>() {
        Ok(level @ 0..=2) => Ok(level),
        _ => Err(format!("MQTT_QOS must be 0, 1 or 2 (got {:?})", raw)),
    }
}
