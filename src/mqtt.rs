//! Broker publishing behind a small capability trait.
//!
//! The monitor loop only needs connect/close/publish, so any concrete
//! pub/sub client fits behind [`Publisher`]. The shipped implementation uses
//! `rumqttc`'s blocking client with a background thread driving the protocol
//! event loop.

use crate::config::Config;
use log::{debug, warn};
use rumqttc::{Client, ConnectionError, MqttOptions, QoS};
use std::thread;
use std::time::Duration;

const DEFAULT_MQTT_PORT: u16 = 1883;

pub trait Publisher {
    fn connect(&mut self) -> Result<(), String>;
    fn close(&mut self);
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), String>;
}

pub struct MqttPublisher {
    options: MqttOptions,
    qos: QoS,
    retain: bool,
    client: Option<Client>,
}

impl MqttPublisher {
    pub fn new(cfg: &Config) -> Result<Self, String> {
        let (host, port) = parse_broker_addr(&cfg.mqtt_broker)?;
        let mut options = MqttOptions::new(cfg.mqtt_client_id.clone(), host, port);
        options.set_keep_alive(Duration::from_secs(30));
        if let Some(username) = &cfg.mqtt_username {
            options.set_credentials(username.clone(), cfg.mqtt_password.clone().unwrap_or_default());
        }

        Ok(MqttPublisher {
            options,
            qos: qos_from_level(cfg.mqtt_qos)?,
            retain: cfg.mqtt_retain,
            client: None,
        })
    }
}

impl Publisher for MqttPublisher {
    fn connect(&mut self) -> Result<(), String> {
        if self.client.is_some() {
            return Ok(());
        }
        let (client, mut connection) = Client::new(self.options.clone(), 32);

        // rumqttc reconnects on its own; the iterator only ends once the
        // client is dropped or disconnected.
        thread::spawn(move || {
            for event in connection.iter() {
                match event {
                    Ok(event) => debug!("mqtt event: {:?}", event),
                    Err(ConnectionError::RequestsDone) => break,
                    Err(e) => {
                        warn!("mqtt connection error: {}", e);
                        thread::sleep(Duration::from_secs(1));
                    }
                }
            }
        });

        self.client = Some(client);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(client) = self.client.take() {
            if let Err(e) = client.disconnect() {
                warn!("mqtt disconnect failed: {}", e);
            }
        }
    }

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), String> {
        let client = self
            .client
            .as_mut()
            .ok_or_else(|| "publisher is not connected".to_string())?;
        client
            .publish(topic, self.qos, self.retain, payload.as_bytes().to_vec())
            .map_err(|e| format!("mqtt publish to {} failed: {}", topic, e))
    }
}

/// Parse a `tcp://host:port` broker uri (scheme and port optional).
fn parse_broker_addr(uri: &str) -> Result<(String, u16), String> {
    let trimmed = uri.trim();
    let without_scheme = trimmed
        .strip_prefix("tcp://")
        .or_else(|| trimmed.strip_prefix("mqtt://"))
        .unwrap_or(trimmed);
    if without_scheme.is_empty() {
        return Err(format!("invalid MQTT broker uri: {:?}", uri));
    }
    match without_scheme.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => {
            let port = port
                .parse::<u16>()
                .map_err(|_| format!("invalid MQTT broker port in {:?}", uri))?;
            Ok((host.to_string(), port))
        }
        Some(_) => Err(format!("invalid MQTT broker uri: {:?}", uri)),
        None => Ok((without_scheme.to_string(), DEFAULT_MQTT_PORT)),
    }
}

fn qos_from_level(level: u8) -> Result<QoS, String> {
    match level {
        0 => Ok(QoS::AtMostOnce),
        1 => Ok(QoS::AtLeastOnce),
        2 => Ok(QoS::ExactlyOnce),
        other => Err(format!("unsupported MQTT QoS level {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broker_addr_accepts_tcp_scheme() {
        assert_eq!(
            parse_broker_addr("tcp://127.0.0.1:1883").unwrap(),
            ("127.0.0.1".to_string(), 1883)
        );
        assert_eq!(
            parse_broker_addr("mqtt://broker.local:8883").unwrap(),
            ("broker.local".to_string(), 8883)
        );
    }

    #[test]
    fn broker_addr_defaults_port() {
        assert_eq!(
            parse_broker_addr("broker.local").unwrap(),
            ("broker.local".to_string(), 1883)
        );
    }

    #[test]
    fn broker_addr_rejects_garbage() {
        assert!(parse_broker_addr("tcp://").is_err());
        assert!(parse_broker_addr("tcp://host:not-a-port").is_err());
        assert!(parse_broker_addr(":1883").is_err());
    }

    #[test]
    fn qos_levels_map_to_rumqttc() {
        assert_eq!(qos_from_level(0).unwrap(), QoS::AtMostOnce);
        assert_eq!(qos_from_level(1).unwrap(), QoS::AtLeastOnce);
        assert_eq!(qos_from_level(2).unwrap(), QoS::ExactlyOnce);
        assert!(qos_from_level(3).is_err());
    }
}
