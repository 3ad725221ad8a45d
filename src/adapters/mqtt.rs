//! MQTT adapter over the ESP-IDF client.
//!
//! Implements [`BrokerConnector`] and [`BrokerSession`].  The ESP-IDF client
//! delivers events on its own task through a callback; the callback pushes
//! them into a bounded channel that [`MqttSession::poll`] drains, so the
//! listener sees a plain non-blocking poll.
//!
//! The client's own auto-reconnect is not relied on: a `Disconnected` event
//! surfaces as [`TransportError::SessionClosed`] and the listener builds a
//! new session after its backoff.

use core::time::Duration;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};

use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};
use log::{info, warn};

use crate::app::ports::{BrokerConnector, BrokerSession};
use crate::config::SystemConfig;
use crate::error::TransportError;

/// How long to wait for CONNACK.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Events buffered between the client task and the listener.  Messages
/// arriving while it is full are dropped.
const EVENT_QUEUE_DEPTH: usize = 8;

enum SessionEvent {
    Connected,
    Message(Vec<u8>),
    Disconnected,
    Error,
}

pub struct MqttConnector {
    url: String,
    client_id: &'static str,
}

impl MqttConnector {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            url: config.broker_url(),
            client_id: config.mqtt_client_id,
        }
    }
}

impl BrokerConnector for MqttConnector {
    type Session = MqttSession;

    fn connect(&mut self) -> Result<MqttSession, TransportError> {
        info!("MQTT: connecting to {} as '{}'", self.url, self.client_id);
        let conf = MqttClientConfiguration {
            client_id: Some(self.client_id),
            ..Default::default()
        };
        let (tx, rx) = mpsc::sync_channel(EVENT_QUEUE_DEPTH);
        let client = EspMqttClient::new_cb(&self.url, &conf, move |event| {
            let forwarded = match event.payload() {
                EventPayload::Connected(_) => SessionEvent::Connected,
                EventPayload::Received { data, .. } => SessionEvent::Message(data.to_vec()),
                EventPayload::Disconnected => SessionEvent::Disconnected,
                EventPayload::Error(_) => SessionEvent::Error,
                _ => return,
            };
            if tx.try_send(forwarded).is_err() {
                warn!("MQTT: event queue full, event dropped");
            }
        })
        .map_err(|e| {
            warn!("MQTT: client init failed: {}", e);
            TransportError::ConnectFailed
        })?;

        loop {
            match rx.recv_timeout(CONNECT_TIMEOUT) {
                Ok(SessionEvent::Connected) => break,
                // Nothing is subscribed yet, so nothing can be lost here.
                Ok(SessionEvent::Message(_)) => {}
                Ok(SessionEvent::Disconnected | SessionEvent::Error)
                | Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                    return Err(TransportError::ConnectFailed);
                }
            }
        }
        info!("MQTT: connected");
        Ok(MqttSession { client, rx })
    }
}

pub struct MqttSession {
    client: EspMqttClient<'static>,
    rx: Receiver<SessionEvent>,
}

impl BrokerSession for MqttSession {
    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        self.client
            .subscribe(topic, QoS::AtMostOnce)
            .map(drop)
            .map_err(|e| {
                warn!("MQTT: subscribe '{}' failed: {}", topic, e);
                TransportError::SubscribeFailed
            })
    }

    fn poll(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        loop {
            match self.rx.try_recv() {
                Ok(SessionEvent::Message(data)) => return Ok(Some(data)),
                // Late CONNACK after a broker-side reconnect.
                Ok(SessionEvent::Connected) => {}
                Ok(SessionEvent::Disconnected) | Err(TryRecvError::Disconnected) => {
                    return Err(TransportError::SessionClosed);
                }
                Ok(SessionEvent::Error) => return Err(TransportError::PollFailed),
                Err(TryRecvError::Empty) => return Ok(None),
            }
        }
    }
}
