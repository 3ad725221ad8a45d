//! System configuration parameters
//!
//! Every tunable of the controller lives here as a compiled-in constant.
//! There is no persisted configuration: a restart always comes up with
//! [`SystemConfig::default()`].

use core::time::Duration;

use crate::adapters::wifi::{validate_password, validate_ssid};

/// Core system configuration
#[derive(Debug, Clone)]
pub struct SystemConfig {
    // --- Network bootstrap ---
    pub wifi_ssid: &'static str,
    pub wifi_password: &'static str,
    /// Link-state polls before bootstrap is declared failed.
    pub wifi_connect_attempts: u32,
    /// Spacing between link-state polls (milliseconds)
    pub wifi_attempt_interval_ms: u32,

    // --- Trigger channel (MQTT) ---
    pub mqtt_host: &'static str,
    pub mqtt_port: u16,
    pub mqtt_client_id: &'static str,
    pub trigger_topic: &'static str,
    /// Message poll tick (milliseconds)
    pub mqtt_poll_interval_ms: u32,
    /// Fixed wait after any transport failure before reconnecting (milliseconds)
    pub mqtt_reconnect_backoff_ms: u32,

    // --- Telemetry ---
    pub telemetry_url: &'static str,
    pub telemetry_token: &'static str,
    /// Sampling period (milliseconds)
    pub telemetry_interval_ms: u32,
    /// HTTP request timeout (milliseconds)
    pub telemetry_timeout_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Network bootstrap
            wifi_ssid: "stepbridge-ap",
            wifi_password: "change-me-please",
            wifi_connect_attempts: 10,
            wifi_attempt_interval_ms: 1000,

            // Trigger channel
            mqtt_host: "broker.emqx.io",
            mqtt_port: 1883,
            mqtt_client_id: "esp32_controller",
            trigger_topic: "sam/esp32/starter",
            mqtt_poll_interval_ms: 100,
            mqtt_reconnect_backoff_ms: 5000,

            // Telemetry
            telemetry_url: "https://industrial.api.ubidots.com/api/v1.6/devices/esp32-devkit-v1/",
            telemetry_token: "BBUS-REPLACE-WITH-DEVICE-TOKEN",
            telemetry_interval_ms: 5000,
            telemetry_timeout_ms: 10_000,
        }
    }
}

impl SystemConfig {
    /// Reject values no task can run with.  Called once at boot, before
    /// any peripheral or network is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_ssid(self.wifi_ssid).map_err(|_| ConfigError("wifi_ssid"))?;
        validate_password(self.wifi_password).map_err(|_| ConfigError("wifi_password"))?;
        if self.wifi_connect_attempts == 0 {
            return Err(ConfigError("wifi_connect_attempts must be > 0"));
        }
        if self.mqtt_host.is_empty() || self.mqtt_port == 0 {
            return Err(ConfigError("mqtt broker address"));
        }
        if self.mqtt_client_id.is_empty() {
            return Err(ConfigError("mqtt_client_id"));
        }
        if self.trigger_topic.is_empty() || self.trigger_topic.contains(['+', '#']) {
            return Err(ConfigError("trigger_topic must be a concrete topic"));
        }
        if self.wifi_attempt_interval_ms == 0
            || self.mqtt_poll_interval_ms == 0
            || self.mqtt_reconnect_backoff_ms == 0
            || self.telemetry_interval_ms == 0
            || self.telemetry_timeout_ms == 0
        {
            return Err(ConfigError("intervals must be > 0"));
        }
        if !self.telemetry_url.starts_with("https://") {
            return Err(ConfigError("telemetry_url must be HTTPS"));
        }
        if self.telemetry_token.is_empty() {
            return Err(ConfigError("telemetry_token"));
        }
        Ok(())
    }

    /// `mqtt://host:port` as understood by the ESP-IDF MQTT client.
    pub fn broker_url(&self) -> String {
        format!("mqtt://{}:{}", self.mqtt_host, self.mqtt_port)
    }

    pub fn wifi_attempt_interval(&self) -> Duration {
        Duration::from_millis(self.wifi_attempt_interval_ms as u64)
    }

    pub fn mqtt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.mqtt_poll_interval_ms as u64)
    }

    pub fn mqtt_reconnect_backoff(&self) -> Duration {
        Duration::from_millis(self.mqtt_reconnect_backoff_ms as u64)
    }

    pub fn telemetry_interval(&self) -> Duration {
        Duration::from_millis(self.telemetry_interval_ms as u64)
    }

    pub fn telemetry_timeout(&self) -> Duration {
        Duration::from_millis(self.telemetry_timeout_ms as u64)
    }
}

/// A config field failed validation.  Carries the offending field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigError(pub &'static str);

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "invalid config: {}", self.0)
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e.0)
    }
}
