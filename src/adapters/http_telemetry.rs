//! HTTPS telemetry uplink.
//!
//! Implements [`TelemetryPort`] by POSTing `{"moisture": <percent>}` to the
//! per-device endpoint with the device token in `X-Auth-Token`.  One
//! connection per reading; nothing is buffered when a send fails.
//!
//! The body encoding is target-independent and tested on the host; the
//! transport is ESP-IDF only.

use serde::Serialize;

use crate::error::TransportError;
use crate::sensors::SensorReading;

/// Header carrying the device token.
pub const AUTH_HEADER: &str = "X-Auth-Token";

#[derive(Serialize)]
struct TelemetryBody {
    moisture: f32,
}

/// JSON body for one reading.
pub fn telemetry_body(reading: &SensorReading) -> Result<Vec<u8>, TransportError> {
    serde_json::to_vec(&TelemetryBody { moisture: reading.percent })
        .map_err(|_| TransportError::EncodeFailed)
}

#[cfg(target_os = "espidf")]
pub use uplink::HttpTelemetryUplink;

#[cfg(target_os = "espidf")]
mod uplink {
    use core::time::Duration;

    use embedded_svc::http::client::Client;
    use embedded_svc::io::Write;
    use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
    use log::{debug, warn};

    use super::{AUTH_HEADER, telemetry_body};
    use crate::app::ports::TelemetryPort;
    use crate::config::SystemConfig;
    use crate::error::TransportError;
    use crate::sensors::SensorReading;

    pub struct HttpTelemetryUplink {
        url: &'static str,
        token: &'static str,
        timeout: Duration,
    }

    impl HttpTelemetryUplink {
        pub fn new(config: &SystemConfig) -> Self {
            Self {
                url: config.telemetry_url,
                token: config.telemetry_token,
                timeout: config.telemetry_timeout(),
            }
        }

        fn post(&self, body: &[u8]) -> Result<u16, TransportError> {
            let config = Configuration {
                timeout: Some(self.timeout),
                crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
                ..Default::default()
            };
            let connection = EspHttpConnection::new(&config).map_err(|e| {
                warn!("HTTP: connection setup failed: {}", e);
                TransportError::RequestFailed
            })?;
            let mut client = Client::wrap(connection);

            let content_length = body.len().to_string();
            let headers = [
                (AUTH_HEADER, self.token),
                ("Content-Type", "application/json"),
                ("Content-Length", content_length.as_str()),
            ];

            let mut request = client.post(self.url, &headers).map_err(|e| {
                warn!("HTTP: request open failed: {}", e);
                TransportError::RequestFailed
            })?;
            request.write_all(body).map_err(|e| {
                warn!("HTTP: body write failed: {}", e);
                TransportError::RequestFailed
            })?;
            request.flush().map_err(|_| TransportError::RequestFailed)?;

            let response = request.submit().map_err(|e| {
                warn!("HTTP: no response: {}", e);
                TransportError::RequestFailed
            })?;
            Ok(response.status())
        }
    }

    impl TelemetryPort for HttpTelemetryUplink {
        fn submit(&mut self, reading: &SensorReading) -> Result<u16, TransportError> {
            let body = telemetry_body(reading)?;
            debug!("HTTP: POST {} ({} bytes)", self.url, body.len());
            self.post(&body)
        }
    }
}
