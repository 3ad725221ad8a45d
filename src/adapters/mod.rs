//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter          | Implements         | Connects to              |
//! |------------------|--------------------|--------------------------|
//! | `hardware`       | ActuatorPort       | Stepper rig (GPIO)       |
//! |                  | SensorPort         | Moisture probe (ADC1)    |
//! | `http_telemetry` | TelemetryPort      | HTTPS endpoint           |
//! | `log_sink`       | EventSink          | Serial log output        |
//! | `mqtt`           | BrokerConnector    | ESP-IDF MQTT client      |
//! | `time`           | ClockPort          | ESP32 system timer       |
//! | `wifi`           | ConnectivityPort   | ESP-IDF WiFi STA         |

pub mod hardware;
pub mod http_telemetry;
pub mod log_sink;
#[cfg(target_os = "espidf")]
pub mod mqtt;
pub mod time;
pub mod wifi;
