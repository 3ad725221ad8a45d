//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! Lines are tagged by subsystem: `ACT`, `MQTT`, `TELEM`, `SYS`.

use log::{debug, error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.  Stateless,
/// so every task gets its own copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&self, event: &AppEvent) {
        match event {
            // ── Actuation ─────────────────────────────────────
            AppEvent::ActuationStarted => info!("ACT   | sequence started"),
            AppEvent::PhaseStarted { axis, direction, steps } => {
                info!("ACT   | axis {} {:?} {} steps", axis.number(), direction, steps);
            }
            AppEvent::ActuationCompleted { elapsed_ms } => {
                info!("ACT   | sequence complete ({} ms)", elapsed_ms);
            }
            AppEvent::ActuationAborted(e) => error!("ACT   | aborted: {}", e),
            AppEvent::ActuationSkipped => info!("ACT   | busy, trigger skipped"),

            // ── Trigger path ──────────────────────────────────
            AppEvent::MessageReceived { len } => debug!("MQTT  | message ({} bytes)", len),
            AppEvent::MessageIgnored(reason) => info!("MQTT  | ignored: {}", reason),
            AppEvent::TriggerDispatched => info!("MQTT  | trigger accepted, actuation dispatched"),
            AppEvent::TriggerDropped { in_flight } => {
                warn!("MQTT  | trigger dropped, {} actuation tasks in flight", in_flight);
            }
            AppEvent::DispatchFailed(e) => error!("MQTT  | dispatch failed: {}", e),
            AppEvent::ListenerState(state) => debug!("MQTT  | state={:?}", state),
            AppEvent::BrokerSubscribed { topic, session } => {
                info!("MQTT  | subscribed '{}' (session {})", topic, session);
            }
            AppEvent::BrokerLost { error, backoff_ms } => {
                warn!("MQTT  | {} | retry in {} ms", error, backoff_ms);
            }

            // ── Telemetry ─────────────────────────────────────
            AppEvent::TelemetrySent { reading, status } => {
                info!("TELEM | moisture={:.1}% raw={} | status={}", reading.percent, reading.raw, status);
            }
            AppEvent::TelemetryRejected { reading, status } => {
                warn!("TELEM | moisture={:.1}% rejected | status={}", reading.percent, status);
            }
            AppEvent::SensorFailed(e) => warn!("TELEM | sensor: {}", e),
            AppEvent::TelemetryFailed(e) => warn!("TELEM | uplink: {}", e),

            // ── Supervisor ────────────────────────────────────
            AppEvent::NetworkWaiting { attempt, max } => {
                info!("SYS   | waiting for WiFi ({}/{})", attempt, max);
            }
            AppEvent::NetworkUp { elapsed_ms } => info!("SYS   | network up ({} ms)", elapsed_ms),
            AppEvent::BootstrapFailed(e) => error!("SYS   | bootstrap failed: {}", e),
            AppEvent::TaskLaunched { name } => info!("SYS   | task '{}' launched", name),
            AppEvent::TaskLaunchFailed { name, error } => {
                error!("SYS   | task '{}' failed to launch: {}", name, error);
            }
            AppEvent::SystemReady => info!("SYS   | ready"),
        }
    }
}
