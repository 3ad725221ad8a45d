//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Executor / Listener / Sampler / Supervisor
//! ```
//!
//! Driven adapters (stepper rig, moisture ADC, MQTT, HTTPS, WiFi, clock,
//! event sinks) implement these traits.  The domain tasks consume them via
//! generics, so none of them touches hardware or the network directly.
//!
//! ## Ownership
//!
//! Every port instance is owned by exactly one task.  The only exception is
//! [`EventSink`], which takes `&self` so one sink can be cloned into every
//! spawned actuation task.

use core::time::Duration;

use crate::drivers::stepper::Direction;
use crate::error::{ActuationError, ConnectivityError, SensorError, SpawnError, TransportError};
use crate::sensors::SensorReading;

// ───────────────────────────────────────────────────────────────
// Actuator port (domain → stepper hardware)
// ───────────────────────────────────────────────────────────────

/// Identifies one of the two stepper axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisId {
    Axis1,
    Axis2,
}

impl AxisId {
    pub const fn number(self) -> u8 {
        match self {
            Self::Axis1 => 1,
            Self::Axis2 => 2,
        }
    }
}

/// Write-side port: the executor calls this to drive one phase.
///
/// Implementations latch `direction` once, then emit exactly `steps`
/// pulses with the fixed timing, blocking the calling task.  The first
/// failed pin write aborts the phase.
pub trait ActuatorPort {
    fn run_phase(
        &mut self,
        axis: AxisId,
        direction: Direction,
        steps: u32,
    ) -> Result<(), ActuationError>;
}

// ───────────────────────────────────────────────────────────────
// Sensor port (moisture ADC → domain)
// ───────────────────────────────────────────────────────────────

pub trait SensorPort {
    /// One raw 12-bit ADC conversion.
    fn read_raw(&mut self) -> Result<u16, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Telemetry port (domain → cloud endpoint)
// ───────────────────────────────────────────────────────────────

pub trait TelemetryPort {
    /// Submit one reading.  Returns the HTTP status of whatever response
    /// came back; classifying it (2xx or not) is the caller's job.
    fn submit(&mut self, reading: &SensorReading) -> Result<u16, TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Messaging ports (broker ↔ trigger listener)
// ───────────────────────────────────────────────────────────────

/// One live broker connection.  Dropping it tears the connection down.
pub trait BrokerSession {
    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError>;

    /// Non-blocking: `Ok(None)` when nothing has arrived since the last call.
    fn poll(&mut self) -> Result<Option<Vec<u8>>, TransportError>;
}

/// Factory for [`BrokerSession`]s.  Each call yields a fresh session.
pub trait BrokerConnector {
    type Session: BrokerSession;

    fn connect(&mut self) -> Result<Self::Session, TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Connectivity port (network bootstrap)
// ───────────────────────────────────────────────────────────────

pub trait ConnectivityPort {
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;

    /// Start association with the configured AP.  Does not wait for the link.
    fn connect(&mut self) -> Result<(), ConnectivityError>;

    fn is_connected(&self) -> bool;

    /// Called once the link is up: wait for the IP layer and report it.
    fn on_link_up(&mut self) -> Result<(), ConnectivityError> {
        Ok(())
    }

    fn disconnect(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Blocking sleeps and monotonic time.  Every loop in the domain sleeps
/// through this port so tests can run them without real time passing.
pub trait ClockPort {
    fn sleep(&self, duration: Duration);

    /// Milliseconds since boot (monotonic).
    fn uptime_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Task spawning
// ───────────────────────────────────────────────────────────────

/// Scheduling parameters for one background task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSpec {
    pub name: &'static str,
    pub core: crate::drivers::task_pin::Core,
    pub priority: u8,
    pub stack_kb: usize,
}

/// Spawn-and-detach capability.  The spawned job is never joined.
pub trait TaskSpawner {
    fn spawn(
        &self,
        spec: TaskSpec,
        job: Box<dyn FnOnce() + Send + 'static>,
    ) -> Result<(), SpawnError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&self, event: &super::events::AppEvent);
}
