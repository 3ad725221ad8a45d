//! Outbound application events.
//!
//! The executor, listener, sampler and supervisor emit these through the
//! [`EventSink`](super::ports::EventSink) port.  This is the only way
//! internal failures become visible: nothing is reported back to the
//! broker or the telemetry endpoint.

use crate::error::{ActuationError, ConnectivityError, SensorError, SpawnError, TransportError};
use crate::sensors::SensorReading;

use super::listener::ListenerState;
use super::ports::AxisId;
use super::trigger::IgnoreReason;
use crate::drivers::stepper::Direction;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    // ── Actuation ─────────────────────────────────────────────
    /// Busy flag acquired; the sequence is starting.
    ActuationStarted,
    /// A phase is about to run.
    PhaseStarted { axis: AxisId, direction: Direction, steps: u32 },
    /// All phases ran to completion.
    ActuationCompleted { elapsed_ms: u64 },
    /// A phase failed; remaining phases were skipped.
    ActuationAborted(ActuationError),
    /// Another sequence held the busy flag; nothing was driven.
    ActuationSkipped,

    // ── Trigger path ──────────────────────────────────────────
    /// Raw message arrived on the trigger topic.
    MessageReceived { len: usize },
    /// A message did not qualify as a trigger.
    MessageIgnored(IgnoreReason),
    /// Trigger accepted and an actuation task was spawned.
    TriggerDispatched,
    /// Trigger accepted but the in-flight cap was reached.
    TriggerDropped { in_flight: usize },
    /// Trigger accepted but no task could be created.
    DispatchFailed(SpawnError),
    /// The listener state machine moved.
    ListenerState(ListenerState),
    /// Subscription is live.
    BrokerSubscribed { topic: &'static str, session: u32 },
    /// A transport failure ended the session; reconnecting after `backoff_ms`.
    BrokerLost { error: TransportError, backoff_ms: u64 },

    // ── Telemetry ─────────────────────────────────────────────
    /// Endpoint answered 2xx.
    TelemetrySent { reading: SensorReading, status: u16 },
    /// Endpoint answered with a non-2xx status.
    TelemetryRejected { reading: SensorReading, status: u16 },
    /// Sensor read failed; cycle skipped.
    SensorFailed(SensorError),
    /// Request could not be delivered; cycle skipped.
    TelemetryFailed(TransportError),

    // ── Supervisor ────────────────────────────────────────────
    /// Waiting for the WiFi link.
    NetworkWaiting { attempt: u32, max: u32 },
    /// Link and IP layer are up, `elapsed_ms` after association started.
    NetworkUp { elapsed_ms: u64 },
    BootstrapFailed(ConnectivityError),
    TaskLaunched { name: &'static str },
    TaskLaunchFailed { name: &'static str, error: SpawnError },
    /// Both long-running tasks are up.
    SystemReady,
}
