//! Application core: pure domain logic, zero I/O.
//!
//! The actuation executor and its dispatcher, the trigger listener, the
//! telemetry sampler and the task supervisor.  All interaction with
//! hardware and the network happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod actuation;
pub mod dispatch;
pub mod events;
pub mod listener;
pub mod ports;
pub mod sampler;
pub mod supervisor;
pub mod trigger;
