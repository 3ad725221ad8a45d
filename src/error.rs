//! Unified error types for the Stepbridge firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! supervisor's error handling uniform.  All variants are `Copy` so they can
//! be carried inside [`AppEvent`](crate::app::events::AppEvent)s and across
//! task boundaries without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A stepper phase could not be driven.
    Actuation(ActuationError),
    /// The moisture sensor could not be read.
    Sensor(SensorError),
    /// Broker or telemetry transport failed.
    Transport(TransportError),
    /// Network association failed.
    Connectivity(ConnectivityError),
    /// A background task could not be created.
    Spawn(SpawnError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actuation(e) => write!(f, "actuation: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Connectivity(e) => write!(f, "connectivity: {e}"),
            Self::Spawn(e) => write!(f, "spawn: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Actuation errors
// ---------------------------------------------------------------------------

/// Which of the two signal lines of an axis failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinRole {
    Pulse,
    Direction,
}

impl fmt::Display for PinRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pulse => write!(f, "PUL"),
            Self::Direction => write!(f, "DIR"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuationError {
    /// A GPIO write on one of the axis lines failed.
    PinWrite { axis: u8, pin: PinRole },
}

impl fmt::Display for ActuationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PinWrite { axis, pin } => write!(f, "axis {axis} {pin} write failed"),
        }
    }
}

impl From<ActuationError> for Error {
    fn from(e: ActuationError) -> Self {
        Self::Actuation(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC oneshot read returned an error code.
    AdcReadFailed(i32),
    /// ADC unit was never initialised.
    NotInitialised,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed(rc) => write!(f, "ADC read failed (rc={rc})"),
            Self::NotInitialised => write!(f, "ADC not initialised"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Broker connection could not be established.
    ConnectFailed,
    /// Topic subscription was refused or failed.
    SubscribeFailed,
    /// Reading from a live session failed.
    PollFailed,
    /// The broker or the network dropped the session.
    SessionClosed,
    /// Telemetry body could not be encoded.
    EncodeFailed,
    /// HTTP request could not be sent or its response read.
    RequestFailed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "broker connect failed"),
            Self::SubscribeFailed => write!(f, "subscribe failed"),
            Self::PollFailed => write!(f, "poll failed"),
            Self::SessionClosed => write!(f, "session closed"),
            Self::EncodeFailed => write!(f, "payload encode failed"),
            Self::RequestFailed => write!(f, "HTTP request failed"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Connectivity errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    /// The driver refused to start association.
    ConnectionFailed,
    /// Link never came up within the bootstrap attempt budget.
    Timeout { attempts: u32 },
    AlreadyConnected,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::Timeout { attempts } => write!(f, "WiFi link not up after {attempts} attempts"),
            Self::AlreadyConnected => write!(f, "already connected to AP"),
        }
    }
}

impl From<ConnectivityError> for Error {
    fn from(e: ConnectivityError) -> Self {
        Self::Connectivity(e)
    }
}

// ---------------------------------------------------------------------------
// Spawn errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnError {
    /// The platform thread/task could not be created.
    ThreadCreate,
    /// Pthread configuration for core pinning was rejected.
    PthreadConfig(i32),
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ThreadCreate => write!(f, "thread creation failed"),
            Self::PthreadConfig(rc) => write!(f, "esp_pthread_set_cfg failed (rc={rc})"),
        }
    }
}

impl From<SpawnError> for Error {
    fn from(e: SpawnError) -> Self {
        Self::Spawn(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
