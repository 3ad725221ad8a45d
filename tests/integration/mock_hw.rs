//! Mock adapters for integration tests.
//!
//! Every mock records what the domain did to it behind an `Arc<Mutex<..>>`
//! so a test can keep a handle after moving the mock into an executor,
//! listener or sampler.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};

use stepbridge::app::dispatch::{ActuationTrigger, DispatchOutcome};
use stepbridge::app::events::AppEvent;
use stepbridge::app::ports::{
    ActuatorPort, AxisId, BrokerConnector, BrokerSession, ClockPort, ConnectivityPort, EventSink,
    SensorPort, TaskSpawner, TaskSpec, TelemetryPort,
};
use stepbridge::drivers::stepper::Direction;
use stepbridge::error::{ActuationError, ConnectivityError, SensorError, SpawnError, TransportError};
use stepbridge::sensors::SensorReading;

// ── Pins ──────────────────────────────────────────────────────

/// `(pin label, level)` for every write, across all pins sharing the log.
pub type PinLog = Arc<Mutex<Vec<(&'static str, bool)>>>;

#[derive(Debug)]
pub struct PinFault;

impl embedded_hal::digital::Error for PinFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Output pin that appends each write to a shared log.  Fails every write
/// after `fail_after` successful ones, if set.
pub struct RecordingPin {
    label: &'static str,
    log: PinLog,
    fail_after: Option<usize>,
    writes: usize,
}

impl RecordingPin {
    pub fn new(label: &'static str, log: &PinLog) -> Self {
        Self { label, log: Arc::clone(log), fail_after: None, writes: 0 }
    }

    pub fn failing_after(label: &'static str, log: &PinLog, ok_writes: usize) -> Self {
        Self { fail_after: Some(ok_writes), ..Self::new(label, log) }
    }

    fn write(&mut self, level: bool) -> Result<(), PinFault> {
        if self.fail_after.is_some_and(|n| self.writes >= n) {
            return Err(PinFault);
        }
        self.writes += 1;
        self.log.lock().unwrap().push((self.label, level));
        Ok(())
    }
}

impl ErrorType for RecordingPin {
    type Error = PinFault;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), PinFault> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), PinFault> {
        self.write(true)
    }
}

/// Delay that only adds up what it was asked to wait.
#[derive(Default)]
pub struct TallyDelay {
    pub total_ns: Arc<Mutex<u64>>,
}

impl DelayNs for TallyDelay {
    fn delay_ns(&mut self, ns: u32) {
        *self.total_ns.lock().unwrap() += u64::from(ns);
    }
}

// ── Actuators ─────────────────────────────────────────────────

pub type PhaseLog = Arc<Mutex<Vec<(AxisId, Direction, u32)>>>;

/// Records phases instead of driving pins.  Can fail or panic on a given
/// phase index, and can hold the first phase until released.
pub struct PhaseRecorder {
    pub phases: PhaseLog,
    fail_on: Option<usize>,
    panic_once_on: Option<usize>,
    gate: Option<Receiver<()>>,
    started: Option<Sender<()>>,
    index: usize,
}

impl PhaseRecorder {
    pub fn new() -> Self {
        Self {
            phases: Arc::default(),
            fail_on: None,
            panic_once_on: None,
            gate: None,
            started: None,
            index: 0,
        }
    }

    pub fn failing_on(phase: usize) -> Self {
        Self { fail_on: Some(phase), ..Self::new() }
    }

    pub fn panicking_once_on(phase: usize) -> Self {
        Self { panic_once_on: Some(phase), ..Self::new() }
    }

    /// Blocks the first phase of every run until the returned sender is
    /// signalled.  The returned receiver reports that a run has started.
    pub fn gated() -> (Self, Sender<()>, Receiver<()>) {
        let (release_tx, release_rx) = channel();
        let (started_tx, started_rx) = channel();
        let rig = Self { gate: Some(release_rx), started: Some(started_tx), ..Self::new() };
        (rig, release_tx, started_rx)
    }
}

impl ActuatorPort for PhaseRecorder {
    fn run_phase(
        &mut self,
        axis: AxisId,
        direction: Direction,
        steps: u32,
    ) -> Result<(), ActuationError> {
        let phase = self.index % 3;
        self.index += 1;
        self.phases.lock().unwrap().push((axis, direction, steps));

        if phase == 0 {
            if let Some(started) = &self.started {
                let _ = started.send(());
            }
            if let Some(gate) = &self.gate {
                let _ = gate.recv();
            }
        }
        if self.panic_once_on == Some(phase) {
            self.panic_once_on = None;
            self.index = 0;
            panic!("injected panic in phase {phase}");
        }
        if self.fail_on == Some(phase) {
            // A fresh run starts over at phase 0.
            self.index = 0;
            return Err(ActuationError::PinWrite {
                axis: axis.number(),
                pin: stepbridge::error::PinRole::Pulse,
            });
        }
        Ok(())
    }
}

// ── Sensor & uplink ───────────────────────────────────────────

/// Returns scripted readings, then `fallback` forever.
pub struct MockSensor {
    script: VecDeque<Result<u16, SensorError>>,
    fallback: u16,
    pub reads: Arc<AtomicUsize>,
}

impl MockSensor {
    pub fn new(script: impl IntoIterator<Item = Result<u16, SensorError>>) -> Self {
        Self { script: script.into_iter().collect(), fallback: 2048, reads: Arc::default() }
    }
}

impl SensorPort for MockSensor {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.script.pop_front().unwrap_or(Ok(self.fallback))
    }
}

/// Records every submitted reading and answers with scripted statuses
/// (200 once the script is empty).
pub struct MockUplink {
    script: VecDeque<Result<u16, TransportError>>,
    pub sent: Arc<Mutex<Vec<SensorReading>>>,
}

impl MockUplink {
    pub fn new(script: impl IntoIterator<Item = Result<u16, TransportError>>) -> Self {
        Self { script: script.into_iter().collect(), sent: Arc::default() }
    }
}

impl TelemetryPort for MockUplink {
    fn submit(&mut self, reading: &SensorReading) -> Result<u16, TransportError> {
        self.sent.lock().unwrap().push(*reading);
        self.script.pop_front().unwrap_or(Ok(200))
    }
}

// ── Broker ────────────────────────────────────────────────────

/// One scripted session: a subscribe result and a queue of poll results.
/// Polls past the end of the queue return `Ok(None)`.
pub struct MockSession {
    subscribe: Result<(), TransportError>,
    inbox: VecDeque<Result<Option<Vec<u8>>, TransportError>>,
    pub subscriptions: Arc<Mutex<Vec<String>>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self { subscribe: Ok(()), inbox: VecDeque::new(), subscriptions: Arc::default() }
    }

    pub fn refusing_subscribe() -> Self {
        Self { subscribe: Err(TransportError::SubscribeFailed), ..Self::new() }
    }

    pub fn message(mut self, payload: &[u8]) -> Self {
        self.inbox.push_back(Ok(Some(payload.to_vec())));
        self
    }

    pub fn idle(mut self) -> Self {
        self.inbox.push_back(Ok(None));
        self
    }

    pub fn failure(mut self, error: TransportError) -> Self {
        self.inbox.push_back(Err(error));
        self
    }
}

impl BrokerSession for MockSession {
    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        self.subscriptions.lock().unwrap().push(topic.to_owned());
        self.subscribe
    }

    fn poll(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        self.inbox.pop_front().unwrap_or(Ok(None))
    }
}

/// Hands out scripted connect results in order; refuses once exhausted.
pub struct MockConnector {
    script: VecDeque<Result<MockSession, TransportError>>,
    pub connects: Arc<AtomicU32>,
}

impl MockConnector {
    pub fn new(script: impl IntoIterator<Item = Result<MockSession, TransportError>>) -> Self {
        Self { script: script.into_iter().collect(), connects: Arc::default() }
    }
}

impl BrokerConnector for MockConnector {
    type Session = MockSession;

    fn connect(&mut self) -> Result<MockSession, TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.script.pop_front().unwrap_or(Err(TransportError::ConnectFailed))
    }
}

/// Counts trigger dispatches without spawning anything.
#[derive(Clone, Default)]
pub struct CountingTrigger {
    pub fired: Arc<AtomicUsize>,
}

impl ActuationTrigger for CountingTrigger {
    fn fire(&self) -> DispatchOutcome {
        self.fired.fetch_add(1, Ordering::SeqCst);
        DispatchOutcome::Spawned
    }
}

// ── Network ───────────────────────────────────────────────────

/// Link comes up on the `up_on_poll`-th `is_connected` call (1-based), or
/// never.
pub struct MockNetwork {
    up_on_poll: Option<u32>,
    polls: AtomicU32,
    pub connects: u32,
    pub link_up_calls: u32,
    pub disconnects: u32,
}

impl MockNetwork {
    pub fn up_on_poll(poll: u32) -> Self {
        Self { up_on_poll: Some(poll), polls: AtomicU32::new(0), connects: 0, link_up_calls: 0, disconnects: 0 }
    }

    pub fn never_up() -> Self {
        Self { up_on_poll: None, ..Self::up_on_poll(0) }
    }

    pub fn polls(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }
}

impl ConnectivityPort for MockNetwork {
    fn set_credentials(&mut self, _ssid: &str, _password: &str) -> Result<(), ConnectivityError> {
        Ok(())
    }

    fn connect(&mut self) -> Result<(), ConnectivityError> {
        self.connects += 1;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        let n = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        self.up_on_poll.is_some_and(|up| n >= up)
    }

    fn on_link_up(&mut self) -> Result<(), ConnectivityError> {
        self.link_up_calls += 1;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
    }
}

// ── Clock ─────────────────────────────────────────────────────

/// Sleeps return at once; each requested duration is recorded and added
/// to a virtual uptime.
#[derive(Clone, Default)]
pub struct ManualClock {
    pub sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl ManualClock {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl ClockPort for ManualClock {
    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }

    fn uptime_ms(&self) -> u64 {
        self.sleeps.lock().unwrap().iter().map(|d| d.as_millis() as u64).sum()
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<AppEvent>>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<AppEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }

    /// Poll until `pred` matches some event, for up to `timeout`.
    pub fn wait_for(&self, timeout: Duration, pred: impl Fn(&AppEvent) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.count(&pred) > 0 {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &AppEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ── Spawner ───────────────────────────────────────────────────

/// Records task names and drops the jobs unrun (background task bodies
/// never return).  Refuses everything when `refuse` is set.
#[derive(Default)]
pub struct RecordingSpawner {
    pub launched: Mutex<Vec<&'static str>>,
    pub refuse: bool,
}

impl RecordingSpawner {
    pub fn refusing() -> Self {
        Self { refuse: true, ..Self::default() }
    }

    pub fn launched(&self) -> Vec<&'static str> {
        self.launched.lock().unwrap().clone()
    }
}

impl TaskSpawner for RecordingSpawner {
    fn spawn(
        &self,
        spec: TaskSpec,
        _job: Box<dyn FnOnce() + Send + 'static>,
    ) -> Result<(), SpawnError> {
        if self.refuse {
            return Err(SpawnError::ThreadCreate);
        }
        self.launched.lock().unwrap().push(spec.name);
        Ok(())
    }
}
