//! Trigger listener: the broker session state machine.
//!
//! ```text
//!   Disconnected ──▶ Connecting ──ok──▶ Subscribed ──▶ Polling ─┐
//!        ▲               │                                │     │ message / idle
//!        │             error                            error   └──────┘
//!        │               ▼                                ▼
//!        └──────── sleep(backoff) ◀───────────────────────┘
//! ```
//!
//! Exactly one session is alive at a time.  Any transport error drops it,
//! waits the fixed backoff and starts over; no error leaves the loop.
//! Actuation never runs on this task: an activate message is handed to the
//! [`ActuationTrigger`] and polling resumes immediately.

use core::time::Duration;

use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::drivers::task_pin::Core;
use crate::error::TransportError;

use super::dispatch::ActuationTrigger;
use super::events::AppEvent;
use super::ports::{BrokerConnector, BrokerSession, ClockPort, EventSink, TaskSpec};
use super::supervisor::BackgroundTask;
use super::trigger::{TriggerDecision, decode_trigger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Disconnected,
    Connecting,
    Subscribed,
    Polling,
}

/// Timing of the listener loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Wait after any transport failure.
    pub backoff: Duration,
    /// Wait between polls of a live session.
    pub poll_interval: Duration,
}

impl ReconnectPolicy {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            backoff: config.mqtt_reconnect_backoff(),
            poll_interval: config.mqtt_poll_interval(),
        }
    }
}

pub const LISTENER_TASK: TaskSpec = TaskSpec {
    name: "mqtt-listener",
    core: Core::Pro,
    priority: 5,
    stack_kb: 8,
};

pub struct TriggerListener<C: BrokerConnector, T, K, S> {
    connector: C,
    trigger: T,
    clock: K,
    sink: S,
    topic: &'static str,
    policy: ReconnectPolicy,
    state: ListenerState,
    session: Option<C::Session>,
    /// Sessions established since boot.
    sessions: u32,
}

impl<C, T, K, S> TriggerListener<C, T, K, S>
where
    C: BrokerConnector,
    T: ActuationTrigger,
    K: ClockPort,
    S: EventSink,
{
    pub fn new(
        connector: C,
        trigger: T,
        clock: K,
        sink: S,
        topic: &'static str,
        policy: ReconnectPolicy,
    ) -> Self {
        Self {
            connector,
            trigger,
            clock,
            sink,
            topic,
            policy,
            state: ListenerState::Disconnected,
            session: None,
            sessions: 0,
        }
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    pub fn sessions(&self) -> u32 {
        self.sessions
    }

    fn transition(&mut self, to: ListenerState) {
        if self.state != to {
            debug!("MQTT: {:?} -> {:?}", self.state, to);
            self.state = to;
            self.sink.emit(&AppEvent::ListenerState(to));
        }
    }

    /// Advance the state machine by one transition.  Blocks for at most one
    /// connect attempt plus one sleep.
    pub fn step(&mut self) {
        match self.state {
            ListenerState::Disconnected => self.transition(ListenerState::Connecting),
            ListenerState::Connecting => match self.open_session() {
                Ok(session) => {
                    self.session = Some(session);
                    self.sessions = self.sessions.wrapping_add(1);
                    self.transition(ListenerState::Subscribed);
                }
                Err(e) => self.fail(e),
            },
            ListenerState::Subscribed => {
                info!("MQTT: subscribed to '{}' (session {})", self.topic, self.sessions);
                self.sink.emit(&AppEvent::BrokerSubscribed {
                    topic: self.topic,
                    session: self.sessions,
                });
                self.transition(ListenerState::Polling);
            }
            ListenerState::Polling => {
                let polled = match self.session.as_mut() {
                    Some(session) => session.poll(),
                    None => Err(TransportError::SessionClosed),
                };
                match polled {
                    Ok(Some(payload)) => {
                        self.handle_message(&payload);
                        self.clock.sleep(self.policy.poll_interval);
                    }
                    Ok(None) => self.clock.sleep(self.policy.poll_interval),
                    Err(e) => self.fail(e),
                }
            }
        }
    }

    /// Run forever.  Each iteration is one [`step`](Self::step).
    pub fn run(mut self) -> ! {
        info!("MQTT: listener started for topic '{}'", self.topic);
        loop {
            self.step();
        }
    }

    fn open_session(&mut self) -> Result<C::Session, TransportError> {
        let mut session = self.connector.connect()?;
        session.subscribe(self.topic)?;
        Ok(session)
    }

    fn handle_message(&mut self, payload: &[u8]) {
        info!("MQTT: received '{}'", String::from_utf8_lossy(payload));
        self.sink.emit(&AppEvent::MessageReceived { len: payload.len() });
        match decode_trigger(payload) {
            TriggerDecision::Activate => {
                info!("MQTT: activate trigger received");
                self.trigger.fire();
            }
            TriggerDecision::Ignored(reason) => {
                debug!("MQTT: message ignored ({})", reason);
                self.sink.emit(&AppEvent::MessageIgnored(reason));
            }
        }
    }

    /// Drop the session, report, back off.  The next step reconnects.
    fn fail(&mut self, error: TransportError) {
        self.session = None;
        let backoff_ms = self.policy.backoff.as_millis() as u64;
        warn!("MQTT: {}; reconnecting in {} ms", error, backoff_ms);
        self.sink.emit(&AppEvent::BrokerLost { error, backoff_ms });
        self.transition(ListenerState::Disconnected);
        self.clock.sleep(self.policy.backoff);
    }
}

impl<C, T, K, S> BackgroundTask for TriggerListener<C, T, K, S>
where
    C: BrokerConnector + Send + 'static,
    C::Session: Send + 'static,
    T: ActuationTrigger + Send + 'static,
    K: ClockPort + Send + 'static,
    S: EventSink + Send + 'static,
{
    fn spec(&self) -> TaskSpec {
        LISTENER_TASK
    }

    fn run(self) {
        TriggerListener::run(self)
    }
}
