//! Integration tests for the trigger listener state machine.
//!
//! The listener is driven one `step()` at a time against a scripted broker
//! and a manual clock, so reconnection and polling cadence are checked
//! without real time passing.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use stepbridge::app::actuation::ActuationExecutor;
use stepbridge::app::dispatch::ActuationDispatcher;
use stepbridge::app::events::AppEvent;
use stepbridge::app::listener::{ListenerState, ReconnectPolicy, TriggerListener};
use stepbridge::app::trigger::IgnoreReason;
use stepbridge::config::SystemConfig;
use stepbridge::drivers::task_pin::ThreadSpawner;
use stepbridge::error::TransportError;

use crate::mock_hw::{CountingTrigger, ManualClock, MockConnector, MockSession, PhaseRecorder, RecordingSink};

const TOPIC: &str = "sam/esp32/starter";
const BACKOFF: Duration = Duration::from_secs(5);
const POLL: Duration = Duration::from_millis(100);

type Listener<T> = TriggerListener<MockConnector, T, ManualClock, RecordingSink>;

fn listener<T: stepbridge::app::dispatch::ActuationTrigger>(
    connector: MockConnector,
    trigger: T,
) -> (Listener<T>, ManualClock, RecordingSink) {
    let clock = ManualClock::default();
    let sink = RecordingSink::default();
    let policy = ReconnectPolicy::from_config(&SystemConfig::default());
    let l = TriggerListener::new(connector, trigger, clock.clone(), sink.clone(), TOPIC, policy);
    (l, clock, sink)
}

/// Step until the listener is polling, bounded so a regression cannot hang.
fn step_to_polling<T: stepbridge::app::dispatch::ActuationTrigger>(l: &mut Listener<T>) {
    for _ in 0..100 {
        if l.state() == ListenerState::Polling {
            return;
        }
        l.step();
    }
    panic!("listener never reached Polling");
}

#[test]
fn policy_defaults_are_five_second_backoff_and_100ms_poll() {
    let policy = ReconnectPolicy::from_config(&SystemConfig::default());
    assert_eq!(policy.backoff, BACKOFF);
    assert_eq!(policy.poll_interval, POLL);
}

#[test]
fn walks_disconnected_connecting_subscribed_polling() {
    let (mut l, _clock, sink) = listener(MockConnector::new([Ok(MockSession::new())]), CountingTrigger::default());
    assert_eq!(l.state(), ListenerState::Disconnected);
    l.step();
    assert_eq!(l.state(), ListenerState::Connecting);
    l.step();
    assert_eq!(l.state(), ListenerState::Subscribed);
    l.step();
    assert_eq!(l.state(), ListenerState::Polling);

    assert_eq!(
        sink.count(|e| *e == AppEvent::BrokerSubscribed { topic: TOPIC, session: 1 }),
        1
    );
}

#[test]
fn subscribes_to_the_configured_topic() {
    let session = MockSession::new();
    let subs = Arc::clone(&session.subscriptions);
    let (mut l, _, _) = listener(MockConnector::new([Ok(session)]), CountingTrigger::default());
    step_to_polling(&mut l);
    assert_eq!(*subs.lock().unwrap(), vec![TOPIC.to_owned()]);
}

#[test]
fn only_msg_equal_one_fires() {
    let session = MockSession::new()
        .message(br#"{"msg":0}"#)
        .message(br#"{"other":1}"#)
        .message(b"not json at all")
        .message(br#"{"msg":1}"#)
        .message(br#"[1]"#)
        .message(br#"{"msg":"1"}"#);
    let trigger = CountingTrigger::default();
    let fired = Arc::clone(&trigger.fired);
    let (mut l, _, sink) = listener(MockConnector::new([Ok(session)]), trigger);

    step_to_polling(&mut l);
    for _ in 0..6 {
        l.step();
    }

    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::MessageReceived { .. })), 6);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::MessageIgnored(IgnoreReason::Inactive))), 2);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::MessageIgnored(IgnoreReason::MissingField))), 1);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::MessageIgnored(IgnoreReason::Malformed))), 2);
    assert_eq!(l.state(), ListenerState::Polling, "bad payloads are never fatal");
}

#[test]
fn polls_every_100ms_when_idle() {
    let session = MockSession::new().idle().idle();
    let (mut l, clock, _) = listener(MockConnector::new([Ok(session)]), CountingTrigger::default());
    step_to_polling(&mut l);
    l.step();
    l.step();
    assert_eq!(clock.sleeps(), vec![POLL, POLL]);
}

#[test]
fn poll_failure_drops_session_backs_off_and_reconnects() {
    let first = MockSession::new().failure(TransportError::PollFailed);
    let second = MockSession::new().message(br#"{"msg":1}"#);
    let connector = MockConnector::new([Ok(first), Ok(second)]);
    let connects = Arc::clone(&connector.connects);
    let trigger = CountingTrigger::default();
    let fired = Arc::clone(&trigger.fired);
    let (mut l, clock, sink) = listener(connector, trigger);

    step_to_polling(&mut l);
    l.step();
    assert_eq!(l.state(), ListenerState::Disconnected);
    assert_eq!(clock.sleeps(), vec![BACKOFF]);
    assert_eq!(
        sink.count(|e| *e == AppEvent::BrokerLost { error: TransportError::PollFailed, backoff_ms: 5000 }),
        1
    );

    step_to_polling(&mut l);
    l.step();
    assert_eq!(connects.load(Ordering::SeqCst), 2);
    assert_eq!(l.sessions(), 2);
    assert_eq!(fired.load(Ordering::SeqCst), 1, "trigger on the new session still fires");
}

#[test]
fn closed_session_is_treated_like_any_transport_failure() {
    let first = MockSession::new().idle().failure(TransportError::SessionClosed);
    let (mut l, clock, _) = listener(
        MockConnector::new([Ok(first), Ok(MockSession::new())]),
        CountingTrigger::default(),
    );
    step_to_polling(&mut l);
    l.step();
    l.step();
    assert_eq!(l.state(), ListenerState::Disconnected);
    assert_eq!(clock.sleeps(), vec![POLL, BACKOFF]);
    step_to_polling(&mut l);
    assert_eq!(l.sessions(), 2);
}

#[test]
fn connect_failures_retry_forever_with_fixed_backoff() {
    let connector = MockConnector::new([
        Err(TransportError::ConnectFailed),
        Err(TransportError::ConnectFailed),
        Err(TransportError::ConnectFailed),
        Ok(MockSession::new()),
    ]);
    let (mut l, clock, _) = listener(connector, CountingTrigger::default());
    step_to_polling(&mut l);
    assert_eq!(clock.sleeps(), vec![BACKOFF; 3], "no growth between attempts");
    assert_eq!(l.sessions(), 1);
}

#[test]
fn subscribe_failure_backs_off_and_reconnects() {
    let connector = MockConnector::new([Ok(MockSession::refusing_subscribe()), Ok(MockSession::new())]);
    let connects = Arc::clone(&connector.connects);
    let (mut l, clock, sink) = listener(connector, CountingTrigger::default());
    step_to_polling(&mut l);
    assert_eq!(connects.load(Ordering::SeqCst), 2);
    assert_eq!(clock.sleeps(), vec![BACKOFF]);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::BrokerLost { error: TransportError::SubscribeFailed, .. })),
        1
    );
}

#[test]
fn listener_keeps_polling_while_an_actuation_runs() {
    let (rig, release, started) = PhaseRecorder::gated();
    let phases = Arc::clone(&rig.phases);
    let sink = RecordingSink::default();
    let exec = Arc::new(ActuationExecutor::new(rig, sink.clone()));
    let dispatcher = ActuationDispatcher::new(Arc::clone(&exec), ThreadSpawner, sink.clone());

    let session = MockSession::new()
        .message(br#"{"msg":1}"#)
        .message(br#"{"msg":1}"#)
        .message(br#"{"msg":0}"#);
    let clock = ManualClock::default();
    let mut l = TriggerListener::new(
        MockConnector::new([Ok(session)]),
        dispatcher,
        clock,
        sink.clone(),
        TOPIC,
        ReconnectPolicy::from_config(&SystemConfig::default()),
    );

    step_to_polling(&mut l);
    l.step();
    started.recv_timeout(Duration::from_secs(5)).unwrap();

    // The first sequence is parked; the listener must not be.
    l.step();
    l.step();
    assert!(exec.is_running());
    assert!(sink.wait_for(Duration::from_secs(5), |e| *e == AppEvent::ActuationSkipped));
    assert_eq!(sink.count(|e| matches!(e, AppEvent::MessageReceived { .. })), 3);

    release.send(()).unwrap();
    assert!(sink.wait_for(Duration::from_secs(5), |e| matches!(e, AppEvent::ActuationCompleted { .. })));
    assert_eq!(phases.lock().unwrap().len(), 3);
}
