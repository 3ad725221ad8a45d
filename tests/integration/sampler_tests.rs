//! Integration tests for the telemetry sampler.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use stepbridge::adapters::hardware::MoistureProbe;
use stepbridge::app::actuation::{ActuationExecutor, RunOutcome};
use stepbridge::app::events::AppEvent;
use stepbridge::app::sampler::{CycleOutcome, TelemetrySampler};
use stepbridge::error::{SensorError, TransportError};
use stepbridge::pins;
use stepbridge::sensors::moisture::{MoistureSensor, sim_set_moisture_adc, sim_set_moisture_fault};

use crate::mock_hw::{ManualClock, MockSensor, MockUplink, PhaseRecorder, RecordingSink};

const PERIOD: Duration = Duration::from_secs(5);

fn sampler(
    sensor: MockSensor,
    uplink: MockUplink,
) -> (TelemetrySampler<MockSensor, MockUplink, ManualClock, RecordingSink>, RecordingSink) {
    let sink = RecordingSink::default();
    let s = TelemetrySampler::new(sensor, uplink, ManualClock::default(), sink.clone(), PERIOD);
    (s, sink)
}

#[test]
fn readings_are_scaled_to_percent_before_sending() {
    let uplink = MockUplink::new([]);
    let sent = Arc::clone(&uplink.sent);
    let (mut s, _) = sampler(MockSensor::new([Ok(4095), Ok(0), Ok(2048)]), uplink);

    for _ in 0..3 {
        assert!(matches!(s.run_cycle(), CycleOutcome::Sent { status: 200, .. }));
    }

    let sent = sent.lock().unwrap();
    assert!((sent[0].percent - 100.0).abs() < 1e-4);
    assert_eq!(sent[1].percent, 0.0);
    assert!((sent[2].percent - 50.01).abs() < 0.01);
    assert_eq!(sent[2].raw, 2048);
}

#[test]
fn sensor_failure_skips_the_cycle_without_sending() {
    let uplink = MockUplink::new([]);
    let sent = Arc::clone(&uplink.sent);
    let (mut s, sink) = sampler(MockSensor::new([Err(SensorError::AdcReadFailed(-1)), Ok(1000)]), uplink);

    assert_eq!(s.run_cycle(), CycleOutcome::SensorFailed(SensorError::AdcReadFailed(-1)));
    assert!(sent.lock().unwrap().is_empty());
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SensorFailed(_))), 1);

    // Next cycle is unaffected.
    assert!(matches!(s.run_cycle(), CycleOutcome::Sent { .. }));
    assert_eq!(sent.lock().unwrap().len(), 1);
}

#[test]
fn transport_failure_and_rejection_are_logged_and_not_retried() {
    let uplink = MockUplink::new([Err(TransportError::RequestFailed), Ok(401), Ok(500), Ok(201)]);
    let sent = Arc::clone(&uplink.sent);
    let (mut s, sink) = sampler(MockSensor::new([]), uplink);

    assert_eq!(s.run_cycle(), CycleOutcome::TransportFailed(TransportError::RequestFailed));
    assert!(matches!(s.run_cycle(), CycleOutcome::Rejected { status: 401, .. }));
    assert!(matches!(s.run_cycle(), CycleOutcome::Rejected { status: 500, .. }));
    assert!(matches!(s.run_cycle(), CycleOutcome::Sent { status: 201, .. }));

    // One submission per cycle: nothing was resent.
    assert_eq!(sent.lock().unwrap().len(), 4);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::TelemetryFailed(_))), 1);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::TelemetryRejected { .. })), 2);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::TelemetrySent { .. })), 1);
}

#[test]
fn telemetry_keeps_sampling_while_an_actuation_runs() {
    let (rig, release, started) = PhaseRecorder::gated();
    let exec = Arc::new(ActuationExecutor::new(rig, RecordingSink::default()));
    let runner = {
        let exec = Arc::clone(&exec);
        thread::spawn(move || exec.run_sequence())
    };
    started.recv_timeout(Duration::from_secs(5)).unwrap();

    let sensor = MockSensor::new([]);
    let reads = Arc::clone(&sensor.reads);
    let (mut s, _) = sampler(sensor, MockUplink::new([]));
    for _ in 0..3 {
        assert!(matches!(s.run_cycle(), CycleOutcome::Sent { .. }));
    }
    assert!(exec.is_running(), "sampling must not wait for the sequence");
    assert_eq!(reads.load(Ordering::SeqCst), 3);

    release.send(()).unwrap();
    assert_eq!(runner.join().unwrap(), RunOutcome::Completed);
}

#[test]
fn simulated_probe_feeds_the_sampler() {
    let probe = MoistureProbe::new(MoistureSensor::new(pins::MOISTURE_ADC_GPIO, pins::MOISTURE_ADC1_CHANNEL));
    let uplink = MockUplink::new([]);
    let sent = Arc::clone(&uplink.sent);
    let mut s = TelemetrySampler::new(probe, uplink, ManualClock::default(), RecordingSink::default(), PERIOD);

    sim_set_moisture_adc(4095);
    assert!(matches!(s.run_cycle(), CycleOutcome::Sent { .. }));
    assert!((sent.lock().unwrap()[0].percent - 100.0).abs() < 1e-4);

    sim_set_moisture_fault(true);
    assert!(matches!(s.run_cycle(), CycleOutcome::SensorFailed(_)));
    sim_set_moisture_fault(false);
    sim_set_moisture_adc(2048);
}
