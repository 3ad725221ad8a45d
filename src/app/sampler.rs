//! Periodic telemetry: read the probe, scale, POST, sleep.
//!
//! Independent of actuation.  Nothing here touches the busy flag, so a
//! sample is taken every period whether or not the steppers are moving.
//! A failed cycle is logged and skipped; the next one starts on schedule.

use core::time::Duration;

use log::{info, warn};

use crate::drivers::task_pin::Core;
use crate::error::{SensorError, TransportError};
use crate::sensors::SensorReading;

use super::events::AppEvent;
use super::ports::{ClockPort, EventSink, SensorPort, TaskSpec, TelemetryPort};
use super::supervisor::BackgroundTask;

pub const SAMPLER_TASK: TaskSpec = TaskSpec {
    name: "telemetry",
    core: Core::Pro,
    priority: 4,
    stack_kb: 10,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// Endpoint answered 2xx.
    Sent { reading: SensorReading, status: u16 },
    /// Delivered, but the endpoint answered something else.
    Rejected { reading: SensorReading, status: u16 },
    SensorFailed(SensorError),
    TransportFailed(TransportError),
}

const fn is_success(status: u16) -> bool {
    status >= 200 && status < 300
}

pub struct TelemetrySampler<Se, T, K, S> {
    sensor: Se,
    uplink: T,
    clock: K,
    sink: S,
    period: Duration,
}

impl<Se, T, K, S> TelemetrySampler<Se, T, K, S>
where
    Se: SensorPort,
    T: TelemetryPort,
    K: ClockPort,
    S: EventSink,
{
    pub fn new(sensor: Se, uplink: T, clock: K, sink: S, period: Duration) -> Self {
        Self { sensor, uplink, clock, sink, period }
    }

    /// One sample-and-send.  Never blocks longer than the uplink timeout.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        let raw = match self.sensor.read_raw() {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Telemetry: sensor read failed: {}", e);
                self.sink.emit(&AppEvent::SensorFailed(e));
                return CycleOutcome::SensorFailed(e);
            }
        };
        let reading = SensorReading::from_raw(raw);

        match self.uplink.submit(&reading) {
            Ok(status) if is_success(status) => {
                info!("Telemetry: moisture {:.1}% sent ({})", reading.percent, status);
                self.sink.emit(&AppEvent::TelemetrySent { reading, status });
                CycleOutcome::Sent { reading, status }
            }
            Ok(status) => {
                warn!("Telemetry: endpoint answered {}", status);
                self.sink.emit(&AppEvent::TelemetryRejected { reading, status });
                CycleOutcome::Rejected { reading, status }
            }
            Err(e) => {
                warn!("Telemetry: send failed: {}", e);
                self.sink.emit(&AppEvent::TelemetryFailed(e));
                CycleOutcome::TransportFailed(e)
            }
        }
    }

    pub fn run(mut self) -> ! {
        info!("Telemetry: sampling every {} ms", self.period.as_millis());
        loop {
            self.run_cycle();
            self.clock.sleep(self.period);
        }
    }
}

impl<Se, T, K, S> BackgroundTask for TelemetrySampler<Se, T, K, S>
where
    Se: SensorPort + Send + 'static,
    T: TelemetryPort + Send + 'static,
    K: ClockPort + Send + 'static,
    S: EventSink + Send + 'static,
{
    fn spec(&self) -> TaskSpec {
        SAMPLER_TASK
    }

    fn run(self) {
        TelemetrySampler::run(self)
    }
}
