//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! The stepper rig becomes the [`ActuatorPort`]; the moisture probe becomes
//! the [`SensorPort`].  On non-espidf targets the underlying drivers use
//! cfg-gated simulation stubs.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::app::ports::{ActuatorPort, AxisId, SensorPort};
use crate::drivers::stepper::{Direction, StepperRig};
use crate::error::{ActuationError, SensorError};
use crate::sensors::moisture::MoistureSensor;

// ── ActuatorPort implementation ───────────────────────────────

impl<P: OutputPin, D: DelayNs> ActuatorPort for StepperRig<P, D> {
    fn run_phase(
        &mut self,
        axis: AxisId,
        direction: Direction,
        steps: u32,
    ) -> Result<(), ActuationError> {
        let stepper = match axis {
            AxisId::Axis1 => &mut self.axis1,
            AxisId::Axis2 => &mut self.axis2,
        };
        let result = stepper.run(direction, steps, &mut self.delay);
        if result.is_err() {
            // Leave the pulse line low if the pin still answers.
            stepper.idle();
        }
        result
    }
}

// ── SensorPort implementation ─────────────────────────────────

/// Moisture probe as seen by the telemetry sampler.
pub struct MoistureProbe {
    sensor: MoistureSensor,
}

impl MoistureProbe {
    pub fn new(sensor: MoistureSensor) -> Self {
        Self { sensor }
    }
}

impl SensorPort for MoistureProbe {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        self.sensor.read()
    }
}
