//! Step/direction stepper axis driver.
//!
//! Drives an external step/dir driver board with a fixed-rate square wave:
//! pulse HIGH, hold 500 µs, pulse LOW, hold 500 µs.  One period is one
//! full step, giving 1000 steps/s.  No acceleration ramp.
//!
//! ## Dual-target design
//!
//! The axis is generic over [`embedded_hal::digital::OutputPin`] and the
//! rig over [`embedded_hal::delay::DelayNs`]: on ESP-IDF these are
//! [`EspOutputPin`](crate::drivers::hw_init::EspOutputPin) and the ROM
//! busy-wait delay; host tests plug in recording pins and a no-op delay.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, PinState};

use crate::error::{ActuationError, PinRole};

/// Full steps per mechanical revolution (1.8° motor, no microstepping).
pub const STEPS_PER_REV: u32 = 200;

/// Half of the step period.  Pulse is held HIGH and then LOW for this long.
pub const HALF_PERIOD_US: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Clockwise; DIR line HIGH.
    Forward,
    /// Counter-clockwise; DIR line LOW.
    Reverse,
}

impl Direction {
    pub const fn pin_state(self) -> PinState {
        match self {
            Self::Forward => PinState::High,
            Self::Reverse => PinState::Low,
        }
    }
}

/// Steps needed for `revolutions` full turns.
pub const fn steps_for(revolutions: u32) -> u32 {
    revolutions * STEPS_PER_REV
}

/// One stepper axis: a pulse line and a direction line.
pub struct StepperAxis<P> {
    number: u8,
    pulse: P,
    dir: P,
}

impl<P: OutputPin> StepperAxis<P> {
    pub fn new(number: u8, pulse: P, dir: P) -> Self {
        Self { number, pulse, dir }
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    /// Latch `direction`, then emit `steps` pulses.  Blocks for
    /// `steps` × 1 ms.  Returns on the first failed pin write.
    pub fn run(
        &mut self,
        direction: Direction,
        steps: u32,
        delay: &mut impl DelayNs,
    ) -> Result<(), ActuationError> {
        let axis = self.number;
        self.dir
            .set_state(direction.pin_state())
            .map_err(|_| ActuationError::PinWrite { axis, pin: PinRole::Direction })?;

        for _ in 0..steps {
            self.pulse
                .set_high()
                .map_err(|_| ActuationError::PinWrite { axis, pin: PinRole::Pulse })?;
            delay.delay_us(HALF_PERIOD_US);
            self.pulse
                .set_low()
                .map_err(|_| ActuationError::PinWrite { axis, pin: PinRole::Pulse })?;
            delay.delay_us(HALF_PERIOD_US);
        }
        Ok(())
    }

    /// Force the pulse line LOW.  Used after an aborted phase so the
    /// driver board is never left mid-pulse.
    pub fn idle(&mut self) {
        let _ = self.pulse.set_low();
    }
}

/// Both axes plus the pulse timer.  Owned by the actuation executor.
pub struct StepperRig<P, D> {
    pub axis1: StepperAxis<P>,
    pub axis2: StepperAxis<P>,
    pub delay: D,
}

impl<P: OutputPin, D: DelayNs> StepperRig<P, D> {
    pub fn new(axis1: StepperAxis<P>, axis2: StepperAxis<P>, delay: D) -> Self {
        Self { axis1, axis2, delay }
    }
}
