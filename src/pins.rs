//! GPIO / peripheral pin assignments for the controller board (ESP32-DevKit-V1).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Stepper axis 1 (external step/dir driver)
// ---------------------------------------------------------------------------

/// Step pulse output.  One rising edge = one full step.
pub const STEPPER1_PUL_GPIO: i32 = 14;
/// Direction output: HIGH = forward (CW), LOW = reverse (CCW).
pub const STEPPER1_DIR_GPIO: i32 = 27;

// ---------------------------------------------------------------------------
// Stepper axis 2
// ---------------------------------------------------------------------------

pub const STEPPER2_PUL_GPIO: i32 = 26;
pub const STEPPER2_DIR_GPIO: i32 = 25;

// ---------------------------------------------------------------------------
// Sensors: analog (ADC1)
// ---------------------------------------------------------------------------

/// Capacitive soil-moisture probe, analog output.
/// ADC1 channel 6 (GPIO 34 on the classic ESP32, input-only pin).
pub const MOISTURE_ADC_GPIO: i32 = 34;
/// ADC1 channel number for [`MOISTURE_ADC_GPIO`].
pub const MOISTURE_ADC1_CHANNEL: u32 = 6;

/// Every output line driven by the actuation sequence.
pub const STEPPER_OUTPUT_GPIOS: [i32; 4] = [
    STEPPER1_PUL_GPIO,
    STEPPER1_DIR_GPIO,
    STEPPER2_PUL_GPIO,
    STEPPER2_DIR_GPIO,
];
