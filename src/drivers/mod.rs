//! Stepper driver, hardware initialisation, and task helpers.

pub mod hw_init;
pub mod stepper;
pub mod task_pin;
