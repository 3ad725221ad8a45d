//! Capacitive soil-moisture probe on ADC1.
//!
//! The probe outputs an analog voltage read through the oneshot ADC at
//! 12-bit resolution.  Conversion to a percentage happens in
//! [`SensorReading::from_raw`](super::SensorReading::from_raw); this driver
//! only produces raw counts.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1 through the oneshot unit configured by hw_init.
//! On host/test: reads from static atomics for value and fault injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
use crate::error::SensorError;

#[cfg(not(target_os = "espidf"))]
static SIM_MOISTURE_ADC: AtomicU16 = AtomicU16::new(2048);
#[cfg(not(target_os = "espidf"))]
static SIM_MOISTURE_FAULT: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_moisture_adc(raw: u16) {
    SIM_MOISTURE_ADC.store(raw, Ordering::Relaxed);
}

/// Make every subsequent simulated read fail (`true`) or succeed (`false`).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_moisture_fault(fault: bool) {
    SIM_MOISTURE_FAULT.store(fault, Ordering::Relaxed);
}

pub struct MoistureSensor {
    adc_channel: u32,
    _adc_gpio: i32,
}

impl MoistureSensor {
    pub fn new(adc_gpio: i32, adc_channel: u32) -> Self {
        Self {
            adc_channel,
            _adc_gpio: adc_gpio,
        }
    }

    #[cfg(target_os = "espidf")]
    pub fn read(&self) -> Result<u16, SensorError> {
        hw_init::adc1_read(self.adc_channel)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn read(&self) -> Result<u16, SensorError> {
        let _ = self.adc_channel;
        if SIM_MOISTURE_FAULT.load(Ordering::Relaxed) {
            return Err(SensorError::AdcReadFailed(-1));
        }
        Ok(SIM_MOISTURE_ADC.load(Ordering::Relaxed))
    }
}
