//! Sensor subsystem: the moisture probe driver and the reading value type.

pub mod moisture;

/// Full-scale count of the 12-bit ADC.
pub const ADC_FULL_SCALE: u16 = 4095;

/// One moisture sample.  Produced, transmitted and discarded every cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    /// Raw ADC count (0 to 4095).
    pub raw: u16,
    /// `raw` scaled to 0.0 to 100.0.
    pub percent: f32,
}

impl SensorReading {
    /// Scale a raw count against [`ADC_FULL_SCALE`].  Counts above full
    /// scale are clamped so the percentage never leaves 0 to 100.
    pub fn from_raw(raw: u16) -> Self {
        let raw = raw.min(ADC_FULL_SCALE);
        let percent = f32::from(raw) / f32::from(ADC_FULL_SCALE) * 100.0;
        Self { raw, percent }
    }
}
