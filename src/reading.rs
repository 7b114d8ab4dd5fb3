//! Decoded ATC thermometer reading.

/// A single reading broadcast by an ATC thermometer.
///
/// Units:
/// - Temperature in Celsius
/// - Humidity in percent relative humidity (0-100 by sensor convention)
/// - Battery voltage in millivolts
/// - Battery charge in percent
///
/// Both wire formats carry all four quantities, so none of the fields are
/// optional. Values are taken from the radio as-is: the decoder does not
/// clamp humidity or battery percent to their nominal ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    /// Temperature in Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Battery voltage in millivolts
    pub battery_mv: u16,
    /// Battery charge estimate in percent
    pub battery_pct: u8,
}
