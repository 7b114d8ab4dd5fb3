//! Service-data decoding for ATC thermometer advertisements.
//!
//! ATC firmware broadcasts its readings in the Environmental Sensing service
//! data of each advertisement. Two firmware variants with different binary
//! layouts are in the wild; both start with a 6-byte echo of the sensor's MAC
//! address, and the only reliable way to tell them apart is the total
//! service-data length. Format selection therefore happens once, by length,
//! and the per-format decoders insist on an exact payload size.

use crate::reading::SensorReading;
use thiserror::Error;

/// Leading bytes of the service data that echo the sensor MAC address.
pub const SERVICE_DATA_HEADER_LEN: usize = 6;

/// Total service-data length of the custom ("pvvx") format.
pub const CUSTOM_SERVICE_DATA_LEN: usize = 15;

/// Total service-data length of the atc1441 format.
pub const ATC1441_SERVICE_DATA_LEN: usize = 13;

/// Payload length of the custom format after the MAC header is stripped.
pub const CUSTOM_PAYLOAD_LEN: usize = CUSTOM_SERVICE_DATA_LEN - SERVICE_DATA_HEADER_LEN;

/// Payload length of the atc1441 format after the MAC header is stripped.
pub const ATC1441_PAYLOAD_LEN: usize = ATC1441_SERVICE_DATA_LEN - SERVICE_DATA_HEADER_LEN;

/// Errors produced when service data cannot be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Service data length matches neither known firmware format
    #[error("unrecognized service data length {0}")]
    UnrecognizedLength(usize),
    /// Payload byte count does not match the chosen format
    #[error("malformed payload: expected {expected} bytes, got {actual}")]
    MalformedPayload { expected: usize, actual: usize },
}

/// The wire format of an advertisement's service data.
///
/// Field widths and field order differ between the two formats (battery
/// percent and battery millivolts swap position), so the format is always an
/// explicit choice, never inferred from field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// Custom firmware format: scaled 16-bit temperature and humidity
    Custom,
    /// Original atc1441 firmware format: whole-unit temperature and humidity
    Atc1441,
    /// Neither known format
    Unrecognized,
}

impl WireFormat {
    /// Classify service data by its total length, MAC header included.
    pub fn from_service_data_len(len: usize) -> Self {
        match len {
            CUSTOM_SERVICE_DATA_LEN => WireFormat::Custom,
            ATC1441_SERVICE_DATA_LEN => WireFormat::Atc1441,
            _ => WireFormat::Unrecognized,
        }
    }
}

/// Decode a complete Environmental Sensing service-data buffer.
///
/// Detects the wire format from the buffer length, strips the 6-byte MAC
/// header and hands the payload to the matching field decoder.
pub fn decode_service_data(data: &[u8]) -> Result<SensorReading, DecodeError> {
    match WireFormat::from_service_data_len(data.len()) {
        WireFormat::Custom => decode_custom(&data[SERVICE_DATA_HEADER_LEN..]),
        WireFormat::Atc1441 => decode_atc1441(&data[SERVICE_DATA_HEADER_LEN..]),
        WireFormat::Unrecognized => Err(DecodeError::UnrecognizedLength(data.len())),
    }
}

/// Decode a 9-byte custom-format payload.
///
/// Layout (all multi-byte fields little-endian):
/// - Bytes 0-1: temperature, signed 16-bit, 0.01 °C resolution
/// - Bytes 2-3: humidity, unsigned 16-bit, 0.01 % resolution
/// - Bytes 4-5: battery voltage, unsigned 16-bit, millivolts
/// - Byte 6: battery percent
/// - Byte 7: advertisement counter (ignored)
/// - Byte 8: flags (ignored)
pub fn decode_custom(payload: &[u8]) -> Result<SensorReading, DecodeError> {
    let payload: &[u8; CUSTOM_PAYLOAD_LEN] =
        payload.try_into().map_err(|_| DecodeError::MalformedPayload {
            expected: CUSTOM_PAYLOAD_LEN,
            actual: payload.len(),
        })?;

    let temperature = i16::from_le_bytes([payload[0], payload[1]]);
    let humidity = u16::from_le_bytes([payload[2], payload[3]]);
    let battery_mv = u16::from_le_bytes([payload[4], payload[5]]);
    let battery_pct = payload[6];

    Ok(SensorReading {
        temperature: f64::from(temperature) / 100.0,
        humidity: f64::from(humidity) / 100.0,
        battery_mv,
        battery_pct,
    })
}

/// Decode a 7-byte atc1441-format payload.
///
/// Layout:
/// - Bytes 0-1: temperature, signed 16-bit little-endian, whole °C
/// - Byte 2: humidity, whole percent
/// - Byte 3: battery percent
/// - Bytes 4-5: battery voltage, unsigned 16-bit little-endian, millivolts
/// - Byte 6: advertisement counter (ignored)
///
/// Note the battery fields sit in the opposite order to the custom format,
/// and temperature/humidity are whole units with no scaling division.
pub fn decode_atc1441(payload: &[u8]) -> Result<SensorReading, DecodeError> {
    let payload: &[u8; ATC1441_PAYLOAD_LEN] =
        payload.try_into().map_err(|_| DecodeError::MalformedPayload {
            expected: ATC1441_PAYLOAD_LEN,
            actual: payload.len(),
        })?;

    let temperature = i16::from_le_bytes([payload[0], payload[1]]);
    let humidity = payload[2];
    let battery_pct = payload[3];
    let battery_mv = u16::from_le_bytes([payload[4], payload[5]]);

    Ok(SensorReading {
        temperature: f64::from(temperature),
        humidity: f64::from(humidity),
        battery_mv,
        battery_pct,
    })
}
