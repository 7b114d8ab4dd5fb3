//! One-shot connected temperature read.
//!
//! ATC thermometers also expose the standard GATT Temperature characteristic
//! (0x2A1F). This module connects to a given sensor, reads it once and
//! disconnects. It exists for spot checks from the command line; the listener
//! itself never connects to anything.

use crate::mac_address::MacAddress;
use crate::scanner::service_uuid_16;
use bluer::Session;
use log::info;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// The standard GATT Temperature characteristic (0x2A1F): signed 16-bit
/// little-endian, 0.1 °C resolution.
pub const TEMPERATURE_CHARACTERISTIC: Uuid = service_uuid_16(0x2A1F);

/// Errors surfaced by the one-shot read. No retry or recovery here; callers
/// get exactly one attempt's outcome.
#[derive(Error, Debug)]
pub enum PollError {
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] bluer::Error),
    #[error("timed out connecting to {0}")]
    ConnectTimeout(MacAddress),
    #[error("device exposes no temperature characteristic")]
    CharacteristicNotFound,
    #[error("temperature characteristic returned {0} bytes, expected 2")]
    MalformedValue(usize),
}

/// Decode a Temperature characteristic value as degrees Celsius.
pub fn decode_temperature(value: &[u8]) -> Result<f64, PollError> {
    let value: &[u8; 2] = value
        .try_into()
        .map_err(|_| PollError::MalformedValue(value.len()))?;
    Ok(f64::from(i16::from_le_bytes(*value)) / 10.0)
}

/// Connect to a sensor, read its temperature once and disconnect.
pub async fn read_temperature(
    address: MacAddress,
    connect_timeout: Duration,
) -> Result<f64, PollError> {
    let session = Session::new().await?;
    let adapter = session.default_adapter().await?;
    adapter.set_powered(true).await?;

    let device = adapter.device(address.into())?;
    tokio::time::timeout(connect_timeout, device.connect())
        .await
        .map_err(|_| PollError::ConnectTimeout(address))??;
    info!("connected to {}", address);

    let result = read_characteristic(&device).await;

    // Disconnect failures don't matter once we have (or failed to get) the value
    let _ = device.disconnect().await;
    result
}

async fn read_characteristic(device: &bluer::Device) -> Result<f64, PollError> {
    for service in device.services().await? {
        for characteristic in service.characteristics().await? {
            if characteristic.uuid().await? == TEMPERATURE_CHARACTERISTIC {
                let value = characteristic.read().await?;
                return decode_temperature(&value);
            }
        }
    }
    Err(PollError::CharacteristicNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_characteristic_uuid() {
        assert_eq!(
            TEMPERATURE_CHARACTERISTIC,
            Uuid::parse_str("00002a1f-0000-1000-8000-00805f9b34fb").unwrap()
        );
    }

    #[test]
    fn test_decode_temperature() {
        assert_eq!(decode_temperature(&215i16.to_le_bytes()).unwrap(), 21.5);
        assert_eq!(decode_temperature(&0i16.to_le_bytes()).unwrap(), 0.0);
        assert_eq!(decode_temperature(&(-83i16).to_le_bytes()).unwrap(), -8.3);
    }

    #[test]
    fn test_decode_temperature_wrong_length() {
        assert!(matches!(
            decode_temperature(&[0x01]),
            Err(PollError::MalformedValue(1))
        ));
        assert!(matches!(
            decode_temperature(&[0x01, 0x02, 0x03]),
            Err(PollError::MalformedValue(3))
        ));
    }
}
