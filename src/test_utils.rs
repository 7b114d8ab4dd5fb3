use crate::mac_address::MacAddress;
use crate::scanner::{Advertisement, ENVIRONMENTAL_SENSING_SERVICE};
use std::collections::HashMap;

/// A stable in-prefix MAC address for unit tests.
pub const TEST_MAC: MacAddress = MacAddress([0xA4, 0xC1, 0x38, 0x29, 0xF2, 0x91]);

/// A MAC address outside the ATC vendor prefix.
pub const FOREIGN_MAC: MacAddress = MacAddress([0xAA, 0xBB, 0xCC, 0x00, 0x00, 0x00]);

/// Encode a 9-byte custom-format payload from raw field values.
pub fn custom_payload(temp_raw: i16, hum_raw: u16, battery_mv: u16, battery_pct: u8) -> Vec<u8> {
    let mut payload = Vec::with_capacity(9);
    payload.extend_from_slice(&temp_raw.to_le_bytes());
    payload.extend_from_slice(&hum_raw.to_le_bytes());
    payload.extend_from_slice(&battery_mv.to_le_bytes());
    payload.push(battery_pct);
    payload.push(0); // advertisement counter
    payload.push(0); // flags
    payload
}

/// Encode a 7-byte atc1441-format payload from raw field values.
pub fn atc1441_payload(temp: i16, hum: u8, battery_pct: u8, battery_mv: u16) -> Vec<u8> {
    let mut payload = Vec::with_capacity(7);
    payload.extend_from_slice(&temp.to_le_bytes());
    payload.push(hum);
    payload.push(battery_pct);
    payload.extend_from_slice(&battery_mv.to_le_bytes());
    payload.push(0); // advertisement counter
    payload
}

/// Prepend the 6-byte MAC echo header to a payload, as the firmware does.
pub fn service_data(mac: MacAddress, payload: &[u8]) -> Vec<u8> {
    let mut data = mac.0.to_vec();
    data.extend_from_slice(payload);
    data
}

/// Build an advertisement carrying the given Environmental Sensing bytes.
pub fn advertisement(mac: MacAddress, data: Vec<u8>) -> Advertisement {
    let mut service_data = HashMap::new();
    service_data.insert(ENVIRONMENTAL_SENSING_SERVICE, data);
    Advertisement {
        mac,
        name: None,
        rssi: Some(-67),
        service_data,
    }
}
