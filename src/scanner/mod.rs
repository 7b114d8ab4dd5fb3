//! BLE advertisement sources for ATC thermometers.
//!
//! This module provides a trait-free abstraction over different Bluetooth
//! scanning backends. Backends deliver raw advertisement events; deciding
//! whether an event comes from a recognized sensor and decoding its payload
//! is the dispatcher's job, one layer up.

#[cfg(feature = "bluer")]
pub mod bluer;

#[cfg(feature = "hci")]
pub mod hci;

use crate::mac_address::MacAddress;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// A single BLE advertisement as delivered by a backend.
///
/// Service data is keyed by the full 128-bit service UUID; 16-bit UUIDs on
/// the air are mapped onto the Bluetooth base UUID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    /// Address of the broadcasting device
    pub mac: MacAddress,
    /// Human-readable device name, when the advertisement carries one
    pub name: Option<String>,
    /// Received signal strength in dBm, when the backend reports it
    pub rssi: Option<i16>,
    /// Raw service-data payloads keyed by service UUID
    pub service_data: HashMap<Uuid, Vec<u8>>,
}

impl Advertisement {
    /// Device name, falling back to the MAC address.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.mac.to_string(),
        }
    }
}

/// Error type for scanner operations.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Bluetooth/adapter related error
    #[error("Bluetooth error: {0}")]
    Bluetooth(String),
    /// Backend not available (not compiled in)
    #[allow(dead_code)]
    #[error("Backend '{0}' not available (not compiled in)")]
    BackendNotAvailable(String),
}

/// The 128-bit Bluetooth base UUID onto which 16-bit UUIDs are mapped.
const BLUETOOTH_BASE_UUID: u128 = 0x00000000_0000_1000_8000_00805f9b34fb;

/// Expand a 16-bit service UUID to its 128-bit form.
pub const fn service_uuid_16(short: u16) -> Uuid {
    Uuid::from_u128(BLUETOOTH_BASE_UUID | ((short as u128) << 96))
}

/// Environmental Sensing service (0x181A), the service ATC firmware
/// broadcasts its readings under.
pub const ENVIRONMENTAL_SENSING_SERVICE: Uuid = service_uuid_16(0x181A);

/// The 16-bit Environmental Sensing UUID as it appears on the air
/// (little-endian), used for advertisement filtering.
#[cfg(any(feature = "bluer", feature = "hci"))]
pub const ENVIRONMENTAL_SENSING_UUID_BYTES: [u8; 2] = [0x1A, 0x18];

/// Bluetooth 16-bit-UUID service data AD type (0x16)
#[cfg(any(feature = "bluer", feature = "hci"))]
pub const SERVICE_DATA_16_TYPE: u8 = 0x16;

/// Channel buffer size for advertisement events.
pub const ADVERTISEMENT_CHANNEL_BUFFER_SIZE: usize = 100;

/// Available scanner backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    /// BlueZ D-Bus backend (requires bluetoothd daemon)
    #[cfg(feature = "bluer")]
    Bluer,
    /// Raw HCI socket backend (direct kernel access, no daemon required)
    #[cfg(feature = "hci")]
    Hci,
}

impl Default for Backend {
    fn default() -> Self {
        #[cfg(feature = "bluer")]
        return Backend::Bluer;
        #[cfg(all(feature = "hci", not(feature = "bluer")))]
        return Backend::Hci;
        #[cfg(not(any(feature = "bluer", feature = "hci")))]
        compile_error!("At least one backend feature must be enabled");
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "bluer")]
            Backend::Bluer => write!(f, "bluer"),
            #[cfg(feature = "hci")]
            Backend::Hci => write!(f, "hci"),
            #[cfg(not(any(feature = "bluer", feature = "hci")))]
            _ => unreachable!("Backend enum has no variants when no backend features are enabled"),
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            #[cfg(feature = "bluer")]
            "bluer" | "bluez" => Ok(Backend::Bluer),
            #[cfg(feature = "hci")]
            "hci" | "raw" => Ok(Backend::Hci),
            _ => Err(format!("Unknown backend: {}", s)),
        }
    }
}

/// Start scanning for BLE advertisements using the specified backend.
///
/// This is the main entry point for creating a scanner. It dispatches to the
/// appropriate backend implementation; the backend owns all Bluetooth state
/// in a spawned task and streams advertisements through the returned channel
/// until interrupted.
pub async fn start_scan(backend: Backend) -> Result<mpsc::Receiver<Advertisement>, ScanError> {
    match backend {
        #[cfg(feature = "bluer")]
        Backend::Bluer => bluer::start_scan().await,
        #[cfg(feature = "hci")]
        Backend::Hci => hci::start_scan().await,
    }
}
