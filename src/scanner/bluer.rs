//! BlueZ D-Bus backend for advertisement scanning.
//!
//! This backend uses the `bluer` crate to communicate with the BlueZ daemon
//! via D-Bus. It requires the `bluetoothd` daemon to be running.

use super::{
    ADVERTISEMENT_CHANNEL_BUFFER_SIZE, Advertisement, ENVIRONMENTAL_SENSING_UUID_BYTES,
    SERVICE_DATA_16_TYPE, ScanError,
};
use crate::mac_address::MacAddress;
use bluer::monitor::{Monitor, MonitorEvent, Pattern};
use bluer::{Adapter, Address, Session};
use futures::StreamExt;
use log::debug;
use tokio::sync::mpsc;

impl From<bluer::Error> for ScanError {
    fn from(err: bluer::Error) -> Self {
        ScanError::Bluetooth(err.to_string())
    }
}

/// Start scanning for advertisements using the BlueZ D-Bus backend.
///
/// Registers an advertisement monitor matching Environmental Sensing service
/// data and streams every matching advertisement through the returned
/// channel. Runs indefinitely until interrupted.
pub async fn start_scan() -> Result<mpsc::Receiver<Advertisement>, ScanError> {
    let session = Session::new().await?;
    let adapter = session.default_adapter().await?;
    adapter.set_powered(true).await?;

    let (tx, rx) = mpsc::channel(ADVERTISEMENT_CHANNEL_BUFFER_SIZE);

    // Filter in the controller for Environmental Sensing service data so the
    // host only wakes up for candidate sensors
    let pattern = Pattern {
        data_type: SERVICE_DATA_16_TYPE,
        start_position: 0,
        content: ENVIRONMENTAL_SENSING_UUID_BYTES.to_vec(),
    };

    let monitor_manager = adapter.monitor().await?;
    let mut monitor_handle = monitor_manager
        .register(Monitor {
            patterns: Some(vec![pattern]),
            ..Default::default()
        })
        .await?;

    // Spawn a task that owns all Bluetooth state and runs the event loop
    tokio::spawn(async move {
        // Keep all Bluetooth state alive by moving it into this task
        let _session = session;
        let _monitor_manager = monitor_manager;

        while let Some(event) = monitor_handle.next().await {
            if let MonitorEvent::DeviceFound(device_id) = event
                && let Err(e) = forward_device(&adapter, device_id.device, &tx).await
            {
                debug!("failed to read advertisement properties: {e}");
            }
        }
    });

    Ok(rx)
}

/// Read the advertisement-level properties of a discovered device and send
/// them on as an [`Advertisement`].
async fn forward_device(
    adapter: &Adapter,
    address: Address,
    tx: &mpsc::Sender<Advertisement>,
) -> Result<(), ScanError> {
    let device = adapter.device(address)?;
    let mac: MacAddress = address.into();

    let service_data = match device.service_data().await? {
        Some(data) => data.into_iter().collect(),
        None => return Ok(()), // No service data available
    };

    let advertisement = Advertisement {
        mac,
        name: device.name().await?,
        rssi: device.rssi().await?,
        service_data,
    };

    let _ = tx.send(advertisement).await;
    Ok(())
}
