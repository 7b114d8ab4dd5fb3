//! Advertisement filtering and dispatch.
//!
//! The dispatcher bridges raw advertisement events to Zabbix samples: it
//! filters for recognized sensors, selects the wire format, decodes, and
//! builds the per-sensor item values. It owns no decoding logic and no
//! mutable state; every advertisement is handled independently.

use crate::decoder::decode_service_data;
use crate::mac_address::MacPrefix;
use crate::reading::SensorReading;
use crate::scanner::Advertisement;
use crate::sink::Sample;
use log::{debug, info, warn};
use std::fmt::Write;
use uuid::Uuid;

/// MAC prefix of Xiaomi thermometers running ATC firmware.
pub const ATC_MAC_PREFIX: MacPrefix = MacPrefix([0xA4, 0xC1, 0x38]);

/// Number of samples produced per decoded reading.
pub const SAMPLES_PER_READING: usize = 3;

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Turns advertisements from recognized sensors into Zabbix samples.
pub struct Dispatcher {
    prefix: MacPrefix,
    service_uuid: Uuid,
    host: String,
}

impl Dispatcher {
    /// Create a dispatcher filtering on the given vendor prefix and service
    /// UUID, emitting samples for the given Zabbix host.
    pub fn new(prefix: MacPrefix, service_uuid: Uuid, host: impl Into<String>) -> Self {
        Self {
            prefix,
            service_uuid,
            host: host.into(),
        }
    }

    /// Handle one advertisement.
    ///
    /// Returns the samples to forward, or `None` when the advertisement is
    /// not from a recognized sensor or its payload cannot be decoded. All
    /// failure modes here are routine and recoverable; they are logged and
    /// never surfaced to the caller.
    pub fn handle(&self, advertisement: &Advertisement) -> Option<Vec<Sample>> {
        if !self.prefix.matches(advertisement.mac) {
            debug!("ignoring advertisement from {}", advertisement.mac);
            return None;
        }
        let Some(data) = advertisement.service_data.get(&self.service_uuid) else {
            debug!(
                "no environmental service data from {}",
                advertisement.mac
            );
            return None;
        };

        match decode_service_data(data) {
            Ok(reading) => {
                let name = advertisement.display_name();
                let rssi = match advertisement.rssi {
                    Some(rssi) => rssi.to_string(),
                    None => "?".to_string(),
                };
                info!(
                    "{}@{} dBm: {:.2} °C, {:.2}%, {}mV ({}%)",
                    name,
                    rssi,
                    reading.temperature,
                    reading.humidity,
                    reading.battery_mv,
                    reading.battery_pct
                );
                Some(self.samples(&name, &reading))
            }
            Err(err) => {
                warn!(
                    "undecodable service data from {}: {} (raw: {})",
                    advertisement.mac,
                    err,
                    hex(data)
                );
                None
            }
        }
    }

    /// Build the trapper item values for one decoded reading.
    fn samples(&self, name: &str, reading: &SensorReading) -> Vec<Sample> {
        let host = self.host.as_str();
        vec![
            Sample::new(host, format!("temperature[{name}]"), reading.temperature),
            Sample::new(host, format!("humidity[{name}]"), reading.humidity),
            Sample::new(host, format!("battery[{name}]"), reading.battery_pct),
        ]
    }
}
