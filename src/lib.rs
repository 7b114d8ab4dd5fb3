//! `atc-listener` library.
//!
//! The binary (`src/main.rs`) is responsible for CLI parsing, logger setup
//! and process exit codes. The core "business logic" lives in [`crate::app`]
//! where it can be tested deterministically with an injected scanner and an
//! injected metrics sink.

pub mod app;
pub mod decoder;
pub mod dispatcher;
pub mod mac_address;
#[cfg(feature = "bluer")]
pub mod poll;
pub mod reading;
pub mod scanner;
pub mod sink;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export commonly used types at the crate root
pub use decoder::{DecodeError, WireFormat, decode_atc1441, decode_custom, decode_service_data};
pub use dispatcher::{ATC_MAC_PREFIX, Dispatcher};
pub use mac_address::{MacAddress, MacPrefix};
pub use reading::SensorReading;
pub use scanner::{Advertisement, Backend, ENVIRONMENTAL_SENSING_SERVICE, ScanError};
pub use sink::{MetricsSink, Sample, SinkError, zabbix::ZabbixSender};
