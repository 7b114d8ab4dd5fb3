//! Metrics forwarding for decoded sensor readings.
//!
//! This module provides a trait for submitting batches of named values and an
//! implementation speaking the Zabbix sender protocol. The trait exists so
//! the run loop can be tested with an in-memory sink.

pub mod zabbix;

use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// One named value, addressed to a host's trapper item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sample {
    /// Monitored host the item belongs to
    pub host: String,
    /// Trapper item key, e.g. `temperature[bedroom]`
    pub key: String,
    /// Value, formatted as the server expects it
    pub value: String,
}

impl Sample {
    pub fn new(
        host: impl Into<String>,
        key: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        Self {
            host: host.into(),
            key: key.into(),
            value: value.to_string(),
        }
    }
}

/// Errors returned when a submission cannot be delivered.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("timed out talking to the server")]
    Timeout,
    #[error("could not encode request: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("malformed server response: {0}")]
    MalformedResponse(String),
    #[error("server rejected the submission: {0}")]
    Rejected(String),
}

/// Destination for decoded readings.
///
/// Submissions are fire-and-forget from the caller's point of view: a failed
/// batch is reported through the error and then dropped, never retried.
pub trait MetricsSink: Send + Sync {
    fn submit(
        &self,
        samples: Vec<Sample>,
    ) -> Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + '_>>;
}
