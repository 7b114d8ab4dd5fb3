//! Core application runner (business logic) for `atc-listener`.
//!
//! This module is intentionally decoupled from CLI parsing and process exit
//! codes so it can be tested deterministically with an injected scanner and
//! an injected metrics sink.

use crate::dispatcher::Dispatcher;
use crate::mac_address::{MacAddress, MacPrefix};
use crate::scanner::{Advertisement, Backend, ScanError};
use crate::sink::{MetricsSink, Sample};
use clap::Parser;
use log::warn;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Buffer size of the queue between the scan loop and the forwarding worker.
pub const FORWARD_CHANNEL_BUFFER_SIZE: usize = 100;

/// Configuration for the core run loop.
#[derive(Parser, Debug, Clone)]
#[command(author, about, version)]
pub struct Options {
    /// Zabbix server or proxy to send values to.
    #[arg(long, default_value = "127.0.0.1")]
    pub zabbix_server: String,

    /// Zabbix trapper port.
    #[arg(long, default_value_t = 10051)]
    pub zabbix_port: u16,

    /// Name of the Zabbix host the trapper items belong to.
    #[arg(long, default_value = "Environment")]
    pub zabbix_host: String,

    /// MAC address prefix identifying the sensors to listen for.
    #[arg(long, default_value = "A4:C1:38", value_parser = MacPrefix::parse)]
    pub address_prefix: MacPrefix,

    /// Service UUID the sensors broadcast their readings under.
    #[arg(
        long,
        default_value = "0000181a-0000-1000-8000-00805f9b34fb",
        value_parser = Uuid::parse_str
    )]
    pub service_uuid: Uuid,

    /// Bluetooth scanner backend to use
    #[arg(long, default_value_t, value_enum)]
    pub backend: Backend,

    /// Connect to the given sensor, read its temperature once and exit.
    #[arg(long, value_name = "MAC", value_parser = MacAddress::parse)]
    pub poll: Option<MacAddress>,

    /// Verbose output, log every advertisement and filtering decision
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Errors returned by the core run loop.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Scanner abstraction to enable deterministic unit tests without Bluetooth hardware.
pub trait Scanner: Send + Sync {
    fn start_scan(
        &self,
        backend: Backend,
    ) -> Pin<Box<dyn Future<Output = Result<mpsc::Receiver<Advertisement>, ScanError>> + Send + '_>>;
}

/// Real scanner implementation that delegates to the compiled-in backends.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealScanner;

impl Scanner for RealScanner {
    fn start_scan(
        &self,
        backend: Backend,
    ) -> Pin<Box<dyn Future<Output = Result<mpsc::Receiver<Advertisement>, ScanError>> + Send + '_>>
    {
        Box::pin(async move { crate::scanner::start_scan(backend).await })
    }
}

/// Run the core processing loop until the advertisement stream closes.
///
/// Advertisements are filtered and decoded inline; the resulting samples go
/// through a bounded queue to a forwarding worker so that sink latency never
/// blocks advertisement intake. Forwarding failures and queue overflows are
/// logged and dropped; neither stops the loop.
pub async fn run(
    options: Options,
    scanner: &dyn Scanner,
    sink: Arc<dyn MetricsSink>,
) -> Result<(), RunError> {
    let dispatcher = Dispatcher::new(
        options.address_prefix,
        options.service_uuid,
        options.zabbix_host,
    );

    let (tx, mut rx) = mpsc::channel::<Vec<Sample>>(FORWARD_CHANNEL_BUFFER_SIZE);
    let forwarder = tokio::spawn(async move {
        while let Some(samples) = rx.recv().await {
            if let Err(err) = sink.submit(samples).await {
                warn!("failed to forward samples: {err}");
            }
        }
    });

    let mut advertisements = scanner.start_scan(options.backend).await?;

    while let Some(advertisement) = advertisements.recv().await {
        if let Some(samples) = dispatcher.handle(&advertisement)
            && tx.try_send(samples).is_err()
        {
            warn!("forwarding queue full, dropping reading");
        }
    }

    // Stream closed; let the worker drain what is already queued
    drop(tx);
    let _ = forwarder.await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::SAMPLES_PER_READING;
    use crate::sink::SinkError;
    use crate::test_utils::{FOREIGN_MAC, TEST_MAC, advertisement, custom_payload, service_data};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct FakeScanner {
        advertisements: Mutex<Vec<Advertisement>>,
    }

    impl FakeScanner {
        fn new(advertisements: Vec<Advertisement>) -> Self {
            Self {
                advertisements: Mutex::new(advertisements),
            }
        }
    }

    impl Scanner for FakeScanner {
        fn start_scan(
            &self,
            _backend: Backend,
        ) -> Pin<
            Box<
                dyn Future<Output = Result<mpsc::Receiver<Advertisement>, ScanError>> + Send + '_,
            >,
        > {
            let advertisements = self.advertisements.lock().unwrap().clone();
            Box::pin(async move {
                let (tx, rx) = mpsc::channel::<Advertisement>(advertisements.len().max(1));
                tokio::spawn(async move {
                    for advertisement in advertisements {
                        let _ = tx.send(advertisement).await;
                    }
                    // drop tx to close channel
                });
                Ok(rx)
            })
        }
    }

    /// Records submitted batches; fails the first `fail_first` submissions.
    #[derive(Debug, Default)]
    struct RecordingSink {
        batches: Mutex<Vec<Vec<Sample>>>,
        fail_first: AtomicUsize,
    }

    impl MetricsSink for RecordingSink {
        fn submit(
            &self,
            samples: Vec<Sample>,
        ) -> Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + '_>> {
            Box::pin(async move {
                if self
                    .fail_first
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok()
                {
                    return Err(SinkError::Timeout);
                }
                self.batches.lock().unwrap().push(samples);
                Ok(())
            })
        }
    }

    fn options() -> Options {
        Options {
            zabbix_server: "127.0.0.1".to_string(),
            zabbix_port: 10051,
            zabbix_host: "Environment".to_string(),
            address_prefix: MacPrefix([0xA4, 0xC1, 0x38]),
            service_uuid: crate::scanner::ENVIRONMENTAL_SENSING_SERVICE,
            backend: Backend::default(),
            poll: None,
            verbose: false,
        }
    }

    fn sensor_advertisement() -> Advertisement {
        advertisement(
            TEST_MAC,
            service_data(TEST_MAC, &custom_payload(2150, 5530, 2980, 72)),
        )
    }

    #[tokio::test]
    async fn run_forwards_decoded_readings() {
        let scanner = FakeScanner::new(vec![sensor_advertisement()]);
        let sink = Arc::new(RecordingSink::default());

        run(options(), &scanner, sink.clone()).await.unwrap();

        let batches = sink.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), SAMPLES_PER_READING);
        assert_eq!(batches[0][0].key, "temperature[A4:C1:38:29:F2:91]");
        assert_eq!(batches[0][0].value, "21.5");
    }

    #[tokio::test]
    async fn run_ignores_unrecognized_advertisements() {
        let foreign = advertisement(
            FOREIGN_MAC,
            service_data(FOREIGN_MAC, &custom_payload(2150, 5530, 2980, 72)),
        );
        let malformed = advertisement(TEST_MAC, vec![0u8; 10]);

        let scanner = FakeScanner::new(vec![foreign, malformed]);
        let sink = Arc::new(RecordingSink::default());

        run(options(), &scanner, sink.clone()).await.unwrap();

        assert!(sink.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn run_survives_forwarding_failure() {
        // Two independent advertisements; the first submission fails
        let scanner = FakeScanner::new(vec![sensor_advertisement(), sensor_advertisement()]);
        let sink = Arc::new(RecordingSink {
            batches: Mutex::new(Vec::new()),
            fail_first: AtomicUsize::new(1),
        });

        run(options(), &scanner, sink.clone()).await.unwrap();

        // The second reading still went through
        let batches = sink.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0][0].value, "21.5");
    }
}
