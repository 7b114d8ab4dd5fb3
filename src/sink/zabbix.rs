//! Zabbix sender (trapper) protocol implementation.
//!
//! The sender protocol is a single request/response exchange over TCP. Both
//! directions are framed the same way: the ASCII marker `ZBXD`, a protocol
//! flag byte, a 32-bit little-endian body length, four reserved zero bytes,
//! and a JSON body. The request is a `sender data` object carrying the item
//! values; the response reports `success`/`failed` plus a summary string.

use super::{MetricsSink, Sample, SinkError};
use log::debug;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Frame marker and protocol flag (0x01 = plain, uncompressed).
const PROTOCOL_HEADER: [u8; 5] = *b"ZBXD\x01";

/// Marker + flag + u32 length + 4 reserved bytes.
const FRAME_HEADER_LEN: usize = PROTOCOL_HEADER.len() + 8;

/// Upper bound on response bodies; real ones are well under a kilobyte.
const MAX_RESPONSE_LEN: usize = 16 * 1024;

#[derive(Serialize)]
struct SenderRequest<'a> {
    request: &'static str,
    data: &'a [Sample],
}

#[derive(Deserialize)]
struct SenderResponse {
    response: String,
    #[serde(default)]
    info: Option<String>,
}

/// Frame a batch of samples as a sender-data request.
fn encode_request(samples: &[Sample]) -> Result<Vec<u8>, SinkError> {
    let body = serde_json::to_vec(&SenderRequest {
        request: "sender data",
        data: samples,
    })?;

    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + body.len());
    frame.extend_from_slice(&PROTOCOL_HEADER);
    frame.extend_from_slice(&(body.len() as u32).to_le_bytes());
    frame.extend_from_slice(&[0u8; 4]); // reserved
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Extract the body length from a response frame header.
fn parse_frame_header(header: &[u8; FRAME_HEADER_LEN]) -> Result<usize, SinkError> {
    if header[..PROTOCOL_HEADER.len()] != PROTOCOL_HEADER {
        return Err(SinkError::MalformedResponse(
            "missing ZBXD protocol marker".to_string(),
        ));
    }
    let len = u32::from_le_bytes([header[5], header[6], header[7], header[8]]) as usize;
    if len > MAX_RESPONSE_LEN {
        return Err(SinkError::MalformedResponse(format!(
            "implausible response length {len}"
        )));
    }
    Ok(len)
}

/// Interpret a response body, failing unless the server reported success.
fn parse_response(body: &[u8]) -> Result<String, SinkError> {
    let response: SenderResponse = serde_json::from_slice(body)
        .map_err(|e| SinkError::MalformedResponse(e.to_string()))?;
    let info = response.info.unwrap_or_default();
    if response.response != "success" {
        return Err(SinkError::Rejected(format!(
            "{}: {}",
            response.response, info
        )));
    }
    Ok(info)
}

/// A metrics sink speaking the Zabbix sender protocol.
///
/// Each submission opens a fresh connection, the way the stock
/// `zabbix_sender` tool does; trapper endpoints close the connection after
/// every exchange anyway.
#[derive(Debug, Clone)]
pub struct ZabbixSender {
    server: String,
    port: u16,
    timeout: Duration,
}

impl ZabbixSender {
    pub fn new(server: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            server: server.into(),
            port,
            timeout,
        }
    }

    async fn exchange(&self, samples: &[Sample]) -> Result<String, SinkError> {
        let frame = encode_request(samples)?;

        let mut stream = TcpStream::connect((self.server.as_str(), self.port)).await?;
        stream.write_all(&frame).await?;

        let mut header = [0u8; FRAME_HEADER_LEN];
        stream.read_exact(&mut header).await?;
        let body_len = parse_frame_header(&header)?;

        let mut body = vec![0u8; body_len];
        stream.read_exact(&mut body).await?;

        parse_response(&body)
    }
}

impl MetricsSink for ZabbixSender {
    fn submit(
        &self,
        samples: Vec<Sample>,
    ) -> Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + '_>> {
        Box::pin(async move {
            let info = tokio::time::timeout(self.timeout, self.exchange(&samples))
                .await
                .map_err(|_| SinkError::Timeout)??;
            debug!("server accepted {} samples: {}", samples.len(), info);
            Ok(())
        })
    }
}
