//! MAC address and vendor-prefix types for Bluetooth devices.
//!
//! ATC thermometers are recognized by the three leading octets of their MAC
//! address, so alongside the full 6-byte address this module provides a
//! 3-byte [`MacPrefix`] with the same parsing rules.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A Bluetooth MAC address stored as a compact 6-byte array.
///
/// Independent of any specific Bluetooth library; the `bluer` backend
/// converts to and from its own address type at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddress(pub [u8; 6]);

/// The three leading octets identifying a device vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacPrefix(pub [u8; 3]);

/// Errors returned when parsing a MAC address or prefix string.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseMacError {
    #[error("expected {expected} colon-separated octets, got {actual}")]
    WrongOctetCount { expected: usize, actual: usize },
    #[error("'{0}' is not a two-digit hex octet")]
    InvalidOctet(String),
}

fn parse_octets(s: &str, out: &mut [u8]) -> Result<(), ParseMacError> {
    let expected = out.len();
    let mut parts = s.split(':');
    for (i, slot) in out.iter_mut().enumerate() {
        let part = parts.next().ok_or(ParseMacError::WrongOctetCount {
            expected,
            actual: i,
        })?;
        if part.len() != 2 {
            return Err(ParseMacError::InvalidOctet(part.to_string()));
        }
        *slot = u8::from_str_radix(part, 16)
            .map_err(|_| ParseMacError::InvalidOctet(part.to_string()))?;
    }
    let rest = parts.count();
    if rest != 0 {
        return Err(ParseMacError::WrongOctetCount {
            expected,
            actual: expected + rest,
        });
    }
    Ok(())
}

impl MacAddress {
    /// Parse a colon-separated address string. Usable as a clap value parser.
    pub fn parse(s: &str) -> Result<Self, ParseMacError> {
        let mut bytes = [0u8; 6];
        parse_octets(s, &mut bytes)?;
        Ok(MacAddress(bytes))
    }
}

impl MacPrefix {
    /// Parse a colon-separated prefix string. Usable as a clap value parser.
    pub fn parse(s: &str) -> Result<Self, ParseMacError> {
        let mut bytes = [0u8; 3];
        parse_octets(s, &mut bytes)?;
        Ok(MacPrefix(bytes))
    }

    /// Whether an address carries this vendor prefix.
    pub fn matches(&self, mac: MacAddress) -> bool {
        mac.0[..3] == self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl fmt::Display for MacPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}:{:02X}:{:02X}", self.0[0], self.0[1], self.0[2])
    }
}

impl FromStr for MacAddress {
    type Err = ParseMacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl FromStr for MacPrefix {
    type Err = ParseMacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }
}

#[cfg(feature = "bluer")]
impl From<bluer::Address> for MacAddress {
    fn from(addr: bluer::Address) -> Self {
        Self(addr.0)
    }
}

#[cfg(feature = "bluer")]
impl From<MacAddress> for bluer::Address {
    fn from(addr: MacAddress) -> Self {
        bluer::Address(addr.0)
    }
}
