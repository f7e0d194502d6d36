//! # Device MAC Addresses
//!
//! Devices are identified by a 48-bit hardware MAC written as exactly
//! 12 hexadecimal digits with no separators. Input is case-insensitive;
//! the stored form is uppercase so `aabbccddeeff` and `AABBCCDDEEFF`
//! address the same device.

use std::fmt;

use serde::Serialize;

use crate::error::ValidationError;

const MAC_HEX_LEN: usize = 12;
const MAC_MASK: u64 = 0xFFFF_FFFF_FFFF;

/// Normalized 12-hex-digit device MAC. Serializes as the uppercase string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DeviceMac(String);

impl DeviceMac {
    /// Validate and normalize a MAC to uppercase.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if !is_valid_mac(raw) {
            return Err(ValidationError::InvalidMac(raw.to_string()));
        }
        Ok(Self(raw.to_ascii_uppercase()))
    }

    /// The normalized uppercase form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The MAC numerically offset by `delta`, wrapping within 48 bits.
    ///
    /// Gateways derive the eSTB MAC as the CM MAC plus two.
    pub fn offset(&self, delta: u64) -> Self {
        // parse() guarantees 12 hex digits, so this cannot fail.
        let value = u64::from_str_radix(&self.0, 16).unwrap_or_default();
        Self(format!("{:012X}", value.wrapping_add(delta) & MAC_MASK))
    }
}

impl fmt::Display for DeviceMac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns `true` when `raw` is exactly 12 hex digits in either case.
pub fn is_valid_mac(raw: &str) -> bool {
    raw.len() == MAC_HEX_LEN && raw.bytes().all(|b| b.is_ascii_hexdigit())
}
