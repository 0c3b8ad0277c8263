//! Account address parsing for user-entered input.
//!
//! [`Address`] itself is `alloy_primitives::Address`; it displays in
//! EIP-55 checksummed form.

pub use alloy_primitives::Address;

use crate::errors::{ClientError, Result};

/// Parse `0x` + 40 hex digits (the prefix is optional). Single-case input
/// is taken as is; mixed-case input must carry a valid checksum.
pub fn parse_address(input: &str) -> Result<Address> {
    let invalid = || ClientError::Validation("Invalid account address.".to_string());
    let input = input.trim();
    let digits = input.strip_prefix("0x").unwrap_or(input);
    if digits.len() != 40 {
        return Err(invalid());
    }
    let address: Address = digits.parse().map_err(|_| invalid())?;

    let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        return Address::parse_checksummed(format!("0x{digits}"), None).map_err(|_| invalid());
    }
    Ok(address)
}
