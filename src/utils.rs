//! Display formatting for fees, timestamps, and addresses.
//!
//! None of these functions fail: bad input degrades to a placeholder string.

use chrono::{DateTime, Local, TimeZone, Utc};
use ethers::types::{Address, U256};
use anyhow::{anyhow, Result};

/// Tinybars per hbar
pub const TINYBARS_PER_HBAR: u64 = 100_000_000;

/// Placeholder for timestamps that cannot be parsed
pub const INVALID_DATE: &str = "Invalid Date";

pub fn format_ether(wei: U256) -> String {
    ethers::utils::format_units(wei, "ether").unwrap_or_else(|_| "0.0".to_string())
}

/// Format a fee in tinybars: whole hbar amounts as `1.50 ℏ`, smaller ones raw.
pub fn format_tinybars(tinybars: Option<u64>) -> String {
    match tinybars {
        None => "N/A".to_string(),
        Some(t) if t >= TINYBARS_PER_HBAR => {
            format!("{:.2} ℏ", t as f64 / TINYBARS_PER_HBAR as f64)
        }
        Some(t) => format!("{} tinybars", t),
    }
}

/// Format a wei amount as ETH with trailing zeros trimmed
pub fn format_wei(wei: Option<u64>) -> String {
    match wei {
        None => "N/A".to_string(),
        Some(w) => {
            let full = format_ether(U256::from(w));
            let trimmed = full.trim_end_matches('0').trim_end_matches('.');
            format!("{} ETH", if trimmed.is_empty() { "0" } else { trimmed })
        }
    }
}

/// Parse a ledger timestamp.
///
/// Accepts mirror-node `seconds.nanos`, bare unix seconds (EVM block time),
/// and RFC 3339.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Some((secs, frac)) = value.split_once('.') {
        if !secs.is_empty() && secs.bytes().all(|b| b.is_ascii_digit()) && frac.bytes().all(|b| b.is_ascii_digit()) {
            let secs: i64 = secs.parse().ok()?;
            // Right-pad or truncate the fraction to nanoseconds
            let mut digits: String = frac.chars().take(9).collect();
            while digits.len() < 9 {
                digits.push('0');
            }
            let nanos: u32 = digits.parse().ok()?;
            return DateTime::from_timestamp(secs, nanos);
        }
    }

    if value.bytes().all(|b| b.is_ascii_digit()) {
        let secs: i64 = value.parse().ok()?;
        return DateTime::from_timestamp(secs, 0);
    }

    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format a timestamp in the local time zone, or [`INVALID_DATE`].
pub fn format_timestamp(value: Option<&str>) -> String {
    format_timestamp_in(value, &Local)
}

pub fn format_timestamp_in<Tz>(value: Option<&str>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    value
        .and_then(parse_timestamp)
        .map(|dt| dt.with_timezone(tz).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| INVALID_DATE.to_string())
}

/// Shorten an address to `0x123456...abcd`
pub fn short_address(address: &Address) -> String {
    let full = format!("{:?}", address);
    if full.len() == 42 {
        format!("{}...{}", &full[..8], &full[36..])
    } else {
        full
    }
}

/// Parse a string representing ETH to Wei
///
/// Parses decimal strings directly to avoid f64 precision loss.
pub fn parse_eth_str_to_wei(input: &str) -> Result<U256> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("ETH amount cannot be empty"));
    }
    if trimmed.starts_with('-') {
        return Err(anyhow!("ETH amount cannot be negative: {}", trimmed));
    }

    ethers::utils::parse_ether(trimmed)
        .map_err(|e| anyhow!("Invalid ETH amount '{}': {}", trimmed, e))
}
