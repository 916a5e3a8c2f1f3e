//! Parsers for `fsutil usn queryjournal` and `vssadmin list shadowstorage` output.
//!
//! Compiled everywhere so they can be tested off Windows.

use crate::capacity::{JournalCapacity, SnapshotCapacity, StorageLimit, DEFAULT_BYTES_PER_OPERATION};

/// `"1.234 GB"`, `"512 MB"`, `"1,024 bytes"` to bytes.
pub fn parse_size(text: &str) -> Option<u64> {
    let mut parts = text.split_whitespace();
    let value: f64 = parts.next()?.replace(',', "").parse().ok()?;
    let unit = parts.next()?.to_ascii_uppercase();
    let multiplier: u64 = match unit.as_str() {
        "BYTES" | "B" => 1,
        "KB" => 1 << 10,
        "MB" => 1 << 20,
        "GB" => 1 << 30,
        "TB" => 1 << 40,
        "PB" => 1 << 50,
        _ => 1,
    };
    Some((value * multiplier as f64) as u64)
}

fn parse_hex(text: &str) -> Option<u64> {
    let text = text.trim();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u64::from_str_radix(digits, 16).ok()
}

fn value_after_colon(line: &str) -> Option<&str> {
    line.split_once(':').map(|(_, value)| value.trim())
}

/// Journal limits from `fsutil usn queryjournal X:`.
pub fn parse_usn_journal(output: &str) -> JournalCapacity {
    let mut max_size = None;
    for line in output.lines() {
        if line.contains("Maximum Size") || line.contains("Max Size") {
            max_size = value_after_colon(line).and_then(|v| parse_hex(first_token(v)));
        }
    }
    JournalCapacity {
        max_size,
        avg_bytes_per_operation: DEFAULT_BYTES_PER_OPERATION,
    }
}

fn first_token(value: &str) -> &str {
    value.split_whitespace().next().unwrap_or("")
}

/// Storage figures from `vssadmin list shadowstorage /for=X:`.
pub fn parse_shadow_storage(output: &str) -> SnapshotCapacity {
    let mut capacity = SnapshotCapacity::default();
    for line in output.lines().map(str::trim) {
        let Some(value) = value_after_colon(line) else {
            continue;
        };
        if line.starts_with("Used Shadow Copy Storage space") {
            capacity.used = parse_size(value);
        } else if line.starts_with("Allocated Shadow Copy Storage space") {
            capacity.allocated = parse_size(value);
        } else if line.starts_with("Maximum Shadow Copy Storage space") {
            capacity.max = if value.to_ascii_uppercase().starts_with("UNBOUNDED") {
                Some(StorageLimit::Unbounded)
            } else {
                parse_size(value).map(StorageLimit::Bounded)
            };
        }
    }
    capacity
}

/// True when `vssadmin list shadows` output lists at least one copy.
pub fn shadows_listed(output: &str) -> bool {
    output.contains("Shadow Copy Volume:") || output.contains("Contents:")
}
