//! Lenient field extraction from hypervisor records.
//!
//! Every function here returns `None` for missing or malformed input; a bad
//! field on one VM never becomes an error.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

const BYTES_PER_MB: u64 = 1024 * 1024;

const DISK_BUS_PREFIXES: &[&str] = &["scsi", "sata", "virtio", "ide"];

static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d+(?:\.\d+)?)\s*([KMGTP])\s*$").expect("size regex is valid")
});

/// Raw byte count to whole megabytes, truncating.
pub fn memory_mb(raw: Option<&Value>) -> Option<u64> {
    let Value::Number(n) = raw? else {
        return None;
    };
    match n.as_u64() {
        Some(bytes) => Some(bytes / BYTES_PER_MB),
        None => n
            .as_f64()
            .filter(|bytes| *bytes >= 0.0)
            .map(|bytes| (bytes / BYTES_PER_MB as f64) as u64),
    }
}

/// A positive count given either as a JSON integer or an integer string.
pub fn count(raw: Option<&Value>) -> Option<u64> {
    let value = match raw? {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    (value > 0).then_some(value)
}

pub fn vcpu_count(cores: Option<u64>, sockets: Option<u64>) -> Option<u64> {
    match (cores, sockets) {
        (Some(cores), Some(sockets)) => cores.checked_mul(sockets),
        (Some(n), None) | (None, Some(n)) => Some(n),
        (None, None) => None,
    }
}

/// Parse a `<number><K|M|G|T|P>` size into whole gigabytes, rounding up.
pub fn size_gb(raw: &str) -> Option<u64> {
    let caps = SIZE_RE.captures(raw)?;
    let number: f64 = caps[1].parse().ok()?;
    let scale = match caps[2].to_ascii_uppercase().as_str() {
        "K" => 1.0 / (1024.0 * 1024.0),
        "M" => 1.0 / 1024.0,
        "G" => 1.0,
        "T" => 1024.0,
        "P" => 1024.0 * 1024.0,
        _ => return None,
    };
    let gb = (number * scale).ceil() as u64;
    if gb == 0 && number > 0.0 {
        Some(1)
    } else {
        Some(gb)
    }
}

fn is_disk_key(key: &str) -> bool {
    DISK_BUS_PREFIXES.iter().any(|prefix| {
        key.strip_prefix(prefix)
            .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
    })
}

fn disk_attribute_size(attributes: &str) -> Option<u64> {
    attributes
        .split(',')
        .find_map(|attribute| attribute.trim().strip_prefix("size="))
        .and_then(size_gb)
}

/// Largest attached disk, in gigabytes.
pub fn disk_gb(config: &Map<String, Value>) -> Option<u64> {
    config
        .iter()
        .filter(|(key, _)| is_disk_key(key))
        .filter_map(|(_, value)| value.as_str())
        .filter_map(disk_attribute_size)
        .max()
        .filter(|gb| *gb > 0)
}

pub fn tags(raw: Option<&Value>) -> Option<Vec<String>> {
    let tags: Vec<String> = raw?
        .as_str()?
        .split(';')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(ToOwned::to_owned)
        .collect();
    (!tags.is_empty()).then_some(tags)
}

pub fn string(raw: Option<&Value>) -> Option<String> {
    raw?.as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}
