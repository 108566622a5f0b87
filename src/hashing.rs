//! Table Fingerprints - SHA-256 over Canonical JSON
//!
//! A quote carries the hash of the table that priced it, so any displayed
//! price can be traced back to one exact price list.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::tiers::PricingConfig;

pub fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v = serde_json::to_value(value)?;
    serde_json::to_string(&sort_value(v))
}

fn sort_value(v: Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_value(v))).collect())
        }
        Value::Array(arr) => Value::Array(arr.into_iter().map(sort_value).collect()),
        other => other,
    }
}

pub fn compute_table_hash(config: &PricingConfig) -> Result<String, serde_json::Error> {
    Ok(sha256_hex(canonical_json(config)?.as_bytes()))
}

/// selection_hash = sha256(table_hash:data_amount:perspectives:engine_version)
pub fn compute_selection_hash(
    table_hash: &str,
    data_amount: usize,
    perspectives: usize,
    engine_version: &str,
) -> String {
    let combined = format!("{}:{}:{}:{}", table_hash, data_amount, perspectives, engine_version);
    sha256_hex(combined.as_bytes())
}
