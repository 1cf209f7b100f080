// 📂 Loader - VIP id list + customer record dump
//
// I/O and malformed top-level input are fatal here. Per-record problems are
// left for the transformer to skip.

use crate::coerce::parse_int_str;
use crate::records::CustomerRecord;
use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Read the VIP list: one integer id per line, blank lines ignored
pub fn read_vip_ids<R: Read>(reader: R) -> Result<HashSet<i64>> {
    let mut ids = HashSet::new();

    for (line_num, line) in BufReader::new(reader).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read VIP line {}", line_num + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let id = parse_int_str(trimmed)
            .with_context(|| format!("Invalid VIP id on line {}: {:?}", line_num + 1, trimmed))?;
        ids.insert(id);
    }

    Ok(ids)
}

pub fn load_vip_ids(path: &Path) -> Result<HashSet<i64>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open VIP file: {}", path.display()))?;

    let ids = read_vip_ids(file)
        .with_context(|| format!("Failed to load VIP ids from {}", path.display()))?;

    debug!(count = ids.len(), path = %path.display(), "loaded VIP ids");
    Ok(ids)
}

/// Read customer records from a JSON array
pub fn read_customer_records<R: Read>(reader: R) -> Result<Vec<CustomerRecord>> {
    let json: serde_json::Value =
        serde_json::from_reader(BufReader::new(reader)).context("Failed to parse customer JSON")?;

    let serde_json::Value::Array(entries) = json else {
        return Err(anyhow!("Customer data must be a JSON array of customer objects"));
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| {
            serde_json::from_value(entry)
                .with_context(|| format!("Malformed customer record at index {}", idx))
        })
        .collect()
}

pub fn load_customer_records(path: &Path) -> Result<Vec<CustomerRecord>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open customer file: {}", path.display()))?;

    let records = read_customer_records(file)
        .with_context(|| format!("Failed to load customers from {}", path.display()))?;

    debug!(count = records.len(), path = %path.display(), "loaded customer records");
    Ok(records)
}
