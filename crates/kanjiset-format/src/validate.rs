use kanjiset_core::error::{Error, RangeError, SchemaError};
use kanjiset_core::hash::uniform_hash_format;
use kanjiset_core::types::DatasetMetadata;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub records: usize,
    pub blob_len: u64,
    /// Bytes covered by record ranges.
    pub used_bytes: u64,
    pub hash_format: Option<&'static str>,
    pub warnings: Vec<String>,
}

/// Check `metadata` against a blob of `blob_len` bytes.
///
/// Hard failures: a range that is inverted, past the blob end, or overlaps
/// another record; an `invalid_records` hash with no record; mixed hash
/// formats. Records whose character is not a label only produce warnings.
pub fn validate_container(metadata: &DatasetMetadata, blob_len: u64) -> Result<ValidationReport, Error> {
    let mut used_bytes = 0u64;
    for r in &metadata.records {
        RangeError::check(r.seek_start, r.seek_end, blob_len)?;
        used_bytes += r.byte_len();
    }

    let mut ranges: Vec<(u64, u64)> = metadata
        .records
        .iter()
        .filter(|r| r.byte_len() > 0)
        .map(|r| (r.seek_start, r.seek_end))
        .collect();
    ranges.sort_unstable();
    for pair in ranges.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if b.0 < a.1 {
            return Err(RangeError::Overlap {
                start: b.0,
                end: b.1,
                other_start: a.0,
                other_end: a.1,
            }
            .into());
        }
    }

    for hash in &metadata.invalid_records {
        if metadata.find_record(hash).is_none() {
            return Err(SchemaError::DanglingInvalidRecord { hash: hash.clone() }.into());
        }
    }

    let hash_format = uniform_hash_format(metadata.records.iter().map(|r| r.hash.as_str()))?;

    let mut warnings = Vec::new();
    for (i, r) in metadata.records.iter().enumerate() {
        if metadata.label_index(&r.character).is_none() {
            warnings.push(format!(
                "record {i} ({}) has character {:?} which is not a label",
                r.hash, r.character
            ));
        }
    }
    if used_bytes < blob_len {
        warnings.push(format!(
            "{} blob bytes are not referenced by any record",
            blob_len - used_bytes
        ));
    }
    for w in &warnings {
        tracing::warn!("{w}");
    }

    Ok(ValidationReport {
        records: metadata.records.len(),
        blob_len,
        used_bytes,
        hash_format: hash_format.map(|f| f.name()),
        warnings,
    })
}
