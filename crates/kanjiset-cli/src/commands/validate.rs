use anyhow::Context;
use std::path::Path;

use kanjiset_ops::Dataset;

use crate::util::{fmt_bytes_human, fmt_u64_commas};

pub(crate) fn cmd_validate(dataset: &str, json: bool) -> anyhow::Result<()> {
    let ds = Dataset::open(Path::new(dataset))?;
    let blob_path = ds.blob_path();
    let blob_len = std::fs::metadata(&blob_path)
        .with_context(|| format!("stat {}", blob_path.display()))?
        .len();
    let report = kanjiset_format::validate_container(&ds.metadata, blob_len)
        .with_context(|| format!("validate {dataset}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!(
        "OK: {} records, {} of {} blob bytes referenced, hashes: {}",
        fmt_u64_commas(report.records as u64),
        fmt_bytes_human(report.used_bytes),
        fmt_bytes_human(report.blob_len),
        report.hash_format.unwrap_or("none"),
    );
    for w in &report.warnings {
        println!("warning: {w}");
    }
    Ok(())
}
