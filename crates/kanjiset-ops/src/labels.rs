use anyhow::Context;
use std::path::{Path, PathBuf};

use kanjiset_core::types::LabelFile;

/// Build a label list from free text: line breaks are skipped and every
/// other character becomes one label. Repeats keep the first occurrence.
/// `content` keeps the text as read.
pub fn labels_from_text(source: &str, text: &str, sort_by_codepoint: bool) -> LabelFile {
    let mut labels: Vec<String> = Vec::new();
    for c in text.chars().filter(|c| *c != '\n' && *c != '\r') {
        let label = c.to_string();
        if labels.contains(&label) {
            tracing::warn!(label = %label, "duplicate label dropped");
            continue;
        }
        labels.push(label);
    }
    if sort_by_codepoint {
        labels.sort();
    }
    LabelFile {
        source: source.to_string(),
        content: text.to_string(),
        labels,
    }
}

/// Read `infile`, derive its labels and write them to `outfile`.
///
/// An existing `outfile` is backed up first. Returns the label file and the
/// backup path, if any.
pub fn create_label_file(
    infile: &Path,
    outfile: &Path,
    sort_by_codepoint: bool,
) -> anyhow::Result<(LabelFile, Option<PathBuf>)> {
    let text =
        std::fs::read_to_string(infile).with_context(|| format!("read {}", infile.display()))?;
    let source = infile
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let label_file = labels_from_text(source, &text, sort_by_codepoint);
    let backup = kanjiset_format::save_json_with_backup(&label_file, outfile)
        .with_context(|| format!("write {}", outfile.display()))?;
    tracing::info!(
        outfile = %outfile.display(),
        labels = label_file.labels.len(),
        "label file written"
    );
    Ok((label_file, backup))
}

/// Load a label file in either the `{source, content, labels}` form or the
/// legacy bare array of strings.
pub fn load_label_file(path: &Path) -> anyhow::Result<LabelFile> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))?;
    if value.is_array() {
        let labels: Vec<String> = serde_json::from_value(value)
            .with_context(|| format!("{}: expected an array of strings", path.display()))?;
        let source = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        return Ok(LabelFile {
            source,
            content: labels.concat(),
            labels,
        });
    }
    serde_json::from_value(value)
        .with_context(|| format!("{}: expected {{source, content, labels}}", path.display()))
}
