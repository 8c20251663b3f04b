use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One output class of a classifier trained on the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMapping {
    pub index: usize,
    pub label: String,
    /// Code point of the label's first character.
    pub codepoint: u32,
}

pub fn label_mapping(labels: &[String]) -> Vec<LabelMapping> {
    labels
        .iter()
        .enumerate()
        .map(|(index, label)| LabelMapping {
            index,
            label: label.clone(),
            codepoint: label.chars().next().map(u32::from).unwrap_or(0),
        })
        .collect()
}

pub fn write_label_mapping(labels: &[String], path: &Path) -> anyhow::Result<Option<PathBuf>> {
    let mapping = label_mapping(labels);
    kanjiset_format::save_json_with_backup(&mapping, path)
        .with_context(|| format!("write {}", path.display()))
}
