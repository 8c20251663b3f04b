use std::collections::BTreeSet;
use std::path::PathBuf;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[cfg(feature = "serde")]
fn default_depth() -> u32 {
    1
}

/// One rendered `(character, font)` instance stored in the blob.
///
/// `seek_start..seek_end` is a half-open byte range into the dataset's blob
/// file. Records are never rewritten in place; a record is excluded by adding
/// its hash to [`DatasetMetadata::invalid_records`] or its font to
/// [`DatasetMetadata::invalid_fonts`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub hash: String,
    #[cfg_attr(feature = "serde", serde(rename = "char", alias = "character"))]
    pub character: String,
    #[cfg_attr(feature = "serde", serde(rename = "font", alias = "font_name"))]
    pub font_name: String,
    pub width: u32,
    pub height: u32,
    #[cfg_attr(feature = "serde", serde(default = "default_depth"))]
    pub depth: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub font_size: u32,
    pub seek_start: u64,
    pub seek_end: u64,
}

impl Record {
    pub fn byte_len(&self) -> u64 {
        self.seek_end.saturating_sub(self.seek_start)
    }
}

/// A `(character, font)` pair that produced no record.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Combination {
    #[cfg_attr(feature = "serde", serde(rename = "char", alias = "character"))]
    pub character: String,
    #[cfg_attr(feature = "serde", serde(rename = "font", alias = "font_name"))]
    pub font_name: String,
}

impl Combination {
    pub fn new(character: impl Into<String>, font_name: impl Into<String>) -> Self {
        Self {
            character: character.into(),
            font_name: font_name.into(),
        }
    }
}

/// Aggregate root persisted as `metadata.json` beside the blob.
///
/// The `invalid_*` and `completed_labels` vectors have set semantics: the
/// mark helpers never insert a value twice and keep insertion order so the
/// file diffs cleanly.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetMetadata {
    pub source: String,
    pub content: String,
    pub labels: Vec<String>,
    pub records: Vec<Record>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub invalid_records: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub invalid_fonts: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub blank_combinations: Vec<Combination>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub unsupported_combinations: Vec<Combination>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub completed_labels: Vec<String>,
}

fn insert_unique(set: &mut Vec<String>, value: &str) -> bool {
    if set.iter().any(|v| v == value) {
        return false;
    }
    set.push(value.to_string());
    true
}

fn remove_value(set: &mut Vec<String>, value: &str) -> bool {
    let before = set.len();
    set.retain(|v| v != value);
    set.len() != before
}

impl DatasetMetadata {
    pub fn new(source: impl Into<String>, content: impl Into<String>, labels: Vec<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
            labels,
            ..Self::default()
        }
    }

    pub fn find_record(&self, hash: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.hash == hash)
    }

    pub fn label_index(&self, character: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == character)
    }

    pub fn fonts(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.font_name.as_str()).collect()
    }

    pub fn records_for_label<'a>(&'a self, character: &'a str) -> impl Iterator<Item = &'a Record> {
        self.records.iter().filter(move |r| r.character == character)
    }

    pub fn is_record_invalid(&self, hash: &str) -> bool {
        self.invalid_records.iter().any(|h| h == hash)
    }

    pub fn is_font_invalid(&self, font_name: &str) -> bool {
        self.invalid_fonts.iter().any(|f| f == font_name)
    }

    pub fn is_label_completed(&self, character: &str) -> bool {
        self.completed_labels.iter().any(|c| c == character)
    }

    /// True when compaction would drop `record`.
    pub fn is_excluded(&self, record: &Record) -> bool {
        self.is_font_invalid(&record.font_name) || self.is_record_invalid(&record.hash)
    }

    /// Returns whether the set changed. Unknown hashes are rejected.
    pub fn mark_record_invalid(&mut self, hash: &str) -> Result<bool, Error> {
        if self.find_record(hash).is_none() {
            return Err(Error::UnknownRecord {
                hash: hash.to_string(),
            });
        }
        Ok(insert_unique(&mut self.invalid_records, hash))
    }

    pub fn mark_record_valid(&mut self, hash: &str) -> bool {
        remove_value(&mut self.invalid_records, hash)
    }

    pub fn mark_font_invalid(&mut self, font_name: &str) -> bool {
        insert_unique(&mut self.invalid_fonts, font_name)
    }

    pub fn mark_font_valid(&mut self, font_name: &str) -> bool {
        remove_value(&mut self.invalid_fonts, font_name)
    }

    pub fn mark_label_completed(&mut self, character: &str) -> bool {
        insert_unique(&mut self.completed_labels, character)
    }

    pub fn mark_label_incompleted(&mut self, character: &str) -> bool {
        remove_value(&mut self.completed_labels, character)
    }
}

/// Label list written by the `labels` step and consumed by the builder.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelFile {
    pub source: String,
    pub content: String,
    pub labels: Vec<String>,
}

/// A font file plus the label characters its cmap covers.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Font {
    pub display_name: String,
    /// Normalized, filename-safe identifier stored in records.
    pub name: String,
    pub size: u32,
    pub path: PathBuf,
    pub supported: BTreeSet<String>,
}

impl Font {
    pub fn supports(&self, character: &str) -> bool {
        self.supported.contains(character)
    }
}
