use anyhow::Context;
use std::collections::{BTreeMap, HashSet};

use kanjiset_core::error::Error;
use kanjiset_core::types::{DatasetMetadata, Record};

use crate::datasets::Dataset;

/// Hashes shared by two or more records, sorted by hash. Records inside a
/// group keep metadata order.
pub fn find_duplicate_hashes(metadata: &DatasetMetadata) -> BTreeMap<&str, Vec<&Record>> {
    let mut groups: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();
    for r in &metadata.records {
        groups.entry(r.hash.as_str()).or_default().push(r);
    }
    groups.retain(|_, records| records.len() >= 2);
    groups
}

/// Read the payload of every record whose hash is in `hashes`.
///
/// Results come back in blob order, each paired with its record.
pub fn fetch_images(dataset: &Dataset, hashes: &[String]) -> anyhow::Result<Vec<(Record, Vec<u8>)>> {
    let wanted: HashSet<&str> = hashes.iter().map(String::as_str).collect();
    let records: Vec<Record> = dataset
        .metadata
        .records
        .iter()
        .filter(|r| wanted.contains(r.hash.as_str()))
        .cloned()
        .collect();
    if records.is_empty() {
        return Ok(Vec::new());
    }
    let mut reader = dataset.reader()?;
    reader
        .read_batch(records, |r| (r.seek_start, r.seek_end))
        .with_context(|| format!("read images from {}", dataset.blob_path().display()))
}

/// An idempotent review mark on a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mark {
    RecordInvalid(String),
    RecordValid(String),
    FontInvalid(String),
    FontValid(String),
    LabelCompleted(String),
    LabelIncompleted(String),
}

impl Mark {
    /// Apply to `metadata`; returns whether anything changed.
    pub fn apply_to(&self, metadata: &mut DatasetMetadata) -> Result<bool, Error> {
        Ok(match self {
            Self::RecordInvalid(h) => metadata.mark_record_invalid(h)?,
            Self::RecordValid(h) => metadata.mark_record_valid(h),
            Self::FontInvalid(f) => metadata.mark_font_invalid(f),
            Self::FontValid(f) => metadata.mark_font_valid(f),
            Self::LabelCompleted(l) => metadata.mark_label_completed(l),
            Self::LabelIncompleted(l) => metadata.mark_label_incompleted(l),
        })
    }

    fn undo(&self, metadata: &mut DatasetMetadata) {
        match self {
            Self::RecordInvalid(h) => {
                metadata.mark_record_valid(h);
            }
            Self::RecordValid(h) => metadata.invalid_records.push(h.clone()),
            Self::FontInvalid(f) => {
                metadata.mark_font_valid(f);
            }
            Self::FontValid(f) => {
                metadata.mark_font_invalid(f);
            }
            Self::LabelCompleted(l) => {
                metadata.mark_label_incompleted(l);
            }
            Self::LabelIncompleted(l) => {
                metadata.mark_label_completed(l);
            }
        }
    }
}

/// Apply `mark` and persist the metadata when it changed.
///
/// If the save fails the in-memory change is rolled back so `dataset` still
/// matches the file on disk.
pub fn apply_mark(dataset: &mut Dataset, mark: &Mark) -> anyhow::Result<bool> {
    let changed = mark
        .apply_to(&mut dataset.metadata)
        .with_context(|| format!("dataset {}", dataset.name))?;
    if !changed {
        return Ok(false);
    }
    if let Err(err) = dataset.save() {
        mark.undo(&mut dataset.metadata);
        return Err(err);
    }
    tracing::info!(dataset = %dataset.name, mark = ?mark, "mark saved");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::write_dataset;
    use kanjiset_core::hash::content_hash;

    #[test]
    fn duplicates_group_by_hash() {
        let root = tempfile::tempdir().unwrap();
        let m = write_dataset(
            &root.path().join("kana"),
            &[("あ", "F1", b"A"), ("い", "F1", b"B"), ("う", "F2", b"A")],
        );
        let dups = find_duplicate_hashes(&m);
        assert_eq!(dups.len(), 1);
        let group = &dups[content_hash(b"A").as_str()];
        let positions: Vec<u64> = group.iter().map(|r| r.seek_start).collect();
        assert_eq!(positions, vec![0, 2]);
    }

    #[test]
    fn no_duplicates_is_empty() {
        let root = tempfile::tempdir().unwrap();
        let m = write_dataset(&root.path().join("kana"), &[("あ", "F1", b"A"), ("い", "F1", b"B")]);
        assert!(find_duplicate_hashes(&m).is_empty());
    }

    #[test]
    fn fetch_images_returns_payloads_for_all_matching_records() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("kana");
        write_dataset(
            &dir,
            &[("あ", "F1", b"AAA"), ("い", "F1", b"BB"), ("う", "F2", b"AAA")],
        );
        let ds = Dataset::open(&dir).unwrap();
        let got = fetch_images(&ds, &[content_hash(b"AAA"), "UNKNOWN".into()]).unwrap();
        assert_eq!(got.len(), 2);
        assert!(got.iter().all(|(_, bytes)| bytes == b"AAA"));
        assert_eq!(got[0].0.character, "あ");
        assert_eq!(got[1].0.character, "う");
    }

    #[test]
    fn marks_persist_only_on_change() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("kana");
        write_dataset(&dir, &[("あ", "F1", b"A")]);
        let mut ds = Dataset::open(&dir).unwrap();
        let hash = content_hash(b"A");

        assert!(apply_mark(&mut ds, &Mark::RecordInvalid(hash.clone())).unwrap());
        assert!(!apply_mark(&mut ds, &Mark::RecordInvalid(hash.clone())).unwrap());
        assert!(apply_mark(&mut ds, &Mark::FontInvalid("F1".into())).unwrap());
        assert!(apply_mark(&mut ds, &Mark::LabelCompleted("あ".into())).unwrap());

        let reopened = Dataset::open(&dir).unwrap();
        assert_eq!(reopened.metadata.invalid_records, vec![hash.clone()]);
        assert_eq!(reopened.metadata.invalid_fonts, vec!["F1"]);
        assert_eq!(reopened.metadata.completed_labels, vec!["あ"]);

        assert!(apply_mark(&mut ds, &Mark::RecordValid(hash)).unwrap());
        assert!(Dataset::open(&dir).unwrap().metadata.invalid_records.is_empty());
    }

    #[test]
    fn unknown_record_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("kana");
        write_dataset(&dir, &[("あ", "F1", b"A")]);
        let mut ds = Dataset::open(&dir).unwrap();
        let err = apply_mark(&mut ds, &Mark::RecordInvalid("NOPE".into())).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::UnknownRecord { .. })
        ));
    }

    #[test]
    fn failed_save_rolls_back_the_toggle() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("kana");
        write_dataset(&dir, &[("あ", "F1", b"A")]);
        let mut ds = Dataset::open(&dir).unwrap();
        ds.dir = root.path().join("missing");

        assert!(apply_mark(&mut ds, &Mark::FontInvalid("F1".into())).is_err());
        assert!(ds.metadata.invalid_fonts.is_empty());
    }
}
