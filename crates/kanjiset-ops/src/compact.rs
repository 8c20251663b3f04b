use anyhow::Context;
use serde::Serialize;
use std::path::{Path, PathBuf};

use kanjiset_core::defaults::{BLOB_FILENAME, INSPECTED_DIRNAME, METADATA_FILENAME};
use kanjiset_core::types::{DatasetMetadata, Record};
use kanjiset_format::{backup_by_modified_time, BlobWriter};

use crate::datasets::{discover_datasets, Dataset};

#[derive(Debug, Clone, Serialize)]
pub struct CompactSummary {
    pub dataset: String,
    pub out_dir: PathBuf,
    pub kept: usize,
    pub dropped: usize,
    pub blob_bytes: u64,
}

/// `<dataset>/inspected`
pub fn default_output_dir(dataset: &Dataset) -> PathBuf {
    dataset.dir.join(INSPECTED_DIRNAME)
}

/// Whether `a` and `b` resolve to the same directory (`..`, symlinks and
/// relative paths included).
fn same_dir(a: &Path, b: &Path) -> anyhow::Result<bool> {
    let a = std::fs::canonicalize(a).with_context(|| format!("canonicalize {}", a.display()))?;
    let b = std::fs::canonicalize(b).with_context(|| format!("canonicalize {}", b.display()))?;
    Ok(a == b)
}

/// Copy every record not excluded by `invalid_fonts`/`invalid_records` into
/// a fresh container at `out_dir`.
///
/// Records keep their original order and get new offsets. The output keeps
/// the label list and the blank/unsupported/completed buckets; its invalid
/// sets are empty. Existing output files are backed up.
pub fn compact_dataset(dataset: &Dataset, out_dir: &Path) -> anyhow::Result<CompactSummary> {
    let mut reader = dataset.reader()?;
    std::fs::create_dir_all(out_dir).with_context(|| format!("create {}", out_dir.display()))?;
    if same_dir(out_dir, &dataset.dir)? {
        anyhow::bail!(
            "output directory {} is the dataset itself",
            out_dir.display()
        );
    }

    let blob_path = out_dir.join(BLOB_FILENAME);
    let metadata_path = out_dir.join(METADATA_FILENAME);
    for path in [&blob_path, &metadata_path] {
        backup_by_modified_time(path).with_context(|| format!("back up {}", path.display()))?;
    }

    let src = &dataset.metadata;
    let mut writer =
        BlobWriter::create(&blob_path).with_context(|| format!("create {}", blob_path.display()))?;
    let mut kept: Vec<Record> = Vec::new();
    for record in src.records.iter().filter(|r| !src.is_excluded(r)) {
        let bytes = reader
            .read_range(record.seek_start, record.seek_end)
            .with_context(|| format!("read record {}", record.hash))?;
        let (seek_start, seek_end) = writer
            .append(&bytes)
            .with_context(|| format!("append to {}", blob_path.display()))?;
        kept.push(Record {
            seek_start,
            seek_end,
            ..record.clone()
        });
    }
    let blob_bytes = writer
        .finish()
        .with_context(|| format!("flush {}", blob_path.display()))?;

    let out = DatasetMetadata {
        source: src.source.clone(),
        content: src.content.clone(),
        labels: src.labels.clone(),
        records: kept,
        invalid_records: Vec::new(),
        invalid_fonts: Vec::new(),
        blank_combinations: src.blank_combinations.clone(),
        unsupported_combinations: src.unsupported_combinations.clone(),
        completed_labels: src.completed_labels.clone(),
    };
    kanjiset_format::save_metadata(&out, &metadata_path)
        .with_context(|| format!("write {}", metadata_path.display()))?;

    let summary = CompactSummary {
        dataset: dataset.name.clone(),
        out_dir: out_dir.to_path_buf(),
        kept: out.records.len(),
        dropped: src.records.len() - out.records.len(),
        blob_bytes,
    };
    tracing::info!(
        dataset = %dataset.name,
        kept = summary.kept,
        dropped = summary.dropped,
        "dataset compacted"
    );
    Ok(summary)
}

/// Compact every dataset under `root` into its default output directory.
/// A dataset that fails is logged and skipped.
pub fn compact_root(root: &Path) -> anyhow::Result<Vec<CompactSummary>> {
    let mut out = Vec::new();
    for dataset in discover_datasets(root)? {
        match compact_dataset(&dataset, &default_output_dir(&dataset)) {
            Ok(summary) => out.push(summary),
            Err(err) => {
                let error = format!("{err:#}");
                tracing::warn!(dataset = %dataset.name, %error, "compaction failed; skipping");
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::write_dataset;
    use kanjiset_core::hash::content_hash;
    use kanjiset_core::types::Combination;
    use kanjiset_format::{load_metadata, validate_container, BlobReader};

    #[test]
    fn invalid_fonts_and_records_are_dropped() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("kana");
        write_dataset(
            &dir,
            &[
                ("あ", "FontX", b"H1-bytes"),
                ("あ", "FontY", b"H2-bytes"),
                ("い", "FontY", b"H3-bytes!"),
            ],
        );
        let mut ds = Dataset::open(&dir).unwrap();
        ds.metadata.mark_font_invalid("FontX");
        ds.metadata.mark_record_invalid(&content_hash(b"H2-bytes")).unwrap();
        ds.metadata
            .blank_combinations
            .push(Combination::new("う", "FontY"));
        ds.metadata.mark_label_completed("あ");

        let out_dir = default_output_dir(&ds);
        let summary = compact_dataset(&ds, &out_dir).unwrap();
        assert_eq!(summary.kept, 1);
        assert_eq!(summary.dropped, 2);

        let blob = std::fs::read(out_dir.join(BLOB_FILENAME)).unwrap();
        assert_eq!(blob, b"H3-bytes!");

        let m = load_metadata(out_dir.join(METADATA_FILENAME)).unwrap();
        assert_eq!(m.records.len(), 1);
        assert_eq!(m.records[0].character, "い");
        assert_eq!((m.records[0].seek_start, m.records[0].seek_end), (0, 9));
        assert!(m.invalid_fonts.is_empty());
        assert!(m.invalid_records.is_empty());
        assert_eq!(m.labels, ds.metadata.labels);
        assert_eq!(m.blank_combinations.len(), 1);
        assert_eq!(m.completed_labels, vec!["あ"]);
        validate_container(&m, blob.len() as u64).unwrap();
    }

    #[test]
    fn kept_payloads_are_byte_identical() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("kana");
        write_dataset(&dir, &[("あ", "F", b"one"), ("い", "F", b"two"), ("う", "F", b"three")]);
        let ds = Dataset::open(&dir).unwrap();
        let out_dir = root.path().join("out");
        compact_dataset(&ds, &out_dir).unwrap();

        let m = load_metadata(out_dir.join(METADATA_FILENAME)).unwrap();
        let mut reader = BlobReader::open(out_dir.join(BLOB_FILENAME)).unwrap();
        for r in &m.records {
            let bytes = reader.read_range(r.seek_start, r.seek_end).unwrap();
            assert_eq!(content_hash(&bytes), r.hash);
        }
        assert_eq!(m.records, ds.metadata.records);
    }

    #[test]
    fn existing_output_is_backed_up() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("kana");
        write_dataset(&dir, &[("あ", "F", b"one")]);
        let ds = Dataset::open(&dir).unwrap();
        let out_dir = root.path().join("out");
        compact_dataset(&ds, &out_dir).unwrap();
        compact_dataset(&ds, &out_dir).unwrap();

        let backups = std::fs::read_dir(&out_dir)
            .unwrap()
            .filter(|e| {
                let name = e.as_ref().unwrap().file_name();
                let name = name.to_string_lossy().into_owned();
                name.ends_with("-images.bin") || name.ends_with("-metadata.json")
            })
            .count();
        assert_eq!(backups, 2);
    }

    #[test]
    fn refuses_to_overwrite_source() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("kana");
        write_dataset(&dir, &[("あ", "F", b"one")]);
        let ds = Dataset::open(&dir).unwrap();
        assert!(compact_dataset(&ds, &dir).is_err());
    }

    #[test]
    fn refuses_aliased_source_and_leaves_it_intact() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("kana");
        write_dataset(&dir, &[("あ", "F", b"one")]);
        let ds = Dataset::open(&dir).unwrap();

        let alias = dir.join("..").join("kana");
        let err = compact_dataset(&ds, &alias).unwrap_err();
        assert!(format!("{err:#}").contains("is the dataset itself"));

        let mut names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec![BLOB_FILENAME, METADATA_FILENAME]);
        assert_eq!(Dataset::open(&dir).unwrap().metadata, ds.metadata);
    }

    #[test]
    fn root_compaction_skips_failures() {
        let root = tempfile::tempdir().unwrap();
        write_dataset(&root.path().join("good"), &[("あ", "F", b"one")]);
        let bad = root.path().join("bad");
        write_dataset(&bad, &[("あ", "F", b"one")]);
        std::fs::remove_file(bad.join(BLOB_FILENAME)).unwrap();

        let summaries = compact_root(root.path()).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].dataset, "good");
        assert!(root.path().join("good").join(INSPECTED_DIRNAME).join(BLOB_FILENAME).exists());
    }
}
