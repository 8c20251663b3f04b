use std::path::Path;

use kanjiset_core::defaults::{BLOB_FILENAME, METADATA_FILENAME};
use kanjiset_core::hash::content_hash;
use kanjiset_core::types::{DatasetMetadata, Record};
use kanjiset_format::BlobWriter;

/// Write a dataset whose records carry the given `(char, font, payload)`.
/// Labels are the distinct characters in first-seen order.
pub(crate) fn write_dataset(dir: &Path, items: &[(&str, &str, &[u8])]) -> DatasetMetadata {
    std::fs::create_dir_all(dir).unwrap();
    let mut labels: Vec<String> = Vec::new();
    for (ch, _, _) in items {
        if !labels.iter().any(|l| l == ch) {
            labels.push(ch.to_string());
        }
    }
    let mut m = DatasetMetadata::new("test.txt", labels.concat(), labels);
    let mut w = BlobWriter::create(dir.join(BLOB_FILENAME)).unwrap();
    for (ch, font, payload) in items {
        let (seek_start, seek_end) = w.append(payload).unwrap();
        m.records.push(Record {
            hash: content_hash(payload),
            character: ch.to_string(),
            font_name: font.to_string(),
            width: 8,
            height: 8,
            depth: 1,
            font_size: 8,
            seek_start,
            seek_end,
        });
    }
    w.finish().unwrap();
    kanjiset_format::save_metadata(&m, dir.join(METADATA_FILENAME)).unwrap();
    m
}
