use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use kanjiset_core::error::{Error, SchemaError};
use kanjiset_core::types::DatasetMetadata;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::backup::backup_by_modified_time;

fn field<T: DeserializeOwned>(
    obj: &Map<String, Value>,
    key: &'static str,
    required: bool,
) -> Result<Option<T>, SchemaError> {
    match obj.get(key) {
        None | Some(Value::Null) if !required => Ok(None),
        None => Err(SchemaError::MissingKey(key)),
        Some(v) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|e| SchemaError::WrongShape {
                key,
                reason: e.to_string(),
            }),
    }
}

fn required<T: DeserializeOwned>(obj: &Map<String, Value>, key: &'static str) -> Result<T, SchemaError> {
    field(obj, key, true)?.ok_or(SchemaError::MissingKey(key))
}

fn optional<T: DeserializeOwned + Default>(
    obj: &Map<String, Value>,
    key: &'static str,
) -> Result<T, SchemaError> {
    Ok(field(obj, key, false)?.unwrap_or_default())
}

/// Parse a `metadata.json` document.
///
/// `source`, `content`, `labels` and `records` are required; the mark and
/// combination buckets default to empty. Unknown keys are ignored.
pub fn parse_metadata(text: &str) -> Result<DatasetMetadata, Error> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| SchemaError::InvalidJson(e.to_string()))?;
    let Value::Object(obj) = value else {
        return Err(SchemaError::NotAnObject.into());
    };
    Ok(DatasetMetadata {
        source: required(&obj, "source")?,
        content: required(&obj, "content")?,
        labels: required(&obj, "labels")?,
        records: required(&obj, "records")?,
        invalid_records: optional(&obj, "invalid_records")?,
        invalid_fonts: optional(&obj, "invalid_fonts")?,
        blank_combinations: optional(&obj, "blank_combinations")?,
        unsupported_combinations: optional(&obj, "unsupported_combinations")?,
        completed_labels: optional(&obj, "completed_labels")?,
    })
}

pub fn load_metadata(path: impl AsRef<Path>) -> Result<DatasetMetadata, Error> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_metadata(&text)
}

/// Two-space indented JSON with literal non-ASCII and a trailing newline.
pub fn to_pretty_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, Error> {
    let mut bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| Error::Io(std::io::Error::other(e)))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Write `bytes` to a fresh temp file beside `path` and fsync it.
fn write_temp(path: &Path, bytes: &[u8]) -> Result<PathBuf, Error> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let base = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("metadata.json");

    let mut i = 0u32;
    loop {
        let tmp_name = if i == 0 {
            format!("{base}.tmp")
        } else {
            format!("{base}.tmp.{i}")
        };
        let tmp_path = dir.join(tmp_name);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)
        {
            Ok(mut f) => {
                if let Err(e) = f.write_all(bytes).and_then(|_| f.sync_all()) {
                    let _ = std::fs::remove_file(&tmp_path);
                    return Err(e.into());
                }
                return Ok(tmp_path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                i = i.saturating_add(1);
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Serialize `value` to `path`: temp file, fsync, back up the current file,
/// then rename into place. Returns the backup path when one was made.
pub fn save_json_with_backup<T: serde::Serialize + ?Sized>(
    value: &T,
    path: impl AsRef<Path>,
) -> Result<Option<PathBuf>, Error> {
    let path = path.as_ref();
    let bytes = to_pretty_json(value)?;
    let tmp_path = write_temp(path, &bytes)?;
    let backup = match backup_by_modified_time(path) {
        Ok(b) => b,
        Err(e) => {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e);
        }
    };
    std::fs::rename(&tmp_path, path)?;
    Ok(backup)
}

pub fn save_metadata(
    metadata: &DatasetMetadata,
    path: impl AsRef<Path>,
) -> Result<Option<PathBuf>, Error> {
    let path = path.as_ref();
    let backup = save_json_with_backup(metadata, path)?;
    tracing::debug!(
        path = %path.display(),
        records = metadata.records.len(),
        "metadata saved"
    );
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanjiset_core::types::{Combination, Record};

    fn sample() -> DatasetMetadata {
        let mut m = DatasetMetadata::new("kana.txt", "あい", vec!["あ".into(), "い".into()]);
        m.records.push(Record {
            hash: "AB".repeat(32),
            character: "あ".into(),
            font_name: "Noto_Regular".into(),
            width: 64,
            height: 64,
            depth: 1,
            font_size: 64,
            seek_start: 0,
            seek_end: 120,
        });
        m.blank_combinations.push(Combination::new("い", "Noto_Regular"));
        m.completed_labels.push("あ".into());
        m
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.json");
        let m = sample();
        assert!(save_metadata(&m, &path).unwrap().is_none());
        assert_eq!(load_metadata(&path).unwrap(), m);
    }

    #[test]
    fn output_is_pretty_literal_and_newline_terminated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.json");
        save_metadata(&sample(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n  \"source\": \"kana.txt\""));
        assert!(text.contains("\"char\": \"あ\""));
        assert!(text.contains("\"font\": \"Noto_Regular\""));
        assert!(!text.contains("\\u"));
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn save_backs_up_previous_file_byte_for_byte() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.json");
        std::fs::write(&path, b"previous contents").unwrap();

        let backup = save_metadata(&sample(), &path).unwrap().unwrap();
        assert_eq!(std::fs::read(&backup).unwrap(), b"previous contents");
        assert!(backup
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .ends_with("-metadata.json"));
        assert!(!dir.path().join("metadata.json.tmp").exists());
    }

    #[test]
    fn optional_keys_default_and_legacy_aliases_load() {
        let text = r#"{
            "source": "s", "content": "あ", "labels": ["あ"],
            "records": [{"hash": "H", "character": "あ", "font_name": "F",
                         "width": 1, "height": 2, "seek_start": 0, "seek_end": 3}],
            "completed_labels": null
        }"#;
        let m = parse_metadata(text).unwrap();
        assert_eq!(m.records[0].character, "あ");
        assert_eq!(m.records[0].font_name, "F");
        assert_eq!(m.records[0].depth, 1);
        assert_eq!(m.records[0].font_size, 0);
        assert!(m.invalid_records.is_empty());
        assert!(m.completed_labels.is_empty());
    }

    #[test]
    fn missing_and_misshapen_keys_are_reported() {
        let err = parse_metadata(r#"{"source": "s", "content": "", "labels": []}"#).unwrap_err();
        assert!(matches!(err, Error::Schema(SchemaError::MissingKey("records"))));

        let err = parse_metadata(r#"{"source": "s", "content": "", "labels": "abc", "records": []}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Schema(SchemaError::WrongShape { key: "labels", .. })
        ));

        let err = parse_metadata("[1, 2]").unwrap_err();
        assert!(matches!(err, Error::Schema(SchemaError::NotAnObject)));

        let err = parse_metadata("{not json").unwrap_err();
        assert!(matches!(err, Error::Schema(SchemaError::InvalidJson(_))));
    }
}
