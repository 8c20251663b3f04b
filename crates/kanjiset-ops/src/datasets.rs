use anyhow::Context;
use std::path::{Path, PathBuf};

use kanjiset_core::defaults::{BLOB_FILENAME, METADATA_FILENAME};
use kanjiset_core::types::DatasetMetadata;
use kanjiset_format::BlobReader;

/// A dataset directory holding `metadata.json` and `images.bin`.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub dir: PathBuf,
    pub metadata: DatasetMetadata,
}

impl Dataset {
    pub fn open(dir: &Path) -> anyhow::Result<Self> {
        let metadata_path = dir.join(METADATA_FILENAME);
        let metadata = kanjiset_format::load_metadata(&metadata_path)
            .with_context(|| format!("load {}", metadata_path.display()))?;
        let name = dir
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(Self {
            name,
            dir: dir.to_path_buf(),
            metadata,
        })
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILENAME)
    }

    pub fn blob_path(&self) -> PathBuf {
        self.dir.join(BLOB_FILENAME)
    }

    pub fn reader(&self) -> anyhow::Result<BlobReader> {
        let path = self.blob_path();
        BlobReader::open(&path).with_context(|| format!("open {}", path.display()))
    }

    /// Rewrite `metadata.json`, backing up the previous file.
    pub fn save(&self) -> anyhow::Result<Option<PathBuf>> {
        let path = self.metadata_path();
        kanjiset_format::save_metadata(&self.metadata, &path)
            .with_context(|| format!("write {}", path.display()))
    }
}

/// Names starting with a letter sort first; backup-prefixed names
/// (`{mtime}-name`) and anything else follow.
pub fn dataset_sort_key(name: &str) -> (bool, &str) {
    let starts_alpha = name.chars().next().is_some_and(char::is_alphabetic);
    (!starts_alpha, name)
}

/// Open every immediate sub-directory of `root` that has a `metadata.json`.
/// Directories that fail to load are logged and skipped.
pub fn discover_datasets(root: &Path) -> anyhow::Result<Vec<Dataset>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(root).with_context(|| format!("read {}", root.display()))? {
        let path = entry?.path();
        if !path.is_dir() || !path.join(METADATA_FILENAME).is_file() {
            continue;
        }
        match Dataset::open(&path) {
            Ok(ds) => out.push(ds),
            Err(err) => {
                let error = format!("{err:#}");
                tracing::warn!(dataset = %path.display(), %error, "skipping dataset");
            }
        }
    }
    out.sort_by(|a, b| dataset_sort_key(&a.name).cmp(&dataset_sort_key(&b.name)));
    Ok(out)
}
