use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use kanjiset_core::error::Error;

fn modified_unix_secs(path: &Path) -> Result<u64, Error> {
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0))
}

/// Rename `path` (file or directory) to `{mtime}-{basename}` in the same
/// directory and return the new path. Returns `None` when `path` does not
/// exist. If the backup name is already taken, `{mtime}.{n}-{basename}` is
/// used instead.
pub fn backup_by_modified_time(path: &Path) -> Result<Option<PathBuf>, Error> {
    if !path.exists() {
        return Ok(None);
    }
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let base = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("backup");
    let ts = modified_unix_secs(path)?;

    let mut i = 0u32;
    let target = loop {
        let name = if i == 0 {
            format!("{ts}-{base}")
        } else {
            format!("{ts}.{i}-{base}")
        };
        let candidate = dir.join(name);
        if !candidate.exists() {
            break candidate;
        }
        i = i.saturating_add(1);
    };

    std::fs::rename(path, &target)?;
    tracing::info!(from = %path.display(), to = %target.display(), "backed up");
    Ok(Some(target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_is_not_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        let got = backup_by_modified_time(&dir.path().join("metadata.json")).unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn backup_keeps_bytes_and_uses_mtime_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.json");
        std::fs::write(&path, b"{\"old\": true}\n").unwrap();
        let ts = modified_unix_secs(&path).unwrap();

        let backup = backup_by_modified_time(&path).unwrap().unwrap();
        assert!(!path.exists());
        assert_eq!(
            backup.file_name().unwrap().to_str().unwrap(),
            format!("{ts}-metadata.json")
        );
        assert_eq!(std::fs::read(&backup).unwrap(), b"{\"old\": true}\n");
    }

    #[test]
    fn colliding_backups_get_a_counter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("images.bin");

        std::fs::write(&path, b"one").unwrap();
        let first = backup_by_modified_time(&path).unwrap().unwrap();
        std::fs::write(&path, b"two").unwrap();
        // Force the same mtime second as the first backup.
        let f = std::fs::File::options().write(true).open(&path).unwrap();
        f.set_modified(std::fs::metadata(&first).unwrap().modified().unwrap())
            .unwrap();
        drop(f);

        let second = backup_by_modified_time(&path).unwrap().unwrap();
        assert_ne!(first, second);
        assert_eq!(std::fs::read(&first).unwrap(), b"one");
        assert_eq!(std::fs::read(&second).unwrap(), b"two");
    }
}
