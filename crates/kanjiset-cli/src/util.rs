use std::path::{Path, PathBuf};

use kanjiset_core::defaults::SETTINGS_FILENAME;
use kanjiset_ops::settings::load_settings_patch;
use kanjiset_ops::{ResolvedSettings, SettingsPatch};

/// Defaults, then `kanjiset.json` in the working directory, then `flags`.
pub(crate) fn resolve_settings(flags: &SettingsPatch) -> anyhow::Result<ResolvedSettings> {
    let file = load_settings_patch(Path::new(SETTINGS_FILENAME))?;
    Ok(ResolvedSettings::roll_up(&[file.as_ref(), Some(flags)]))
}

/// Directory holding datasets: `--root`, else the configured `datasets_dir`.
pub(crate) fn datasets_root(root: Option<&str>) -> anyhow::Result<PathBuf> {
    match root {
        Some(r) => Ok(PathBuf::from(r)),
        None => Ok(resolve_settings(&SettingsPatch::default())?.datasets_dir),
    }
}

pub(crate) fn path_string(p: &Path) -> String {
    p.display().to_string()
}

pub(crate) fn fmt_u64_commas(mut v: u64) -> String {
    if v == 0 {
        return "0".to_string();
    }
    let mut parts = Vec::new();
    while v > 0 {
        parts.push((v % 1000) as u16);
        v /= 1000;
    }
    let mut out = String::new();
    for (i, part) in parts.iter().rev().enumerate() {
        if i == 0 {
            out.push_str(&part.to_string());
        } else {
            out.push_str(&format!(",{:03}", part));
        }
    }
    out
}

pub(crate) fn fmt_bytes_human(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0usize;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        return format!("{bytes} B");
    }
    if value >= 10.0 {
        format!("{value:.0} {}", UNITS[unit])
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
