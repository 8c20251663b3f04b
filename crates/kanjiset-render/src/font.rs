use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Context;
use kanjiset_core::naming::normalize_filename;
use kanjiset_core::types::Font;
use ttf_parser::{name_id, Face};

fn name_entry(face: &Face<'_>, id: u16) -> Option<String> {
    face.names()
        .into_iter()
        .filter(|n| n.name_id == id)
        .find_map(|n| n.to_string())
        .filter(|s| !s.trim().is_empty())
}

/// `"{family}_{subfamily}"` from the name table, or the file stem.
fn display_name(face: &Face<'_>, path: &Path) -> String {
    match (
        name_entry(face, name_id::FAMILY),
        name_entry(face, name_id::SUBFAMILY),
    ) {
        (Some(family), Some(sub)) => format!("{family}_{sub}"),
        (Some(family), None) => family,
        _ => path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("font")
            .to_string(),
    }
}

fn covers(face: &Face<'_>, label: &str) -> bool {
    !label.is_empty()
        && label
            .chars()
            .all(|c| face.glyph_index(c).is_some_and(|g| g.0 != 0))
}

/// Parse the font at `path` and compute which of `labels` its cmap covers.
pub fn load_font(path: &Path, font_size: u32, labels: &[String]) -> anyhow::Result<Font> {
    let data = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let face = Face::parse(&data, 0).with_context(|| format!("parse font {}", path.display()))?;
    let display_name = display_name(&face, path);
    let supported: BTreeSet<String> = labels
        .iter()
        .filter(|l| covers(&face, l))
        .cloned()
        .collect();
    Ok(Font {
        name: normalize_filename(&display_name),
        display_name,
        size: font_size,
        path: path.to_path_buf(),
        supported,
    })
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("ttf") || ext.eq_ignore_ascii_case("otf"))
        .unwrap_or(false)
}

/// Load every `.ttf`/`.otf` in `dir`, in file-name order.
pub fn load_fonts(dir: &Path, font_size: u32, labels: &[String]) -> anyhow::Result<Vec<Font>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            tracing::warn!(path = %path.display(), "skipping directory in font folder");
            continue;
        }
        if !is_font_file(&path) {
            tracing::warn!(path = %path.display(), "skipping non-font file");
            continue;
        }
        paths.push(path);
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut fonts = Vec::with_capacity(paths.len());
    for path in paths {
        let font = load_font(&path, font_size, labels)?;
        let missing = missing_labels(&font, labels);
        if !missing.is_empty() {
            tracing::warn!(
                font = %font.name,
                missing = missing.len(),
                chars = %missing.concat(),
                "font does not cover every label"
            );
        }
        fonts.push(font);
    }
    for name in duplicate_font_names(&fonts) {
        let paths: Vec<String> = fonts
            .iter()
            .filter(|f| f.name == name)
            .map(|f| f.path.display().to_string())
            .collect();
        tracing::warn!(
            font = %name,
            paths = %paths.join(", "),
            "several font files share one name; their records will be indistinguishable"
        );
    }
    tracing::info!(dir = %dir.display(), fonts = fonts.len(), "fonts loaded");
    Ok(fonts)
}

/// Names carried by more than one font, sorted.
pub fn duplicate_font_names(fonts: &[Font]) -> Vec<&str> {
    let mut seen = BTreeSet::new();
    let mut dupes = BTreeSet::new();
    for f in fonts {
        if !seen.insert(f.name.as_str()) {
            dupes.insert(f.name.as_str());
        }
    }
    dupes.into_iter().collect()
}

pub fn missing_labels<'a>(font: &Font, labels: &'a [String]) -> Vec<&'a str> {
    labels
        .iter()
        .filter(|l| !font.supports(l))
        .map(String::as_str)
        .collect()
}
