use anyhow::Context;
use std::path::Path;

use kanjiset_core::naming::{first_invalid_char, normalize_filename};
use kanjiset_ops::{BuildOptions, SettingsPatch};
use kanjiset_render::GlyphRasterizer;

use crate::util::{fmt_bytes_human, fmt_u64_commas, resolve_settings};

/// Dataset name: `--name` if given, else the normalized stem of the label
/// file's source.
pub(crate) fn dataset_name(name: Option<&str>, source: &str) -> anyhow::Result<String> {
    if let Some(name) = name {
        if let Some(c) = first_invalid_char(name) {
            anyhow::bail!("dataset name {name:?} contains invalid character {c:?}");
        }
        return Ok(name.to_string());
    }
    let stem = Path::new(source)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let normalized = normalize_filename(stem);
    if normalized.is_empty() {
        anyhow::bail!("cannot derive a dataset name from source {source:?}; pass --name");
    }
    Ok(normalized)
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_build(
    labels: &str,
    name: Option<&str>,
    fonts: Option<&str>,
    datasets: Option<&str>,
    font_size: Option<u32>,
    image_size: Option<u32>,
    jobs: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let settings = resolve_settings(&SettingsPatch {
        datasets_dir: datasets.map(Into::into),
        fonts_dir: fonts.map(Into::into),
        font_size,
        image_size,
        jobs,
    })?;
    tracing::debug!(?settings, "resolved build settings");
    let label_file = kanjiset_ops::load_label_file(Path::new(labels))?;
    if label_file.labels.is_empty() {
        anyhow::bail!("{labels} has no labels");
    }
    let out_dir = settings
        .datasets_dir
        .join(dataset_name(name, &label_file.source)?);

    let fonts = kanjiset_render::load_fonts(
        &settings.fonts_dir,
        settings.font_size,
        &label_file.labels,
    )?;
    if fonts.is_empty() {
        anyhow::bail!("no .ttf/.otf fonts in {}", settings.fonts_dir.display());
    }
    let rasterizer = GlyphRasterizer::new(&fonts).context("load font faces")?;
    let opts = BuildOptions {
        image_size: settings.image_size,
        jobs: settings.jobs,
    };
    let summary =
        kanjiset_ops::build_dataset(&label_file, &fonts, &rasterizer, &out_dir, &opts)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    println!(
        "Built {}: {} labels x {} fonts -> {} records ({})",
        summary.out_dir.display(),
        fmt_u64_commas(summary.labels as u64),
        fmt_u64_commas(summary.fonts as u64),
        fmt_u64_commas(summary.records as u64),
        fmt_bytes_human(summary.blob_bytes),
    );
    println!(
        "Skipped {} blank and {} unsupported combinations",
        summary.blank, summary.unsupported
    );
    for b in &summary.backups {
        println!("Backed up {}", b.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_defaults_to_normalized_source_stem() {
        assert_eq!(dataset_name(None, "kana.txt").unwrap(), "kana");
        assert_eq!(dataset_name(None, "jōyō kanji (2010).txt").unwrap(), "jōyō_kanji_2010");
        assert!(dataset_name(None, "").is_err());
    }

    #[test]
    fn explicit_name_is_checked() {
        assert_eq!(dataset_name(Some("kana"), "x.txt").unwrap(), "kana");
        assert!(dataset_name(Some("a/b"), "x.txt").is_err());
    }
}
