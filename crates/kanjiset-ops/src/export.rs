use anyhow::Context;
use image::{GrayImage, Luma};
use serde::Serialize;
use std::path::{Path, PathBuf};

use kanjiset_core::types::Record;
use kanjiset_format::backup_by_modified_time;

use crate::build::encode_png;
use crate::datasets::Dataset;

#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub out_dir: PathBuf,
    pub sheets: usize,
    pub images: usize,
    pub backup: Option<PathBuf>,
}

/// Grid width for `n` tiles.
pub fn grid_columns(n: usize) -> usize {
    let mut c = (n as f64).sqrt().ceil() as usize;
    while c * c < n {
        c += 1;
    }
    c
}

fn checkerboard(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        if (x + y) % 2 == 0 {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// `{codepoint}_{char}` with the code point zero-padded to `pad` digits.
pub fn sheet_basename(character: &str, pad: usize) -> String {
    let cp = character.chars().next().map(u32::from).unwrap_or(0);
    format!("{cp:0pad$}_{character}")
}

/// Tile `images` (in order) into one sheet over a checkerboard so empty
/// slots stand out.
fn tile(images: &[GrayImage]) -> GrayImage {
    let cell_w = images.iter().map(|i| i.width()).max().unwrap_or(1);
    let cell_h = images.iter().map(|i| i.height()).max().unwrap_or(1);
    let cols = grid_columns(images.len()).max(1);
    let rows = images.len().div_ceil(cols).max(1);
    let mut sheet = checkerboard(cell_w * cols as u32, cell_h * rows as u32);
    for (i, img) in images.iter().enumerate() {
        let left = (i % cols) as u32 * cell_w;
        let top = (i / cols) as u32 * cell_h;
        for (x, y, px) in img.enumerate_pixels() {
            sheet.put_pixel(left + x, top + y, *px);
        }
    }
    sheet
}

/// Write one contact sheet (`.png`) and its record list (`.json`) per label.
///
/// Labels are taken in first-appearance order over the records. An existing
/// `out_dir` is backed up first.
pub fn export_contact_sheets(dataset: &Dataset, out_dir: &Path) -> anyhow::Result<ExportSummary> {
    let backup =
        backup_by_modified_time(out_dir).with_context(|| format!("back up {}", out_dir.display()))?;
    std::fs::create_dir_all(out_dir).with_context(|| format!("create {}", out_dir.display()))?;

    let records = &dataset.metadata.records;
    let mut order: Vec<&str> = Vec::new();
    for r in records {
        if !order.contains(&r.character.as_str()) {
            order.push(r.character.as_str());
        }
    }
    let pad = records
        .iter()
        .filter_map(|r| r.character.chars().next())
        .map(|c| u32::from(c).to_string().len())
        .max()
        .unwrap_or(1);

    let mut reader = dataset.reader()?;
    let mut images = 0usize;
    for character in &order {
        let group: Vec<Record> = records
            .iter()
            .filter(|r| r.character == *character)
            .cloned()
            .collect();
        let mut fetched = reader
            .read_batch(group.clone(), |r| (r.seek_start, r.seek_end))
            .with_context(|| format!("read images for {character:?}"))?;
        // Sheet tiles follow metadata order, not blob order.
        fetched.sort_by_key(|(r, _)| group.iter().position(|g| g == r));

        let mut tiles = Vec::with_capacity(fetched.len());
        for (r, bytes) in &fetched {
            let img = image::load_from_memory(bytes)
                .with_context(|| format!("decode record {}", r.hash))?;
            tiles.push(img.to_luma8());
        }
        images += tiles.len();

        let basename = sheet_basename(character, pad);
        let png_path = out_dir.join(format!("{basename}.png"));
        std::fs::write(&png_path, encode_png(&tile(&tiles))?)
            .with_context(|| format!("write {}", png_path.display()))?;
        let json_path = out_dir.join(format!("{basename}.json"));
        std::fs::write(&json_path, kanjiset_format::to_pretty_json(&group)?)
            .with_context(|| format!("write {}", json_path.display()))?;
    }

    tracing::info!(
        dataset = %dataset.name,
        out_dir = %out_dir.display(),
        sheets = order.len(),
        images,
        "contact sheets exported"
    );
    Ok(ExportSummary {
        out_dir: out_dir.to_path_buf(),
        sheets: order.len(),
        images,
        backup,
    })
}
