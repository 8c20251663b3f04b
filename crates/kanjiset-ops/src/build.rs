use anyhow::Context;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, GrayImage, ImageEncoder};
use serde::Serialize;
use std::path::{Path, PathBuf};

use kanjiset_core::defaults::{BLOB_FILENAME, IMAGE_DEPTH, IMAGE_SIZE, METADATA_FILENAME};
use kanjiset_core::hash::content_hash;
use kanjiset_core::types::{Combination, DatasetMetadata, Font, LabelFile, Record};
use kanjiset_format::{backup_by_modified_time, BlobWriter};
use kanjiset_render::{Rasterizer, RenderError};

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub image_size: u32,
    /// Render workers per label; 1 renders on the calling thread.
    pub jobs: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            image_size: IMAGE_SIZE,
            jobs: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub out_dir: PathBuf,
    pub labels: usize,
    pub fonts: usize,
    pub records: usize,
    pub blank: usize,
    pub unsupported: usize,
    pub blob_bytes: u64,
    pub backups: Vec<PathBuf>,
}

enum Outcome {
    Unsupported,
    Blank,
    Rendered {
        png: Vec<u8>,
        width: u32,
        height: u32,
    },
}

pub fn encode_png(image: &GrayImage) -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::L8,
        )
        .context("encode PNG")?;
    Ok(buf)
}

fn render_one(
    rasterizer: &dyn Rasterizer,
    character: &str,
    font: &Font,
    image_size: u32,
) -> anyhow::Result<Outcome> {
    if !font.supports(character) {
        return Ok(Outcome::Unsupported);
    }
    match rasterizer.render(character, font, image_size) {
        Ok(None) => Ok(Outcome::Blank),
        Ok(Some(image)) => Ok(Outcome::Rendered {
            png: encode_png(&image)?,
            width: image.width(),
            height: image.height(),
        }),
        Err(RenderError::Unsupported { .. }) => Ok(Outcome::Unsupported),
        Err(err) => Err(err).with_context(|| format!("render {character:?} with {}", font.name)),
    }
}

/// Render one label across every font, keeping font order.
fn render_label(
    rasterizer: &dyn Rasterizer,
    character: &str,
    fonts: &[Font],
    opts: &BuildOptions,
) -> anyhow::Result<Vec<Outcome>> {
    if opts.jobs <= 1 || fonts.len() <= 1 {
        return fonts
            .iter()
            .map(|f| render_one(rasterizer, character, f, opts.image_size))
            .collect();
    }
    let per_worker = fonts.len().div_ceil(opts.jobs);
    std::thread::scope(|s| {
        let handles: Vec<_> = fonts
            .chunks(per_worker)
            .map(|chunk| {
                s.spawn(move || {
                    chunk
                        .iter()
                        .map(|f| render_one(rasterizer, character, f, opts.image_size))
                        .collect::<anyhow::Result<Vec<_>>>()
                })
            })
            .collect();
        let mut out = Vec::with_capacity(fonts.len());
        for h in handles {
            let part = h
                .join()
                .map_err(|_| anyhow::anyhow!("render worker panicked"))??;
            out.extend(part);
        }
        Ok(out)
    })
}

/// Render every `(label, font)` pair into `out_dir/images.bin` and
/// `out_dir/metadata.json`.
///
/// Labels are the outer loop and fonts the inner loop, fonts in the order
/// given. Existing container files in `out_dir` are backed up first. The
/// metadata file is written once, after the blob is complete.
pub fn build_dataset(
    label_file: &LabelFile,
    fonts: &[Font],
    rasterizer: &dyn Rasterizer,
    out_dir: &Path,
    opts: &BuildOptions,
) -> anyhow::Result<BuildSummary> {
    std::fs::create_dir_all(out_dir).with_context(|| format!("create {}", out_dir.display()))?;
    for font in fonts {
        if opts.image_size < font.size {
            tracing::warn!(
                font = %font.name,
                font_size = font.size,
                image_size = opts.image_size,
                "image size is smaller than font size; glyphs may be clipped"
            );
        }
    }

    let blob_path = out_dir.join(BLOB_FILENAME);
    let metadata_path = out_dir.join(METADATA_FILENAME);
    let mut backups = Vec::new();
    for path in [&blob_path, &metadata_path] {
        if let Some(b) = backup_by_modified_time(path)
            .with_context(|| format!("back up {}", path.display()))?
        {
            backups.push(b);
        }
    }

    let mut metadata = DatasetMetadata::new(
        label_file.source.clone(),
        label_file.content.clone(),
        label_file.labels.clone(),
    );
    let mut writer =
        BlobWriter::create(&blob_path).with_context(|| format!("create {}", blob_path.display()))?;

    for label in &label_file.labels {
        let outcomes = render_label(rasterizer, label, fonts, opts)?;
        for (font, outcome) in fonts.iter().zip(outcomes) {
            match outcome {
                Outcome::Unsupported => metadata
                    .unsupported_combinations
                    .push(Combination::new(label.as_str(), font.name.as_str())),
                Outcome::Blank => metadata
                    .blank_combinations
                    .push(Combination::new(label.as_str(), font.name.as_str())),
                Outcome::Rendered { png, width, height } => {
                    let hash = content_hash(&png);
                    let (seek_start, seek_end) = writer
                        .append(&png)
                        .with_context(|| format!("append to {}", blob_path.display()))?;
                    metadata.records.push(Record {
                        hash,
                        character: label.clone(),
                        font_name: font.name.clone(),
                        width,
                        height,
                        depth: IMAGE_DEPTH,
                        font_size: font.size,
                        seek_start,
                        seek_end,
                    });
                }
            }
        }
        tracing::debug!(label = %label, records = metadata.records.len(), "label rendered");
    }

    let blob_bytes = writer
        .finish()
        .with_context(|| format!("flush {}", blob_path.display()))?;
    kanjiset_format::save_metadata(&metadata, &metadata_path)
        .with_context(|| format!("write {}", metadata_path.display()))?;

    let summary = BuildSummary {
        out_dir: out_dir.to_path_buf(),
        labels: metadata.labels.len(),
        fonts: fonts.len(),
        records: metadata.records.len(),
        blank: metadata.blank_combinations.len(),
        unsupported: metadata.unsupported_combinations.len(),
        blob_bytes,
        backups,
    };
    tracing::info!(
        out_dir = %out_dir.display(),
        records = summary.records,
        blank = summary.blank,
        unsupported = summary.unsupported,
        "dataset built"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use kanjiset_format::{load_metadata, validate_container, BlobReader};
    use std::collections::BTreeSet;

    /// Draws a bar whose width depends on the character and font; `・` is blank.
    struct FakeRasterizer;

    impl Rasterizer for FakeRasterizer {
        fn render(
            &self,
            character: &str,
            font: &Font,
            image_size: u32,
        ) -> Result<Option<GrayImage>, RenderError> {
            if character == "・" {
                return Ok(None);
            }
            if font.name == "Broken" {
                return Err(RenderError::FontNotLoaded {
                    font: font.name.clone(),
                });
            }
            let seed = character.chars().map(u32::from).sum::<u32>() + font.name.len() as u32;
            let mut img = GrayImage::new(image_size, image_size);
            for x in 0..(seed % image_size).max(1) {
                img.put_pixel(x, 0, Luma([255]));
            }
            Ok(Some(img))
        }
    }

    fn font(name: &str, supported: &[&str]) -> Font {
        Font {
            display_name: name.into(),
            name: name.into(),
            size: 8,
            path: PathBuf::from(format!("{name}.ttf")),
            supported: supported.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
        }
    }

    fn labels(chars: &[&str]) -> LabelFile {
        LabelFile {
            source: "kana.txt".into(),
            content: chars.concat(),
            labels: chars.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn opts(jobs: usize) -> BuildOptions {
        BuildOptions {
            image_size: 8,
            jobs,
        }
    }

    #[test]
    fn builds_label_major_with_soft_buckets() {
        let dir = tempfile::tempdir().unwrap();
        let fonts = vec![font("A", &["あ", "い", "・"]), font("BB", &["あ", "・"])];
        let summary =
            build_dataset(&labels(&["あ", "い", "・"]), &fonts, &FakeRasterizer, dir.path(), &opts(1))
                .unwrap();
        assert_eq!(summary.records, 3);
        assert_eq!(summary.unsupported, 1);
        assert_eq!(summary.blank, 2);

        let m = load_metadata(dir.path().join(METADATA_FILENAME)).unwrap();
        let order: Vec<(&str, &str)> = m
            .records
            .iter()
            .map(|r| (r.character.as_str(), r.font_name.as_str()))
            .collect();
        assert_eq!(order, vec![("あ", "A"), ("あ", "BB"), ("い", "A")]);
        assert_eq!(m.unsupported_combinations, vec![Combination::new("い", "BB")]);
        assert_eq!(
            m.blank_combinations,
            vec![Combination::new("・", "A"), Combination::new("・", "BB")]
        );

        let blob_len = std::fs::metadata(dir.path().join(BLOB_FILENAME)).unwrap().len();
        assert_eq!(blob_len, summary.blob_bytes);
        validate_container(&m, blob_len).unwrap();

        let mut reader = BlobReader::open(dir.path().join(BLOB_FILENAME)).unwrap();
        for r in &m.records {
            let bytes = reader.read_range(r.seek_start, r.seek_end).unwrap();
            assert_eq!(content_hash(&bytes), r.hash);
            let img = image::load_from_memory(&bytes).unwrap();
            assert_eq!((img.width(), img.height()), (8, 8));
            assert_eq!(r.depth, 1);
            assert_eq!(r.font_size, 8);
        }
    }

    #[test]
    fn parallel_build_matches_serial_output() {
        let fonts: Vec<Font> = ["A", "BB", "CCC", "DDDD", "EEEEE"]
            .iter()
            .map(|n| font(n, &["あ", "い", "う"]))
            .collect();
        let lf = labels(&["あ", "い", "う"]);

        let serial = tempfile::tempdir().unwrap();
        let parallel = tempfile::tempdir().unwrap();
        build_dataset(&lf, &fonts, &FakeRasterizer, serial.path(), &opts(1)).unwrap();
        build_dataset(&lf, &fonts, &FakeRasterizer, parallel.path(), &opts(3)).unwrap();

        for name in [BLOB_FILENAME, METADATA_FILENAME] {
            assert_eq!(
                std::fs::read(serial.path().join(name)).unwrap(),
                std::fs::read(parallel.path().join(name)).unwrap(),
                "{name} differs"
            );
        }
    }

    #[test]
    fn rebuilding_backs_up_previous_container() {
        let dir = tempfile::tempdir().unwrap();
        let fonts = vec![font("A", &["あ"])];
        let lf = labels(&["あ"]);
        build_dataset(&lf, &fonts, &FakeRasterizer, dir.path(), &opts(1)).unwrap();
        let old_blob = std::fs::read(dir.path().join(BLOB_FILENAME)).unwrap();

        let summary = build_dataset(&lf, &fonts, &FakeRasterizer, dir.path(), &opts(1)).unwrap();
        assert_eq!(summary.backups.len(), 2);
        let blob_backup = summary
            .backups
            .iter()
            .find(|p| p.to_string_lossy().ends_with(BLOB_FILENAME))
            .unwrap();
        assert_eq!(std::fs::read(blob_backup).unwrap(), old_blob);
    }

    #[test]
    fn hard_render_errors_abort_without_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let fonts = vec![font("Broken", &["あ"])];
        let err =
            build_dataset(&labels(&["あ"]), &fonts, &FakeRasterizer, dir.path(), &opts(1)).unwrap_err();
        assert!(format!("{err:#}").contains("Broken"));
        assert!(!dir.path().join(METADATA_FILENAME).exists());
    }
}
