use std::collections::HashMap;

use ab_glyph::{FontArc, PxScale};
use anyhow::Context;
use image::{GrayImage, Luma};
use imageproc::drawing::draw_text_mut;
use kanjiset_core::types::Font;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("font {font:?} has no glyph for {character:?}")]
    Unsupported { character: String, font: String },

    #[error("font {font:?} was not loaded by this rasterizer")]
    FontNotLoaded { font: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Turns one `(character, font)` pair into a grayscale bitmap.
///
/// `Ok(None)` means the font drew nothing (blank); `Err(Unsupported)` means
/// the font does not cover the character.
pub trait Rasterizer: Sync {
    fn render(
        &self,
        character: &str,
        font: &Font,
        image_size: u32,
    ) -> Result<Option<GrayImage>, RenderError>;
}

/// Rasterizer backed by the real font files.
pub struct GlyphRasterizer {
    faces: HashMap<String, FontArc>,
}

impl GlyphRasterizer {
    pub fn new(fonts: &[Font]) -> anyhow::Result<Self> {
        let mut faces = HashMap::with_capacity(fonts.len());
        for font in fonts {
            let bytes = std::fs::read(&font.path)
                .with_context(|| format!("read {}", font.path.display()))?;
            let face = FontArc::try_from_vec(bytes)
                .with_context(|| format!("parse font {}", font.path.display()))?;
            if faces.insert(font.name.clone(), face).is_some() {
                tracing::warn!(
                    font = %font.name,
                    path = %font.path.display(),
                    "font name already loaded; this file replaces the earlier face"
                );
            }
        }
        Ok(Self { faces })
    }
}

impl Rasterizer for GlyphRasterizer {
    fn render(
        &self,
        character: &str,
        font: &Font,
        image_size: u32,
    ) -> Result<Option<GrayImage>, RenderError> {
        if !font.supports(character) {
            return Err(RenderError::Unsupported {
                character: character.to_string(),
                font: font.name.clone(),
            });
        }
        let face = self
            .faces
            .get(&font.name)
            .ok_or_else(|| RenderError::FontNotLoaded {
                font: font.name.clone(),
            })?;

        let canvas_size = (font.size * 2).max(image_size);
        let mut canvas = GrayImage::new(canvas_size, canvas_size);
        let origin = ((canvas_size - font.size) / 2) as i32;
        let scale = PxScale::from(font.size as f32);
        draw_text_mut(&mut canvas, Luma([255u8]), origin, origin, scale, face, character);

        let image = center_crop(&canvas, image_size);
        if image.is_none() {
            tracing::warn!(font = %font.name, character, "blank render");
        }
        Ok(image)
    }
}

/// Crop an `image_size` square out of `canvas`, centered on the bounding box
/// of its non-zero pixels. Returns `None` for an all-zero canvas. Pixels that
/// fall outside the canvas are black.
pub fn center_crop(canvas: &GrayImage, image_size: u32) -> Option<GrayImage> {
    let mut bbox: Option<(u32, u32, u32, u32)> = None;
    for (x, y, px) in canvas.enumerate_pixels() {
        if px.0[0] == 0 {
            continue;
        }
        bbox = Some(match bbox {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    let (min_x, min_y, max_x, max_y) = bbox?;

    let size = i64::from(image_size);
    let offset_x = i64::from(min_x) - (size - i64::from(max_x - min_x)) / 2;
    let offset_y = i64::from(min_y) - (size - i64::from(max_y - min_y)) / 2;

    let (cw, ch) = (i64::from(canvas.width()), i64::from(canvas.height()));
    let mut out = GrayImage::new(image_size, image_size);
    for (x, y, px) in out.enumerate_pixels_mut() {
        let sx = offset_x + i64::from(x);
        let sy = offset_y + i64::from(y);
        if (0..cw).contains(&sx) && (0..ch).contains(&sy) {
            *px = *canvas.get_pixel(sx as u32, sy as u32);
        }
    }
    Some(out)
}
