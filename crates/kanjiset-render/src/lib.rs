//! Font discovery and glyph rasterization for dataset builds.

pub mod font;
pub mod rasterizer;

pub use font::{duplicate_font_names, load_font, load_fonts, missing_labels};
pub use rasterizer::{center_crop, GlyphRasterizer, Rasterizer, RenderError};
