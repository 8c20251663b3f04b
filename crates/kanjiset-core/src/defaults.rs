/// Directory scanned for dataset sub-directories.
pub const DATASETS_DIR: &str = "datasets";
/// Directory scanned for `.ttf` / `.otf` files.
pub const FONTS_DIR: &str = "fonts";
pub const METADATA_FILENAME: &str = "metadata.json";
pub const BLOB_FILENAME: &str = "images.bin";
/// Sub-directory of a dataset that receives its compacted container.
pub const INSPECTED_DIRNAME: &str = "inspected";
pub const LABEL_FILENAME: &str = "labels.json";
pub const EXPORT_DIRNAME: &str = "exported_images";
/// Optional settings file read from the working directory.
pub const SETTINGS_FILENAME: &str = "kanjiset.json";

pub const FONT_SIZE: u32 = 64;
pub const IMAGE_SIZE: u32 = 64;
/// Grayscale payloads.
pub const IMAGE_DEPTH: u32 = 1;
