pub mod audit;
pub mod build;
pub mod compact;
pub mod datasets;
pub mod export;
pub mod labels;
pub mod mapping;
pub mod settings;
#[cfg(test)]
pub(crate) mod testutil;

// Re-export commonly used types for convenience
pub use audit::{apply_mark, fetch_images, find_duplicate_hashes, Mark};
pub use build::{build_dataset, BuildOptions, BuildSummary};
pub use compact::{compact_dataset, compact_root, CompactSummary};
pub use datasets::{discover_datasets, Dataset};
pub use export::export_contact_sheets;
pub use labels::{create_label_file, load_label_file};
pub use mapping::{label_mapping, write_label_mapping, LabelMapping};
pub use settings::{ResolvedSettings, SettingsPatch};
