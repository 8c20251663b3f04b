//! On-disk container for a dataset: `images.bin` (concatenated PNG payloads)
//! plus `metadata.json` describing every payload's byte range.

pub mod backup;
pub mod blob;
pub mod metadata;
pub mod validate;

pub use backup::backup_by_modified_time;
pub use blob::{BlobReader, BlobWriter};
pub use metadata::{
    load_metadata, parse_metadata, save_json_with_backup, save_metadata, to_pretty_json,
};
pub use validate::{validate_container, ValidationReport};
