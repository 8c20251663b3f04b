use std::path::{Path, PathBuf};

use kanjiset_core::defaults::EXPORT_DIRNAME;
use kanjiset_ops::Dataset;

pub(crate) fn cmd_export(dataset: &str, out: Option<&str>, json: bool) -> anyhow::Result<()> {
    let ds = Dataset::open(Path::new(dataset))?;
    let out_dir = out.map_or_else(|| ds.dir.join(EXPORT_DIRNAME), PathBuf::from);
    let summary = kanjiset_ops::export_contact_sheets(&ds, &out_dir)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    println!(
        "Exported {} sheets ({} images) to {}",
        summary.sheets,
        summary.images,
        summary.out_dir.display()
    );
    if let Some(b) = &summary.backup {
        println!("Previous export backed up to {}", b.display());
    }
    Ok(())
}
