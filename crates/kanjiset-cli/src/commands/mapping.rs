use std::path::Path;

use kanjiset_core::defaults::METADATA_FILENAME;
use kanjiset_ops::Dataset;

use crate::types::MappingJson;
use crate::util::path_string;

/// Labels of a dataset directory, or of a label file.
fn source_labels(source: &Path) -> anyhow::Result<Vec<String>> {
    if source.is_dir() && source.join(METADATA_FILENAME).is_file() {
        return Ok(Dataset::open(source)?.metadata.labels);
    }
    Ok(kanjiset_ops::load_label_file(source)?.labels)
}

pub(crate) fn cmd_mapping(source: &str, out: &str, json: bool) -> anyhow::Result<()> {
    let labels = source_labels(Path::new(source))?;
    let backup = kanjiset_ops::write_label_mapping(&labels, Path::new(out))?;
    if json {
        let payload = MappingJson {
            outfile: out,
            labels: labels.len(),
            backup: backup.as_deref().map(path_string),
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }
    println!("Wrote mapping for {} labels to {out}", labels.len());
    if let Some(b) = backup {
        println!("Previous file backed up to {}", b.display());
    }
    Ok(())
}
