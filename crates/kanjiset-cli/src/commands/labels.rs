use std::path::Path;

use crate::types::LabelsJson;
use crate::util::path_string;

pub(crate) fn cmd_labels(infile: &str, out: &str, sort: bool, json: bool) -> anyhow::Result<()> {
    let (label_file, backup) =
        kanjiset_ops::create_label_file(Path::new(infile), Path::new(out), sort)?;
    if json {
        let payload = LabelsJson {
            outfile: out,
            source: &label_file.source,
            labels: &label_file.labels,
            backup: backup.as_deref().map(path_string),
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }
    println!(
        "Wrote {} labels from {} to {}",
        label_file.labels.len(),
        label_file.source,
        out
    );
    if let Some(b) = backup {
        println!("Previous file backed up to {}", b.display());
    }
    Ok(())
}
