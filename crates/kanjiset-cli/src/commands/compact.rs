use std::path::{Path, PathBuf};

use kanjiset_ops::compact::default_output_dir;
use kanjiset_ops::{CompactSummary, Dataset};

use crate::util::fmt_bytes_human;

pub(crate) fn cmd_compact(
    dataset: Option<&str>,
    out: Option<&str>,
    root: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let summaries: Vec<CompactSummary> = match (dataset, root) {
        (Some(dataset), _) => {
            let ds = Dataset::open(Path::new(dataset))?;
            let out_dir = out.map_or_else(|| default_output_dir(&ds), PathBuf::from);
            vec![kanjiset_ops::compact_dataset(&ds, &out_dir)?]
        }
        (None, Some(root)) => kanjiset_ops::compact_root(Path::new(root))?,
        (None, None) => anyhow::bail!("pass a dataset directory or --root"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }
    if summaries.is_empty() {
        println!("Nothing compacted.");
    }
    for s in &summaries {
        println!(
            "{}: kept {}, dropped {} -> {} ({})",
            s.dataset,
            s.kept,
            s.dropped,
            s.out_dir.display(),
            fmt_bytes_human(s.blob_bytes)
        );
    }
    Ok(())
}
