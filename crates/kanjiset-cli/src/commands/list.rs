use kanjiset_ops::Dataset;

use crate::types::ListEntryJson;
use crate::util::{datasets_root, fmt_bytes_human, fmt_u64_commas, path_string};

#[derive(Debug, Clone, PartialEq, Eq)]
struct ListedDataset {
    name: String,
    labels: usize,
    fonts: usize,
    records: usize,
    blob_bytes: u64,
}

pub(crate) fn cmd_list(root: Option<&str>, json: bool) -> anyhow::Result<()> {
    let root = datasets_root(root)?;
    let datasets = kanjiset_ops::discover_datasets(&root)?;
    if json {
        let out: Vec<ListEntryJson> = datasets
            .iter()
            .map(|d| ListEntryJson {
                name: d.name.clone(),
                path: path_string(&d.dir),
                labels: d.metadata.labels.len(),
                fonts: d.metadata.fonts().len(),
                records: d.metadata.records.len(),
                invalid_records: d.metadata.invalid_records.len(),
                invalid_fonts: d.metadata.invalid_fonts.len(),
                completed_labels: d.metadata.completed_labels.len(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if datasets.is_empty() {
        println!("No datasets found in {}.", root.display());
        return Ok(());
    }

    let rows: Vec<ListedDataset> = datasets.iter().map(listed).collect();
    print_table(&rows);
    Ok(())
}

fn listed(d: &Dataset) -> ListedDataset {
    let blob_bytes = std::fs::metadata(d.blob_path()).map(|m| m.len()).unwrap_or(0);
    ListedDataset {
        name: d.name.clone(),
        labels: d.metadata.labels.len(),
        fonts: d.metadata.fonts().len(),
        records: d.metadata.records.len(),
        blob_bytes,
    }
}

fn print_table(rows: &[ListedDataset]) {
    let cells: Vec<[String; 5]> = rows
        .iter()
        .map(|r| {
            [
                r.name.clone(),
                fmt_u64_commas(r.labels as u64),
                fmt_u64_commas(r.fonts as u64),
                fmt_u64_commas(r.records as u64),
                fmt_bytes_human(r.blob_bytes),
            ]
        })
        .collect();
    let headers = ["Dataset", "Labels", "Fonts", "Records", "Blob"];
    let mut widths = headers.map(str::len);
    for row in &cells {
        for (w, c) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(c.chars().count());
        }
    }

    println!(
        "{:<w0$}  {:>w1$}  {:>w2$}  {:>w3$}  {:>w4$}",
        headers[0],
        headers[1],
        headers[2],
        headers[3],
        headers[4],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
        w3 = widths[3],
        w4 = widths[4],
    );
    for row in &cells {
        println!(
            "{:<w0$}  {:>w1$}  {:>w2$}  {:>w3$}  {:>w4$}",
            row[0],
            row[1],
            row[2],
            row[3],
            row[4],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
            w3 = widths[3],
            w4 = widths[4],
        );
    }
}
