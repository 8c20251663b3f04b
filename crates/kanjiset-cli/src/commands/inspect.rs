use std::path::Path;

use kanjiset_ops::Dataset;

use crate::types::{InspectJson, LabelRecordJson};

pub(crate) fn cmd_inspect(dataset: &str, label: Option<&str>, json: bool) -> anyhow::Result<()> {
    let ds = Dataset::open(Path::new(dataset))?;
    let m = &ds.metadata;

    if let Some(label) = label {
        if m.label_index(label).is_none() {
            anyhow::bail!("label {label:?} is not in dataset {}", ds.name);
        }
        let rows: Vec<LabelRecordJson> = m
            .records_for_label(label)
            .map(|r| LabelRecordJson {
                hash: &r.hash,
                font_name: &r.font_name,
                width: r.width,
                height: r.height,
                seek_start: r.seek_start,
                seek_end: r.seek_end,
                invalid: m.is_excluded(r),
            })
            .collect();
        if json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }
        let completed = if m.is_label_completed(label) {
            " (completed)"
        } else {
            ""
        };
        println!("{label}: {} records{completed}", rows.len());
        for r in &rows {
            let flag = if r.invalid { "  invalid" } else { "" };
            println!(
                "  {}  {}  {}x{}  [{}, {}){flag}",
                r.hash, r.font_name, r.width, r.height, r.seek_start, r.seek_end
            );
        }
        return Ok(());
    }

    let out = InspectJson {
        name: &ds.name,
        source: &m.source,
        labels: &m.labels,
        fonts: m.fonts().into_iter().collect(),
        records: m.records.len(),
        invalid_records: &m.invalid_records,
        invalid_fonts: &m.invalid_fonts,
        completed_labels: &m.completed_labels,
        blank_combinations: m.blank_combinations.len(),
        unsupported_combinations: m.unsupported_combinations.len(),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    println!("Dataset: {}", out.name);
    println!("Source: {}", out.source);
    println!(
        "Labels: {} ({} completed)",
        out.labels.len(),
        out.completed_labels.len()
    );
    println!("Fonts: {}", out.fonts.join(", "));
    println!("Records: {}", out.records);
    println!("Invalid records: {}", out.invalid_records.len());
    println!("Invalid fonts: {}", out.invalid_fonts.join(", "));
    println!(
        "Blank/unsupported combinations: {}/{}",
        out.blank_combinations, out.unsupported_combinations
    );
    Ok(())
}
