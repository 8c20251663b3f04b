use std::path::Path;

use kanjiset_ops::Dataset;

use crate::types::{DuplicateGroupJson, DuplicateMemberJson};

pub(crate) fn cmd_duplicates(dataset: &str, json: bool) -> anyhow::Result<()> {
    let ds = Dataset::open(Path::new(dataset))?;
    let m = &ds.metadata;
    let groups: Vec<DuplicateGroupJson> = kanjiset_ops::find_duplicate_hashes(m)
        .into_iter()
        .map(|(hash, records)| DuplicateGroupJson {
            hash,
            records: records
                .into_iter()
                .map(|r| DuplicateMemberJson {
                    character: &r.character,
                    font_name: &r.font_name,
                    invalid: m.is_excluded(r),
                })
                .collect(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }
    if groups.is_empty() {
        println!("No duplicate images in {}.", ds.name);
        return Ok(());
    }
    for g in &groups {
        println!("{} ({} records)", g.hash, g.records.len());
        for r in &g.records {
            let flag = if r.invalid { "  invalid" } else { "" };
            println!("  {}  {}{flag}", r.character, r.font_name);
        }
    }
    Ok(())
}
