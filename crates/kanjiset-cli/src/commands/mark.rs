use std::path::Path;

use kanjiset_ops::{Dataset, Mark};

use crate::cli::MarkKind;
use crate::types::MarkJson;

fn to_mark(kind: MarkKind, value: &str) -> Mark {
    let v = value.to_string();
    match kind {
        MarkKind::RecordInvalid => Mark::RecordInvalid(v),
        MarkKind::RecordValid => Mark::RecordValid(v),
        MarkKind::FontInvalid => Mark::FontInvalid(v),
        MarkKind::FontValid => Mark::FontValid(v),
        MarkKind::LabelComplete => Mark::LabelCompleted(v),
        MarkKind::LabelIncomplete => Mark::LabelIncompleted(v),
    }
}

fn kind_name(kind: MarkKind) -> &'static str {
    match kind {
        MarkKind::RecordInvalid => "record-invalid",
        MarkKind::RecordValid => "record-valid",
        MarkKind::FontInvalid => "font-invalid",
        MarkKind::FontValid => "font-valid",
        MarkKind::LabelComplete => "label-complete",
        MarkKind::LabelIncomplete => "label-incomplete",
    }
}

pub(crate) fn cmd_mark(dataset: &str, kind: MarkKind, value: &str, json: bool) -> anyhow::Result<()> {
    let mut ds = Dataset::open(Path::new(dataset))?;
    let changed = kanjiset_ops::apply_mark(&mut ds, &to_mark(kind, value))?;
    if json {
        let out = MarkJson {
            dataset: &ds.name,
            mark: kind_name(kind),
            value,
            changed,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    if changed {
        println!("Marked {value} as {} in {}", kind_name(kind), ds.name);
    } else {
        println!("{value} already {} in {}; nothing to do", kind_name(kind), ds.name);
    }
    Ok(())
}
