use crate::cli::{Cli, Command};

pub(crate) fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.cmd {
        Command::Labels { infile, out, sort } => {
            crate::commands::labels::cmd_labels(&infile, &out, sort, cli.json)
        }
        Command::Build {
            labels,
            name,
            fonts,
            datasets,
            font_size,
            image_size,
            jobs,
        } => crate::commands::build::cmd_build(
            &labels,
            name.as_deref(),
            fonts.as_deref(),
            datasets.as_deref(),
            font_size,
            image_size,
            jobs,
            cli.json,
        ),
        Command::List { root } => crate::commands::list::cmd_list(root.as_deref(), cli.json),
        Command::Validate { dataset } => crate::commands::validate::cmd_validate(&dataset, cli.json),
        Command::Inspect { dataset, label } => {
            crate::commands::inspect::cmd_inspect(&dataset, label.as_deref(), cli.json)
        }
        Command::Duplicates { dataset } => {
            crate::commands::duplicates::cmd_duplicates(&dataset, cli.json)
        }
        Command::Mark {
            dataset,
            kind,
            value,
        } => crate::commands::mark::cmd_mark(&dataset, kind, &value, cli.json),
        Command::Compact { dataset, out, root } => crate::commands::compact::cmd_compact(
            dataset.as_deref(),
            out.as_deref(),
            root.as_deref(),
            cli.json,
        ),
        Command::Mapping { source, out } => {
            crate::commands::mapping::cmd_mapping(&source, &out, cli.json)
        }
        Command::Export { dataset, out } => {
            crate::commands::export::cmd_export(&dataset, out.as_deref(), cli.json)
        }
        Command::Web { root, bind } => {
            if cli.json {
                anyhow::bail!("--json is not supported for web");
            }
            crate::commands::web::cmd_web(root.as_deref(), &bind)
        }
    }
}
