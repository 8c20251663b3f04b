use clap::builder::RangedU64ValueParser;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "kanjiset",
    version,
    about = "Build, audit and compact rendered Japanese character datasets.",
    long_about = "Build, audit and compact rendered Japanese character datasets.\n\nNotes:\n  - A dataset is a directory holding `images.bin` (concatenated PNGs) and `metadata.json`.\n  - Files are never edited in place: rewrites back up the previous file as `{mtime}-{name}`.\n  - Build settings come from defaults, then `kanjiset.json` in the working directory, then flags."
)]
pub(crate) struct Cli {
    /// Emit machine-readable JSON instead of human output.
    #[arg(long, global = true)]
    pub(crate) json: bool,

    #[command(subcommand)]
    pub(crate) cmd: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Turn a text file into a label file (one label per character).
    Labels {
        /// UTF-8 text file with the characters to label.
        infile: String,
        /// Output label file (backed up if it exists).
        #[arg(long, default_value = "labels.json")]
        out: String,
        /// Sort labels by Unicode code point.
        #[arg(long)]
        sort: bool,
    },
    /// Render every (label, font) pair into a new dataset.
    Build {
        /// Label file produced by `labels`.
        #[arg(long, default_value = "labels.json")]
        labels: String,
        /// Dataset name (defaults to the label source file stem).
        #[arg(long)]
        name: Option<String>,
        /// Directory of `.ttf`/`.otf` fonts.
        #[arg(long)]
        fonts: Option<String>,
        /// Directory that holds datasets.
        #[arg(long)]
        datasets: Option<String>,
        /// Font size in pixels.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        font_size: Option<u32>,
        /// Output image edge in pixels.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        image_size: Option<u32>,
        /// Render worker threads.
        #[arg(long, short = 'j', value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
        jobs: Option<usize>,
    },
    /// List datasets under a directory.
    List {
        /// Directory that holds datasets.
        #[arg(long)]
        root: Option<String>,
    },
    /// Check that a dataset's metadata matches its blob.
    Validate {
        /// Dataset directory.
        dataset: String,
    },
    /// Summarize a dataset, or list the records of one label.
    Inspect {
        /// Dataset directory.
        dataset: String,
        /// Label to list records for.
        #[arg(long)]
        label: Option<String>,
    },
    /// Report records that share a content hash.
    Duplicates {
        /// Dataset directory.
        dataset: String,
    },
    /// Mark a record, font or label and save the metadata.
    Mark {
        /// Dataset directory.
        dataset: String,
        /// What to mark.
        #[arg(value_enum)]
        kind: MarkKind,
        /// Record hash, font name or label.
        value: String,
    },
    /// Write a copy of a dataset without invalid records and fonts.
    Compact {
        /// Dataset directory (omit with `--root`).
        #[arg(required_unless_present = "root", conflicts_with = "root")]
        dataset: Option<String>,
        /// Output directory (defaults to `<dataset>/inspected`).
        #[arg(long, conflicts_with = "root")]
        out: Option<String>,
        /// Compact every dataset under this directory.
        #[arg(long)]
        root: Option<String>,
    },
    /// Write the label-to-index mapping used by trained models.
    Mapping {
        /// Dataset directory or label file.
        source: String,
        /// Output JSON path (backed up if it exists).
        #[arg(long, default_value = "mapping.json")]
        out: String,
    },
    /// Export one contact-sheet PNG per label.
    Export {
        /// Dataset directory.
        dataset: String,
        /// Output directory (defaults to `<dataset>/exported_images`).
        #[arg(long)]
        out: Option<String>,
    },
    /// Serve the JSON inspection API.
    Web {
        /// Directory that holds datasets.
        #[arg(long)]
        root: Option<String>,
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum MarkKind {
    RecordInvalid,
    RecordValid,
    FontInvalid,
    FontValid,
    LabelComplete,
    LabelIncomplete,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parses_defaults() {
        let cli = Cli::try_parse_from(["kanjiset", "labels", "kana.txt"]).expect("parse should succeed");
        match cli.cmd {
            Command::Labels { infile, out, sort } => {
                assert_eq!(infile, "kana.txt");
                assert_eq!(out, "labels.json");
                assert!(!sort);
            }
            _ => panic!("expected labels command"),
        }
    }

    #[test]
    fn build_accepts_short_jobs_and_overrides() {
        let cli = Cli::try_parse_from([
            "kanjiset",
            "build",
            "-j",
            "4",
            "--image-size",
            "48",
            "--name",
            "kana",
        ])
        .expect("parse should succeed");
        match cli.cmd {
            Command::Build {
                jobs,
                image_size,
                font_size,
                name,
                labels,
                ..
            } => {
                assert_eq!(jobs, Some(4));
                assert_eq!(image_size, Some(48));
                assert_eq!(font_size, None);
                assert_eq!(name.as_deref(), Some("kana"));
                assert_eq!(labels, "labels.json");
            }
            _ => panic!("expected build command"),
        }
    }

    #[test]
    fn build_rejects_zero_sizes() {
        for flag in ["--font-size", "--image-size", "--jobs"] {
            assert!(
                Cli::try_parse_from(["kanjiset", "build", flag, "0"]).is_err(),
                "{flag} 0 should be rejected"
            );
        }
        assert!(Cli::try_parse_from(["kanjiset", "build", "--image-size", "1"]).is_ok());
    }

    #[test]
    fn json_flag_is_global() {
        let cli = Cli::try_parse_from(["kanjiset", "list", "--json"]).expect("parse should succeed");
        assert!(cli.json);
    }

    #[test]
    fn mark_kind_uses_kebab_case() {
        let cli = Cli::try_parse_from(["kanjiset", "mark", "datasets/kana", "font-invalid", "Noto_Regular"])
            .expect("parse should succeed");
        match cli.cmd {
            Command::Mark { kind, value, .. } => {
                assert_eq!(kind, MarkKind::FontInvalid);
                assert_eq!(value, "Noto_Regular");
            }
            _ => panic!("expected mark command"),
        }
        assert!(Cli::try_parse_from(["kanjiset", "mark", "d", "bogus", "x"]).is_err());
    }

    #[test]
    fn compact_needs_dataset_or_root() {
        assert!(Cli::try_parse_from(["kanjiset", "compact"]).is_err());
        assert!(Cli::try_parse_from(["kanjiset", "compact", "d", "--root", "r"]).is_err());
        let cli = Cli::try_parse_from(["kanjiset", "compact", "--root", "datasets"])
            .expect("parse should succeed");
        match cli.cmd {
            Command::Compact { dataset, root, .. } => {
                assert_eq!(dataset, None);
                assert_eq!(root.as_deref(), Some("datasets"));
            }
            _ => panic!("expected compact command"),
        }
    }
}
