//! Interface de linha de comando do zero-entry baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (run, export,
//! barcodes) e flags globais (--config, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Types zero-quantity identifiers from an inventory export into a focused GUI.
#[derive(Debug, Parser)]
#[command(name = "zero-entry", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to $ZERO_ENTRY_CONFIG or zero-entry.toml).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enables debug logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// Subcomandos disponíveis.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extracts the work list and types it into the focused window.
    Run {
        /// Path to the exported table (.xls/.xlsx, HTML exports included).
        file: PathBuf,

        /// Logs keystrokes instead of sending them.
        #[arg(long)]
        dry_run: bool,

        /// Writes the run report as JSON to this path.
        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,
    },

    /// Writes the extracted identifiers to a file and exits.
    Export {
        /// Path to the exported table.
        file: PathBuf,

        /// Output file.
        #[arg(long, short, default_value = "extracted_upcs.txt", value_name = "PATH")]
        out: PathBuf,

        /// Skips the exclusion and special lists (zero-quantity output only).
        #[arg(long)]
        raw: bool,

        /// Output format.
        #[arg(long, value_enum, default_value_t = ExportFormat::Lines)]
        format: ExportFormat,
    },

    /// Prints the work list as a Code 39 label sheet (PDF).
    Barcodes {
        /// Path to the exported table.
        file: PathBuf,

        /// Output PDF (defaults to zero_export_<count>_items.pdf).
        #[arg(long, short, value_name = "PATH")]
        out: Option<PathBuf>,
    },
}

/// Formato do arquivo gerado por `export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// One identifier per line.
    Lines,
    /// JSON array of {identifier, protocol}.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_run_subcommand() {
        let cli = Cli::parse_from(["zero-entry", "run", "stock.xls", "--dry-run"]);
        match cli.command {
            Command::Run {
                file,
                dry_run,
                report,
            } => {
                assert_eq!(file, PathBuf::from("stock.xls"));
                assert!(dry_run);
                assert!(report.is_none());
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from([
            "zero-entry",
            "--config",
            "site.toml",
            "--verbose",
            "run",
            "stock.xls",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("site.toml")));
    }

    #[test]
    fn cli_parses_export_defaults() {
        let cli = Cli::parse_from(["zero-entry", "export", "stock.xls"]);
        match cli.command {
            Command::Export {
                out, raw, format, ..
            } => {
                assert_eq!(out, PathBuf::from("extracted_upcs.txt"));
                assert!(!raw);
                assert_eq!(format, ExportFormat::Lines);
            }
            _ => panic!("expected Export command"),
        }
    }

    #[test]
    fn cli_parses_export_json() {
        let cli = Cli::parse_from([
            "zero-entry",
            "export",
            "stock.xls",
            "--format",
            "json",
            "-o",
            "list.json",
            "--raw",
        ]);
        match cli.command {
            Command::Export {
                out, raw, format, ..
            } => {
                assert_eq!(out, PathBuf::from("list.json"));
                assert!(raw);
                assert_eq!(format, ExportFormat::Json);
            }
            _ => panic!("expected Export command"),
        }
    }

    #[test]
    fn cli_parses_barcodes() {
        let cli = Cli::parse_from(["zero-entry", "barcodes", "stock.xls"]);
        match cli.command {
            Command::Barcodes { file, out } => {
                assert_eq!(file, PathBuf::from("stock.xls"));
                assert!(out.is_none());
            }
            _ => panic!("expected Barcodes command"),
        }
        let cli = Cli::parse_from(["zero-entry", "barcodes", "stock.xls", "-o", "labels.pdf"]);
        assert!(matches!(
            cli.command,
            Command::Barcodes { out: Some(ref p), .. } if p == &PathBuf::from("labels.pdf")
        ));
    }

    #[test]
    fn run_requires_a_file() {
        assert!(Cli::try_parse_from(["zero-entry", "run"]).is_err());
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
