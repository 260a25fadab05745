mod barcode;
mod cli;
mod config;
mod dispatch;
mod error;
mod export;
mod extract;
mod input;
mod lists;
mod pipeline;
mod state_machine;
mod ui;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Cli, Command, ExportFormat};
use config::ZeroEntryConfig;
use dispatch::Dispatcher;
use error::{ZeroEntryError, EXIT_FATAL, EXIT_OK};
use input::dry_run::DryRunInput;
use input::{InputSink, SignalSource};
use lists::IdentifierList;
use pipeline::WorkList;
use state_machine::RunReport;
use ui::{RunProgress, StdinGate};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let dry_run = matches!(cli.command, Command::Run { dry_run: true, .. });
    init_tracing(cli.verbose, dry_run);

    let config_path = ZeroEntryConfig::resolve_path(cli.config.as_deref());
    let result = match ZeroEntryConfig::load(&config_path) {
        Ok(config) => match cli.command {
            Command::Run { file, dry_run, report } => {
                run_command(&file, dry_run, report.as_deref(), &config, cli.verbose).await
            }
            Command::Export {
                file,
                out,
                raw,
                format,
            } => export_command(&file, &out, raw, format, &config),
            Command::Barcodes { file, out } => barcodes_command(&file, out, &config),
        },
        Err(e) => Err(anyhow::Error::new(e)
            .context(format!("failed to load {}", config_path.display()))),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_OK),
        Err(err) => {
            let code = err
                .downcast_ref::<ZeroEntryError>()
                .map(ZeroEntryError::exit_code)
                .unwrap_or(EXIT_FATAL);
            match err.downcast_ref::<ZeroEntryError>() {
                Some(ZeroEntryError::NoWork) => println!("{err}"),
                _ => ui::print_error(&format!("{err:#}")),
            }
            ExitCode::from(code)
        }
    }
}

fn init_tracing(verbose: bool, dry_run: bool) {
    let default = if verbose {
        "debug"
    } else if dry_run {
        "info"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run_command(
    file: &Path,
    dry_run: bool,
    report_path: Option<&Path>,
    config: &ZeroEntryConfig,
    verbose: bool,
) -> Result<()> {
    let prepared = pipeline::prepare(file, config)?;
    if prepared.extraction.is_misaligned() {
        warn!(
            identifiers = prepared.extraction.identifier_count,
            quantities = prepared.extraction.quantity_count,
            "column lengths differ; some identifiers may be paired with the wrong quantity"
        );
    }
    ui::print_work_list(&prepared.work);

    let report = if dry_run {
        warn!("dry run: keystrokes are logged, not sent");
        dispatch(DryRunInput::new(), DryRunInput::new(), false, &prepared.work, config).await?
    } else {
        dispatch_os(&prepared.work, config).await?
    };
    let report = report.with_source(file.to_path_buf());

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write run report to {}", path.display()))?;
    }
    if verbose {
        ui::print_report(&report);
    }
    Ok(())
}

async fn dispatch<S: InputSink, P: SignalSource>(
    sink: S,
    signals: P,
    keep_alive: bool,
    work: &WorkList,
    config: &ZeroEntryConfig,
) -> Result<RunReport> {
    let mut dispatcher = Dispatcher::new(sink, signals, config.timings.clone(), config.keys.clone());
    if !keep_alive {
        dispatcher = dispatcher.without_keep_alive();
    }
    let mut gate = StdinGate::new(
        config.keys.clone(),
        config.timings.settle_delay().as_secs(),
    );
    let mut progress = RunProgress::new(work.len());

    match dispatcher.run(work, &mut gate, &mut progress).await {
        Ok(report) => {
            progress.finish(&report);
            Ok(report)
        }
        Err(e) => {
            progress.abandon();
            Err(e.into())
        }
    }
}

#[cfg(feature = "os-input")]
async fn dispatch_os(work: &WorkList, config: &ZeroEntryConfig) -> Result<RunReport> {
    use input::os::{OsInput, OsSignals};

    let sink = OsInput::new().context("cannot start the keyboard backend")?;
    let signals = OsSignals::new(config.keys.cancel, config.keys.pause);
    dispatch(sink, signals, true, work, config).await
}

#[cfg(not(feature = "os-input"))]
async fn dispatch_os(_work: &WorkList, _config: &ZeroEntryConfig) -> Result<RunReport> {
    Err(ZeroEntryError::Config(
        "built without the `os-input` feature; rebuild with `--features os-input` or pass --dry-run"
            .into(),
    )
    .into())
}

fn export_command(
    file: &Path,
    out: &Path,
    raw: bool,
    format: ExportFormat,
    config: &ZeroEntryConfig,
) -> Result<()> {
    let extraction = extract::extract(file)?;
    if extraction.is_misaligned() {
        println!(
            "Warning: {} identifiers but {} quantities; the longer column was truncated.",
            extraction.identifier_count, extraction.quantity_count
        );
    }

    let (exclusions, specials) = if raw {
        (IdentifierList::default(), IdentifierList::default())
    } else {
        pipeline::load_lists(config)?
    };
    let work = pipeline::filter(extraction.zero_quantity(), &exclusions, &specials);

    export::write(&work, out, format)?;
    println!("Exported {} identifiers to {}", work.len(), out.display());
    Ok(())
}

fn barcodes_command(file: &Path, out: Option<PathBuf>, config: &ZeroEntryConfig) -> Result<()> {
    let prepared = pipeline::prepare(file, config)?;
    ui::print_work_list(&prepared.work);

    let out = out.unwrap_or_else(|| barcode::default_output(prepared.work.len()));
    let summary = barcode::write(&prepared.work, &out)?;
    for identifier in &summary.skipped {
        ui::print_error(&format!("Cannot print {identifier} as Code 39; cell left blank"));
    }
    println!(
        "Wrote {} labels on {} page(s) to {}",
        summary.printed,
        summary.pages,
        out.display()
    );
    Ok(())
}
