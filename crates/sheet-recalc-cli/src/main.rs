//! sheet-recalc CLI - recalculate spreadsheets with LibreOffice and report errors

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use sheet_recalc::diagnostics::diagnose;
use sheet_recalc::{
    inspect, DualModeRunner, EngineConfig, ExternalCommand, ModePreference, Recalculator, Report,
    StrategyConfig,
};
use tracing::Level;

#[derive(Parser)]
#[command(name = "sheet-recalc")]
#[command(
    author,
    version,
    about = "Recalculate spreadsheet formulas with LibreOffice and report error cells"
)]
struct Cli {
    /// Path to the soffice executable (default: search install locations, then PATH)
    #[arg(long, global = true, value_name = "PATH")]
    soffice: Option<PathBuf>,

    /// Directory holding the Standard macro library (default: the user's LibreOffice profile)
    #[arg(long, global = true, value_name = "DIR")]
    profile_dir: Option<PathBuf>,

    /// More log output on stderr (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recalculate a workbook in place and print the JSON report
    Recalc {
        /// Workbook to recalculate (xlsx)
        file: PathBuf,

        /// Seconds to wait for LibreOffice
        #[arg(default_value_t = 30)]
        timeout_seconds: u64,
    },

    /// Check the LibreOffice setup and recalculate a workbook, printing what was found
    Diagnose {
        /// Workbook to recalculate
        file: PathBuf,

        /// Seconds to wait for LibreOffice
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        /// In-process, child process, or in-process with child-process fallback
        #[arg(long, value_enum, default_value_t = Mode::Auto)]
        mode: Mode,
    },

    /// List sheets and count formulas without recalculating
    Inspect {
        /// Workbook to read
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Auto,
    Embedded,
    External,
}

impl From<Mode> for ModePreference {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Auto => ModePreference::Auto,
            Mode::Embedded => ModePreference::Embedded,
            Mode::External => ModePreference::External,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config = EngineConfig {
        soffice_path: cli.soffice.clone(),
        profile_dir: cli.profile_dir.clone(),
        ..EngineConfig::default()
    };

    match &cli.command {
        Commands::Recalc {
            file,
            timeout_seconds,
        } => recalc(config, file, Duration::from_secs(*timeout_seconds)).await,
        Commands::Diagnose {
            file,
            timeout,
            mode,
        } => {
            let strategy = StrategyConfig {
                preference: (*mode).into(),
                external_command: Some(self_command(&cli)?),
                ..StrategyConfig::default()
            };
            run_diagnose(config, strategy, file, Duration::from_secs(*timeout)).await
        }
        Commands::Inspect { file } => run_inspect(file),
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, 2) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

async fn recalc(config: EngineConfig, file: &Path, timeout: Duration) -> Result<ExitCode> {
    let report = Recalculator::new(config).recalc(file, timeout).await;
    print_json(&report)?;
    Ok(match report {
        Report::Scan(_) => ExitCode::SUCCESS,
        Report::Error(_) => ExitCode::FAILURE,
    })
}

async fn run_diagnose(
    config: EngineConfig,
    strategy: StrategyConfig,
    file: &Path,
    timeout: Duration,
) -> Result<ExitCode> {
    let recalculator = Recalculator::new(config);
    let engine = recalculator.engine().clone();
    let runner = DualModeRunner::new(recalculator, strategy);

    let report = diagnose(&engine, &runner, file, timeout).await;
    print_json(&report)?;
    Ok(if report.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_inspect(file: &Path) -> Result<ExitCode> {
    let summary =
        inspect(file).with_context(|| format!("Failed to read '{}'", file.display()))?;
    print_json(&summary)?;
    Ok(ExitCode::SUCCESS)
}

/// This executable's `recalc` subcommand, carrying the engine options over.
fn self_command(cli: &Cli) -> Result<ExternalCommand> {
    let exe = std::env::current_exe().context("Failed to locate the sheet-recalc executable")?;
    let mut command = ExternalCommand::new(exe);
    if let Some(soffice) = &cli.soffice {
        command = command
            .arg("--soffice")
            .arg(OsString::from(soffice.as_os_str()));
    }
    if let Some(dir) = &cli.profile_dir {
        command = command
            .arg("--profile-dir")
            .arg(OsString::from(dir.as_os_str()));
    }
    Ok(command.arg("--quiet").arg("recalc"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize report")?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}").context("Failed to write to stdout")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_recalc_timeout_defaults_to_thirty() {
        let cli = Cli::parse_from(["sheet-recalc", "recalc", "book.xlsx"]);
        match cli.command {
            Commands::Recalc {
                file,
                timeout_seconds,
            } => {
                assert_eq!(file, PathBuf::from("book.xlsx"));
                assert_eq!(timeout_seconds, 30);
            }
            _ => panic!("expected recalc"),
        }
    }

    #[test]
    fn test_self_command_forwards_engine_options() {
        let cli = Cli::parse_from([
            "sheet-recalc",
            "--soffice",
            "/opt/lo/soffice",
            "diagnose",
            "book.xlsx",
            "--mode",
            "external",
        ]);
        let command = self_command(&cli).unwrap();
        let args: Vec<String> = command
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args, ["--soffice", "/opt/lo/soffice", "--quiet", "recalc"]);
    }

    #[test]
    fn test_missing_file_is_a_usage_error() {
        let err = Cli::try_parse_from(["sheet-recalc", "recalc"]).err().unwrap();
        assert_eq!(err.exit_code(), 2);
    }
}
