use clap::Parser;
use picsort::cli::{MAX_YEAR, MIN_YEAR, Mode, RunOptions, run_cli_with_config};
use picsort::output::OutputFormatter;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "picsort", version, about = "Organize my pictures")]
struct Args {
    /// Mode of operation: 0 show folder statistics, 1 verify year, 2 show duplicate
    /// file names, 3* move to subfolders, 4* move back from subfolders, 5* move to
    /// month subfolders, 6* flatten subfolders with safe rename, 7* remove rename suffixes
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=7))]
    mode: u8,

    /// Path to the folder to process
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    path: PathBuf,

    /// Expected year of capturing for mode 1
    #[arg(long, value_parser = clap::value_parser!(i32).range(MIN_YEAR as i64..=MAX_YEAR as i64))]
    year: Option<i32>,

    /// Only print the planned operations of the modes marked with *
    #[arg(long = "dry_run")]
    dry_run: bool,

    /// Print every file operation
    #[arg(long)]
    verbose: bool,

    /// Configuration file (default: .picsortrc.toml, then ~/.config/picsort/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let Some(mode) = Mode::from_number(args.mode) else {
        OutputFormatter::error(&format!("Unknown mode {}", args.mode));
        return ExitCode::FAILURE;
    };

    if !args.path.exists() {
        OutputFormatter::error(&format!(
            "The given path {} does not exist. Exit.",
            args.path.display()
        ));
        return ExitCode::FAILURE;
    }

    let options = RunOptions {
        dry_run: args.dry_run,
        verbose: args.verbose,
        year: args.year,
    };

    match run_cli_with_config(mode, &args.path, options, args.config.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            ExitCode::FAILURE
        }
    }
}
