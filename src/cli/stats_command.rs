use crate::{
    cli::render_command::scan,
    config::load_config,
    error::DepsError,
    report::{DepsReport, display_report},
};
use argh::FromArgs;
use std::path::PathBuf;

/// Summarize the obligations of a proof script.
#[derive(FromArgs)]
#[argh(subcommand, name = "stats")]
pub struct StatsCommand {
    /// the proof script to scan.
    #[argh(option, short = 'f')]
    filename: Option<PathBuf>,

    /// path to lemma-deps.toml config file.
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,
}

pub fn run_stats(cmd: StatsCommand) -> Result<(), DepsError> {
    let config = load_config(cmd.config.as_deref())?;
    let document = cmd
        .filename
        .unwrap_or_else(|| config.document().to_path_buf());

    let scanned = scan(&config, &document)?;
    let report = DepsReport::new(&scanned.graph, scanned.document.sections().len());

    if !display_report(&report) {
        std::process::exit(1);
    }
    Ok(())
}
