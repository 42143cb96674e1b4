use crate::{
    cli::{
        init_command::{InitCommand, run_init},
        render_command::{RenderCommand, run_render},
        stats_command::{StatsCommand, run_stats},
    },
    error::DepsError,
    util::ansi::{ANSI_BOLD, ANSI_RED, ANSI_RESET},
};
use argh::FromArgs;

mod init_command;
mod render_command;
mod stats_command;

/// Draw the dependency graph between the lemmas of a proof script.
#[derive(FromArgs)]
struct Args {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Render(RenderCommand),
    Stats(StatsCommand),
    Init(InitCommand),
}

pub fn run_cli() {
    let args: Args = argh::from_env();

    let result = match args.command {
        Command::Render(cmd) => run_render(cmd),
        Command::Stats(cmd) => run_stats(cmd),
        Command::Init(cmd) => run_init(cmd),
    };

    if let Err(err) = result {
        print_error(&err);
        std::process::exit(1);
    }
}

fn print_error(err: &DepsError) {
    eprintln!("{ANSI_RED}{ANSI_BOLD}error:{ANSI_RESET} {err}");
}
