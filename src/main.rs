mod cli;
mod config;
mod diagnostics;
mod document;
mod error;
mod graph;
mod render;
mod report;
mod span;
mod strings;
mod util;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    cli::run_cli();
}
