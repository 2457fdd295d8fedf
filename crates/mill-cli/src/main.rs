use anyhow::Result;
use clap::Parser;
use mill_cli::{Cli, Commands, MillConfig};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

mod commands;

fn run(cli: &Cli) -> Result<()> {
    let mut config = MillConfig::load(cli.config.as_deref())?;
    config.apply_solver(cli.solver.as_deref())?;
    match &cli.command {
        Commands::Solve(args) => commands::solve::handle(args, config),
        Commands::Follower(args) => commands::follower::handle(args, config),
        Commands::Batch(args) => commands::batch::handle(args, config),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout carries results only
    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {err}");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
