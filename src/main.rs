//! livespec CLI entry point

use std::process::ExitCode;

use clap::Parser;

use livespec::cli::Commands;
use livespec::commands::{run_check, run_config, run_listen, run_serve, CommandContext};
use livespec::Cli;

fn main() -> ExitCode {
    match run() {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

fn run() -> livespec::Result<String> {
    let cli = Cli::parse();
    let ctx = CommandContext::from_cli(&cli)?;

    match &cli.command {
        Commands::Serve(args) => run_serve(args, &ctx),
        Commands::Check(args) => run_check(args, &ctx),
        Commands::Listen(args) => run_listen(args, &ctx),
        Commands::Config(args) => run_config(args, &ctx),
    }
}
