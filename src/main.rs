//! `tuxsync` binary.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tuxsync::cli::{Cli, Command};
use tuxsync::commands;
use tuxsync::logging::{self, Logger};

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    let command = args.command.name();

    if let Command::Completions { shell } = args.command {
        clap_complete::generate(shell, &mut Cli::command(), "tuxsync", &mut std::io::stdout());
        return ExitCode::SUCCESS;
    }

    logging::init_subscriber(args.verbose, command);
    let log = Logger::new(command);

    let result = match &args.command {
        Command::Backup(opts) => commands::backup::run(&args.global, opts, &log),
        Command::Restore(opts) => commands::restore::run(&args.global, opts, &log),
        Command::List(opts) => commands::list::run(&args.global, opts, &log),
        Command::Version => commands::version::run().map_err(Into::into),
        Command::Completions { .. } => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log.error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
