//! Stubfill CLI entry point.

use clap::Parser;
use stubfill::cli::{self, Cli, EXIT_ERROR};
use stubfill::logger;

fn main() {
    let cli = Cli::parse();
    logger::init(cli.verbose, cli.quiet);

    let exit_code = match cli::run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
