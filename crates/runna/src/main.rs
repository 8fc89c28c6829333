//! Runna CLI entry point: argument parsing, logging setup and dispatch.

use clap::Parser;
use runna::{cli, commands, error, logger, ui};
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);
    ui::set_quiet(args.quiet);

    // Convert CLI errors to miette diagnostics for reporting
    commands::execute(args)
        .await
        .map_err(error::cli_error_to_miette)
}
