#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! mastr-fetch: export market participants and storage units from the MaStR registry as JSON lines.

mod cli;
mod commands;
mod mastr;
mod soap;
mod types;

use clap::Parser;

use cli::{Cli, OutputCtx, logging, write_error};
use commands::FetchSettings;
use types::ErrorOutput;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.debug);

    let ctx = OutputCtx::new(cli.output, cli.json, cli.no_header, cli.debug);
    let settings = FetchSettings::from_cli(&cli);

    match commands::dispatch(&cli.command, &settings, &ctx) {
        Ok(()) => {}
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            let error_output = ErrorOutput::from_mastr_error(&err);
            write_error(&error_output, cli.output, cli.json);
            std::process::exit(err.exit_code());
        }
    }
}
