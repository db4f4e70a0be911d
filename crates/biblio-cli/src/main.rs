//! Biblio CLI - lending ledger for a small library's books and members
//!
//! Command-line interface over the biblio-core loan engine.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod helpers;
mod output;
mod ui;

use clap::{CommandFactory, Parser};
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::AppContext;
use crate::cli::Cli;
use crate::errors::exit_code_for;
use crate::ui::{error_message, UiContext, UiFlags};

/// Log filter variable; defaults to warnings only.
const LOG_ENV: &str = "BIBLIO_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let Some(command) = cli.command.as_ref() else {
        let _ = Cli::command().print_help();
        println!();
        return;
    };

    let result = AppContext::new(&cli).and_then(|ctx| commands::dispatch(&ctx, command));
    if let Err(err) = result {
        let ui = UiContext::from_env(
            UiFlags {
                json: cli.json,
                format: cli.format.as_deref(),
                no_color: cli.no_color,
                ascii: cli.ascii,
            },
            None,
        );
        let message = format!("{:#}", err);
        let (first, rest) = match message.split_once('\n') {
            Some((first, rest)) => (first.to_string(), Some(rest.trim().to_string())),
            None => (message.clone(), None),
        };
        if ui.mode.is_json() {
            eprintln!("{}", serde_json::json!({ "status": "error", "error": message }));
        } else {
            eprintln!(
                "{}",
                error_message(&ui, &first, rest.as_deref().filter(|r| !r.is_empty()))
            );
        }
        std::process::exit(exit_code_for(&err));
    }
}
