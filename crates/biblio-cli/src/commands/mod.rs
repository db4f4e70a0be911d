//! Command handlers, one module per command group.

mod books;
mod init;
mod loans;
mod maintenance;
mod members;
mod misc;

use crate::app::AppContext;
use crate::cli::Commands;
use crate::ui::{badge, print, Badge};

pub fn dispatch(ctx: &AppContext, command: &Commands) -> anyhow::Result<()> {
    match command {
        Commands::Init(args) => init::handle_init(ctx, args),
        Commands::Book(cmd) => books::handle(ctx, cmd),
        Commands::Member(cmd) => members::handle(ctx, cmd),
        Commands::Loan(cmd) => loans::handle(ctx, cmd),
        Commands::Check => maintenance::handle_check(ctx),
        Commands::Backup(args) => maintenance::handle_backup(ctx, args),
        Commands::Completions { shell } => misc::handle_completions(*shell),
    }
}

/// Report a confirmation the user declined.
fn cancelled(ctx: &AppContext) {
    if ctx.quiet() {
        return;
    }
    let ui = ctx.ui();
    if ui.mode.is_pretty() {
        print(ui, &badge(ui, Badge::Info, "Cancelled"));
    } else if ui.mode.is_json() {
        println!("{}", serde_json::json!({ "status": "cancelled" }));
    } else {
        println!("status=cancelled");
    }
}
