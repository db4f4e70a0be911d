use std::path::Path;

use super::cancelled;
use crate::app::AppContext;
use crate::cli::BackupArgs;
use crate::errors::CliError;
use crate::output::print_json;
use crate::ui::{badge, hint, kv, print, receipt, Badge};

pub fn handle_check(ctx: &AppContext) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let ui = ctx.ui();

    if let Err(err) = store.check_integrity() {
        tracing::error!(error = %err, "integrity check failed");
        if ui.mode.is_json() {
            print_json(&serde_json::json!({ "status": "failed", "error": err.to_string() }))?;
        } else {
            eprintln!("{}", badge(ui, Badge::Err, "Integrity check failed"));
            eprintln!("{}", kv(ui, "Error", &err.to_string()));
            eprintln!(
                "{}",
                hint(ui, "Restore from a backup or export the catalog before retrying.")
            );
        }
        return Err(CliError::IntegrityFailed(format!("Integrity check failed: {}", err)).into());
    }

    let metadata = store.metadata()?;
    if ui.mode.is_json() {
        return print_json(&serde_json::json!({
            "status": "ok",
            "format_version": metadata.format_version,
            "last_modified": metadata.last_modified,
        }));
    }
    if !ctx.quiet() {
        print(
            ui,
            &receipt(
                ui,
                "Integrity check passed",
                &[
                    ("Format", metadata.format_version),
                    ("Last modified", metadata.last_modified.to_rfc3339()),
                ],
            ),
        );
    }
    Ok(())
}

pub fn handle_backup(ctx: &AppContext, args: &BackupArgs) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let destination = Path::new(&args.destination);

    if destination.exists()
        && !ctx.confirm(&format!("Overwrite existing file {}?", destination.display()))?
    {
        cancelled(ctx);
        return Ok(());
    }

    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!(
                    "Failed to create backup directory {}: {}",
                    parent.display(),
                    e
                )
            })?;
        }
    }
    store.backup_to(destination)?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&serde_json::json!({
            "status": "ok",
            "destination": args.destination,
        }));
    }
    if !ctx.quiet() {
        print(
            ui,
            &receipt(ui, "Backup written", &[("Destination", args.destination.clone())]),
        );
    }
    Ok(())
}
