use biblio_core::members::{register_first_admin, LogNotifier};
use biblio_core::storage::SqliteStore;

use crate::app::AppContext;
use crate::cli::InitArgs;
use crate::config::{default_library_path, write_config, BiblioConfig, DEFAULT_LOAN_DAYS};
use crate::errors::CliError;
use crate::output::{member_json, print_json};
use crate::ui::{blank_line, hint, print, receipt};

pub fn handle_init(ctx: &AppContext, args: &InitArgs) -> anyhow::Result<()> {
    let library_path = match args.path.as_deref().or(ctx.cli().db.as_deref()) {
        Some(value) => std::path::PathBuf::from(value),
        None => default_library_path()?,
    };
    let config_path = match &args.config_path {
        Some(value) => std::path::PathBuf::from(value),
        None => ctx.config_path().clone(),
    };
    let loan_days = args.loan_days.unwrap_or(DEFAULT_LOAN_DAYS);

    if library_path.exists() {
        return Err(CliError::invalid_input(format!(
            "A library already exists at {}",
            library_path.display()
        ))
        .into());
    }
    if let Some(parent) = library_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!("Failed to create directory {}: {}", parent.display(), e)
            })?;
        }
    }

    let store = SqliteStore::create(&library_path)?.with_clock(ctx.clock()?);
    tracing::info!(path = %library_path.display(), "library created");

    let wrote_config = !config_path.exists();
    if wrote_config {
        write_config(&config_path, &BiblioConfig::new(library_path.clone(), loan_days))?;
    }

    let admin = match (&args.admin_name, &args.admin_email) {
        (Some(name), Some(email)) => Some(register_first_admin(&store, &LogNotifier, name, email)?),
        _ => None,
    };

    let ui = ctx.ui();
    if ui.mode.is_json() {
        let admin_json = admin.as_ref().map(|registered| {
            let mut value = member_json(&registered.member);
            value["secret"] = serde_json::Value::String(registered.secret.to_string());
            value
        });
        let config_json = wrote_config.then(|| config_path.clone());
        return print_json(&serde_json::json!({
            "status": "ok",
            "path": library_path,
            "config": config_json,
            "admin": admin_json,
        }));
    }

    if ctx.quiet() {
        return Ok(());
    }
    let mut items = vec![("Path", library_path.display().to_string())];
    if wrote_config {
        items.push(("Config", config_path.display().to_string()));
    }
    if let Some(registered) = &admin {
        items.push(("Admin", registered.member.email.clone()));
        items.push(("Admin ID", registered.member.id.to_string()));
        items.push(("Secret", registered.secret.to_string()));
    }
    print(ui, &receipt(ui, "Library created", &items));
    blank_line(ui);
    if admin.is_some() {
        print(ui, &hint(ui, "The secret is shown once. Hand it to the administrator now."));
    } else {
        print(
            ui,
            &hint(ui, "biblio book add --title <TITLE> --author <AUTHOR> --copies <N>"),
        );
    }
    Ok(())
}
