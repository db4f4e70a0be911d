use biblio_core::access::{can_manage_member, is_privileged, MemberScope};
use biblio_core::members::{
    register_member, reset_credential, update_member, LogNotifier, Registered, Registration,
};
use biblio_core::storage::{DeletionGuard, LoanLedger, Member, MemberStore, MemberUpdate};
use biblio_core::LibraryError;

use super::cancelled;
use crate::app::AppContext;
use crate::cli::{MemberCommand, MemberEditArgs, MemberRegisterArgs};
use crate::errors::CliError;
use crate::helpers::require_member;
use crate::output::{
    loan_json, loan_row, member_json, member_row, print_json, LookupNames, LOAN_COLUMNS,
    MEMBER_COLUMNS,
};
use crate::ui::{badge, blank_line, details, header, hint, print, receipt, simple_table, Badge};

pub fn handle(ctx: &AppContext, command: &MemberCommand) -> anyhow::Result<()> {
    match command {
        MemberCommand::Register(args) => handle_register(ctx, args),
        MemberCommand::List => handle_list(ctx),
        MemberCommand::Show { member } => handle_show(ctx, member),
        MemberCommand::Edit(args) => handle_edit(ctx, args),
        MemberCommand::ResetCredential { member } => handle_reset(ctx, member),
        MemberCommand::Delete { member } => handle_delete(ctx, member),
    }
}

/// Refuse access to another member's record for a non-admin `--as` member.
fn ensure_can_manage(ctx: &AppContext, target: &Member, action: &str) -> anyhow::Result<()> {
    match ctx.actor()? {
        Some(actor) if !can_manage_member(actor, &target.id) => Err(CliError::permission_denied(
            format!("{} may not {} {}", actor.email, action, target.email),
        )
        .into()),
        _ => Ok(()),
    }
}

fn print_credential(ctx: &AppContext, title: &str, registered: &Registered) -> anyhow::Result<()> {
    let ui = ctx.ui();
    if ui.mode.is_json() {
        let mut value = member_json(&registered.member);
        value["secret"] = serde_json::Value::String(registered.secret.to_string());
        return print_json(&value);
    }
    if ctx.quiet() {
        return Ok(());
    }
    print(
        ui,
        &receipt(
            ui,
            title,
            &[
                ("ID", registered.member.id.to_string()),
                ("Email", registered.member.email.clone()),
                ("Role", registered.member.role.to_string()),
                ("Secret", registered.secret.to_string()),
            ],
        ),
    );
    blank_line(ui);
    print(ui, &hint(ui, "The secret is shown once and only its hash is stored."));
    Ok(())
}

fn handle_register(ctx: &AppContext, args: &MemberRegisterArgs) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let registration = Registration {
        name: args.name.clone(),
        email: args.email.clone(),
        role: args.role,
    };
    let registered = register_member(store, &LogNotifier, &registration, ctx.actor()?)?;
    if registered.member.role != args.role && !ctx.quiet() && !ctx.ui().mode.is_json() {
        eprintln!(
            "{}",
            badge(
                ctx.ui(),
                Badge::Warn,
                "Role ignored; only an admin acting with --as can grant roles"
            )
        );
    }
    print_credential(ctx, "Member registered", &registered)
}

fn handle_list(ctx: &AppContext) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let members = match ctx.actor()? {
        Some(actor) => MemberScope::for_actor(actor).list_members(store)?,
        None => store.list_members()?,
    };

    let ui = ctx.ui();
    if ui.mode.is_json() {
        let values: Vec<_> = members.iter().map(member_json).collect();
        return print_json(&values);
    }
    if ui.mode.is_pretty() {
        print(ui, &header(ui, "member list", None));
    }
    if members.is_empty() {
        if ui.mode.is_pretty() {
            print(ui, &badge(ui, Badge::Info, "No members registered"));
            print(ui, &hint(ui, "biblio member register --name <NAME> --email <EMAIL>"));
        }
        return Ok(());
    }
    let rows: Vec<Vec<String>> = members.iter().map(|m| member_row(ui, m)).collect();
    print(ui, &simple_table(ui, &MEMBER_COLUMNS, &rows));
    Ok(())
}

fn handle_show(ctx: &AppContext, value: &str) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let member = require_member(store, value)?;
    ensure_can_manage(ctx, &member, "view")?;
    let loans = store.open_loans(Some(&member.id))?;
    let names = LookupNames::for_loans(store, &loans)?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        let mut value = member_json(&member);
        value["open_loans"] = loans.iter().map(|l| loan_json(l, &names)).collect();
        return print_json(&value);
    }
    print(
        ui,
        &details(
            ui,
            &[
                ("ID", member.id.to_string()),
                ("Name", member.name.clone()),
                ("Email", member.email.clone()),
                ("Role", member.role.to_string()),
                ("Open loans", loans.len().to_string()),
            ],
        ),
    );
    if !loans.is_empty() && ui.mode.is_pretty() {
        blank_line(ui);
        let today = store.today();
        let rows: Vec<Vec<String>> = loans
            .iter()
            .map(|loan| loan_row(ui, loan, &names, today))
            .collect();
        print(ui, &simple_table(ui, &LOAN_COLUMNS, &rows));
    }
    Ok(())
}

fn handle_edit(ctx: &AppContext, args: &MemberEditArgs) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let member = require_member(store, &args.member)?;

    let update = MemberUpdate {
        name: args.name.clone(),
        email: args.email.clone(),
        role: args.role,
        credential_hash: None,
    };
    if update.name.is_none() && update.email.is_none() && update.role.is_none() {
        return Err(CliError::invalid_input("Nothing to change; pass at least one field").into());
    }

    let updated = match ctx.actor()? {
        Some(actor) => {
            if update.role.is_some() && !is_privileged(actor) {
                return Err(CliError::permission_denied(format!(
                    "{} may not change roles",
                    actor.email
                ))
                .into());
            }
            update_member(store, &member.id, &update, actor)?
        }
        None => {
            if update.role.is_some() {
                return Err(CliError::permission_denied(
                    "Role changes require --as <admin email>",
                )
                .into());
            }
            store.update_member(&member.id, &update)?
        }
    };

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&member_json(&updated));
    }
    if !ctx.quiet() {
        print(
            ui,
            &receipt(
                ui,
                "Member updated",
                &[
                    ("ID", updated.id.to_string()),
                    ("Email", updated.email.clone()),
                    ("Role", updated.role.to_string()),
                ],
            ),
        );
    }
    Ok(())
}

fn handle_reset(ctx: &AppContext, value: &str) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let member = require_member(store, value)?;
    let actor = ctx.actor()?.ok_or_else(|| {
        CliError::permission_denied("Resetting a credential requires --as <email>")
    })?;
    let registered = reset_credential(store, &LogNotifier, &member.id, actor)?;
    print_credential(ctx, "Credential reset", &registered)
}

fn handle_delete(ctx: &AppContext, value: &str) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let member = require_member(store, value)?;
    ensure_can_manage(ctx, &member, "delete")?;

    if !store.can_delete_member(&member.id)? {
        return Err(LibraryError::DeletionBlocked {
            what: "member",
            id: member.id,
        }
        .into());
    }
    if !ctx.confirm(&format!(
        "Delete member {} and their returned loans?",
        member.email
    ))? {
        cancelled(ctx);
        return Ok(());
    }
    if !store.delete_member_cascade(&member.id)? {
        return Err(LibraryError::DeletionBlocked {
            what: "member",
            id: member.id,
        }
        .into());
    }

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&serde_json::json!({ "status": "ok", "deleted": member.id }));
    }
    if !ctx.quiet() {
        print(
            ui,
            &receipt(
                ui,
                "Member deleted",
                &[("ID", member.id.to_string()), ("Email", member.email)],
            ),
        );
    }
    Ok(())
}
