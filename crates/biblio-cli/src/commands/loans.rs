use biblio_core::access::{is_privileged, LoanScope};
use biblio_core::storage::{Loan, LoanFilter, LoanLedger, LoanState, Member};
use biblio_core::LibraryError;

use super::cancelled;
use crate::app::AppContext;
use crate::cli::{LoanCommand, LoanCreateArgs, LoanListArgs};
use crate::constants::DEFAULT_LIST_LIMIT;
use crate::errors::CliError;
use crate::helpers::{require_book, require_loan, require_member, resolve_due_date};
use crate::output::{loan_json, loan_row, print_json, LookupNames, LOAN_COLUMNS};
use crate::ui::{badge, details, due_in, header, print, receipt, table, Badge};

pub fn handle(ctx: &AppContext, command: &LoanCommand) -> anyhow::Result<()> {
    match command {
        LoanCommand::Create(args) => handle_create(ctx, args),
        LoanCommand::Return { id } => handle_return(ctx, id),
        LoanCommand::List(args) => handle_list(ctx, args),
        LoanCommand::Show { id } => handle_show(ctx, id),
        LoanCommand::Delete { id } => handle_delete(ctx, id),
    }
}

/// A non-admin `--as` member may only touch their own loans.
fn ensure_owns(actor: Option<&Member>, loan: &Loan) -> Result<(), CliError> {
    match actor {
        Some(actor) if !is_privileged(actor) && actor.id != loan.member_id => Err(
            CliError::permission_denied(format!("{} may not access loan {}", actor.email, loan.id)),
        ),
        _ => Ok(()),
    }
}

fn handle_create(ctx: &AppContext, args: &LoanCreateArgs) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let actor = ctx.actor()?;
    let book = require_book(store, &args.book)?;
    let member = match (&args.member, actor) {
        (Some(value), _) => require_member(store, value)?,
        (None, Some(actor)) => actor.clone(),
        (None, None) => {
            return Err(CliError::invalid_input(
                "Name the borrower with --member or act as them with --as",
            )
            .into())
        }
    };
    if let Some(actor) = actor {
        if !is_privileged(actor) && actor.id != member.id {
            return Err(CliError::permission_denied(format!(
                "{} may not borrow on behalf of {}",
                actor.email, member.email
            ))
            .into());
        }
    }

    let today = store.today();
    let (default_days, max_days) = ctx.loan_days();
    let due_date = resolve_due_date(
        today,
        args.due.as_deref(),
        args.days,
        default_days,
        max_days,
    )?;
    let loan = store.create_loan(&book.id, &member.id, due_date)?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        let names = LookupNames::for_loans(store, std::slice::from_ref(&loan))?;
        return print_json(&loan_json(&loan, &names));
    }
    if !ctx.quiet() {
        print(
            ui,
            &receipt(
                ui,
                "Loan created",
                &[
                    ("ID", loan.id.to_string()),
                    ("Book", book.title.clone()),
                    ("Member", member.email.clone()),
                    ("Due", loan.due_date.to_string()),
                ],
            ),
        );
    }
    Ok(())
}

fn handle_return(ctx: &AppContext, id: &str) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let loan = require_loan(store, id)?;
    ensure_owns(ctx.actor()?, &loan)?;

    let already_returned = loan.state == LoanState::Returned;
    let returned = store
        .return_loan(&loan.id)?
        .ok_or(LibraryError::LoanNotFound(loan.id))?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        let names = LookupNames::for_loans(store, std::slice::from_ref(&returned))?;
        return print_json(&loan_json(&returned, &names));
    }
    if ctx.quiet() {
        return Ok(());
    }
    if already_returned {
        print(ui, &badge(ui, Badge::Info, "Loan was already returned"));
    } else {
        let today = store.today();
        let mut items = vec![("ID", returned.id.to_string())];
        if loan.state == LoanState::Overdue {
            items.push(("Late", due_in(loan.due_date, today)));
        }
        print(ui, &receipt(ui, "Loan returned", &items));
    }
    Ok(())
}

fn handle_list(ctx: &AppContext, args: &LoanListArgs) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let requested = match &args.member {
        Some(value) => Some(require_member(store, value)?.id),
        None => None,
    };
    let member = match ctx.actor()? {
        Some(actor) => LoanScope::for_actor(actor).narrow(requested),
        None => requested,
    };
    let book = match &args.book {
        Some(value) => Some(require_book(store, value)?.id),
        None => None,
    };
    let limit = args.limit.unwrap_or(DEFAULT_LIST_LIMIT);

    let (mut loans, context) = if args.open {
        (store.open_loans(member.as_ref())?, Some("open"))
    } else if args.returned {
        (store.returned_loans(member.as_ref())?, Some("returned"))
    } else {
        let mut filter = LoanFilter::new().limit(limit);
        if let Some(id) = member {
            filter = filter.member(id);
        }
        if let Some(id) = book {
            filter = filter.book(id);
        }
        if let Some(state) = args.state {
            filter = filter.state(state);
        }
        (store.list_loans(&filter)?, args.state.map(|s| s.as_str()))
    };
    if let Some(id) = book {
        loans.retain(|loan| loan.book_id == id);
    }
    loans.truncate(limit);

    let names = LookupNames::for_loans(store, &loans)?;
    let ui = ctx.ui();
    if ui.mode.is_json() {
        let values: Vec<_> = loans.iter().map(|l| loan_json(l, &names)).collect();
        return print_json(&values);
    }
    if ui.mode.is_pretty() {
        print(ui, &header(ui, "loan list", context));
    }
    if loans.is_empty() {
        if ui.mode.is_pretty() {
            print(ui, &badge(ui, Badge::Info, "No loans found"));
        }
        return Ok(());
    }
    let today = store.today();
    let rows: Vec<Vec<String>> = loans
        .iter()
        .map(|loan| loan_row(ui, loan, &names, today))
        .collect();
    print(ui, &table(ui, &LOAN_COLUMNS, &rows));
    Ok(())
}

fn handle_show(ctx: &AppContext, id: &str) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let loan = require_loan(store, id)?;
    ensure_owns(ctx.actor()?, &loan)?;
    let names = LookupNames::for_loans(store, std::slice::from_ref(&loan))?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&loan_json(&loan, &names));
    }
    let mut items = vec![
        ("ID", loan.id.to_string()),
        (
            "Book",
            names
                .book_title(&loan.book_id)
                .map(str::to_string)
                .unwrap_or_else(|| loan.book_id.to_string()),
        ),
        (
            "Member",
            names
                .member_email(&loan.member_id)
                .map(str::to_string)
                .unwrap_or_else(|| loan.member_id.to_string()),
        ),
        ("Start", loan.start_date.to_string()),
        ("Due", loan.due_date.to_string()),
        ("State", loan.state.to_string()),
    ];
    if loan.state.is_open() {
        items.push(("When", due_in(loan.due_date, store.today())));
    }
    print(ui, &details(ui, &items));
    Ok(())
}

fn handle_delete(ctx: &AppContext, id: &str) -> anyhow::Result<()> {
    ctx.require_privileged("delete loans")?;
    let store = ctx.store()?;
    let loan = require_loan(store, id)?;

    if loan.state.is_open() {
        return Err(LibraryError::LoanStillOpen(loan.id).into());
    }
    if !ctx.confirm(&format!("Delete returned loan {}?", loan.id))? {
        cancelled(ctx);
        return Ok(());
    }
    store.delete_returned_loan(&loan.id)?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&serde_json::json!({ "status": "ok", "deleted": loan.id }));
    }
    if !ctx.quiet() {
        print(ui, &receipt(ui, "Loan deleted", &[("ID", loan.id.to_string())]));
    }
    Ok(())
}
