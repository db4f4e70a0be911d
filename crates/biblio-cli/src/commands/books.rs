use std::io::Read;
use std::path::Path;

use biblio_core::fs::{rename_with_fallback, temp_sibling};
use biblio_core::storage::{
    Availability, Book, BookUpdate, CatalogStore, DeletionGuard, LoanLedger, LoanState, NewBook,
};
use biblio_core::transfer::{export_books, import_books};
use biblio_core::LibraryError;

use super::cancelled;
use crate::app::AppContext;
use crate::cli::{BookAddArgs, BookCommand, BookEditArgs, BookListArgs};
use crate::errors::CliError;
use crate::helpers::require_book;
use crate::output::{book_json, book_row, print_json, BOOK_COLUMNS};
use crate::ui::{badge, details, header, hint, or_dash, print, receipt, simple_table, Badge};

pub fn handle(ctx: &AppContext, command: &BookCommand) -> anyhow::Result<()> {
    match command {
        BookCommand::Add(args) => handle_add(ctx, args),
        BookCommand::Edit(args) => handle_edit(ctx, args),
        BookCommand::List(args) => handle_list(ctx, args),
        BookCommand::Show { id } => handle_show(ctx, id),
        BookCommand::Search { query } => {
            let books = ctx.store()?.search_books_by_title(query)?;
            print_books(ctx, "book search", Some(query.as_str()), &books)
        }
        BookCommand::Available { query } => {
            let store = ctx.store()?;
            let books = match query {
                Some(q) => store.search_available_books(q)?,
                None => store.list_available_books()?,
            };
            print_books(ctx, "book available", query.as_deref(), &books)
        }
        BookCommand::Delete { id } => handle_delete(ctx, id),
        BookCommand::Import { file } => handle_import(ctx, file),
        BookCommand::Export { output } => handle_export(ctx, output.as_deref()),
    }
}

fn handle_add(ctx: &AppContext, args: &BookAddArgs) -> anyhow::Result<()> {
    ctx.require_privileged("add books")?;
    let store = ctx.store()?;

    let mut new_book = NewBook::new(&args.title, &args.author, args.copies);
    if let Some(publisher) = &args.publisher {
        new_book = new_book.with_publisher(publisher);
    }
    if let Some(year) = args.year {
        new_book = new_book.with_year(year);
    }
    if let Some(category) = &args.category {
        new_book = new_book.with_category(category);
    }
    let book = store.insert_book(&new_book)?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&book_json(&book, book.total_copies));
    }
    if !ctx.quiet() {
        print(
            ui,
            &receipt(
                ui,
                "Book added",
                &[
                    ("ID", book.id.to_string()),
                    ("Title", book.title.clone()),
                    ("Copies", book.total_copies.to_string()),
                ],
            ),
        );
    }
    Ok(())
}

fn handle_edit(ctx: &AppContext, args: &BookEditArgs) -> anyhow::Result<()> {
    ctx.require_privileged("edit books")?;
    let store = ctx.store()?;
    let book = require_book(store, &args.id)?;

    let update = BookUpdate {
        title: args.title.clone(),
        author: args.author.clone(),
        publisher: clearable(args.publisher.clone(), args.clear_publisher),
        year: clearable(args.year, args.clear_year),
        category: clearable(args.category.clone(), args.clear_category),
        total_copies: args.copies,
    };
    if update.is_empty() {
        return Err(CliError::invalid_input("Nothing to change; pass at least one field").into());
    }

    let updated = store.update_book(&book.id, &update)?;
    let available = store.available_copies(&updated.id)?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&book_json(&updated, available));
    }
    if !ctx.quiet() {
        print(
            ui,
            &receipt(
                ui,
                "Book updated",
                &[("ID", updated.id.to_string()), ("Title", updated.title.clone())],
            ),
        );
    }
    Ok(())
}

/// `--field value` sets, `--clear-field` removes, neither leaves unchanged.
fn clearable<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

fn handle_list(ctx: &AppContext, args: &BookListArgs) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let (books, context) = match (&args.author, &args.category) {
        (Some(author), _) => (store.list_books_by_author(author)?, Some(author.as_str())),
        (None, Some(category)) => (
            store.list_books_by_category(category)?,
            Some(category.as_str()),
        ),
        (None, None) => (store.list_books()?, None),
    };
    print_books(ctx, "book list", context, &books)
}

fn print_books(
    ctx: &AppContext,
    command: &str,
    context: Option<&str>,
    books: &[Book],
) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let ui = ctx.ui();

    let mut listed = Vec::with_capacity(books.len());
    for book in books {
        listed.push((book, store.available_copies(&book.id)?));
    }

    if ui.mode.is_json() {
        let values: Vec<_> = listed
            .iter()
            .map(|(book, available)| book_json(book, *available))
            .collect();
        return print_json(&values);
    }

    if ui.mode.is_pretty() {
        print(ui, &header(ui, command, context));
    }
    if listed.is_empty() {
        if ui.mode.is_pretty() {
            print(ui, &badge(ui, Badge::Info, "No books found"));
        }
        return Ok(());
    }
    let rows: Vec<Vec<String>> = listed
        .iter()
        .map(|(book, available)| book_row(ui, book, *available))
        .collect();
    print(ui, &simple_table(ui, &BOOK_COLUMNS, &rows));
    Ok(())
}

fn handle_show(ctx: &AppContext, id: &str) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let book = require_book(store, id)?;
    let available = store.available_copies(&book.id)?;
    let on_loan = book.total_copies.saturating_sub(available);

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&book_json(&book, available));
    }
    print(
        ui,
        &details(
            ui,
            &[
                ("ID", book.id.to_string()),
                ("Title", book.title.clone()),
                ("Author", book.author.clone()),
                ("Publisher", or_dash(book.publisher.as_deref())),
                (
                    "Year",
                    book.year.map(|y| y.to_string()).unwrap_or_else(|| "-".into()),
                ),
                ("Category", or_dash(book.category.as_deref())),
                ("Copies", book.total_copies.to_string()),
                ("Available", available.to_string()),
                ("On loan", on_loan.to_string()),
            ],
        ),
    );
    Ok(())
}

fn handle_delete(ctx: &AppContext, id: &str) -> anyhow::Result<()> {
    ctx.require_privileged("delete books")?;
    let store = ctx.store()?;
    let book = require_book(store, id)?;

    if !store.can_delete_book(&book.id)? {
        return Err(LibraryError::DeletionBlocked {
            what: "book",
            id: book.id,
        }
        .into());
    }
    let returned = store.loans_for_book_in_state(&book.id, LoanState::Returned)?;
    let prompt = if returned.is_empty() {
        format!("Delete '{}'?", book.title)
    } else {
        format!(
            "Delete '{}' and its {} returned loan(s)?",
            book.title,
            returned.len()
        )
    };
    if !ctx.confirm(&prompt)? {
        cancelled(ctx);
        return Ok(());
    }

    // A loan opened between the check and the delete still wins.
    if !store.delete_book_cascade(&book.id)? {
        return Err(LibraryError::DeletionBlocked {
            what: "book",
            id: book.id,
        }
        .into());
    }

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&serde_json::json!({ "status": "ok", "deleted": book.id }));
    }
    if !ctx.quiet() {
        print(
            ui,
            &receipt(
                ui,
                "Book deleted",
                &[
                    ("ID", book.id.to_string()),
                    ("Loans removed", returned.len().to_string()),
                ],
            ),
        );
    }
    Ok(())
}

fn handle_import(ctx: &AppContext, file: &str) -> anyhow::Result<()> {
    ctx.require_privileged("import books")?;
    let store = ctx.store()?;

    let json = if file == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(file)
            .map_err(|e| CliError::not_found(format!("Cannot read {}: {}", file, e), ""))?
    };
    let count = import_books(store, &json)?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&serde_json::json!({ "status": "ok", "imported": count }));
    }
    if !ctx.quiet() {
        print(ui, &receipt(ui, "Books imported", &[("Imported", count.to_string())]));
        if count > 0 {
            print(ui, &hint(ui, "biblio book list"));
        }
    }
    Ok(())
}

fn handle_export(ctx: &AppContext, output: Option<&str>) -> anyhow::Result<()> {
    let json = export_books(ctx.store()?)?;

    let Some(path) = output else {
        println!("{}", json);
        return Ok(());
    };

    let destination = Path::new(path);
    let temp = temp_sibling(destination)?;
    std::fs::write(&temp, json.as_bytes())
        .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", temp.display(), e))?;
    rename_with_fallback(&temp, destination)?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&serde_json::json!({ "status": "ok", "output": path }));
    }
    if !ctx.quiet() {
        print(ui, &receipt(ui, "Catalog exported", &[("Output", path.to_string())]));
    }
    Ok(())
}
