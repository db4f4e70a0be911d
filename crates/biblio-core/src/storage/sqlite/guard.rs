use rusqlite::TransactionBehavior;
use uuid::Uuid;

use super::ledger::{mark_overdue, open_count_for_book, open_count_for_member, RefreshScope};
use super::{catalog, members, touch, SqliteStore};
use crate::error::Result;
use crate::storage::traits::DeletionGuard;

impl DeletionGuard for SqliteStore {
    fn can_delete_book(&self, book_id: &Uuid) -> Result<bool> {
        let conn = self.lock_conn()?;
        mark_overdue(&conn, self.today(), RefreshScope::Book(book_id))?;
        Ok(open_count_for_book(&conn, book_id)? == 0)
    }

    fn delete_book_cascade(&self, book_id: &Uuid) -> Result<bool> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if catalog::fetch_book(&tx, book_id)?.is_none() {
            return Ok(false);
        }
        mark_overdue(&tx, self.today(), RefreshScope::Book(book_id))?;
        let open = open_count_for_book(&tx, book_id)?;
        if open > 0 {
            tx.commit()?;
            tracing::warn!(book_id = %book_id, open, "book delete refused: open loans");
            return Ok(false);
        }

        let loans = tx.execute(
            "DELETE FROM loans WHERE book_id = ? AND state = 'returned'",
            [book_id.to_string()],
        )?;
        tx.execute("DELETE FROM books WHERE id = ?", [book_id.to_string()])?;
        touch(&tx)?;
        tx.commit()?;

        tracing::info!(book_id = %book_id, returned_loans = loans, "book deleted");
        Ok(true)
    }

    fn can_delete_member(&self, member_id: &Uuid) -> Result<bool> {
        let conn = self.lock_conn()?;
        if members::fetch_member(&conn, member_id)?.is_none() {
            return Ok(false);
        }
        mark_overdue(&conn, self.today(), RefreshScope::Member(member_id))?;
        Ok(open_count_for_member(&conn, member_id)? == 0)
    }

    fn delete_member_cascade(&self, member_id: &Uuid) -> Result<bool> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if members::fetch_member(&tx, member_id)?.is_none() {
            return Ok(false);
        }
        mark_overdue(&tx, self.today(), RefreshScope::Member(member_id))?;
        let open = open_count_for_member(&tx, member_id)?;
        if open > 0 {
            tx.commit()?;
            tracing::warn!(member_id = %member_id, open, "member delete refused: open loans");
            return Ok(false);
        }

        let loans = tx.execute(
            "DELETE FROM loans WHERE member_id = ? AND state = 'returned'",
            [member_id.to_string()],
        )?;
        tx.execute("DELETE FROM members WHERE id = ?", [member_id.to_string()])?;
        touch(&tx)?;
        tx.commit()?;

        tracing::info!(member_id = %member_id, returned_loans = loans, "member deleted");
        Ok(true)
    }
}
