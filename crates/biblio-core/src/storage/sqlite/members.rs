use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use uuid::Uuid;

use super::row::{MemberRow, MEMBER_COLUMNS};
use super::{is_unique_violation, touch, SqliteStore};
use crate::error::{LibraryError, Result};
use crate::members::{normalize_email, validate_email, validate_name};
use crate::storage::traits::MemberStore;
use crate::storage::types::{Member, MemberUpdate, NewMember};

pub(super) fn fetch_member(conn: &Connection, id: &Uuid) -> Result<Option<Member>> {
    let sql = format!("SELECT {} FROM members m WHERE m.id = ?", MEMBER_COLUMNS);
    let row = conn
        .query_row(&sql, [id.to_string()], MemberRow::from_row)
        .optional()?;
    row.map(Member::try_from).transpose()
}

fn fetch_member_by_email(conn: &Connection, email: &str) -> Result<Option<Member>> {
    let sql = format!("SELECT {} FROM members m WHERE m.email = ?", MEMBER_COLUMNS);
    let row = conn
        .query_row(&sql, [normalize_email(email)], MemberRow::from_row)
        .optional()?;
    row.map(Member::try_from).transpose()
}

/// Map a UNIQUE failure on `members.email` to a refusal.
fn email_conflict(err: rusqlite::Error, email: &str) -> LibraryError {
    if is_unique_violation(&err) {
        LibraryError::DuplicateEmail(email.to_string())
    } else {
        err.into()
    }
}

impl MemberStore for SqliteStore {
    fn insert_member(&self, member: &NewMember) -> Result<Member> {
        let name = validate_name(&member.name)?;
        let email = normalize_email(&member.email);
        validate_email(&email)?;
        if member.credential_hash.is_empty() {
            return Err(LibraryError::Validation(
                "Credential hash is required".to_string(),
            ));
        }

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let id = Uuid::new_v4();
        tx.execute(
            r#"
            INSERT INTO members (id, name, email, credential_hash, role, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            (
                id.to_string(),
                &name,
                &email,
                &member.credential_hash,
                member.role.as_str(),
                Utc::now().to_rfc3339(),
            ),
        )
        .map_err(|e| email_conflict(e, &email))?;
        touch(&tx)?;
        tx.commit()?;

        tracing::info!(member_id = %id, role = %member.role, "member added");
        Ok(Member {
            id,
            name,
            email,
            credential_hash: member.credential_hash.clone(),
            role: member.role,
        })
    }

    fn update_member(&self, id: &Uuid, update: &MemberUpdate) -> Result<Member> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = fetch_member(&tx, id)?.ok_or(LibraryError::MemberNotFound(*id))?;

        let name = match &update.name {
            Some(name) => validate_name(name)?,
            None => existing.name.clone(),
        };
        let email = match &update.email {
            Some(email) => {
                let email = normalize_email(email);
                validate_email(&email)?;
                email
            }
            None => existing.email.clone(),
        };
        let updated = Member {
            id: *id,
            name,
            email,
            credential_hash: update
                .credential_hash
                .clone()
                .unwrap_or_else(|| existing.credential_hash.clone()),
            role: update.role.unwrap_or(existing.role),
        };

        tx.execute(
            "UPDATE members SET name = ?, email = ?, credential_hash = ?, role = ? WHERE id = ?",
            (
                &updated.name,
                &updated.email,
                &updated.credential_hash,
                updated.role.as_str(),
                id.to_string(),
            ),
        )
        .map_err(|e| email_conflict(e, &updated.email))?;
        touch(&tx)?;
        tx.commit()?;

        tracing::info!(member_id = %id, "member updated");
        Ok(updated)
    }

    fn get_member(&self, id: &Uuid) -> Result<Option<Member>> {
        let conn = self.lock_conn()?;
        fetch_member(&conn, id)
    }

    fn get_member_by_email(&self, email: &str) -> Result<Option<Member>> {
        let conn = self.lock_conn()?;
        fetch_member_by_email(&conn, email)
    }

    fn member_exists_by_email(&self, email: &str) -> Result<bool> {
        let conn = self.lock_conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM members WHERE email = ?",
                [normalize_email(email)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn list_members(&self) -> Result<Vec<Member>> {
        let conn = self.lock_conn()?;
        let sql = format!(
            "SELECT {} FROM members m ORDER BY m.name COLLATE NOCASE, m.email",
            MEMBER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], MemberRow::from_row)?;

        let mut members = Vec::new();
        for row in rows {
            members.push(row?.try_into()?);
        }
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::Role;

    fn new_member(email: &str) -> NewMember {
        NewMember {
            name: "Grace Hopper".into(),
            email: email.into(),
            credential_hash: "$argon2id$v=19$stub".into(),
            role: Role::User,
        }
    }

    #[test]
    fn test_email_is_normalized_and_unique() {
        let store = SqliteStore::open_in_memory().unwrap();
        let member = store
            .insert_member(&new_member("  Grace@Navy.MIL "))
            .unwrap();
        assert_eq!(member.email, "grace@navy.mil");

        let err = store
            .insert_member(&new_member("grace@navy.mil"))
            .unwrap_err();
        assert!(matches!(err, LibraryError::DuplicateEmail(_)));

        assert!(store.member_exists_by_email("GRACE@navy.mil").unwrap());
        let found = store.get_member_by_email("grace@NAVY.mil").unwrap().unwrap();
        assert_eq!(found.id, member.id);
    }

    #[test]
    fn test_update_member_email_conflict() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_member(&new_member("a@example.org")).unwrap();
        let b = store.insert_member(&new_member("b@example.org")).unwrap();

        let err = store
            .update_member(
                &b.id,
                &MemberUpdate {
                    email: Some("A@example.org".into()),
                    ..MemberUpdate::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, LibraryError::DuplicateEmail(_)));

        let renamed = store
            .update_member(
                &b.id,
                &MemberUpdate {
                    name: Some("Barbara".into()),
                    role: Some(Role::Admin),
                    ..MemberUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(renamed.name, "Barbara");
        assert_eq!(renamed.role, Role::Admin);
        assert_eq!(renamed.email, "b@example.org");
    }

    #[test]
    fn test_list_members_sorted_by_name() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut zed = new_member("z@example.org");
        zed.name = "Zed".into();
        let mut amy = new_member("amy@example.org");
        amy.name = "amy".into();
        store.insert_member(&zed).unwrap();
        store.insert_member(&amy).unwrap();

        let names: Vec<String> = store
            .list_members()
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["amy", "Zed"]);
    }
}
