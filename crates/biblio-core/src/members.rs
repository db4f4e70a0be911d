//! Member registration.
//!
//! Registration generates the member's secret, stores only its hash, and
//! hands the plaintext to a [`Notifier`] for delivery. Delivery failures are
//! logged and never undo the registration.

use uuid::Uuid;
use zeroize::Zeroizing;

use crate::access::{can_manage_member, is_privileged};
use crate::credential::{generate_secret, hash_secret};
use crate::error::{LibraryError, Result};
use crate::storage::traits::MemberStore;
use crate::storage::types::{Member, MemberUpdate, NewMember, Role};

/// Maximum bytes for a member name or email.
pub const MAX_FIELD_BYTES: usize = 256;

/// Trim and ASCII-lowercase an email for storage and comparison.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Check a (normalized) email: non-empty, one `@` with text on both sides.
pub fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() {
        return Err(LibraryError::Validation("Email is required".to_string()));
    }
    if email.len() > MAX_FIELD_BYTES {
        return Err(LibraryError::Validation(format!(
            "Email too long (max {} bytes)",
            MAX_FIELD_BYTES
        )));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(LibraryError::Validation(format!("Invalid email: {}", email))),
    }
}

/// Check a member name and return it trimmed.
pub fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(LibraryError::Validation("Name is required".to_string()));
    }
    if trimmed.len() > MAX_FIELD_BYTES {
        return Err(LibraryError::Validation(format!(
            "Name too long (max {} bytes)",
            MAX_FIELD_BYTES
        )));
    }
    Ok(trimmed.to_string())
}

/// Delivers generated credentials to new members.
pub trait Notifier: Send + Sync {
    fn send_generated_credential(&self, email: &str, secret: &str) -> Result<()>;
}

/// Drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn send_generated_credential(&self, _email: &str, _secret: &str) -> Result<()> {
        Ok(())
    }
}

/// Records that a credential was issued in the log. The secret is not logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send_generated_credential(&self, email: &str, _secret: &str) -> Result<()> {
        tracing::info!(email, "credential issued");
        Ok(())
    }
}

/// A registration request.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    /// Requested role; only honoured when the acting member is privileged
    pub role: Role,
}

/// Result of a successful registration.
pub struct Registered {
    pub member: Member,
    /// The generated secret, shown once
    pub secret: Zeroizing<String>,
}

fn deliver(notifier: &dyn Notifier, member: &Member, secret: &str) {
    if let Err(e) = notifier.send_generated_credential(&member.email, secret) {
        tracing::warn!(member_id = %member.id, error = %e, "credential delivery failed");
    }
}

/// Register a new member with a generated secret.
///
/// With no actor (first-run bootstrap, self sign-up) or a non-privileged
/// actor the member is always created as a USER.
pub fn register_member<S: MemberStore + ?Sized>(
    store: &S,
    notifier: &dyn Notifier,
    registration: &Registration,
    actor: Option<&Member>,
) -> Result<Registered> {
    let name = validate_name(&registration.name)?;
    let email = normalize_email(&registration.email);
    validate_email(&email)?;

    if store.member_exists_by_email(&email)? {
        tracing::warn!(email = %email, "registration refused: email taken");
        return Err(LibraryError::DuplicateEmail(email));
    }

    let role = match actor {
        Some(actor) if is_privileged(actor) => registration.role,
        _ => {
            if registration.role != Role::User {
                tracing::warn!(requested = %registration.role, "role request ignored for unprivileged actor");
            }
            Role::User
        }
    };

    let secret = generate_secret()?;
    let credential_hash = hash_secret(&secret)?;
    let member = store.insert_member(&NewMember {
        name,
        email,
        credential_hash,
        role,
    })?;

    deliver(notifier, &member, &secret);
    Ok(Registered { member, secret })
}

/// Bootstrap the first administrator of an empty library.
///
/// # Errors
///
/// Returns `LibraryError::PermissionDenied` if any member already exists.
pub fn register_first_admin<S: MemberStore + ?Sized>(
    store: &S,
    notifier: &dyn Notifier,
    name: &str,
    email: &str,
) -> Result<Registered> {
    if !store.list_members()?.is_empty() {
        return Err(LibraryError::PermissionDenied(
            "an administrator can only be bootstrapped into an empty library".to_string(),
        ));
    }

    let email = normalize_email(email);
    validate_email(&email)?;
    let secret = generate_secret()?;
    let member = store.insert_member(&NewMember {
        name: validate_name(name)?,
        email,
        credential_hash: hash_secret(&secret)?,
        role: Role::Admin,
    })?;

    deliver(notifier, &member, &secret);
    Ok(Registered { member, secret })
}

/// Edit a member's name, email or role on behalf of `actor`.
///
/// Role changes from a non-privileged actor are ignored. Credential hashes
/// cannot be set here; use [`reset_credential`].
pub fn update_member<S: MemberStore + ?Sized>(
    store: &S,
    id: &Uuid,
    update: &MemberUpdate,
    actor: &Member,
) -> Result<Member> {
    if !can_manage_member(actor, id) {
        return Err(LibraryError::PermissionDenied(format!(
            "{} may not edit member {}",
            actor.email, id
        )));
    }

    let mut allowed = MemberUpdate {
        name: update.name.clone(),
        email: update.email.clone(),
        role: None,
        credential_hash: None,
    };
    if update.role.is_some() {
        if is_privileged(actor) {
            allowed.role = update.role;
        } else {
            tracing::warn!(member_id = %id, "role change ignored for unprivileged actor");
        }
    }

    store.update_member(id, &allowed)
}

/// Replace a member's credential with a freshly generated secret.
pub fn reset_credential<S: MemberStore + ?Sized>(
    store: &S,
    notifier: &dyn Notifier,
    id: &Uuid,
    actor: &Member,
) -> Result<Registered> {
    if !can_manage_member(actor, id) {
        return Err(LibraryError::PermissionDenied(format!(
            "{} may not reset the credential of member {}",
            actor.email, id
        )));
    }

    let secret = generate_secret()?;
    let member = store.update_member(
        id,
        &MemberUpdate {
            credential_hash: Some(hash_secret(&secret)?),
            ..MemberUpdate::default()
        },
    )?;

    deliver(notifier, &member, &secret);
    Ok(Registered { member, secret })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::credential::verify_secret;
    use crate::storage::SqliteStore;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl Notifier for RecordingNotifier {
        fn send_generated_credential(&self, email: &str, secret: &str) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((email.to_string(), secret.to_string()));
            Ok(())
        }
    }

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn send_generated_credential(&self, _email: &str, _secret: &str) -> Result<()> {
            Err(LibraryError::Storage("smtp down".to_string()))
        }
    }

    fn registration(email: &str, role: Role) -> Registration {
        Registration {
            name: "Margaret Hamilton".into(),
            email: email.into(),
            role,
        }
    }

    #[test]
    fn test_register_stores_hash_and_notifies() {
        let store = SqliteStore::open_in_memory().unwrap();
        let notifier = RecordingNotifier::default();

        let registered = register_member(
            &store,
            &notifier,
            &registration(" Margaret@MIT.edu ", Role::User),
            None,
        )
        .unwrap();

        assert_eq!(registered.member.email, "margaret@mit.edu");
        assert_ne!(registered.member.credential_hash, *registered.secret);
        assert!(verify_secret(&registered.secret, &registered.member.credential_hash).unwrap());

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "margaret@mit.edu");
        assert_eq!(sent[0].1, *registered.secret);
    }

    #[test]
    fn test_duplicate_email_refused() {
        let store = SqliteStore::open_in_memory().unwrap();
        register_member(&store, &NoopNotifier, &registration("a@b.org", Role::User), None).unwrap();

        let err = register_member(&store, &NoopNotifier, &registration("A@B.org", Role::User), None)
            .err()
            .unwrap();
        assert!(matches!(err, LibraryError::DuplicateEmail(_)));
    }

    #[test]
    fn test_role_requires_privileged_actor() {
        let store = SqliteStore::open_in_memory().unwrap();
        let admin = register_first_admin(&store, &NoopNotifier, "Root", "root@lib.org")
            .unwrap()
            .member;
        let user = register_member(&store, &NoopNotifier, &registration("u@lib.org", Role::Admin), None)
            .unwrap()
            .member;
        assert_eq!(user.role, Role::User);

        let by_user = register_member(
            &store,
            &NoopNotifier,
            &registration("v@lib.org", Role::Admin),
            Some(&user),
        )
        .unwrap()
        .member;
        assert_eq!(by_user.role, Role::User);

        let by_admin = register_member(
            &store,
            &NoopNotifier,
            &registration("w@lib.org", Role::Admin),
            Some(&admin),
        )
        .unwrap()
        .member;
        assert_eq!(by_admin.role, Role::Admin);
    }

    #[test]
    fn test_notifier_failure_keeps_member() {
        let store = SqliteStore::open_in_memory().unwrap();
        let registered = register_member(
            &store,
            &FailingNotifier,
            &registration("x@lib.org", Role::User),
            None,
        )
        .unwrap();

        assert!(store.get_member(&registered.member.id).unwrap().is_some());
    }

    #[test]
    fn test_first_admin_only_into_empty_library() {
        let store = SqliteStore::open_in_memory().unwrap();
        register_first_admin(&store, &NoopNotifier, "Root", "root@lib.org").unwrap();

        let err = register_first_admin(&store, &NoopNotifier, "Again", "again@lib.org")
            .err()
            .unwrap();
        assert!(matches!(err, LibraryError::PermissionDenied(_)));
    }

    #[test]
    fn test_update_member_permissions() {
        let store = SqliteStore::open_in_memory().unwrap();
        let a = register_member(&store, &NoopNotifier, &registration("a@lib.org", Role::User), None)
            .unwrap()
            .member;
        let b = register_member(&store, &NoopNotifier, &registration("b@lib.org", Role::User), None)
            .unwrap()
            .member;

        let promote = MemberUpdate {
            name: Some("Ann".into()),
            role: Some(Role::Admin),
            ..MemberUpdate::default()
        };
        let own = update_member(&store, &a.id, &promote, &a).unwrap();
        assert_eq!(own.name, "Ann");
        assert_eq!(own.role, Role::User);

        let err = update_member(&store, &b.id, &promote, &a).unwrap_err();
        assert!(matches!(err, LibraryError::PermissionDenied(_)));
    }

    #[test]
    fn test_reset_credential_replaces_hash() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = register_member(&store, &NoopNotifier, &registration("r@lib.org", Role::User), None)
            .unwrap();

        let reset = reset_credential(&store, &NoopNotifier, &first.member.id, &first.member).unwrap();

        assert!(!verify_secret(&first.secret, &reset.member.credential_hash).unwrap());
        assert!(verify_secret(&reset.secret, &reset.member.credential_hash).unwrap());
    }

    #[test]
    fn test_email_validation() {
        assert!(validate_email("a@b").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@b").is_err());
        assert!(validate_email("a@b@c").is_err());
    }
}
