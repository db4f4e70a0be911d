//! Role checks and listing scope.
//!
//! Every role decision goes through [`is_privileged`]; the scope types turn it
//! into the filters the ledger and member listings take.

use uuid::Uuid;

use crate::error::Result;
use crate::storage::traits::MemberStore;
use crate::storage::types::{Member, Role};

/// Whether the member may see and manage everyone's records.
pub fn is_privileged(member: &Member) -> bool {
    member.role == Role::Admin
}

/// Whether `actor` may edit or delete the member `target`.
pub fn can_manage_member(actor: &Member, target: &Uuid) -> bool {
    is_privileged(actor) || actor.id == *target
}

/// Which loans an actor may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanScope {
    All,
    Member(Uuid),
}

impl LoanScope {
    pub fn for_actor(actor: &Member) -> Self {
        if is_privileged(actor) {
            LoanScope::All
        } else {
            LoanScope::Member(actor.id)
        }
    }

    /// Member filter to pass to the ledger listings.
    pub fn member_filter(&self) -> Option<Uuid> {
        match self {
            LoanScope::All => None,
            LoanScope::Member(id) => Some(*id),
        }
    }

    /// Intersect a requested member filter with this scope.
    ///
    /// A non-privileged actor asking for someone else's loans gets their own.
    pub fn narrow(&self, requested: Option<Uuid>) -> Option<Uuid> {
        match self {
            LoanScope::All => requested,
            LoanScope::Member(id) => Some(*id),
        }
    }
}

/// Which member records an actor may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberScope {
    All,
    SelfOnly(Uuid),
}

impl MemberScope {
    pub fn for_actor(actor: &Member) -> Self {
        if is_privileged(actor) {
            MemberScope::All
        } else {
            MemberScope::SelfOnly(actor.id)
        }
    }

    pub fn list_members<S: MemberStore + ?Sized>(&self, store: &S) -> Result<Vec<Member>> {
        match self {
            MemberScope::All => store.list_members(),
            MemberScope::SelfOnly(id) => Ok(store.get_member(id)?.into_iter().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::NewMember;
    use crate::storage::SqliteStore;

    fn member(role: Role) -> Member {
        Member {
            id: Uuid::new_v4(),
            name: "M".into(),
            email: "m@example.org".into(),
            credential_hash: String::new(),
            role,
        }
    }

    #[test]
    fn test_loan_scope() {
        let admin = member(Role::Admin);
        let user = member(Role::User);
        let other = Uuid::new_v4();

        assert_eq!(LoanScope::for_actor(&admin).member_filter(), None);
        assert_eq!(LoanScope::for_actor(&admin).narrow(Some(other)), Some(other));
        assert_eq!(LoanScope::for_actor(&user).member_filter(), Some(user.id));
        assert_eq!(LoanScope::for_actor(&user).narrow(Some(other)), Some(user.id));
    }

    #[test]
    fn test_can_manage_member() {
        let admin = member(Role::Admin);
        let user = member(Role::User);

        assert!(can_manage_member(&admin, &user.id));
        assert!(can_manage_member(&user, &user.id));
        assert!(!can_manage_member(&user, &admin.id));
    }

    #[test]
    fn test_member_scope_lists_self_only() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut stored = Vec::new();
        for (email, role) in [("a@example.org", Role::Admin), ("u@example.org", Role::User)] {
            stored.push(
                store
                    .insert_member(&NewMember {
                        name: email.into(),
                        email: email.into(),
                        credential_hash: "hash".into(),
                        role,
                    })
                    .unwrap(),
            );
        }

        let all = MemberScope::for_actor(&stored[0]).list_members(&store).unwrap();
        let own = MemberScope::for_actor(&stored[1]).list_members(&store).unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].id, stored[1].id);
    }
}
