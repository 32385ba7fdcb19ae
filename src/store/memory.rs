//! In-memory `PlatformStore`. All data is lost when the process exits.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{sort_newest_first, PlatformStore, ProposalMutation};
use crate::error::{PlatformError, PlatformResult};
use crate::models::proposal::{Proposal, ProposalFilter};
use crate::models::user::{User, UserRole};

#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<String, User>>,
    proposals: RwLock<HashMap<String, Proposal>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> PlatformError {
    PlatformError::Storage("Store lock poisoned".to_string())
}

impl PlatformStore for InMemoryStore {
    fn get_user(&self, id: &str) -> PlatformResult<Option<User>> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.get(id).cloned())
    }

    fn find_user_by_email(&self, email: &str) -> PlatformResult<Option<User>> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn insert_user(&self, user: &User) -> PlatformResult<()> {
        let mut users = self.users.write().map_err(poisoned)?;
        if users
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(PlatformError::Conflict("Email already registered".to_string()));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    fn list_users(&self, role: Option<UserRole>) -> PlatformResult<Vec<User>> {
        let users = self.users.read().map_err(poisoned)?;
        let mut listed: Vec<User> = users
            .values()
            .filter(|user| role.map_or(true, |r| user.role == r))
            .cloned()
            .collect();
        listed.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(listed)
    }

    fn get_proposal(&self, id: &str) -> PlatformResult<Option<Proposal>> {
        let proposals = self.proposals.read().map_err(poisoned)?;
        Ok(proposals.get(id).cloned())
    }

    fn insert_proposal(&self, proposal: &Proposal) -> PlatformResult<()> {
        let mut proposals = self.proposals.write().map_err(poisoned)?;
        if proposals.contains_key(&proposal.id) {
            return Err(PlatformError::Conflict(format!(
                "Proposal {} already exists",
                proposal.id
            )));
        }
        proposals.insert(proposal.id.clone(), proposal.clone());
        Ok(())
    }

    fn list_proposals(&self, filter: &ProposalFilter) -> PlatformResult<Vec<Proposal>> {
        let proposals = self.proposals.read().map_err(poisoned)?;
        let mut listed: Vec<Proposal> = proposals
            .values()
            .filter(|proposal| filter.matches(proposal))
            .cloned()
            .collect();
        sort_newest_first(&mut listed);
        Ok(listed)
    }

    fn update_proposal(&self, id: &str, apply: ProposalMutation<'_>) -> PlatformResult<Proposal> {
        let mut proposals = self.proposals.write().map_err(poisoned)?;
        let stored = proposals
            .get_mut(id)
            .ok_or_else(PlatformError::proposal_not_found)?;

        // A failed mutation leaves the stored record untouched.
        let mut working = stored.clone();
        apply(&mut working)?;
        *stored = working.clone();
        Ok(working)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::proposal::ProposalStatus;

    fn proposal(id: &str, created_at: i64) -> Proposal {
        Proposal {
            id: id.to_string(),
            title: "Solar kiosk".to_string(),
            description: "Community charging".to_string(),
            amount: 1200.0,
            status: ProposalStatus::Draft,
            organizer_id: "org-1".to_string(),
            organizer_name: "Olu".to_string(),
            organizer_email: "olu@example.com".to_string(),
            votes: Vec::new(),
            comments: Vec::new(),
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn failed_mutation_does_not_persist_partial_changes() {
        let store = InMemoryStore::new();
        store.insert_proposal(&proposal("p-1", 1)).expect("insert");

        let err = store
            .update_proposal("p-1", &mut |p: &mut Proposal| -> PlatformResult<()> {
                p.title = "changed".to_string();
                Err(PlatformError::Validation("nope".to_string()))
            })
            .expect_err("mutation fails");
        assert_eq!(err, PlatformError::Validation("nope".to_string()));

        let stored = store.get_proposal("p-1").expect("get").expect("exists");
        assert_eq!(stored.title, "Solar kiosk");
    }

    #[test]
    fn update_of_missing_proposal_is_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .update_proposal("missing", &mut |_: &mut Proposal| Ok(()))
            .expect_err("missing proposal");
        assert_eq!(err.to_string(), "Proposal not found");
    }

    #[test]
    fn proposals_list_newest_first() {
        let store = InMemoryStore::new();
        store.insert_proposal(&proposal("old", 10)).expect("insert old");
        store.insert_proposal(&proposal("new", 20)).expect("insert new");

        let listed = store
            .list_proposals(&ProposalFilter::default())
            .expect("list");
        let ids: Vec<&str> = listed.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }
}
