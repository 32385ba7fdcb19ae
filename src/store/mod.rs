//! Storage abstraction for users and proposals.
//!
//! The voting engine and the command layer only talk to `PlatformStore`;
//! the concrete backend (in-memory maps or SQLite) is picked at startup
//! from the settings file.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use crate::error::PlatformResult;
use crate::models::proposal::{Proposal, ProposalFilter};
use crate::models::user::{User, UserRole};

/// Mutation applied to a single proposal while the store holds it exclusively.
pub type ProposalMutation<'a> = &'a mut dyn FnMut(&mut Proposal) -> PlatformResult<()>;

pub trait PlatformStore: Send + Sync {
    fn get_user(&self, id: &str) -> PlatformResult<Option<User>>;

    /// Case-insensitive email lookup.
    fn find_user_by_email(&self, email: &str) -> PlatformResult<Option<User>>;

    /// Insert a new user. Fails with `Conflict` when the email is taken.
    fn insert_user(&self, user: &User) -> PlatformResult<()>;

    fn list_users(&self, role: Option<UserRole>) -> PlatformResult<Vec<User>>;

    fn get_proposal(&self, id: &str) -> PlatformResult<Option<Proposal>>;

    fn insert_proposal(&self, proposal: &Proposal) -> PlatformResult<()>;

    /// Proposals matching `filter`, newest first.
    fn list_proposals(&self, filter: &ProposalFilter) -> PlatformResult<Vec<Proposal>>;

    /// Load, mutate and write back one proposal as a single atomic step.
    ///
    /// Fails with `NotFound` if the proposal does not exist. If `apply`
    /// returns an error nothing is written and the error is propagated.
    fn update_proposal(&self, id: &str, apply: ProposalMutation<'_>) -> PlatformResult<Proposal>;
}

pub(crate) fn sort_newest_first(proposals: &mut [Proposal]) {
    proposals.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
