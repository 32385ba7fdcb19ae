//! Demo accounts and proposals the dashboards start from on a fresh install.

use crate::engine::{directory, proposals};
use crate::engine::proposals::NewProposal;
use crate::error::PlatformResult;
use crate::models::proposal::ProposalStatus;
use crate::models::user::{NewUser, User, UserRole};
use crate::store::PlatformStore;

pub const DEMO_PASSWORD: &str = "password123";

const DEMO_USERS: &[(&str, &str, UserRole)] = &[
    ("admin@fundvote.dev", "Platform Admin", UserRole::Admin),
    ("amaka.officer@fundvote.dev", "Amaka Eze", UserRole::Officer),
    ("bayo.officer@fundvote.dev", "Bayo Adeyemi", UserRole::Officer),
    ("chioma.officer@fundvote.dev", "Chioma Obi", UserRole::Officer),
    ("dayo.officer@fundvote.dev", "Dayo Bello", UserRole::Officer),
    ("efe.officer@fundvote.dev", "Efe Okoro", UserRole::Officer),
    ("kemi.organizer@fundvote.dev", "Kemi Salami", UserRole::Organizer),
    ("tunde.organizer@fundvote.dev", "Tunde Lawal", UserRole::Organizer),
    ("ife.investor@fundvote.dev", "Ife Nwosu", UserRole::Investor),
];

const DEMO_PROPOSALS: &[(&str, &str, f64, ProposalStatus)] = &[
    (
        "Community solar microgrid",
        "Rooftop panels and storage for twelve households.",
        45_000.0,
        ProposalStatus::InReview,
    ),
    (
        "Mobile literacy van",
        "A converted van carrying books to three rural schools.",
        18_500.0,
        ProposalStatus::Submitted,
    ),
    (
        "Cold storage for farmers",
        "Shared cold room to cut post-harvest losses.",
        32_000.0,
        ProposalStatus::Draft,
    ),
];

/// Seed demo data into an empty store. Returns `false` when users already exist.
pub fn seed_demo_data(store: &dyn PlatformStore) -> PlatformResult<bool> {
    if !store.list_users(None)?.is_empty() {
        log::debug!("Store already has users; skipping demo seed");
        return Ok(false);
    }

    let mut organizers: Vec<User> = Vec::new();
    for (email, name, role) in DEMO_USERS {
        let user = directory::register_user(
            store,
            NewUser {
                email: email.to_string(),
                name: name.to_string(),
                password: DEMO_PASSWORD.to_string(),
                role: *role,
            },
        )?;
        if user.role == UserRole::Organizer {
            organizers.push(user);
        }
    }

    for (index, (title, description, amount, status)) in DEMO_PROPOSALS.iter().enumerate() {
        let Some(organizer) = organizers.get(index % organizers.len().max(1)) else {
            break;
        };
        let proposal = proposals::create_proposal(
            store,
            NewProposal {
                organizer_id: organizer.id.clone(),
                title: title.to_string(),
                description: description.to_string(),
                amount: *amount,
            },
        )?;
        if *status != ProposalStatus::Draft {
            proposals::set_status(store, &proposal.id, *status)?;
        }
    }

    log::info!(
        "Seeded {} demo users and {} demo proposals",
        DEMO_USERS.len(),
        DEMO_PROPOSALS.len()
    );
    Ok(true)
}
