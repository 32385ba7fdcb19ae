use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, PlatformResult};
use crate::models::proposal::{
    now_millis, Comment, Proposal, ProposalFilter, ProposalStats, ProposalStatus,
};
use crate::models::user::UserRole;
use crate::store::PlatformStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProposal {
    pub organizer_id: String,
    pub title: String,
    pub description: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub author: String,
    pub content: String,
    #[serde(default)]
    pub is_internal: bool,
}

pub fn create_proposal(store: &dyn PlatformStore, input: NewProposal) -> PlatformResult<Proposal> {
    let title = input.title.trim().to_string();
    let description = input.description.trim().to_string();
    if title.is_empty() {
        return Err(PlatformError::Validation("Title is required".to_string()));
    }
    if description.is_empty() {
        return Err(PlatformError::Validation("Description is required".to_string()));
    }
    if !input.amount.is_finite() || input.amount <= 0.0 {
        return Err(PlatformError::Validation(
            "Amount must be greater than zero".to_string(),
        ));
    }

    let organizer = store
        .get_user(&input.organizer_id)?
        .filter(|user| user.role == UserRole::Organizer)
        .ok_or_else(|| PlatformError::NotFound("Organizer not found".to_string()))?;

    let now = now_millis();
    let proposal = Proposal {
        id: uuid::Uuid::new_v4().to_string(),
        title,
        description,
        amount: input.amount,
        status: ProposalStatus::Draft,
        organizer_id: organizer.id,
        organizer_name: organizer.name,
        organizer_email: organizer.email,
        votes: Vec::new(),
        comments: Vec::new(),
        created_at: now,
        updated_at: now,
    };
    store.insert_proposal(&proposal)?;

    log::info!("Proposal {} created by {}", proposal.id, proposal.organizer_email);
    Ok(proposal)
}

pub fn get_proposal(store: &dyn PlatformStore, proposal_id: &str) -> PlatformResult<Proposal> {
    store
        .get_proposal(proposal_id)?
        .ok_or_else(PlatformError::proposal_not_found)
}

pub fn list_proposals(
    store: &dyn PlatformStore,
    filter: &ProposalFilter,
) -> PlatformResult<Vec<Proposal>> {
    store.list_proposals(filter)
}

/// Organizer hands a draft (or a proposal sent back for changes) to review.
pub fn submit_proposal(store: &dyn PlatformStore, proposal_id: &str) -> PlatformResult<Proposal> {
    let mut apply = |proposal: &mut Proposal| -> PlatformResult<()> {
        match proposal.status {
            ProposalStatus::Draft | ProposalStatus::Callback => {
                proposal.status = ProposalStatus::Submitted;
                proposal.touch();
                Ok(())
            }
            from => Err(PlatformError::InvalidTransition {
                from,
                to: ProposalStatus::Submitted,
            }),
        }
    };
    let updated = store.update_proposal(proposal_id, &mut apply)?;
    log::info!("Proposal {proposal_id} submitted for review");
    Ok(updated)
}

/// Admin override. Any status may be written, including backward moves.
pub fn set_status(
    store: &dyn PlatformStore,
    proposal_id: &str,
    status: ProposalStatus,
) -> PlatformResult<Proposal> {
    let mut previous = status;
    let mut apply = |proposal: &mut Proposal| -> PlatformResult<()> {
        previous = proposal.status;
        proposal.status = status;
        proposal.touch();
        Ok(())
    };
    let updated = store.update_proposal(proposal_id, &mut apply)?;
    log::info!("Proposal {proposal_id} moved from {previous} to {status} by admin override");
    Ok(updated)
}

pub fn add_comment(
    store: &dyn PlatformStore,
    proposal_id: &str,
    input: NewComment,
) -> PlatformResult<Comment> {
    let content = input.content.trim().to_string();
    if content.is_empty() {
        return Err(PlatformError::Validation("Comment cannot be empty".to_string()));
    }

    let comment = Comment {
        id: uuid::Uuid::new_v4().to_string(),
        author: input.author,
        content,
        created_at: now_millis(),
        is_internal: input.is_internal,
    };
    store.update_proposal(proposal_id, &mut |proposal: &mut Proposal| -> PlatformResult<()> {
        proposal.comments.push(comment.clone());
        proposal.touch();
        Ok(())
    })?;
    Ok(comment)
}

pub fn list_comments(
    store: &dyn PlatformStore,
    proposal_id: &str,
    include_internal: bool,
) -> PlatformResult<Vec<Comment>> {
    let proposal = get_proposal(store, proposal_id)?;
    Ok(proposal
        .comments
        .into_iter()
        .filter(|comment| include_internal || !comment.is_internal)
        .collect())
}

pub fn proposal_stats(store: &dyn PlatformStore) -> PlatformResult<ProposalStats> {
    let proposals = store.list_proposals(&ProposalFilter::default())?;
    let mut by_status: BTreeMap<ProposalStatus, usize> =
        ProposalStatus::ALL.iter().map(|status| (*status, 0)).collect();
    for proposal in &proposals {
        *by_status.entry(proposal.status).or_insert(0) += 1;
    }
    Ok(ProposalStats {
        total: proposals.len(),
        by_status,
    })
}
