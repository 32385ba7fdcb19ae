//! Officer voting and the status changes it drives.
//!
//! A first-time vote from an officer may move the proposal forward:
//! `FUNDED` once [`ACCEPTANCE_THRESHOLD`] accept votes exist, otherwise
//! `IN_REVIEW` becomes `VETTED`. A revised vote only rewrites the officer's
//! existing entry and never recomputes status. The engine never writes
//! `REJECTED`; that only happens through an admin override.

use crate::error::{PlatformError, PlatformResult};
use crate::models::proposal::{
    now_millis, Proposal, ProposalStatus, Vote, VoteDecision, VotingResults,
};
use crate::models::user::{User, UserRole};
use crate::store::PlatformStore;

pub const ACCEPTANCE_THRESHOLD: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The officer already had a vote; it was overwritten in place.
    Revised,
    /// A new vote was appended and status recomputed.
    Recorded {
        previous: ProposalStatus,
        current: ProposalStatus,
    },
}

pub fn submit_vote(
    store: &dyn PlatformStore,
    proposal_id: &str,
    officer_id: &str,
    decision: VoteDecision,
    review: &str,
) -> PlatformResult<Proposal> {
    if store.get_proposal(proposal_id)?.is_none() {
        return Err(PlatformError::proposal_not_found());
    }
    let officer = find_officer(store, officer_id)?;

    let now = now_millis();
    let mut outcome = None;
    let mut apply = |proposal: &mut Proposal| -> PlatformResult<()> {
        outcome = Some(record_vote(proposal, &officer, decision, review, now));
        Ok(())
    };
    let updated = store.update_proposal(proposal_id, &mut apply)?;

    match outcome {
        Some(VoteOutcome::Revised) => {
            log::info!(
                "Officer {} revised vote on proposal {} to {}",
                officer.id,
                proposal_id,
                decision.as_str()
            );
        }
        Some(VoteOutcome::Recorded { previous, current }) => {
            log::info!(
                "Officer {} voted {} on proposal {}",
                officer.id,
                decision.as_str(),
                proposal_id
            );
            if previous != current {
                log::info!("Proposal {proposal_id} moved from {previous} to {current}");
            }
        }
        None => {}
    }

    Ok(updated)
}

/// Apply one officer decision to `proposal` in memory.
pub fn record_vote(
    proposal: &mut Proposal,
    officer: &User,
    decision: VoteDecision,
    review: &str,
    now: i64,
) -> VoteOutcome {
    if let Some(existing) = proposal.vote_by_mut(&officer.id) {
        existing.decision = decision;
        existing.review = review.to_string();
        existing.timestamp = now;
        return VoteOutcome::Revised;
    }

    proposal.votes.push(Vote {
        officer_id: officer.id.clone(),
        officer_name: officer.name.clone(),
        decision,
        review: review.to_string(),
        timestamp: now,
    });

    let previous = proposal.status;
    let next = recompute_status(proposal);
    if next != previous {
        proposal.status = next;
        proposal.updated_at = now;
    }

    VoteOutcome::Recorded {
        previous,
        current: proposal.status,
    }
}

pub fn recompute_status(proposal: &Proposal) -> ProposalStatus {
    if proposal.count_decisions(VoteDecision::Accept) >= ACCEPTANCE_THRESHOLD {
        ProposalStatus::Funded
    } else if proposal.status == ProposalStatus::InReview && !proposal.votes.is_empty() {
        ProposalStatus::Vetted
    } else {
        proposal.status
    }
}

pub fn get_voting_results(
    store: &dyn PlatformStore,
    proposal_id: &str,
) -> PlatformResult<VotingResults> {
    let proposal = store
        .get_proposal(proposal_id)?
        .filter(|p| !p.votes.is_empty())
        .ok_or_else(|| PlatformError::NotFound("Voting results not found".to_string()))?;

    let accept_count = proposal.count_decisions(VoteDecision::Accept);
    let reject_count = proposal.count_decisions(VoteDecision::Reject);
    let total_officers = store.list_users(Some(UserRole::Officer))?.len();

    Ok(VotingResults {
        proposal_id: proposal.id,
        accept_count,
        reject_count,
        total_votes: proposal.votes.len(),
        total_officers,
        threshold: ACCEPTANCE_THRESHOLD,
        threshold_met: accept_count >= ACCEPTANCE_THRESHOLD,
        status: proposal.status,
    })
}

fn find_officer(store: &dyn PlatformStore, officer_id: &str) -> PlatformResult<User> {
    store
        .get_user(officer_id)?
        .filter(|user| user.role == UserRole::Officer)
        .ok_or_else(PlatformError::officer_not_found)
}
