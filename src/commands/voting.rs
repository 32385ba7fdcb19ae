use crate::engine::voting;
use crate::models::proposal::{Proposal, VoteDecision, VotingResults};
use crate::state::AppState;

pub async fn submit_vote(
    state: &AppState,
    proposal_id: String,
    officer_id: String,
    decision: VoteDecision,
    review: String,
) -> Result<Proposal, String> {
    state.simulate_latency().await;
    voting::submit_vote(state.store(), &proposal_id, &officer_id, decision, &review)
        .map_err(|e| e.to_string())
}

pub async fn get_voting_results(
    state: &AppState,
    proposal_id: String,
) -> Result<VotingResults, String> {
    state.simulate_latency().await;
    voting::get_voting_results(state.store(), &proposal_id).map_err(|e| e.to_string())
}
