use crate::engine::proposals::{self, NewComment, NewProposal};
use crate::models::proposal::{Comment, Proposal, ProposalFilter, ProposalStats, ProposalStatus};
use crate::models::user::UserRole;
use crate::state::AppState;

pub async fn create_proposal(state: &AppState, input: NewProposal) -> Result<Proposal, String> {
    state.simulate_latency().await;
    proposals::create_proposal(state.store(), input).map_err(|e| e.to_string())
}

pub async fn get_proposal(state: &AppState, proposal_id: String) -> Result<Proposal, String> {
    state.simulate_latency().await;
    proposals::get_proposal(state.store(), &proposal_id).map_err(|e| e.to_string())
}

pub async fn list_proposals(
    state: &AppState,
    filter: Option<ProposalFilter>,
) -> Result<Vec<Proposal>, String> {
    state.simulate_latency().await;
    proposals::list_proposals(state.store(), &filter.unwrap_or_default())
        .map_err(|e| e.to_string())
}

pub async fn submit_proposal(state: &AppState, proposal_id: String) -> Result<Proposal, String> {
    state.simulate_latency().await;
    proposals::submit_proposal(state.store(), &proposal_id).map_err(|e| e.to_string())
}

/// Admin-only status override.
pub async fn update_proposal_status(
    state: &AppState,
    token: String,
    proposal_id: String,
    status: ProposalStatus,
) -> Result<Proposal, String> {
    state.simulate_latency().await;
    state
        .sessions
        .require_role(&token, &[UserRole::Admin])
        .map_err(|e| e.to_string())?;
    proposals::set_status(state.store(), &proposal_id, status).map_err(|e| e.to_string())
}

pub async fn add_comment(
    state: &AppState,
    proposal_id: String,
    comment: NewComment,
) -> Result<Comment, String> {
    state.simulate_latency().await;
    proposals::add_comment(state.store(), &proposal_id, comment).map_err(|e| e.to_string())
}

/// Internal comments are only returned to admins and officers.
pub async fn list_comments(
    state: &AppState,
    token: String,
    proposal_id: String,
) -> Result<Vec<Comment>, String> {
    state.simulate_latency().await;
    let session = state.sessions.session(&token).map_err(|e| e.to_string())?;
    let include_internal = matches!(session.role, UserRole::Admin | UserRole::Officer);
    proposals::list_comments(state.store(), &proposal_id, include_internal)
        .map_err(|e| e.to_string())
}

pub async fn get_proposal_stats(state: &AppState, token: String) -> Result<ProposalStats, String> {
    state.simulate_latency().await;
    state
        .sessions
        .require_role(&token, &[UserRole::Admin])
        .map_err(|e| e.to_string())?;
    proposals::proposal_stats(state.store()).map_err(|e| e.to_string())
}
