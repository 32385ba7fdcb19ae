use serde_json::json;
use tempfile::TempDir;
use fundvote_lib::commands::auth::{get_current_user, list_officers, list_users, login, logout, register};
use fundvote_lib::commands::proposals::{
    add_comment, create_proposal, get_proposal, get_proposal_stats, list_comments, list_proposals,
    submit_proposal, update_proposal_status,
};
use fundvote_lib::commands::settings::{get_settings, save_settings};
use fundvote_lib::commands::voting::{get_voting_results, submit_vote};
use fundvote_lib::engine::proposals::{NewComment, NewProposal};
use fundvote_lib::models::proposal::{Proposal, ProposalFilter, ProposalStatus, VoteDecision};
use fundvote_lib::models::response::ApiResponse;
use fundvote_lib::models::user::{NewUser, User, UserRole};
use fundvote_lib::seed::DEMO_PASSWORD;
use fundvote_lib::AppState;

fn open_data_dir() -> (TempDir, String, AppState) {
    fundvote_lib::init_logging();
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let data_dir = temp_dir.path().to_string_lossy().to_string();
    let state = AppState::open(&data_dir).expect("open app state");
    (temp_dir, data_dir, state)
}

async fn in_review_proposal(state: &AppState) -> Proposal {
    let listed = list_proposals(
        state,
        Some(ProposalFilter {
            status: Some(ProposalStatus::InReview),
            organizer_id: None,
        }),
    )
    .await
    .expect("list in-review proposals");
    listed.into_iter().next().expect("seeded in-review proposal")
}

async fn officers(state: &AppState) -> Vec<User> {
    let officers = list_officers(state).await.expect("list officers");
    assert_eq!(officers.len(), 5);
    officers
}

#[tokio::test]
async fn open_writes_default_settings_and_seeds_demo_accounts() {
    let (tmp, data_dir, state) = open_data_dir();

    assert!(tmp.path().join(".fundvote").join("settings.json").exists());
    assert!(tmp.path().join(".fundvote").join("state.db").exists());

    let settings = get_settings(data_dir).await.expect("load settings");
    assert_eq!(settings["storage"], json!("sqlite"));
    assert_eq!(settings["simulatedLatencyMs"], json!(0));

    officers(&state).await;
    let session = login(&state, "admin@fundvote.dev".to_string(), DEMO_PASSWORD.to_string())
        .await
        .expect("admin login");
    assert_eq!(session.role, UserRole::Admin);
}

#[tokio::test]
async fn settings_commands_round_trip_and_merge_partial_updates() {
    let (_tmp, data_dir, _state) = open_data_dir();
    let initial = get_settings(data_dir.clone()).await.expect("load settings");

    let saved = save_settings(
        data_dir.clone(),
        json!({
            "storage": "memory",
            "simulatedLatencyMs": 5
        }),
    )
    .await
    .expect("save settings");

    assert_eq!(saved["storage"], json!("memory"));
    assert_eq!(saved["simulatedLatencyMs"], json!(5));
    assert_eq!(saved["sessionTtlMinutes"], initial["sessionTtlMinutes"]);

    let reopened = AppState::open(&data_dir).expect("reopen with memory store");
    assert_eq!(reopened.settings.simulated_latency.as_millis(), 5);
    officers(&reopened).await;
}

#[tokio::test]
async fn four_first_time_accepts_fund_an_in_review_proposal() {
    let (_tmp, _data_dir, state) = open_data_dir();
    let proposal = in_review_proposal(&state).await;
    let roster = officers(&state).await;

    let vetted = submit_vote(
        &state,
        proposal.id.clone(),
        roster[0].id.clone(),
        VoteDecision::Accept,
        "Budget is realistic".to_string(),
    )
    .await
    .expect("first vote");
    assert_eq!(vetted.status, ProposalStatus::Vetted);
    assert_eq!(vetted.votes.len(), 1);

    let mut latest = vetted;
    for officer in &roster[1..4] {
        latest = submit_vote(
            &state,
            proposal.id.clone(),
            officer.id.clone(),
            VoteDecision::Accept,
            "Approve".to_string(),
        )
        .await
        .expect("accept vote");
    }
    assert_eq!(latest.status, ProposalStatus::Funded);
    assert!(latest.updated_at >= proposal.updated_at);

    let wire = serde_json::to_value(&latest).expect("serialize proposal");
    assert_eq!(wire["status"], json!("FUNDED"));
    assert_eq!(wire["votes"][0]["decision"], json!("ACCEPT"));

    let results = get_voting_results(&state, proposal.id.clone())
        .await
        .expect("voting results");
    assert_eq!(results.accept_count, 4);
    assert_eq!(results.reject_count, 0);
    assert_eq!(results.total_officers, 5);
    assert!(results.threshold_met);
}

#[tokio::test]
async fn revote_keeps_one_entry_and_skips_status_recompute() {
    let (_tmp, _data_dir, state) = open_data_dir();
    let proposal = in_review_proposal(&state).await;
    let officer = officers(&state).await.remove(0);

    submit_vote(
        &state,
        proposal.id.clone(),
        officer.id.clone(),
        VoteDecision::Reject,
        "Missing quotes".to_string(),
    )
    .await
    .expect("reject vote");

    // Push the proposal back so a recompute would be visible.
    let admin_token = login(&state, "admin@fundvote.dev".to_string(), DEMO_PASSWORD.to_string())
        .await
        .expect("admin login")
        .token;
    update_proposal_status(
        &state,
        admin_token,
        proposal.id.clone(),
        ProposalStatus::InReview,
    )
    .await
    .expect("admin override");

    let revised = submit_vote(
        &state,
        proposal.id.clone(),
        officer.id.clone(),
        VoteDecision::Accept,
        "Quotes received".to_string(),
    )
    .await
    .expect("revote");

    assert_eq!(revised.votes.len(), 1);
    assert_eq!(revised.votes[0].decision, VoteDecision::Accept);
    assert_eq!(revised.votes[0].review, "Quotes received");
    assert_eq!(revised.status, ProposalStatus::InReview);
}

#[tokio::test]
async fn failures_surface_verbatim_in_the_response_envelope() {
    let (_tmp, _data_dir, state) = open_data_dir();
    let proposal = in_review_proposal(&state).await;
    let officer = officers(&state).await.remove(0);

    let missing_proposal = submit_vote(
        &state,
        "no-such-proposal".to_string(),
        officer.id.clone(),
        VoteDecision::Accept,
        String::new(),
    )
    .await;
    let envelope = serde_json::to_value(ApiResponse::from(missing_proposal)).expect("serialize");
    assert_eq!(envelope, json!({ "success": false, "message": "Proposal not found" }));

    let missing_officer = submit_vote(
        &state,
        proposal.id.clone(),
        "no-such-officer".to_string(),
        VoteDecision::Accept,
        String::new(),
    )
    .await;
    assert_eq!(missing_officer.expect_err("unknown officer"), "Officer not found");

    let untouched = get_proposal(&state, proposal.id.clone()).await.expect("get");
    assert!(untouched.votes.is_empty());
    assert_eq!(untouched.status, ProposalStatus::InReview);

    let no_votes = get_voting_results(&state, proposal.id.clone()).await;
    assert_eq!(no_votes.expect_err("no votes"), "Voting results not found");

    let ok = ApiResponse::from(get_proposal(&state, proposal.id.clone()).await);
    let envelope = serde_json::to_value(ok).expect("serialize");
    assert_eq!(envelope["success"], json!(true));
    assert_eq!(envelope["data"]["id"], json!(proposal.id));
}

#[tokio::test]
async fn admin_commands_enforce_session_roles() {
    let (_tmp, _data_dir, state) = open_data_dir();
    let proposal = in_review_proposal(&state).await;

    let organizer = login(
        &state,
        "kemi.organizer@fundvote.dev".to_string(),
        DEMO_PASSWORD.to_string(),
    )
    .await
    .expect("organizer login");
    let denied = update_proposal_status(
        &state,
        organizer.token.clone(),
        proposal.id.clone(),
        ProposalStatus::Rejected,
    )
    .await;
    assert_eq!(denied.expect_err("organizer denied"), "Access denied");

    let bogus = get_proposal_stats(&state, "bogus-token".to_string()).await;
    assert_eq!(bogus.expect_err("unknown token"), "Session expired or invalid");

    let admin = login(&state, "admin@fundvote.dev".to_string(), DEMO_PASSWORD.to_string())
        .await
        .expect("admin login");
    let rejected = update_proposal_status(
        &state,
        admin.token.clone(),
        proposal.id.clone(),
        ProposalStatus::Rejected,
    )
    .await
    .expect("admin rejects");
    assert_eq!(rejected.status, ProposalStatus::Rejected);

    let stats = get_proposal_stats(&state, admin.token.clone())
        .await
        .expect("stats");
    assert_eq!(stats.total, 3);
    assert_eq!(stats.by_status[&ProposalStatus::Rejected], 1);

    let all_users = list_users(&state, admin.token.clone(), None)
        .await
        .expect("list users");
    assert_eq!(all_users.len(), 9);

    logout(&state, admin.token.clone()).await.expect("logout");
    let after = get_current_user(&state, admin.token).await;
    assert!(after.is_err());
}

#[tokio::test]
async fn organizer_flow_and_comment_visibility() {
    let (_tmp, _data_dir, state) = open_data_dir();

    let organizer = register(
        &state,
        NewUser {
            email: "zainab@example.com".to_string(),
            name: "Zainab Musa".to_string(),
            password: "secret99".to_string(),
            role: UserRole::Organizer,
        },
    )
    .await
    .expect("register organizer");
    let organizer_session = login(&state, "zainab@example.com".to_string(), "secret99".to_string())
        .await
        .expect("organizer login");
    let me = get_current_user(&state, organizer_session.token.clone())
        .await
        .expect("current user");
    assert_eq!(me.id, organizer.id);

    let draft = create_proposal(
        &state,
        NewProposal {
            organizer_id: organizer.id.clone(),
            title: "Clinic solar backup".to_string(),
            description: "Keep the vaccine fridge running".to_string(),
            amount: 9_800.0,
        },
    )
    .await
    .expect("create proposal");
    assert_eq!(draft.status, ProposalStatus::Draft);

    let submitted = submit_proposal(&state, draft.id.clone())
        .await
        .expect("submit proposal");
    assert_eq!(submitted.status, ProposalStatus::Submitted);

    let again = submit_proposal(&state, draft.id.clone()).await;
    assert_eq!(
        again.expect_err("double submit"),
        "Cannot move proposal from SUBMITTED to SUBMITTED"
    );

    add_comment(
        &state,
        draft.id.clone(),
        NewComment {
            author: "Amaka Eze".to_string(),
            content: "Ask for the inverter spec".to_string(),
            is_internal: true,
        },
    )
    .await
    .expect("internal comment");
    add_comment(
        &state,
        draft.id.clone(),
        NewComment {
            author: "Zainab Musa".to_string(),
            content: "Spec attached".to_string(),
            is_internal: false,
        },
    )
    .await
    .expect("public comment");

    let organizer_view = list_comments(&state, organizer_session.token.clone(), draft.id.clone())
        .await
        .expect("organizer comments");
    assert_eq!(organizer_view.len(), 1);

    let officer_session = login(
        &state,
        "amaka.officer@fundvote.dev".to_string(),
        DEMO_PASSWORD.to_string(),
    )
    .await
    .expect("officer login");
    let officer_view = list_comments(&state, officer_session.token, draft.id.clone())
        .await
        .expect("officer comments");
    assert_eq!(officer_view.len(), 2);

    let mine = list_proposals(
        &state,
        Some(ProposalFilter {
            status: None,
            organizer_id: Some(organizer.id.clone()),
        }),
    )
    .await
    .expect("organizer proposals");
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, draft.id);
}

#[tokio::test]
async fn sqlite_store_persists_votes_across_restarts() {
    let (_tmp, data_dir, state) = open_data_dir();
    let proposal = in_review_proposal(&state).await;
    let roster = officers(&state).await;

    let decisions = [VoteDecision::Reject, VoteDecision::Accept];
    for (officer, decision) in roster.iter().zip(decisions) {
        submit_vote(
            &state,
            proposal.id.clone(),
            officer.id.clone(),
            decision,
            "noted".to_string(),
        )
        .await
        .expect("vote");
    }
    drop(state);

    let reopened = AppState::open(&data_dir).expect("reopen");
    // Seeding is skipped for a store that already has users.
    officers(&reopened).await;

    let stored = get_proposal(&reopened, proposal.id.clone()).await.expect("get");
    assert_eq!(stored.status, ProposalStatus::Vetted);
    let order: Vec<&str> = stored.votes.iter().map(|v| v.officer_id.as_str()).collect();
    assert_eq!(order, vec![roster[0].id.as_str(), roster[1].id.as_str()]);
}
