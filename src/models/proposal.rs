use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalStatus {
    Draft,
    Submitted,
    InReview,
    Vetted,
    Callback,
    Funded,
    Rejected,
}

impl ProposalStatus {
    pub const ALL: [ProposalStatus; 7] = [
        ProposalStatus::Draft,
        ProposalStatus::Submitted,
        ProposalStatus::InReview,
        ProposalStatus::Vetted,
        ProposalStatus::Callback,
        ProposalStatus::Funded,
        ProposalStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Draft => "DRAFT",
            ProposalStatus::Submitted => "SUBMITTED",
            ProposalStatus::InReview => "IN_REVIEW",
            ProposalStatus::Vetted => "VETTED",
            ProposalStatus::Callback => "CALLBACK",
            ProposalStatus::Funded => "FUNDED",
            ProposalStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(raw: &str) -> Option<ProposalStatus> {
        Self::ALL.into_iter().find(|status| status.as_str() == raw)
    }
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteDecision {
    Accept,
    Reject,
}

impl VoteDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteDecision::Accept => "ACCEPT",
            VoteDecision::Reject => "REJECT",
        }
    }

    pub fn parse(raw: &str) -> Option<VoteDecision> {
        match raw {
            "ACCEPT" => Some(VoteDecision::Accept),
            "REJECT" => Some(VoteDecision::Reject),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub officer_id: String,
    pub officer_name: String,
    pub decision: VoteDecision,
    pub review: String,
    pub timestamp: i64, // unix millis
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub content: String,
    pub created_at: i64,
    pub is_internal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: String,
    pub title: String,
    pub description: String,
    pub amount: f64,
    pub status: ProposalStatus,
    pub organizer_id: String,
    pub organizer_name: String,
    pub organizer_email: String,
    pub votes: Vec<Vote>,
    pub comments: Vec<Comment>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Proposal {
    pub fn vote_by_mut(&mut self, officer_id: &str) -> Option<&mut Vote> {
        self.votes.iter_mut().find(|vote| vote.officer_id == officer_id)
    }

    pub fn count_decisions(&self, decision: VoteDecision) -> usize {
        self.votes.iter().filter(|vote| vote.decision == decision).count()
    }

    pub fn touch(&mut self) {
        self.updated_at = now_millis();
    }
}

/// Filter for proposal listings. Empty filter matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalFilter {
    pub status: Option<ProposalStatus>,
    pub organizer_id: Option<String>,
}

impl ProposalFilter {
    pub fn matches(&self, proposal: &Proposal) -> bool {
        self.status.map_or(true, |status| proposal.status == status)
            && self
                .organizer_id
                .as_deref()
                .map_or(true, |id| proposal.organizer_id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingResults {
    pub proposal_id: String,
    pub accept_count: usize,
    pub reject_count: usize,
    pub total_votes: usize,
    pub total_officers: usize,
    pub threshold: usize,
    pub threshold_met: bool,
    pub status: ProposalStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalStats {
    pub total: usize,
    pub by_status: std::collections::BTreeMap<ProposalStatus, usize>,
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
