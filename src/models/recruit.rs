use serde::{Deserialize, Serialize};

use super::team::Team;
use super::user::Profile;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecruitStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RecruitStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RecruitStatus::Pending)
    }
}

/// An invitation from a team leader to a player.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecruitRequest {
    pub id: i64,
    pub team: Team,
    pub requester: Profile,
    pub target_user: Profile,
    pub status: RecruitStatus,
    pub message: Option<String>,
    pub created_at: Option<String>,
}

impl RecruitRequest {
    pub fn is_actionable(&self) -> bool {
        !self.status.is_terminal()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecruitList {
    pub requests: Vec<RecruitRequest>,
    #[serde(default)]
    pub total_count: usize,
}

/// Body of `POST /api/recruits`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SendRecruitRequest {
    pub target_user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of `POST /api/recruits/{id}/respond`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct RecruitDecision {
    pub accept: bool,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::models::team::fixtures::team_with_scores;
    use crate::models::user::fixtures::profile;

    pub fn pending_request(id: i64, team_scores: &[i32], target: Profile) -> RecruitRequest {
        let team = team_with_scores(10, team_scores);
        RecruitRequest {
            id,
            requester: team.leader.clone(),
            team,
            target_user: target,
            status: RecruitStatus::Pending,
            message: None,
            created_at: None,
        }
    }

    pub fn target(id: i64, score: i32) -> Profile {
        profile(id, score)
    }
}
