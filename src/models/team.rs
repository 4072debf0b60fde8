use serde::{Deserialize, Serialize};

use super::user::Profile;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub leader: Profile,
    #[serde(default)]
    pub members: Vec<Profile>,
    /// Server-computed; rule checks use [`Team::member_score_sum`].
    #[serde(default)]
    pub total_score: i32,
    #[serde(default)]
    pub member_count: usize,
    #[serde(default)]
    pub can_recruit: bool,
    pub created_at: Option<String>,
}

impl Team {
    /// Members actually listed, with the leader counted once even if the server omitted them.
    pub fn roster_size(&self) -> usize {
        if self.has_member(self.leader.id) {
            self.members.len()
        } else {
            self.members.len() + 1
        }
    }

    pub fn member_score_sum(&self) -> i32 {
        let listed: i32 = self.members.iter().map(|m| m.score).sum();
        if self.has_member(self.leader.id) {
            listed
        } else {
            listed + self.leader.score
        }
    }

    pub fn has_member(&self, user_id: i64) -> bool {
        self.members.iter().any(|m| m.id == user_id)
    }

    pub fn is_led_by(&self, user_id: i64) -> bool {
        self.leader.id == user_id
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamList {
    pub teams: Vec<Team>,
    #[serde(default)]
    pub total_count: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TeamCreateRequest {
    pub name: String,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::models::user::fixtures::profile;

    /// A team led by user 1 with `scores.len()` members, ids 1..=n.
    pub fn team_with_scores(id: i64, scores: &[i32]) -> Team {
        let mut members: Vec<Profile> = scores
            .iter()
            .enumerate()
            .map(|(i, score)| profile(i as i64 + 1, *score))
            .collect();
        for m in members.iter_mut() {
            m.team_name = Some(format!("team{id}"));
        }
        let mut leader = members[0].clone();
        leader.is_team_leader = true;
        members[0].is_team_leader = true;
        Team {
            id,
            name: format!("team{id}"),
            leader,
            total_score: scores.iter().sum(),
            member_count: members.len(),
            can_recruit: members.len() < 5,
            members,
            created_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::team_with_scores;
    use super::*;

    #[test]
    fn sums_member_scores() {
        let team = team_with_scores(1, &[10, 12, 8]);
        assert_eq!(team.roster_size(), 3);
        assert_eq!(team.member_score_sum(), 30);
        assert!(team.is_led_by(1));
        assert!(team.has_member(3));
        assert!(!team.has_member(4));
    }

    #[test]
    fn leader_missing_from_members_is_still_counted() {
        let mut team = team_with_scores(1, &[10, 12]);
        team.members.remove(0);
        assert_eq!(team.roster_size(), 2);
        assert_eq!(team.member_score_sum(), 22);
    }
}
