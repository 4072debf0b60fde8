use serde::{Deserialize, Serialize};

use super::tier::{Rank, Standing, Tier};

/// Which kind of school account the user holds.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserRole {
    #[serde(rename = "SCH")]
    School,
    #[serde(rename = "STU")]
    Student,
    #[serde(rename = "DOR")]
    Dormitory,
}

/// Grade, class and seat number as printed on the school roster.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GradeInfo {
    pub grade: u8,
    pub class_num: u8,
    pub num: u8,
}

/// The server's user record, mirrored into the session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: i64,
    #[serde(default)]
    pub account_id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(flatten)]
    pub grade_info: GradeInfo,
    pub user_role: Option<UserRole>,
    #[serde(rename = "summonerName")]
    pub linked_game_account_name: Option<String>,
    pub tier: Option<Tier>,
    pub rank: Option<Rank>,
    #[serde(default)]
    pub league_points: i32,
    #[serde(default)]
    pub score: i32,
    pub team_name: Option<String>,
    #[serde(default)]
    pub is_team_leader: bool,
}

impl Profile {
    /// True until both a game account name and a tier are known.
    ///
    /// An empty account name counts as absent.
    pub fn needs_game_account_link(&self) -> bool {
        let has_name = self
            .linked_game_account_name
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty());
        !has_name || self.tier.is_none()
    }

    pub fn has_team(&self) -> bool {
        self.team_name
            .as_deref()
            .is_some_and(|name| !name.is_empty())
    }

    /// Ladder standing, once a tier is known.
    pub fn standing(&self) -> Option<Standing> {
        self.tier
            .map(|tier| Standing::new(tier, self.rank, self.league_points))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserList {
    pub users: Vec<Profile>,
    #[serde(default)]
    pub total_count: usize,
}

/// Filters accepted by the user listing endpoints.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_team: Option<bool>,
}

/// School account credentials. The server expects snake_case here.
#[derive(Serialize, Deserialize, Clone)]
pub struct LoginRequest {
    pub account_id: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("account_id", &self.account_id)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoginResponse {
    #[serde(alias = "access_token")]
    pub token: String,
}

/// Riot ID used to link a game account.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RiotAccountRequest {
    pub game_name: String,
    pub tag_line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summoner_name: Option<String>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn profile(id: i64, score: i32) -> Profile {
        Profile {
            id,
            account_id: format!("s{id}"),
            display_name: format!("player{id}"),
            grade_info: GradeInfo {
                grade: 2,
                class_num: 1,
                num: id as u8,
            },
            user_role: Some(UserRole::Student),
            linked_game_account_name: Some(format!("summoner{id}")),
            tier: Some(Tier::Gold),
            rank: Some(Rank::Two),
            league_points: 40,
            score,
            team_name: None,
            is_team_leader: false,
        }
    }
}
