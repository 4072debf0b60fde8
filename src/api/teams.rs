use crate::error::{Error, Result};
use crate::gateway::ApiClient;
use crate::models::{Team, TeamCreateRequest, TeamList};

impl ApiClient {
    pub async fn create_team(&self, request: &TeamCreateRequest) -> Result<Team> {
        self.post("/api/teams", request).await?.into_data()
    }

    pub async fn teams(&self) -> Result<TeamList> {
        self.get("/api/teams").await?.into_data()
    }

    pub async fn team(&self, team_id: i64) -> Result<Team> {
        self.get(&format!("/api/teams/{}", team_id))
            .await?
            .into_data()
    }

    /// `None` when the caller is not on a team.
    pub async fn my_team(&self) -> Result<Option<Team>> {
        match self.get::<Team>("/api/teams/my-team").await {
            Ok(response) if response.success => Ok(response.data),
            Ok(_) => Ok(None),
            Err(Error::Server { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn leave_team(&self) -> Result<String> {
        self.post_empty::<serde_json::Value>("/api/teams/leave")
            .await?
            .into_message()
    }

    pub async fn kick_member(&self, user_id: i64) -> Result<String> {
        self.post_empty::<serde_json::Value>(&format!("/api/teams/kick/{}", user_id))
            .await?
            .into_message()
    }
}
