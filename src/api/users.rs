use tracing::info;

use crate::error::Result;
use crate::gateway::ApiClient;
use crate::models::{LoginRequest, LoginResponse, Profile, RiotAccountRequest, UserList, UserQuery};

impl ApiClient {
    /// `POST /api/users/login`: school credentials for a bearer token.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse> {
        info!(account_id = %credentials.account_id, "Logging in");
        self.post_anonymous("/api/users/login", credentials)
            .await?
            .into_data()
    }

    /// `POST /api/users/register-riot`: links a game account, returning the updated profile.
    pub async fn register_riot(&self, account: &RiotAccountRequest) -> Result<Profile> {
        info!(game_name = %account.game_name, tag_line = %account.tag_line, "Linking game account");
        self.post("/api/users/register-riot", account)
            .await?
            .into_data()
    }

    /// `GET /api/users/me`
    pub async fn me(&self) -> Result<Profile> {
        self.get("/api/users/me").await?.into_data()
    }

    /// `GET /api/users`
    pub async fn users(&self, query: &UserQuery) -> Result<UserList> {
        self.get_with_query("/api/users", query).await?.into_data()
    }

    /// `GET /api/users/available`: players without a team.
    pub async fn available_users(&self, query: &UserQuery) -> Result<UserList> {
        self.get_with_query("/api/users/available", query)
            .await?
            .into_data()
    }
}
