use crate::error::Result;
use crate::gateway::ApiClient;
use crate::models::{RecruitDecision, RecruitList, RecruitRequest, SendRecruitRequest};

impl ApiClient {
    pub async fn send_recruit(&self, request: &SendRecruitRequest) -> Result<RecruitRequest> {
        self.post("/api/recruits", request).await?.into_data()
    }

    pub async fn respond_to_recruit(&self, request_id: i64, decision: RecruitDecision) -> Result<String> {
        self.post::<serde_json::Value, _>(&format!("/api/recruits/{}/respond", request_id), &decision)
            .await?
            .into_message()
    }

    /// Requests sent by the caller's team.
    pub async fn team_recruit_requests(&self) -> Result<RecruitList> {
        self.get("/api/recruits/team-requests").await?.into_data()
    }

    /// Requests waiting for the caller's answer.
    pub async fn pending_recruit_requests(&self) -> Result<RecruitList> {
        self.get("/api/recruits/pending").await?.into_data()
    }
}
