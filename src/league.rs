//! Team and recruiting operations.
//!
//! Reads go through the query cache. Mutations run their rule check locally,
//! hold a submit permit for the duration of the request, then drop every
//! cached read the mutation could have changed, whether the server accepted
//! the change or not.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::auth::Auth;
use crate::cache::{QueryCache, QueryGroup, QueryKey};
use crate::error::{Error, Result};
use crate::gateway::ApiClient;
use crate::inflight::{Action, SubmitLock};
use crate::models::{
    Profile, RecruitDecision, RecruitList, RecruitRequest, SendRecruitRequest, Team,
    TeamCreateRequest, TeamList, UserList, UserQuery,
};
use crate::rules::{self, RuleViolation, TeamLimits};

pub struct League {
    client: Arc<ApiClient>,
    cache: Arc<QueryCache>,
    auth: Arc<Auth>,
    limits: TeamLimits,
    submits: SubmitLock,
}

impl League {
    pub fn new(
        client: Arc<ApiClient>,
        cache: Arc<QueryCache>,
        auth: Arc<Auth>,
        limits: TeamLimits,
    ) -> Self {
        Self {
            client,
            cache,
            auth,
            limits,
            submits: SubmitLock::new(),
        }
    }

    pub fn limits(&self) -> TeamLimits {
        self.limits
    }

    pub fn is_submitting(&self, action: &Action) -> bool {
        self.submits.is_pending(action)
    }

    async fn cached<T, F>(&self, key: QueryKey, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: Future<Output = Result<T>>,
    {
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }
        let value = fetch.await?;
        self.cache.put(key, &value);
        Ok(value)
    }

    fn actor(&self) -> Result<Profile> {
        self.auth
            .profile()
            .ok_or_else(|| Error::Unauthorized("sign in first".to_string()))
    }

    /// Re-reads the profile after a mutation that changed the caller's team.
    async fn refresh_actor(&self) {
        if let Err(e) = self.auth.refresh_profile().await {
            warn!("Profile refresh after mutation failed: {}", e);
        }
    }

    /// Drops `groups` once a mutation's request has completed, then hands back its outcome.
    fn settle<T>(&self, outcome: Result<T>, groups: &[QueryGroup]) -> Result<T> {
        self.cache.invalidate(groups);
        if let Err(e) = &outcome {
            debug!(?groups, "mutation failed, cached reads dropped anyway: {}", e);
        }
        outcome
    }

    pub async fn users(&self, query: &UserQuery) -> Result<UserList> {
        self.cached(QueryKey::Users(query.clone()), self.client.users(query))
            .await
    }

    pub async fn available_users(&self, query: &UserQuery) -> Result<UserList> {
        self.cached(
            QueryKey::AvailableUsers(query.clone()),
            self.client.available_users(query),
        )
        .await
    }

    pub async fn teams(&self) -> Result<TeamList> {
        self.cached(QueryKey::Teams, self.client.teams()).await
    }

    pub async fn team(&self, team_id: i64) -> Result<Team> {
        self.cached(QueryKey::Team(team_id), self.client.team(team_id))
            .await
    }

    /// The caller's team, or `None` when they are not on one.
    pub async fn my_team(&self) -> Result<Option<Team>> {
        self.cached(QueryKey::MyTeam, self.client.my_team()).await
    }

    /// Requests waiting for the caller's answer.
    pub async fn pending_requests(&self) -> Result<RecruitList> {
        self.cached(
            QueryKey::RecruitsPending,
            self.client.pending_recruit_requests(),
        )
        .await
    }

    /// Requests the caller's team has sent.
    pub async fn team_requests(&self) -> Result<RecruitList> {
        self.cached(QueryKey::RecruitsTeam, self.client.team_recruit_requests())
            .await
    }

    pub async fn create_team(&self, name: &str) -> Result<Team> {
        let actor = self.actor()?;
        rules::check_create_team(&actor, name)?;
        let _permit = self.submits.begin(Action::CreateTeam)?;

        let outcome = self
            .client
            .create_team(&TeamCreateRequest {
                name: name.trim().to_string(),
            })
            .await;
        let team = self.settle(
            outcome,
            &[QueryGroup::Teams, QueryGroup::MyTeam, QueryGroup::Me],
        )?;
        info!(team_id = team.id, name = %team.name, "Team created");

        self.refresh_actor().await;
        Ok(team)
    }

    /// Invites `candidate` into the caller's team.
    ///
    /// Fails locally without contacting the server when the caller does not
    /// lead a team, the team is full, or the candidate would push the team
    /// over the score cap.
    pub async fn send_recruit(
        &self,
        candidate: &Profile,
        message: Option<String>,
    ) -> Result<RecruitRequest> {
        let actor = self.actor()?;
        let team = self.my_team().await?.ok_or(RuleViolation::NotOnTeam)?;
        rules::check_send_recruit(&actor, &team, candidate, self.limits)?;
        let _permit = self.submits.begin(Action::SendRecruit(candidate.id))?;

        let outcome = self
            .client
            .send_recruit(&SendRecruitRequest {
                target_user_id: candidate.id,
                message,
            })
            .await;
        // a refusal means the roster we checked against was out of date
        let mut groups = vec![QueryGroup::Recruits];
        if outcome.is_err() {
            groups.extend([QueryGroup::MyTeam, QueryGroup::Team(team.id)]);
        }
        let request = self.settle(outcome, &groups)?;
        info!(
            request_id = request.id,
            team_id = team.id,
            target = candidate.id,
            "Recruit request sent"
        );
        Ok(request)
    }

    /// Accepts or rejects a request addressed to the caller.
    pub async fn respond(&self, request: &RecruitRequest, accept: bool) -> Result<String> {
        let actor = self.actor()?;
        if accept {
            rules::check_accept_recruit(&actor, request, self.limits)?;
        } else {
            rules::check_reject_recruit(&actor, request)?;
        }
        let _permit = self.submits.begin(Action::RespondRecruit(request.id))?;

        let outcome = self
            .client
            .respond_to_recruit(request.id, RecruitDecision { accept })
            .await;
        let message = self.settle(
            outcome,
            &[
                QueryGroup::Recruits,
                QueryGroup::MyTeam,
                QueryGroup::Team(request.team.id),
                QueryGroup::Teams,
                QueryGroup::Me,
                QueryGroup::AvailableUsers,
            ],
        )?;
        info!(request_id = request.id, accept, "Recruit request answered");

        self.refresh_actor().await;
        Ok(message)
    }

    pub async fn leave_team(&self) -> Result<String> {
        let actor = self.actor()?;
        rules::check_leave(&actor)?;
        let _permit = self.submits.begin(Action::LeaveTeam)?;

        let outcome = self.client.leave_team().await;
        let message = self.settle(
            outcome,
            &[
                QueryGroup::Teams,
                QueryGroup::MyTeam,
                QueryGroup::Me,
                QueryGroup::AvailableUsers,
            ],
        )?;
        info!(user_id = actor.id, "Left team");

        self.refresh_actor().await;
        Ok(message)
    }

    pub async fn kick_member(&self, user_id: i64) -> Result<String> {
        let actor = self.actor()?;
        let team = self.my_team().await?.ok_or(RuleViolation::NotOnTeam)?;
        rules::check_kick(&actor, &team, user_id)?;
        let _permit = self.submits.begin(Action::Kick(user_id))?;

        let outcome = self.client.kick_member(user_id).await;
        let message = self.settle(
            outcome,
            &[
                QueryGroup::Teams,
                QueryGroup::MyTeam,
                QueryGroup::Team(team.id),
                QueryGroup::AvailableUsers,
            ],
        )?;
        debug!(team_id = team.id, user_id, "Member removed: {}", message);
        Ok(message)
    }
}
