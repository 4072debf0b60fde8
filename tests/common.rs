#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use leaguedesk::config::{ApiConfig, ConfigV1, StoreConfig};
use leaguedesk::models::{LoginRequest, StoredToken};
use leaguedesk::state::AppState;
use leaguedesk::store::TokenStore;
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Value};

pub fn config_for(base_url: &str) -> ConfigV1 {
    ConfigV1 {
        api: ApiConfig {
            base_url: base_url.to_string(),
            timeout_in_ms: 2000,
        },
        store: StoreConfig {
            enabled: false,
            backend: None,
        },
        ..ConfigV1::default()
    }
}

pub fn app(base_url: &str) -> AppState {
    AppState::new(Arc::new(config_for(base_url))).expect("failed to build app state")
}

pub fn app_with_tokens(base_url: &str, tokens: Arc<dyn TokenStore>) -> AppState {
    AppState::with_token_store(Arc::new(config_for(base_url)), tokens)
        .expect("failed to build app state")
}

/// A JWT whose `exp` claim lies `seconds` from now (negative for the past).
pub fn jwt_expiring_in(seconds: i64) -> String {
    let exp = Utc::now().timestamp() + seconds;
    encode(
        &Header::default(),
        &json!({ "sub": "s2107", "exp": exp }),
        &EncodingKey::from_secret(b"league-backend"),
    )
    .expect("failed to encode test JWT")
}

pub fn stored(jwt: &str) -> StoredToken {
    StoredToken::new(jwt, Duration::days(7), Utc::now())
}

pub fn envelope(data: Value) -> String {
    json!({ "success": true, "message": "ok", "data": data }).to_string()
}

pub fn failure(message: &str) -> String {
    json!({ "success": false, "message": message }).to_string()
}

/// A linked, ranked player.
pub fn player(id: i64, score: i32) -> Value {
    json!({
        "id": id,
        "accountId": format!("s{}", id),
        "name": format!("player{}", id),
        "grade": 2, "classNum": 1, "num": id,
        "userRole": "STU",
        "summonerName": format!("summoner{}", id),
        "tier": "GOLD", "rank": "II", "leaguePoints": 40,
        "score": score,
        "isTeamLeader": false
    })
}

pub fn unlinked(id: i64) -> Value {
    json!({
        "id": id,
        "name": format!("player{}", id),
        "grade": 1, "classNum": 3, "num": id,
        "userRole": "STU",
        "leaguePoints": 0, "score": 0,
        "isTeamLeader": false
    })
}

pub fn on_team(mut profile: Value, team: &str, leader: bool) -> Value {
    profile["teamName"] = json!(team);
    profile["isTeamLeader"] = json!(leader);
    profile
}

/// Team `id` whose first member, the leader, is `members[0]`.
pub fn team(id: i64, name: &str, members: Vec<Value>) -> Value {
    let total: i64 = members.iter().filter_map(|m| m["score"].as_i64()).sum();
    let members: Vec<Value> = members
        .into_iter()
        .enumerate()
        .map(|(i, m)| on_team(m, name, i == 0))
        .collect();
    json!({
        "id": id,
        "name": name,
        "leader": members[0].clone(),
        "totalScore": total,
        "memberCount": members.len(),
        "canRecruit": members.len() < 5,
        "members": members
    })
}

pub fn recruit_request(id: i64, team: Value, target: Value) -> Value {
    json!({
        "id": id,
        "requester": team["leader"].clone(),
        "team": team,
        "targetUser": target,
        "status": "PENDING",
        "message": "join us"
    })
}

pub async fn mock_login(server: &mut ServerGuard, jwt: &str) -> Mock {
    server
        .mock("POST", "/api/users/login")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "success": true, "message": "ok", "data": { "token": jwt } }).to_string())
        .create_async()
        .await
}

pub async fn mock_me(server: &mut ServerGuard, jwt: &str, profile: Value) -> Mock {
    server
        .mock("GET", "/api/users/me")
        .match_header("authorization", format!("Bearer {}", jwt).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(profile))
        .create_async()
        .await
}

pub fn credentials() -> LoginRequest {
    LoginRequest {
        account_id: "s2107".to_string(),
        password: "correct horse".to_string(),
    }
}

/// Logs in as `profile` and returns the state plus the token used.
pub async fn signed_in(server: &mut ServerGuard, profile: Value) -> (AppState, String) {
    let jwt = jwt_expiring_in(3600);
    let _login = mock_login(server, &jwt).await;
    let _me = mock_me(server, &jwt, profile).await;

    let state = app(&server.url());
    state.auth.restore().await.expect("restore failed");
    let outcome = state.auth.login(&credentials()).await.expect("login failed");
    assert!(outcome.is_authenticated(), "unexpected state {:?}", outcome);
    assert_eq!(state.session.state(), outcome);
    (state, jwt)
}
