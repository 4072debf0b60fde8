use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::models::ApiResponse;
use crate::session::{SessionEvent, SessionStore};

/// Outbound HTTP access to the league backend.
///
/// Attaches the session's bearer token to every call and turns an
/// authorization failure into a single forced sign-out, no matter how many
/// in-flight calls fail at once.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
    forced_logouts: AtomicUsize,
}

/// The token a request was sent with, if any.
struct Credentials {
    epoch: u64,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, session: Arc<SessionStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Connectivity(format!("failed to build HTTP client: {}", e)))?;
        info!(
            "Creating API client for '{}' (timeout {} ms)",
            config.base_url, config.timeout_in_ms
        );
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            forced_logouts: AtomicUsize::new(0),
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// How many times an authorization failure signed the session out.
    pub fn forced_logouts(&self) -> usize {
        self.forced_logouts.load(Ordering::SeqCst)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>> {
        self.send(self.request(Method::GET, path)).await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send(self.request(Method::GET, path).query(query)).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>> {
        self.send(self.request(Method::POST, path)).await
    }

    /// Sends without any bearer token, whatever the session holds.
    pub async fn post_anonymous<T, B>(&self, path: &str, body: &B) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(self.request(Method::POST, path).json(body), None)
            .await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header("x-request-id", Uuid::new_v4().to_string())
    }

    /// Attaches the current token, or refuses to send an expired one.
    async fn authorize(&self, builder: RequestBuilder) -> Result<(RequestBuilder, Option<Credentials>)> {
        let session = self.session.snapshot();
        let Some(token) = session.token else {
            return Ok((builder, None));
        };

        if !token.is_valid() {
            warn!(epoch = session.epoch, "Held token has expired; signing out.");
            self.sign_out(SessionEvent::TokenExpired {
                epoch: session.epoch,
            })
            .await;
            return Err(Error::Unauthorized("session token has expired".to_string()));
        }

        let builder = builder.bearer_auth(&token.value);
        Ok((
            builder,
            Some(Credentials {
                epoch: session.epoch,
            }),
        ))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<ApiResponse<T>> {
        let (builder, credentials) = self.authorize(builder).await?;
        self.execute(builder, credentials).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        credentials: Option<Credentials>,
    ) -> Result<ApiResponse<T>> {
        let request = builder.build().map_err(Error::from)?;
        let method = request.method().clone();
        let path = request.url().path().to_string();
        debug!(%method, %path, authorized = credentials.is_some(), "Sending API request");

        let response = match self.http.execute(request).await {
            Ok(r) => r,
            Err(e) => {
                warn!(%method, %path, "No response from server: {}", e);
                return Err(Error::from(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            return response
                .json::<ApiResponse<T>>()
                .await
                .map_err(|e| Error::Decode(format!("{} {}: {}", method, path, e)));
        }

        let message = error_message(response).await;
        debug!(%method, %path, status = status.as_u16(), "API request failed: {}", message);
        let error = Error::from_status(status, message);

        if matches!(error, Error::Unauthorized(_)) {
            match credentials {
                Some(Credentials { epoch }) => {
                    self.sign_out(SessionEvent::CredentialsRejected { epoch })
                        .await;
                }
                None => debug!(%path, "Unauthorized without a token; session untouched."),
            }
        }
        Err(error)
    }

    /// Dispatches a sign-out event; only the first one per token epoch takes effect.
    async fn sign_out(&self, event: SessionEvent) {
        match self.session.dispatch(event).await {
            Ok(_) => {
                let count = self.forced_logouts.fetch_add(1, Ordering::SeqCst) + 1;
                warn!(forced_logouts = count, "Server rejected the session; signed out.");
            }
            Err(e) => debug!("Sign-out already handled: {}", e),
        }
    }
}

/// Pulls the server's message out of an error response, preferring the envelope text.
async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if let Ok(envelope) = serde_json::from_str::<ApiResponse<serde_json::Value>>(&body) {
        if !envelope.message.is_empty() {
            return envelope.message;
        }
    }
    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionState;
    use crate::store::MemoryTokenStore;
    use mockito::Server;

    fn client_for(url: &str) -> ApiClient {
        let session = Arc::new(SessionStore::new(Arc::new(MemoryTokenStore::new())));
        ApiClient::new(
            &ApiConfig {
                base_url: url.to_string(),
                timeout_in_ms: 2000,
            },
            session,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn anonymous_request_has_no_bearer() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/api/teams")
            .match_header("authorization", mockito::Matcher::Missing)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success": true, "message": "ok", "data": 1}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let response: ApiResponse<u32> = client.get("/api/teams").await.unwrap();
        m.assert_async().await;
        assert_eq!(response.into_data().unwrap(), 1);
    }

    #[tokio::test]
    async fn error_envelope_message_is_surfaced() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/api/teams")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success": false, "message": "name already taken"}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let err = client
            .post::<serde_json::Value, _>("/api/teams", &serde_json::json!({"name": "Red"}))
            .await
            .unwrap_err();
        m.assert_async().await;
        assert!(
            matches!(err, Error::Validation { status: 400, ref message } if message == "name already taken")
        );
    }

    #[tokio::test]
    async fn unauthorized_without_token_leaves_session_alone() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/api/users/login")
            .with_status(401)
            .with_body("bad credentials")
            .create_async()
            .await;

        let client = client_for(&server.url());
        let err = client
            .post::<serde_json::Value, _>("/api/users/login", &serde_json::json!({}))
            .await
            .unwrap_err();
        m.assert_async().await;
        assert!(matches!(err, Error::Unauthorized(ref m) if m == "bad credentials"));
        assert_eq!(client.forced_logouts(), 0);
        assert_eq!(client.session().state(), SessionState::Unknown);
    }

    #[tokio::test]
    async fn refused_connection_is_connectivity() {
        let client = client_for("http://127.0.0.1:1");
        let err = client.get::<serde_json::Value>("/api/users/me").await.unwrap_err();
        assert!(matches!(err, Error::Connectivity(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/teams")
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let client = client_for(&server.url());
        let err = client.get::<serde_json::Value>("/api/teams").await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
