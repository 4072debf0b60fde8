use std::collections::HashSet;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// The bearer token as kept in durable storage.
///
/// Two expiries apply: the application's own (`expires_at`, set when the token
/// is stored) and the `exp` claim embedded in the token. Either one lapsing
/// invalidates the token.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StoredToken {
    pub value: String,
    pub stored_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct ExpiryClaim {
    exp: Option<i64>,
}

impl StoredToken {
    pub fn new(value: impl Into<String>, lifetime: Duration, now: DateTime<Utc>) -> Self {
        StoredToken {
            value: value.into(),
            stored_at: now,
            expires_at: now + lifetime,
        }
    }

    /// Reads the `exp` claim without verifying the signature; only the server can do that.
    pub fn claim_expiry(&self) -> Option<DateTime<Utc>> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        let data = decode::<ExpiryClaim>(&self.value, &DecodingKey::from_secret(&[]), &validation)
            .ok()?;
        Utc.timestamp_opt(data.claims.exp?, 0).single()
    }

    /// A token without a readable `exp` claim is never valid.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if self.expires_at <= now {
            return false;
        }
        matches!(self.claim_expiry(), Some(exp) if exp > now)
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.value)
    }
}

impl std::fmt::Debug for StoredToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredToken")
            .field("value", &"<redacted>")
            .field("stored_at", &self.stored_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
