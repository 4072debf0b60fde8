use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use super::store::StoreConfig;

/// Prefix for environment overrides, e.g. `LEAGUEDESK_API__BASE_URL`.
pub const ENV_PREFIX: &str = "LEAGUEDESK_";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0. Every section may be omitted.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone, Default)]
pub struct ConfigV1 {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the league backend lives and how long to wait for it.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_in_ms")]
    pub timeout_in_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_in_ms() -> u64 {
    10_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_in_ms: default_timeout_in_ms(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_in_ms)
    }
}

#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct SessionConfig {
    /// Application-side lifetime of a stored token, independent of its `exp` claim.
    #[serde(default = "default_token_lifetime_days")]
    pub token_lifetime_days: i64,
    /// How long the guard shows a loading state before offering a retry.
    #[serde(default = "default_guard_loading_timeout_ms")]
    pub guard_loading_timeout_ms: u64,
}

fn default_token_lifetime_days() -> i64 {
    7
}

fn default_guard_loading_timeout_ms() -> u64 {
    10_000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_lifetime_days: default_token_lifetime_days(),
            guard_loading_timeout_ms: default_guard_loading_timeout_ms(),
        }
    }
}

impl SessionConfig {
    pub fn token_lifetime(&self) -> chrono::Duration {
        chrono::Duration::days(self.token_lifetime_days)
    }

    pub fn guard_loading_timeout(&self) -> Duration {
        Duration::from_millis(self.guard_loading_timeout_ms)
    }
}

#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct RulesConfig {
    /// Highest allowed sum of member scores in one team.
    #[serde(default = "default_max_team_score")]
    pub max_team_score: i32,
}

fn default_max_team_score() -> i32 {
    crate::rules::MAX_TEAM_SCORE
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            max_team_score: default_max_team_score(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_stale_time_secs")]
    pub stale_time_secs: u64,
}

fn default_stale_time_secs() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time_secs: default_stale_time_secs(),
        }
    }
}

/// Builds the figment: the YAML file, then `LEAGUEDESK_*` environment overrides.
///
/// A missing file is not an error; every setting has a default.
pub fn figment_for(path: &Path) -> Figment {
    Figment::from(Serialized::default("version", "1.0.0"))
        .merge(Yaml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Extracts a versioned config from any figment.
pub fn extract_config(figment: &Figment) -> Result<ConfigV1, figment::Error> {
    match figment.extract::<Config>()? {
        Config::ConfigV1(c) => Ok(c),
    }
}

/// Load config from a YAML file (by default "config.yaml" in the current directory).
pub fn load_config(path: &Path) -> ConfigV1 {
    match extract_config(&figment_for(path)) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> Result<(), serde_json::Error> {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_yaml(yaml: &str) -> Result<ConfigV1, figment::Error> {
        extract_config(&Figment::new().merge(Yaml::string(yaml)))
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = from_yaml("version: \"1.0.0\"\n").unwrap();
        assert_eq!(cfg.api.base_url, "http://localhost:8080");
        assert_eq!(cfg.api.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.session.token_lifetime(), chrono::Duration::days(7));
        assert_eq!(cfg.rules.max_team_score, 50);
        assert_eq!(cfg.cache.stale_time_secs, 300);
        assert!(cfg.store.enabled);
        assert!(cfg.store.backend.is_none());
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn full_config() {
        let cfg = from_yaml(
            r#"
version: "1.0.0"
api:
  base_url: "https://league.example.org"
  timeout_in_ms: 2500
store:
  enabled: true
  type: file
  path: /tmp/leaguedesk/session.json
session:
  token_lifetime_days: 1
  guard_loading_timeout_ms: 4000
rules:
  max_team_score: 60
logging:
  level: debug
  format: json
"#,
        )
        .unwrap();
        assert_eq!(cfg.api.base_url, "https://league.example.org");
        assert_eq!(cfg.session.guard_loading_timeout(), Duration::from_secs(4));
        assert_eq!(cfg.rules.max_team_score, 60);
        match cfg.store.backend {
            Some(super::super::StoreBackend::File(f)) => {
                assert_eq!(f.path, std::path::PathBuf::from("/tmp/leaguedesk/session.json"))
            }
            None => panic!("expected a file backend"),
        }
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = extract_config(&figment_for(Path::new("/nonexistent/leaguedesk.yaml"))).unwrap();
        assert_eq!(cfg.cache.stale_time_secs, 300);
    }

    #[test]
    fn unknown_version_is_rejected() {
        assert!(from_yaml("version: \"9.9.9\"\n").is_err());
    }
}
