use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::store::FileStoreConfig;

/// A wrapper for the token store configuration:
/// - enabled: if false, the token is kept in memory only.
/// - backend: the durable backend, selected by a "type" tag in the YAML.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Falls back to the file backend at its default path when omitted.
    #[serde(flatten)]
    pub backend: Option<StoreBackend>,
}

fn default_enabled() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
#[serde(tag = "type")]
pub enum StoreBackend {
    #[serde(rename = "file")]
    File(FileStoreConfig),
}

impl Default for StoreBackend {
    fn default() -> Self {
        StoreBackend::File(FileStoreConfig::default())
    }
}
