use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::contract::DEFAULT_MAX_RESULTS;

pub const DEFAULT_COLLECTION_PATTERN: &str = "monk:collection-*";
pub const DEFAULT_WORK_PREFIX: &str = "monk:tcp-";
pub const DEFAULT_MEMBERSHIP_PREDICATE: &str =
    "info:fedora/fedora-system:def/relations-external#isMemberOfCollection";
pub const DEFAULT_SUPER_COLLECTION: &str = "monk:collections";

/// Where the repository lives and who we are when talking to it.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub timeout_secs: u64,
    /// Injected from the environment; never read from or written to a config file.
    #[serde(skip)]
    pub password: Option<String>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        RepositoryConfig {
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 8080,
            user: "fedoraAdmin".to_string(),
            timeout_secs: 300,
            password: None,
        }
    }
}

impl RepositoryConfig {
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}/fedora", self.protocol, self.host, self.port)
    }

    pub fn trace_loaded(&self) {
        info!(
            base_url = %self.base_url(),
            user = %self.user,
            timeout_secs = self.timeout_secs,
            password_set = self.password.is_some(),
            "Loaded RepositoryConfig"
        );
    }
}

impl std::fmt::Debug for RepositoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryConfig")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("timeout_secs", &self.timeout_secs)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Settings for the collection-object and work-object listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search terms identifying collection objects.
    pub collection_pattern: String,
    /// PID prefix identifying work objects.
    pub work_prefix: String,
    pub max_results: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            collection_pattern: DEFAULT_COLLECTION_PATTERN.to_string(),
            work_prefix: DEFAULT_WORK_PREFIX.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl SearchConfig {
    pub fn trace_loaded(&self) {
        debug!(?self, "Loaded SearchConfig");
    }
}

/// Settings for the collection-membership query against the resource index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MembershipConfig {
    pub predicate: String,
    /// PID (or `info:fedora/` URI) of the collection every listed collection belongs to.
    pub super_collection: String,
}

impl Default for MembershipConfig {
    fn default() -> Self {
        MembershipConfig {
            predicate: DEFAULT_MEMBERSHIP_PREDICATE.to_string(),
            super_collection: DEFAULT_SUPER_COLLECTION.to_string(),
        }
    }
}
