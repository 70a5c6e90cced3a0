/// `load_config` module: loads the static YAML config and injects secrets from the environment.
///
/// This is the only place where the user-supplied YAML is parsed. Every key has a
/// default, so a partial file (or no file at all) yields a usable configuration.
///
/// # Responsibilities
/// - Parse the YAML file into the typed config structs from `fedora-components-core`
/// - Inject `FEDORA_PASSWORD` from the environment; passwords never live in the file
///
/// # Errors
/// Errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use fedora_components_core::config::{MembershipConfig, RepositoryConfig, SearchConfig};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const PASSWORD_ENV: &str = "FEDORA_PASSWORD";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub repository: RepositoryConfig,
    pub search: SearchConfig,
    pub membership: MembershipConfig,
}

impl CliConfig {
    /// All defaults, with secrets taken from the environment.
    pub fn from_env() -> Self {
        let mut config = CliConfig::default();
        inject_env(&mut config);
        config
    }

    pub fn trace_loaded(&self) {
        self.repository.trace_loaded();
        self.search.trace_loaded();
        info!(
            predicate = %self.membership.predicate,
            super_collection = %self.membership.super_collection,
            "Loaded MembershipConfig"
        );
    }
}

fn inject_env(config: &mut CliConfig) {
    config.repository.password = std::env::var(PASSWORD_ENV)
        .ok()
        .filter(|p| !p.is_empty());
}

/// Loads a static YAML config file (no secrets) and injects the password from the environment.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    // An empty document is valid and means "all defaults".
    let mut config: CliConfig = if config_content.trim().is_empty() {
        CliConfig::default()
    } else {
        match serde_yaml::from_str(&config_content) {
            Ok(conf) => {
                info!(config_path = ?path_ref, "Parsed config YAML successfully");
                conf
            }
            Err(e) => {
                error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
                return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
            }
        }
    };

    inject_env(&mut config);
    Ok(config)
}
