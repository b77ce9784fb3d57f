use mirio_core::{MirioError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bind_addr: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// One entry per backend node; order fixes the round-robin sequence.
    pub nodes: Vec<NodeConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// `host:port` or a full URL of the S3-compatible endpoint.
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
}

fn default_bucket() -> String {
    "files".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::with_name(path))
            .add_source(::config::Environment::with_prefix("MIRIO"))
            .build()
            .map_err(|e| MirioError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| MirioError::Config(e.to_string()))?;

        if config.nodes.is_empty() {
            return Err(MirioError::Config(
                "at least one storage node must be configured".to_string(),
            ));
        }

        Ok(config)
    }
}
