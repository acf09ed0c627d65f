use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::hub::HubConfig;
use crate::orchestrator::OrchestratorConfig;
use crate::pipeline::PipelineConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub hub: HubConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Upload acceptance rules applied before a task is started.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Largest accepted upload in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: usize,
    /// Accepted file extensions, without the leading dot.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl UploadConfig {
    /// Whether `filename` ends with one of the allowed extensions (case-insensitive).
    pub fn accepts_filename(&self, filename: &str) -> bool {
        let Some((_, ext)) = filename.rsplit_once('.') else {
            return false;
        };
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }
}

fn default_max_file_size() -> usize {
    50 * 1024 * 1024 // 50 MiB
}

fn default_allowed_extensions() -> Vec<String> {
    vec!["csv".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_server_section() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
    }

    #[test]
    fn test_deserialize_with_default_server() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
    }

    #[test]
    fn test_deserialize_upload_section() {
        let toml = r#"
[upload]
max_file_size_bytes = 1024
allowed_extensions = ["csv", "tsv"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.upload.max_file_size_bytes, 1024);
        assert_eq!(config.upload.allowed_extensions, vec!["csv", "tsv"]);
    }

    #[test]
    fn test_accepts_filename() {
        let upload = UploadConfig::default();
        assert!(upload.accepts_filename("data.csv"));
        assert!(upload.accepts_filename("DATA.CSV"));
        assert!(!upload.accepts_filename("data.txt"));
        assert!(!upload.accepts_filename("csv"));
        assert!(!upload.accepts_filename("archive.csv.gz"));
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = Config::default();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["server"]["port"], 8080);
        assert_eq!(json["hub"]["queue_capacity"], 100);
        assert_eq!(json["hub"]["overflow_retain"], 50);
    }
}
