//! Application configuration.
//!
//! Settings are read from a `timetable.toml` file (every key is optional) and
//! then overridden by environment variables:
//!
//! | Variable | Setting |
//! |---|---|
//! | `HOST` | `server.host` |
//! | `PORT` | `server.port` |
//! | `REPOSITORY_TYPE` | `repository.type` |
//! | `SEED_PATH` | `repository.seed_path` |
//! | `SOLVER_URL` | `solver.url` |
//! | `SOLVER_TIMEOUT_SECS` | `solver.timeout_secs` |
//! | `SESSION_IDLE_MINS` | `server.session_idle_mins` |
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 5000
//! session_idle_mins = 120
//!
//! [repository]
//! type = "local"
//! seed_path = "seed.json"
//!
//! [solver]
//! url = "http://127.0.0.1:8000/generate"
//! timeout_secs = 35
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::db::factory::RepositoryType;
use crate::db::repository::RepositoryError;
use crate::services::DEFAULT_SESSION_IDLE_MINS;

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub repository: RepositorySettings,
    pub solver: SolverSettings,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Maximum accepted request body, in megabytes.
    pub body_limit_mb: usize,
    /// Edit sessions untouched for this many minutes are dropped.
    pub session_idle_mins: i64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            body_limit_mb: 10,
            session_idle_mins: DEFAULT_SESSION_IDLE_MINS,
        }
    }
}

/// Repository selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositorySettings {
    #[serde(rename = "type")]
    pub repo_type: String,
    /// JSON file with registry records loaded at startup.
    pub seed_path: Option<PathBuf>,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            repo_type: "local".to_string(),
            seed_path: None,
        }
    }
}

/// External schedule generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8000/generate".to_string(),
            timeout_secs: 35,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            RepositoryError::configuration(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            RepositoryError::configuration(format!("Failed to parse config file: {}", e))
        })
    }

    /// Load from the first `timetable.toml` found in the standard locations,
    /// falling back to defaults when there is none.
    ///
    /// Searches:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, RepositoryError> {
        let search_paths = [
            PathBuf::from("timetable.toml"),
            PathBuf::from("backend/timetable.toml"),
            PathBuf::from("../timetable.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// File (or defaults) with environment overrides applied.
    pub fn load() -> Result<Self, RepositoryError> {
        let mut config = Self::from_default_location()?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production, a map in tests).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), RepositoryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| RepositoryError::configuration(format!("Invalid PORT: {}", port)))?;
        }
        if let Some(mins) = lookup("SESSION_IDLE_MINS") {
            self.server.session_idle_mins = mins
                .parse()
                .ok()
                .filter(|m: &i64| *m > 0)
                .ok_or_else(|| {
                    RepositoryError::configuration(format!("Invalid SESSION_IDLE_MINS: {}", mins))
                })?;
        }
        if let Some(repo_type) = lookup("REPOSITORY_TYPE") {
            self.repository.repo_type = repo_type;
        }
        if let Some(seed) = lookup("SEED_PATH") {
            self.repository.seed_path = Some(PathBuf::from(seed));
        }
        if let Some(url) = lookup("SOLVER_URL") {
            self.solver.url = url;
        }
        if let Some(timeout) = lookup("SOLVER_TIMEOUT_SECS") {
            self.solver.timeout_secs = timeout.parse().map_err(|_| {
                RepositoryError::configuration(format!("Invalid SOLVER_TIMEOUT_SECS: {}", timeout))
            })?;
        }
        Ok(())
    }

    /// Get the repository type from configuration.
    pub fn repository_type(&self) -> Result<RepositoryType, RepositoryError> {
        RepositoryType::from_str(&self.repository.repo_type).map_err(RepositoryError::configuration)
    }

    /// `host:port` string for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[server]
port = 5000

[solver]
timeout_secs = 10
"#;

        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.solver.timeout_secs, 10);
        assert_eq!(config.solver.url, "http://127.0.0.1:8000/generate");
        assert_eq!(config.repository_type().unwrap(), RepositoryType::Local);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let env: HashMap<&str, &str> = [
            ("PORT", "9000"),
            ("SOLVER_URL", "http://solver:8000/generate"),
            ("SEED_PATH", "/etc/seed.json"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:9000");
        assert_eq!(config.solver.url, "http://solver:8000/generate");
        assert_eq!(
            config.repository.seed_path,
            Some(PathBuf::from("/etc/seed.json"))
        );
    }

    #[test]
    fn test_invalid_port_is_configuration_error() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(|k| (k == "PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
    }

    #[test]
    fn test_session_idle_override() {
        let mut config = AppConfig::default();
        assert_eq!(config.server.session_idle_mins, 120);
        config
            .apply_overrides(|k| (k == "SESSION_IDLE_MINS").then(|| "15".to_string()))
            .unwrap();
        assert_eq!(config.server.session_idle_mins, 15);

        assert!(config
            .apply_overrides(|k| (k == "SESSION_IDLE_MINS").then(|| "0".to_string()))
            .is_err());
    }

    #[test]
    fn test_unknown_repository_type() {
        let mut config = AppConfig::default();
        config.repository.repo_type = "mongo".to_string();
        assert!(config.repository_type().is_err());
    }
}
