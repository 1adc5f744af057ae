//! Repository factory for dependency injection.
//!
//! This module provides utilities for creating and configuring repository instances
//! based on runtime configuration.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use super::repositories::LocalRepository;
use super::repository::{FullRepository, RepositoryError, RepositoryResult};
use crate::config::AppConfig;
use crate::models::RegistrySeed;

/// Repository type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// In-memory local repository
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Parse repository type from string ("local", "memory").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "memory" => Ok(Self::Local),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// Get repository type from the `REPOSITORY_TYPE` environment variable.
    ///
    /// Defaults to Local when unset or unparsable.
    pub fn from_env() -> Self {
        std::env::var("REPOSITORY_TYPE")
            .ok()
            .and_then(|val| val.parse().ok())
            .unwrap_or(Self::Local)
    }
}

/// Read a registry seed from a JSON file.
pub fn load_seed_file<P: AsRef<Path>>(path: P) -> RepositoryResult<RegistrySeed> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        RepositoryError::configuration(format!(
            "Failed to read seed file {}: {}",
            path.as_ref().display(),
            e
        ))
    })?;
    serde_json::from_str(&content)
        .map_err(|e| RepositoryError::configuration(format!("Failed to parse seed file: {}", e)))
}

/// Repository factory for creating repository instances.
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository instance based on type, optionally seeded.
    pub fn create(
        repo_type: RepositoryType,
        seed: Option<RegistrySeed>,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        match repo_type {
            RepositoryType::Local => {
                let repo = LocalRepository::new();
                if let Some(seed) = seed {
                    info!(
                        classes = seed.classes.len(),
                        teachers = seed.teachers.len(),
                        assignments = seed.assignments.len(),
                        "Loading registry seed"
                    );
                    repo.load_seed(seed);
                }
                Ok(Arc::new(repo))
            }
        }
    }

    /// Create an empty in-memory local repository.
    pub fn create_local() -> Arc<dyn FullRepository> {
        Arc::new(LocalRepository::new())
    }

    /// Create repository from an application configuration.
    pub fn from_config(config: &AppConfig) -> RepositoryResult<Arc<dyn FullRepository>> {
        let repo_type = config.repository_type()?;
        let seed = match &config.repository.seed_path {
            Some(path) => Some(load_seed_file(path)?),
            None => None,
        };
        Self::create(repo_type, seed)
    }
}

/// Builder for configuring repository creation.
///
/// # Example
/// ```
/// use timetable_backend::db::{RepositoryBuilder, RepositoryType};
///
/// let repo = RepositoryBuilder::new()
///     .repository_type(RepositoryType::Local)
///     .build()
///     .unwrap();
/// ```
pub struct RepositoryBuilder {
    repo_type: RepositoryType,
    seed: Option<RegistrySeed>,
    seed_path: Option<PathBuf>,
}

impl RepositoryBuilder {
    /// Create a new builder using the environment's repository type.
    pub fn new() -> Self {
        Self {
            repo_type: RepositoryType::from_env(),
            seed: None,
            seed_path: None,
        }
    }

    /// Set the repository type.
    pub fn repository_type(mut self, repo_type: RepositoryType) -> Self {
        self.repo_type = repo_type;
        self
    }

    /// Seed the registry with in-memory records.
    pub fn seed(mut self, seed: RegistrySeed) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Seed the registry from a JSON file when building.
    pub fn seed_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.seed_path = Some(path.into());
        self
    }

    /// Build the repository instance.
    pub fn build(self) -> RepositoryResult<Arc<dyn FullRepository>> {
        let seed = match (self.seed, self.seed_path) {
            (Some(seed), _) => Some(seed),
            (None, Some(path)) => Some(load_seed_file(path)?),
            (None, None) => None,
        };
        RepositoryFactory::create(self.repo_type, seed)
    }
}

impl Default for RepositoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
