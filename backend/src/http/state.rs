//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullRepository;
use crate::services::{ScheduleGenerator, SessionStore};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for timetables and registry lookups
    pub repository: Arc<dyn FullRepository>,
    /// Open edit sessions
    pub sessions: SessionStore,
    /// External schedule solver
    pub generator: Arc<dyn ScheduleGenerator>,
}

impl AppState {
    pub fn new(repository: Arc<dyn FullRepository>, generator: Arc<dyn ScheduleGenerator>) -> Self {
        Self {
            repository,
            sessions: SessionStore::new(),
            generator,
        }
    }

    /// Replace the session store, e.g. one with a configured idle timeout.
    pub fn with_sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = sessions;
        self
    }
}
