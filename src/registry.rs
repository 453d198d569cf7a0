//! Concurrent registry of independent sessions keyed by id.
//!
//! Each session sits behind its own lock, so sessions can be driven from
//! different threads. Calls for the same id are serialized in lock order.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::info;

use crate::config::ScoringConfig;
use crate::error::{Result, ScoringError};
use crate::math::vector::Vector4;
use crate::session::{Observation, ReferenceTrajectory, RepetitionSession};
use crate::summary::SessionSummary;

type SharedSession = Arc<Mutex<RepetitionSession>>;

/// Sessions keyed by id, all sharing one scoring configuration.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    config: ScoringConfig,
    sessions: RwLock<HashMap<String, SharedSession>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Arm session `id` with `reference`, creating it if needed.
    ///
    /// An existing session is restarted and loses its progress.
    ///
    /// # Errors
    ///
    /// Propagates [`RepetitionSession::start`] errors; a new session is not
    /// registered when its start fails.
    pub fn start(&self, id: impl Into<String>, reference: ReferenceTrajectory) -> Result<()> {
        let id = id.into();
        // Lookup and insert share one write guard.
        let mut sessions = self.sessions.write();
        if let Some(session) = sessions.get(&id) {
            return session.lock().start(reference);
        }

        let mut session = RepetitionSession::new(self.config.clone());
        session.start(reference)?;
        info!(session = %id, "session registered");
        sessions.insert(id, Arc::new(Mutex::new(session)));
        Ok(())
    }

    /// Feed one reading to session `id`.
    ///
    /// # Errors
    ///
    /// - [`ScoringError::SessionNotFound`] for an unknown id.
    /// - See [`RepetitionSession::observe`].
    pub fn observe(&self, id: &str, vector: Vector4) -> Result<Observation> {
        let session = self
            .get(id)
            .ok_or_else(|| ScoringError::SessionNotFound(id.to_owned()))?;
        let mut guard = session.lock();
        guard.observe(vector)
    }

    /// End session `id`, remove it and return its summary.
    ///
    /// # Errors
    ///
    /// - [`ScoringError::SessionNotFound`] for an unknown id.
    /// - See [`RepetitionSession::end`]; the session is removed either way.
    pub fn end(&self, id: &str) -> Result<SessionSummary> {
        let session = self
            .sessions
            .write()
            .remove(id)
            .ok_or_else(|| ScoringError::SessionNotFound(id.to_owned()))?;
        info!(session = %id, "session removed");
        let mut guard = session.lock();
        guard.end()
    }

    /// Whether a session is registered under `id`.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.sessions.read().contains_key(id)
    }

    /// Number of registered sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Whether no session is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Registered ids, sorted.
    #[must_use]
    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn get(&self, id: &str) -> Option<SharedSession> {
        self.sessions.read().get(id).cloned()
    }
}
