use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::wizard::engine::WizardFormEngine;
use crate::wizard::WizardError;

/// In-memory wizard sessions, keyed by session id.
///
/// Locks are only held for synchronous engine calls, never across a call to
/// an external service.
#[derive(Clone, Default)]
pub struct WizardSessions {
    inner: Arc<RwLock<HashMap<Uuid, WizardFormEngine>>>,
}

impl WizardSessions {
    /// Opens a new session and drops sessions idle for longer than `max_idle`.
    pub async fn create<R>(
        &self,
        max_idle: Duration,
        f: impl FnOnce(&WizardFormEngine) -> R,
    ) -> R {
        let engine = WizardFormEngine::new();
        let id = engine.id();
        let mut sessions = self.inner.write().await;

        let cutoff = Utc::now()
            .checked_sub_signed(max_idle)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let before = sessions.len();
        sessions.retain(|_, engine| engine.touched_at() >= cutoff);
        let purged = before - sessions.len();
        if purged > 0 {
            info!("Purged {} idle wizard session(s)", purged);
        }

        let engine = sessions.entry(id).or_insert(engine);
        info!("Wizard session {} opened", id);
        f(engine)
    }

    /// Runs `f` against the session with exclusive access.
    pub async fn with_session<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut WizardFormEngine) -> R,
    ) -> Result<R, WizardError> {
        let mut sessions = self.inner.write().await;
        let engine = sessions
            .get_mut(&id)
            .ok_or(WizardError::SessionNotFound(id))?;
        Ok(f(engine))
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), WizardError> {
        self.inner
            .write()
            .await
            .remove(&id)
            .map(drop)
            .ok_or(WizardError::SessionNotFound(id))?;
        info!("Wizard session {} closed", id);
        Ok(())
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
