//! Session state owned by the application.
//!
//! The current session is held in an explicitly owned [`SessionContext`]
//! that is constructed once in `main` and injected into whatever needs it,
//! rather than living in a process-wide singleton. Session transitions are
//! published on a watch channel; interested parties take a [`SessionWatch`]
//! and drop it when they are done listening.
//!
//! Because the CLI is one process per command, the session also round-trips
//! through a small JSON file between invocations.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// An authenticated session issued by the session service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Owned, injectable holder of the current session.
pub struct SessionContext {
    tx: watch::Sender<Option<Session>>,
}

impl SessionContext {
    pub fn new(initial: Option<Session>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Snapshot of the current session, if any.
    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    /// Publish a signed-in session.
    pub fn set(&self, session: Session) {
        self.tx.send_replace(Some(session));
    }

    /// Publish the signed-out state.
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// Subscribe to session transitions. The subscription ends when the
    /// returned watch is dropped.
    pub fn subscribe(&self) -> SessionWatch {
        SessionWatch {
            rx: self.tx.subscribe(),
        }
    }
}

/// A cancellable subscription to session transitions.
pub struct SessionWatch {
    rx: watch::Receiver<Option<Session>>,
}

impl SessionWatch {
    /// Wait for the next transition and return the new session state.
    /// `None` means the context itself has been dropped.
    pub async fn next(&mut self) -> Option<Option<Session>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

/// Load a previously persisted session. Missing or corrupt files are
/// treated as signed-out.
pub async fn load(path: &Path) -> Option<Session> {
    let bytes = tokio::fs::read(path).await.ok()?;
    match serde_json::from_slice(&bytes) {
        Ok(session) => Some(session),
        Err(err) => {
            tracing::warn!("Ignoring corrupt session file {:?}: {}", path, err);
            None
        }
    }
}

/// Persist the session for the next invocation.
pub async fn store(path: &Path, session: &Session) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }
    let bytes = serde_json::to_vec_pretty(session)?;
    tokio::fs::write(path, bytes).await
}

/// Remove the persisted session. Already-absent files are fine.
pub async fn clear_file(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}
