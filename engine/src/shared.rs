//! Cross-task access to one session.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use parley_context::HistoryLedger;
use parley_providers::{RequestParamsSource, Transport};
use parley_types::{Role, StreamChunk};

use crate::errors::SessionError;
use crate::session::{Session, SessionId, TurnReport};

/// Clonable handle to a [`Session`].
///
/// Every clone drives the same ledger. A `send` holds the lock for the whole
/// turn, so concurrent callers are served one turn at a time.
pub struct SharedSession<T, P> {
    id: SessionId,
    inner: Arc<Mutex<Session<T, P>>>,
}

impl<T, P> Clone for SharedSession<T, P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, P> SharedSession<T, P>
where
    T: Transport,
    P: RequestParamsSource,
{
    pub fn new(session: Session<T, P>) -> Self {
        Self {
            id: session.id(),
            inner: Arc::new(Mutex::new(session)),
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub async fn send(
        &self,
        role: Role,
        content: &str,
        tx: &mpsc::Sender<StreamChunk>,
    ) -> Result<TurnReport, SessionError> {
        self.inner.lock().await.send(role, content, tx).await
    }

    pub async fn reset(&self) {
        self.inner.lock().await.reset();
    }

    /// Runs `f` against the ledger while holding the session lock.
    pub async fn with_ledger<R>(&self, f: impl FnOnce(&HistoryLedger) -> R) -> R {
        f(self.inner.lock().await.ledger())
    }
}
