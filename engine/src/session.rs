//! Session orchestration: write the caller's message, fetch params, open the
//! transport, and drive classifier + aggregator until the turn ends.

use std::fmt;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use uuid::Uuid;

use parley_context::HistoryLedger;
use parley_providers::{RequestParamsSource, StreamClassifier, Transport, classifier_for};
use parley_types::{NonEmptyString, Role, StreamChunk, ToolCall, ValidationError, Vendor};

use crate::aggregator::{CommitReport, EndReason, Step, StreamAggregator};
use crate::errors::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of one completed `send`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub commit: CommitReport,
    /// Chunks delivered to the caller's channel.
    pub forwarded: usize,
}

impl TurnReport {
    #[must_use]
    pub fn end(&self) -> EndReason {
        self.commit.end
    }

    #[must_use]
    pub fn tool_calls(&self) -> &[ToolCall] {
        &self.commit.tool_calls
    }
}

/// One conversation: a ledger, the vendor's classifier, and the collaborators
/// that reach the network.
pub struct Session<T, P> {
    id: SessionId,
    ledger: HistoryLedger,
    classifier: Box<dyn StreamClassifier>,
    transport: T,
    params: P,
}

impl<T, P> fmt::Debug for Session<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("vendor", &self.classifier.vendor())
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

impl<T, P> Session<T, P>
where
    T: Transport,
    P: RequestParamsSource,
{
    pub fn new(ledger: HistoryLedger, vendor: Vendor, transport: T, params: P) -> Self {
        Self::with_classifier(ledger, classifier_for(vendor), transport, params)
    }

    pub fn with_classifier(
        ledger: HistoryLedger,
        classifier: Box<dyn StreamClassifier>,
        transport: T,
        params: P,
    ) -> Self {
        let id = SessionId::new();
        tracing::debug!(
            session = %id,
            vendor = classifier.vendor().as_str(),
            max_tokens = ledger.max_tokens(),
            "Session created"
        );
        Self {
            id,
            ledger,
            classifier,
            transport,
            params,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn vendor(&self) -> Vendor {
        self.classifier.vendor()
    }

    #[must_use]
    pub fn ledger(&self) -> &HistoryLedger {
        &self.ledger
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn reset(&mut self) {
        self.ledger.reset();
        tracing::debug!(session = %self.id, "Session reset");
    }

    /// Like [`send`](Self::send), with the role given by name.
    pub async fn send_str(
        &mut self,
        role: &str,
        content: &str,
        tx: &mpsc::Sender<StreamChunk>,
    ) -> Result<TurnReport, SessionError> {
        let role: Role = role.parse().map_err(ValidationError::from)?;
        self.send(role, content, tx).await
    }

    /// Appends the caller's message, streams the reply into `tx`, and commits
    /// the assistant turn.
    ///
    /// A closed `tx` ends the turn as cancelled. Dropping the returned future
    /// mid-stream still commits whatever had been accumulated.
    pub async fn send(
        &mut self,
        role: Role,
        content: &str,
        tx: &mpsc::Sender<StreamChunk>,
    ) -> Result<TurnReport, SessionError> {
        let session = self.id;
        let content = NonEmptyString::trimmed(content).map_err(ValidationError::from)?;

        // A system message sent while reasoning is still provisional (tool
        // results mid-loop) is tracked too, at zero cost.
        let reasoning = (role == Role::System && self.ledger.has_ephemeral()).then(String::new);
        self.ledger
            .try_append(role, content.into_inner(), reasoning)
            .inspect_err(|err| {
                tracing::warn!(%session, %err, "Message rejected: over budget");
            })?;

        let snapshot = self.ledger.read();
        let params = self.params.params(&snapshot)?;

        let mut aggregator = StreamAggregator::new(&mut self.ledger);
        let mut stream = match self.transport.open(snapshot, params).await {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!(%session, %err, "Failed to open stream");
                aggregator.end(EndReason::Failed);
                aggregator.finish();
                return Err(err.into());
            }
        };

        let mut forwarded = 0usize;
        let mut failure = None;
        while let Some(item) = stream.next().await {
            let raw = match item {
                Ok(raw) => raw,
                Err(err) => {
                    tracing::warn!(%session, %err, "Stream failed mid-turn");
                    aggregator.end(EndReason::Failed);
                    failure = Some(err);
                    break;
                }
            };

            match aggregator.accept(self.classifier.classify(&raw)) {
                Step::Forward(chunk) => {
                    if tx.send(chunk).await.is_err() {
                        tracing::debug!(%session, "Receiver closed; cancelling turn");
                        aggregator.end(EndReason::Cancelled);
                        break;
                    }
                    forwarded += 1;
                }
                Step::Skip => {}
                Step::Ended => break,
            }
        }
        drop(stream);

        let commit = aggregator.finish();
        tracing::debug!(
            %session,
            end = commit.end.as_str(),
            forwarded,
            total_tokens = self.ledger.total_tokens(),
            "Turn finished"
        );

        match failure {
            Some(err) => Err(err.into()),
            None => Ok(TurnReport { commit, forwarded }),
        }
    }
}
