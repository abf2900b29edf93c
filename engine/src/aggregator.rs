//! Per-turn stream aggregation.
//!
//! ```text
//! Streaming ──End / exhaustion / failure / cancel──▶ Ended ──commit──▶ Committed
//! ```
//!
//! The commit into the ledger happens exactly once: through [`StreamAggregator::finish`]
//! on the normal path, or from `Drop` when the aggregator goes out of scope early
//! (an upstream error propagated with `?`, or the caller dropping the `send`
//! future mid-stream).

use std::mem;

use parley_context::{BudgetExceeded, HistoryLedger, MessageId};
use parley_types::{AccumulatedTurn, NonEmptyStaticStr, Role, StreamChunk, ToolCall};

/// Content stored for a turn that produced reasoning but no visible answer.
pub const THINKING_ONLY_PLACEHOLDER: NonEmptyStaticStr = NonEmptyStaticStr::new("[Thinking only]");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Vendor end sentinel or upstream exhaustion.
    Completed,
    /// Transport error, before or during streaming.
    Failed,
    /// The caller stopped listening or dropped the turn.
    Cancelled,
}

impl EndReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EndReason::Completed => "completed",
            EndReason::Failed => "failed",
            EndReason::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Appended { id: MessageId, tokens: u32 },
    /// Nothing was produced, so nothing was written.
    Skipped,
    /// The reply did not fit even after evicting the whole conversation.
    Rejected(BudgetExceeded),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    pub end: EndReason,
    pub outcome: CommitOutcome,
    pub tool_calls: Vec<ToolCall>,
    /// Whether provisional reasoning was stripped (no tool calls this turn).
    pub ephemeral_cleared: bool,
}

/// What the caller should do with a chunk after [`StreamAggregator::accept`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Forward(StreamChunk),
    Skip,
    /// The chunk was the end sentinel; stop pulling.
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Streaming,
    Ended(EndReason),
    Committed,
}

pub struct StreamAggregator<'a> {
    ledger: &'a mut HistoryLedger,
    turn: AccumulatedTurn,
    state: State,
}

impl<'a> StreamAggregator<'a> {
    pub fn new(ledger: &'a mut HistoryLedger) -> Self {
        Self {
            ledger,
            turn: AccumulatedTurn::new(),
            state: State::Streaming,
        }
    }

    pub fn accept(&mut self, chunk: StreamChunk) -> Step {
        if self.state != State::Streaming {
            return Step::Skip;
        }

        match chunk {
            StreamChunk::Content(ref text) => self.turn.push_content(text),
            StreamChunk::Reasoning(ref text) => self.turn.push_reasoning(text),
            StreamChunk::ToolCalls(ref fragments) => {
                self.turn.extend_tool_calls(fragments.iter().cloned());
            }
            StreamChunk::End => {
                self.state = State::Ended(EndReason::Completed);
                return Step::Ended;
            }
            StreamChunk::Empty => return Step::Skip,
        }
        Step::Forward(chunk)
    }

    /// Moves to `Ended`. Only the first call has any effect.
    pub fn end(&mut self, reason: EndReason) {
        if self.state == State::Streaming {
            self.state = State::Ended(reason);
        }
    }

    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.state == State::Streaming
    }

    #[must_use]
    pub fn turn(&self) -> &AccumulatedTurn {
        &self.turn
    }

    /// Commits the turn. A still-streaming aggregator is treated as having
    /// reached upstream exhaustion.
    pub fn finish(mut self) -> CommitReport {
        let end = match self.state {
            State::Ended(reason) => reason,
            State::Streaming | State::Committed => EndReason::Completed,
        };
        self.commit(end)
    }

    fn commit(&mut self, end: EndReason) -> CommitReport {
        self.state = State::Committed;
        let turn = mem::take(&mut self.turn);
        let tool_calls = turn.assemble_tool_calls();

        let outcome = if turn.content().is_empty() && turn.reasoning().is_empty() {
            CommitOutcome::Skipped
        } else {
            let content = if turn.content().is_empty() {
                THINKING_ONLY_PLACEHOLDER.as_str().to_owned()
            } else {
                turn.content().to_owned()
            };
            let reasoning = (!turn.reasoning().is_empty()).then(|| turn.reasoning().to_owned());
            match self.ledger.try_append(Role::Assistant, content, reasoning) {
                Ok(id) => CommitOutcome::Appended {
                    id,
                    tokens: self.ledger.cost_of(id).unwrap_or_default(),
                },
                Err(err) => {
                    tracing::warn!(%err, end = end.as_str(), "Assistant turn dropped: over budget");
                    CommitOutcome::Rejected(err)
                }
            }
        };

        let ephemeral_cleared = !turn.has_tool_calls();
        if ephemeral_cleared {
            self.ledger.clear_ephemeral();
        }

        tracing::debug!(
            end = end.as_str(),
            ?outcome,
            tool_calls = tool_calls.len(),
            ephemeral_cleared,
            "Committed assistant turn"
        );

        CommitReport {
            end,
            outcome,
            tool_calls,
            ephemeral_cleared,
        }
    }
}

impl Drop for StreamAggregator<'_> {
    fn drop(&mut self) {
        let end = match self.state {
            State::Committed => return,
            State::Ended(reason) => reason,
            State::Streaming => EndReason::Cancelled,
        };
        tracing::debug!(end = end.as_str(), "Turn left scope before commit");
        self.commit(end);
    }
}
