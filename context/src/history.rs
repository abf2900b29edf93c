//! Token-budgeted conversation ledger.
//!
//! The ledger holds a pinned system prompt followed by the conversation, oldest
//! first. Every entry remembers its own token cost so the running total can be
//! kept exact without recounting:
//!
//! - `total_tokens` always equals the sum of entry costs (prompt included)
//! - after any successful mutation, `total_tokens <= max_tokens`
//! - making room only ever drops a contiguous prefix of non-pinned entries
//! - the ephemeral index names exactly the entries that still carry reasoning

use std::collections::VecDeque;
use std::fmt;

use thiserror::Error;

use parley_types::{Message, Role};

use crate::ephemeral::EphemeralIndex;
use crate::token_counter::TokenCounter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(u64);

impl MessageId {
    const fn new(id: u64) -> Self {
        Self(id)
    }

    #[cfg(test)]
    pub(crate) const fn new_for_test(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

const PROMPT_ID: MessageId = MessageId::new(0);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerConfigError {
    #[error("token budget must be greater than zero")]
    ZeroBudget,
    #[error("system prompt costs {prompt_tokens} tokens, exceeding the {max_tokens}-token budget")]
    PromptExceedsBudget { prompt_tokens: u32, max_tokens: u32 },
}

/// A message that cannot fit even after evicting every non-pinned entry.
///
/// The ledger is left untouched when this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error(
    "message needs {required} tokens but at most {available} fit beside the system prompt (budget {budget})"
)]
pub struct BudgetExceeded {
    pub required: u32,
    pub available: u32,
    pub budget: u32,
}

#[derive(Debug, Clone)]
struct LedgerEntry {
    id: MessageId,
    message: Message,
    content_tokens: u32,
    reasoning_tokens: u32,
}

impl LedgerEntry {
    fn cost(&self) -> u32 {
        self.content_tokens + self.reasoning_tokens
    }
}

pub struct HistoryLedger {
    prompt: LedgerEntry,
    entries: VecDeque<LedgerEntry>,
    ephemeral: EphemeralIndex,
    total_tokens: u32,
    max_tokens: u32,
    next_message_id: u64,
    counter: Box<dyn TokenCounter>,
}

impl fmt::Debug for HistoryLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryLedger")
            .field("messages", &self.message_count())
            .field("total_tokens", &self.total_tokens)
            .field("max_tokens", &self.max_tokens)
            .field("ephemeral", &self.ephemeral.len())
            .finish_non_exhaustive()
    }
}

impl HistoryLedger {
    /// Creates a ledger holding only the pinned system prompt.
    pub fn new(
        system_prompt: impl Into<String>,
        max_tokens: u32,
        counter: impl TokenCounter + 'static,
    ) -> Result<Self, LedgerConfigError> {
        if max_tokens == 0 {
            return Err(LedgerConfigError::ZeroBudget);
        }

        let system_prompt = system_prompt.into();
        let prompt_tokens = counter.count(&system_prompt);
        if prompt_tokens > max_tokens {
            return Err(LedgerConfigError::PromptExceedsBudget {
                prompt_tokens,
                max_tokens,
            });
        }

        Ok(Self {
            prompt: LedgerEntry {
                id: PROMPT_ID,
                message: Message::system(system_prompt),
                content_tokens: prompt_tokens,
                reasoning_tokens: 0,
            },
            entries: VecDeque::new(),
            ephemeral: EphemeralIndex::new(),
            total_tokens: prompt_tokens,
            max_tokens,
            next_message_id: PROMPT_ID.as_u64() + 1,
            counter: Box::new(counter),
        })
    }

    /// Appends a message, evicting the oldest entries if needed.
    ///
    /// Returns `false` (with the ledger unchanged) when the message cannot fit
    /// even after evicting everything but the prompt.
    pub fn append(&mut self, role: Role, content: impl Into<String>, reasoning: Option<String>) -> bool {
        self.try_append(role, content, reasoning).is_ok()
    }

    pub fn try_append(
        &mut self,
        role: Role,
        content: impl Into<String>,
        reasoning: Option<String>,
    ) -> Result<MessageId, BudgetExceeded> {
        let content = content.into();
        let content_tokens = self.counter.count(&content);
        let reasoning_tokens = reasoning.as_deref().map_or(0, |r| self.counter.count(r));
        let Some(cost) = content_tokens.checked_add(reasoning_tokens) else {
            return Err(self.reject(role, u32::MAX));
        };

        let projected = u64::from(self.total_tokens) + u64::from(cost);
        let budget = u64::from(self.max_tokens);
        if projected > budget {
            let needed = u32::try_from(projected - budget).unwrap_or(u32::MAX);
            if !self.evict(needed) {
                return Err(self.reject(role, cost));
            }
        }

        let id = MessageId::new(self.next_message_id);
        self.next_message_id += 1;

        let tracked = reasoning.is_some();
        let message = match reasoning {
            Some(reasoning) => Message::with_reasoning(role, content, reasoning),
            None => Message::new(role, content),
        };

        self.entries.push_back(LedgerEntry {
            id,
            message,
            content_tokens,
            reasoning_tokens,
        });
        self.total_tokens += cost;
        if tracked {
            self.ephemeral.push(id, reasoning_tokens);
        }

        Ok(id)
    }

    fn reject(&self, role: Role, required: u32) -> BudgetExceeded {
        let available = self.max_tokens - self.prompt.cost();
        tracing::debug!(
            role = role.as_str(),
            required,
            available,
            "Message does not fit the ledger budget"
        );
        BudgetExceeded {
            required,
            available,
            budget: self.max_tokens,
        }
    }

    /// Frees at least `needed` tokens by dropping the oldest non-pinned entries.
    ///
    /// Entries are scanned oldest first until their combined cost covers `needed`.
    /// If the whole conversation cannot cover it, nothing is removed and `false`
    /// is returned. Ephemeral index entries for evicted messages are dropped with
    /// them.
    pub fn evict(&mut self, needed: u32) -> bool {
        if needed == 0 {
            return true;
        }

        let needed = u64::from(needed);
        let mut freed = 0u64;
        let mut count = 0usize;
        for entry in &self.entries {
            if freed >= needed {
                break;
            }
            freed += u64::from(entry.cost());
            count += 1;
        }

        if freed < needed {
            return false;
        }

        self.entries.drain(..count);
        // freed <= total_tokens, which is a u32
        self.total_tokens -= freed as u32;

        let first_live = self
            .entries
            .front()
            .map_or(MessageId::new(self.next_message_id), |entry| entry.id);
        let dropped_ephemeral = self.ephemeral.forget_before(first_live);

        tracing::debug!(
            evicted = count,
            freed_tokens = freed,
            dropped_ephemeral,
            total_tokens = self.total_tokens,
            "Evicted oldest ledger entries"
        );
        true
    }

    /// Strips provisional reasoning from every tracked message and refunds its
    /// tokens. Returns the number of tokens refunded; a second call returns 0.
    pub fn clear_ephemeral(&mut self) -> u32 {
        let tracked = self.ephemeral.take();
        let mut refunded = 0u32;

        for entry in tracked {
            let Ok(position) = self.entries.binary_search_by_key(&entry.id, |e| e.id) else {
                tracing::warn!(
                    id = entry.id.as_u64(),
                    "Ephemeral index referenced a message no longer in the ledger"
                );
                continue;
            };

            let ledger_entry = &mut self.entries[position];
            ledger_entry.message.take_reasoning();
            debug_assert_eq!(ledger_entry.reasoning_tokens, entry.tokens);
            let refund = std::mem::take(&mut ledger_entry.reasoning_tokens);
            self.total_tokens -= refund;
            refunded += refund;
        }

        if refunded > 0 {
            tracing::debug!(refunded, total_tokens = self.total_tokens, "Cleared ephemeral reasoning");
        }
        refunded
    }

    /// Drops the whole conversation, keeping only the pinned prompt.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.ephemeral.clear();
        self.total_tokens = self.prompt.cost();
    }

    /// Snapshot of every message in ledger order, prompt first.
    #[must_use]
    pub fn read(&self) -> Vec<Message> {
        self.messages().cloned().collect()
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        std::iter::once(&self.prompt.message).chain(self.entries.iter().map(|e| &e.message))
    }

    /// Per-message costs in ledger order, prompt first.
    #[must_use]
    pub fn costs(&self) -> Vec<u32> {
        std::iter::once(self.prompt.cost())
            .chain(self.entries.iter().map(LedgerEntry::cost))
            .collect()
    }

    /// Current cost of a live message, or `None` once it has been evicted.
    #[must_use]
    pub fn cost_of(&self, id: MessageId) -> Option<u32> {
        if id == PROMPT_ID {
            return Some(self.prompt.cost());
        }
        self.entries
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|position| self.entries[position].cost())
    }

    /// Ids of the non-pinned messages, oldest first.
    #[must_use]
    pub fn message_ids(&self) -> Vec<MessageId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    #[must_use]
    pub fn prompt(&self) -> &Message {
        &self.prompt.message
    }

    #[must_use]
    pub fn prompt_tokens(&self) -> u32 {
        self.prompt.cost()
    }

    /// Number of messages including the prompt.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.entries.len() + 1
    }

    #[must_use]
    pub fn total_tokens(&self) -> u32 {
        self.total_tokens
    }

    #[must_use]
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    #[must_use]
    pub fn remaining_tokens(&self) -> u32 {
        self.max_tokens - self.total_tokens
    }

    #[must_use]
    pub fn ephemeral(&self) -> &EphemeralIndex {
        &self.ephemeral
    }

    #[must_use]
    pub fn has_ephemeral(&self) -> bool {
        !self.ephemeral.is_empty()
    }

    #[must_use]
    pub fn ephemeral_len(&self) -> usize {
        self.ephemeral.len()
    }
}
