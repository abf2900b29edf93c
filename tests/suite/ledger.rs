//! Ledger behaviour through the public API.

use parley_context::{HistoryLedger, LedgerConfigError, TiktokenCounter, TokenCounter};
use parley_types::{Message, Role};

use crate::common::{char_counter, ledger};

fn assert_accounting(ledger: &HistoryLedger) {
    assert_eq!(ledger.total_tokens(), ledger.costs().iter().sum::<u32>());
    assert!(ledger.total_tokens() <= ledger.max_tokens());
    assert_eq!(ledger.costs()[0], ledger.prompt_tokens());
    assert_eq!(ledger.prompt().role(), Role::System);
}

#[test]
fn scenario_append_within_budget() {
    let mut ledger = ledger("abc", 100);
    assert!(ledger.append(Role::User, "hello", None));
    assert_eq!(ledger.total_tokens(), 8);
}

#[test]
fn scenario_fourth_message_evicts_oldest() {
    let mut ledger = ledger("abc", 20);
    for text in ["11111", "22222", "33333"] {
        assert!(ledger.append(Role::User, text, None));
    }
    assert_eq!(ledger.total_tokens(), 18);

    assert!(ledger.append(Role::Assistant, "44444", None));
    assert!(ledger.total_tokens() <= 20);
    let contents: Vec<String> = ledger.read().into_iter().map(|m| m.content().to_string()).collect();
    assert_eq!(contents, ["abc", "22222", "33333", "44444"]);
}

#[test]
fn scenario_oversized_message_is_rejected_atomically() {
    let mut ledger = ledger("abc", 20);
    assert!(ledger.append(Role::User, "hello", None));
    assert!(!ledger.append(Role::User, "x".repeat(20), None));
    assert_eq!(ledger.total_tokens(), 8);
    assert_eq!(ledger.read(), vec![Message::system("abc"), Message::user("hello")]);
}

#[test]
fn construction_failures() {
    assert_eq!(
        HistoryLedger::new("too long", 3, char_counter).unwrap_err(),
        LedgerConfigError::PromptExceedsBudget {
            prompt_tokens: 8,
            max_tokens: 3
        }
    );
    assert_eq!(
        HistoryLedger::new("", 0, char_counter).unwrap_err(),
        LedgerConfigError::ZeroBudget
    );
}

#[test]
fn surviving_entries_are_always_a_suffix() {
    let mut ledger = ledger("p", 40);
    let mut appended = Vec::new();
    for step in 0..50u32 {
        let text = "m".repeat((step % 9 + 1) as usize);
        let reasoning = (step % 4 == 0).then(|| "r".repeat((step % 3) as usize));
        let id = ledger
            .try_append(Role::Assistant, text, reasoning)
            .expect("every message fits beside the prompt");
        appended.push(id);

        let live = ledger.message_ids();
        assert!(appended.ends_with(&live));
        assert_accounting(&ledger);
    }
}

#[test]
fn clear_ephemeral_refunds_exactly_the_reasoning() {
    let mut ledger = ledger("abc", 100);
    ledger.append(Role::User, "question", None);
    ledger.append(Role::Assistant, "answer", Some("long chain of thought".to_string()));
    let before = ledger.costs();

    let refunded = ledger.clear_ephemeral();
    assert_eq!(refunded, 21);
    let after = ledger.costs();
    assert_eq!(after[..2], before[..2]);
    assert_eq!(after[2], before[2] - 21);
    assert_eq!(ledger.clear_ephemeral(), 0);
    assert_accounting(&ledger);
}

#[test]
fn works_with_tiktoken_counter() {
    let counter = TiktokenCounter::new();
    let prompt = "You are a helpful assistant.";
    let prompt_tokens = counter.count(prompt);

    let mut ledger = HistoryLedger::new(prompt, prompt_tokens + 64, counter).unwrap();
    for _ in 0..20 {
        assert!(ledger.append(Role::User, "The quick brown fox jumps over the lazy dog.", None));
        assert_accounting(&ledger);
    }
    assert!(ledger.message_count() < 21);
}
