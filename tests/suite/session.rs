//! End-to-end turns through `Session` with scripted transports.

use std::time::Duration;

use tokio::sync::mpsc;

use parley_engine::{CommitOutcome, EndReason, SessionError, SharedSession};
use parley_providers::TransportError;
use parley_types::{Message, Role, StreamChunk, ToolCall, Vendor};

use crate::common::{
    Item, ScriptedTransport, content, finish, keepalive, reasoning, session, tool_call, usage_end,
};

async fn drain(mut rx: mpsc::Receiver<StreamChunk>) -> Vec<StreamChunk> {
    let mut chunks = Vec::new();
    while let Some(chunk) = rx.recv().await {
        chunks.push(chunk);
    }
    chunks
}

#[tokio::test]
async fn chunks_arrive_in_order_through_a_small_channel() {
    let words: Vec<String> = (0..32).map(|i| format!("w{i} ")).collect();
    let mut script: Vec<Item> = words.iter().map(|w| content(w)).collect();
    script.push(usage_end());

    let mut session = session(Vendor::DeepSeek, 10_000, ScriptedTransport::new(vec![script]));
    let (tx, rx) = mpsc::channel(1);
    let reader = tokio::spawn(drain(rx));

    let report = session.send(Role::User, "count", &tx).await.unwrap();
    drop(tx);
    let received = reader.await.unwrap();

    assert_eq!(report.forwarded, 32);
    let text: String = received
        .into_iter()
        .map(|chunk| match chunk {
            StreamChunk::Content(text) => text,
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(text, words.concat());
    assert_eq!(session.ledger().messages().last().unwrap().content(), words.concat());
}

#[tokio::test]
async fn reasoning_only_turn_is_stored_with_placeholder_until_cleanup() {
    let transport = ScriptedTransport::new(vec![
        vec![reasoning("thinking"), tool_call(0, Some("c1"), Some("search"), "{}"), usage_end()],
        vec![content("final"), usage_end()],
    ]);
    let mut session = session(Vendor::Doubao, 10_000, transport);
    let (tx, _rx) = mpsc::channel(16);

    let first = session.send(Role::User, "look it up", &tx).await.unwrap();
    assert_eq!(
        first.tool_calls(),
        [ToolCall {
            id: "c1".to_string(),
            name: "search".to_string(),
            arguments: "{}".to_string(),
        }]
    );
    let stored = session.ledger().messages().last().unwrap().clone();
    assert_eq!(stored.content(), "[Thinking only]");
    assert_eq!(stored.reasoning(), Some("thinking"));
    assert_eq!(session.ledger().ephemeral_len(), 1);

    let second = session.send(Role::System, "search result", &tx).await.unwrap();
    assert!(second.commit.ephemeral_cleared);
    assert_eq!(session.ledger().ephemeral_len(), 0);
    assert!(session.ledger().messages().all(|m| !m.has_reasoning()));
}

#[tokio::test]
async fn two_reasoning_turns_without_tools_leave_nothing_provisional() {
    let transport = ScriptedTransport::new(vec![
        vec![reasoning("a"), content("one"), usage_end()],
        vec![reasoning("b"), content("two"), usage_end()],
    ]);
    let mut session = session(Vendor::Qwen, 10_000, transport);
    let (tx, _rx) = mpsc::channel(16);

    session.send(Role::User, "first", &tx).await.unwrap();
    session.send(Role::User, "second", &tx).await.unwrap();

    assert!(session.ledger().messages().all(|m| !m.has_reasoning()));
    assert_eq!(session.ledger().ephemeral_len(), 0);
    assert_eq!(
        session.ledger().read()[1..],
        [
            Message::user("first"),
            Message::assistant("one"),
            Message::user("second"),
            Message::assistant("two"),
        ]
    );
}

#[tokio::test]
async fn dropping_the_send_future_commits_partial_content() {
    let transport = ScriptedTransport::hanging(vec![reasoning("hmm"), content("partial")]);
    let mut session = session(Vendor::Kimi, 10_000, transport);
    let (tx, mut rx) = mpsc::channel(16);

    let result = tokio::time::timeout(
        Duration::from_millis(50),
        session.send(Role::User, "hello", &tx),
    )
    .await;
    assert!(result.is_err(), "stream should still be pending");

    assert_eq!(rx.recv().await, Some(StreamChunk::Reasoning("hmm".into())));
    assert_eq!(rx.recv().await, Some(StreamChunk::Content("partial".into())));

    let last = session.ledger().messages().last().unwrap();
    assert_eq!(last.content(), "partial");
    assert!(!last.has_reasoning());
    assert_eq!(session.ledger().message_count(), 3);
}

#[tokio::test]
async fn transport_failure_commits_what_arrived() {
    let transport = ScriptedTransport::new(vec![vec![
        content("half an "),
        Item::Fail("connection reset"),
        content("answer"),
    ]]);
    let mut session = session(Vendor::DeepSeek, 10_000, transport);
    let (tx, _rx) = mpsc::channel(16);

    let err = session.send(Role::User, "hi", &tx).await.unwrap_err();
    assert!(matches!(err, SessionError::Transport(TransportError::Stream(_))));
    assert_eq!(
        session.ledger().messages().last().unwrap(),
        &Message::assistant("half an ")
    );
}

#[tokio::test]
async fn transport_failure_after_tool_call_keeps_reasoning_provisional() {
    let transport = ScriptedTransport::new(vec![vec![
        reasoning("plan"),
        tool_call(0, Some("c1"), Some("search"), "{}"),
        Item::Fail("connection reset"),
    ]]);
    let mut session = session(Vendor::DeepSeek, 10_000, transport);
    let (tx, _rx) = mpsc::channel(16);

    let err = session.send(Role::User, "look it up", &tx).await.unwrap_err();
    assert!(matches!(err, SessionError::Transport(TransportError::Stream(_))));

    let last = session.ledger().messages().last().unwrap();
    assert_eq!(last.content(), "[Thinking only]");
    assert_eq!(last.reasoning(), Some("plan"));
    assert_eq!(session.ledger().ephemeral_len(), 1);
}

#[tokio::test]
async fn closed_receiver_after_tool_call_keeps_reasoning_provisional() {
    let transport = ScriptedTransport::new(vec![vec![
        reasoning("plan"),
        tool_call(0, Some("c1"), Some("search"), "{}"),
        content("a"),
        content("b"),
        usage_end(),
    ]]);
    let mut session = session(Vendor::Qwen, 10_000, transport);
    let (tx, mut rx) = mpsc::channel(1);
    let reader = tokio::spawn(async move {
        let first = rx.recv().await;
        let second = rx.recv().await;
        (first, second)
    });

    let report = session.send(Role::User, "look it up", &tx).await.unwrap();
    let (first, second) = reader.await.unwrap();
    assert_eq!(first, Some(StreamChunk::Reasoning("plan".into())));
    assert!(matches!(second, Some(StreamChunk::ToolCalls(_))));

    assert_eq!(report.end(), EndReason::Cancelled);
    assert_eq!(report.tool_calls().len(), 1);
    assert!(!report.commit.ephemeral_cleared);

    let last = session.ledger().messages().last().unwrap();
    assert_eq!(last.role(), Role::Assistant);
    assert_eq!(last.reasoning(), Some("plan"));
    assert_eq!(session.ledger().ephemeral_len(), 1);
}

#[tokio::test]
async fn open_failure_leaves_user_message_and_no_reply() {
    let mut session = session(Vendor::DeepSeek, 10_000, ScriptedTransport::new(vec![]));
    let (tx, _rx) = mpsc::channel(16);

    let err = session.send(Role::User, "hi", &tx).await.unwrap_err();
    assert!(matches!(err, SessionError::Transport(TransportError::Connect(_))));
    assert_eq!(
        session.ledger().read(),
        vec![Message::system("sys"), Message::user("hi")]
    );
}

#[tokio::test]
async fn stream_without_end_sentinel_completes_on_exhaustion() {
    let transport = ScriptedTransport::new(vec![vec![keepalive(), content("done"), finish("stop")]]);
    let mut session = session(Vendor::Doubao, 10_000, transport);
    let (tx, _rx) = mpsc::channel(16);

    let report = session.send(Role::User, "hi", &tx).await.unwrap();
    assert_eq!(report.end(), EndReason::Completed);
    assert!(matches!(report.commit.outcome, CommitOutcome::Appended { tokens: 4, .. }));
}

#[tokio::test]
async fn snapshot_sent_to_transport_reflects_eviction() {
    let transport = ScriptedTransport::new(vec![
        vec![content("aaaaaaaaaa"), usage_end()],
        vec![content("bbbbbbbbbb"), usage_end()],
    ]);
    // prompt 3 + room for 27 tokens
    let mut session = session(Vendor::DeepSeek, 30, transport);
    let (tx, _rx) = mpsc::channel(16);

    session.send(Role::User, "qqqqq", &tx).await.unwrap();
    session.send(Role::User, "rrrrrrrrrrrrrrr", &tx).await.unwrap();

    let opened = session.transport().opened();
    assert_eq!(
        opened[1],
        vec![
            Message::system("sys"),
            Message::assistant("aaaaaaaaaa"),
            Message::user("rrrrrrrrrrrrrrr"),
        ]
    );
    assert_eq!(session.ledger().total_tokens(), 28);
    assert_eq!(
        session.ledger().messages().last().unwrap(),
        &Message::assistant("bbbbbbbbbb")
    );
}

#[tokio::test]
async fn empty_message_is_rejected_without_contacting_transport() {
    let mut session = session(Vendor::DeepSeek, 10_000, ScriptedTransport::new(vec![]));
    let (tx, _rx) = mpsc::channel(16);
    let err = session.send(Role::User, " \t ", &tx).await.unwrap_err();
    assert!(matches!(err, SessionError::Validation(_)));
    assert!(session.transport().opened().is_empty());
}

#[tokio::test]
async fn shared_sessions_run_in_parallel_tasks() {
    let mut handles = Vec::new();
    for i in 0..4 {
        let transport = ScriptedTransport::new(vec![vec![content(&format!("reply {i}")), usage_end()]]);
        let shared = SharedSession::new(session(Vendor::DeepSeek, 10_000, transport));
        handles.push(tokio::spawn(async move {
            let (tx, _rx) = mpsc::channel(16);
            shared.send(Role::User, "hi", &tx).await.unwrap();
            shared
                .with_ledger(|ledger| ledger.messages().last().map(|m| m.content().to_string()))
                .await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.await.unwrap(), Some(format!("reply {i}")));
    }
}
