//! Vendor classification over recorded stream shapes.

use parley_providers::{StreamClassifier, classifier_for};
use parley_types::{StreamChunk, Vendor};
use serde_json::json;

use crate::common::{Item, content, finish, keepalive, reasoning, tool_call, usage_end};

fn classify_all(vendor: Vendor, items: Vec<Item>) -> Vec<StreamChunk> {
    let classifier = classifier_for(vendor);
    items
        .into_iter()
        .map(|item| match item {
            Item::Chunk(raw) => classifier.classify(&raw),
            Item::Fail(_) => unreachable!("classifier captures contain no failures"),
        })
        .collect()
}

#[test]
fn reasoning_vendors_share_the_common_shape() {
    for vendor in [Vendor::DeepSeek, Vendor::Doubao, Vendor::Kimi, Vendor::Qwen] {
        let tags = classify_all(
            vendor,
            vec![keepalive(), reasoning("r"), content("c"), finish("stop"), usage_end()],
        );
        assert_eq!(
            tags,
            vec![
                StreamChunk::Empty,
                StreamChunk::Reasoning("r".into()),
                StreamChunk::Content("c".into()),
                StreamChunk::Empty,
                StreamChunk::End,
            ],
            "{vendor}"
        );
    }
}

#[test]
fn tool_call_fragments_pass_through_untouched() {
    let tags = classify_all(
        Vendor::DeepSeek,
        vec![
            tool_call(0, Some("call_a"), Some("weather"), ""),
            tool_call(0, None, None, "{\"city\":\"Paris\"}"),
        ],
    );
    let StreamChunk::ToolCalls(first) = &tags[0] else {
        panic!("expected tool calls, got {:?}", tags[0]);
    };
    assert_eq!(first[0].id.as_deref(), Some("call_a"));
    assert_eq!(first[0].kind.as_deref(), Some("function"));
    let StreamChunk::ToolCalls(second) = &tags[1] else {
        panic!("expected tool calls, got {:?}", tags[1]);
    };
    assert_eq!(
        second[0].function.as_ref().and_then(|f| f.arguments.as_deref()),
        Some("{\"city\":\"Paris\"}")
    );
}

#[test]
fn only_kimi_ends_on_in_choice_usage() {
    let raw = json!({
        "choices": [{"index": 0, "delta": {}, "finish_reason": "stop", "usage": {"total_tokens": 9}}]
    });
    for vendor in Vendor::all() {
        let expected = if *vendor == Vendor::Kimi {
            StreamChunk::End
        } else {
            StreamChunk::Empty
        };
        assert_eq!(classifier_for(*vendor).classify(&raw), expected, "{vendor}");
    }
}

#[test]
fn only_qwen_reads_thinking() {
    let raw = json!({"choices": [{"delta": {"thinking": "deep"}}]});
    for vendor in Vendor::all() {
        let expected = if *vendor == Vendor::Qwen {
            StreamChunk::Reasoning("deep".into())
        } else {
            StreamChunk::Empty
        };
        assert_eq!(classifier_for(*vendor).classify(&raw), expected, "{vendor}");
    }
}
