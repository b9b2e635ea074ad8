//! Stream transcoding over arbitrary read boundaries

use creditgate::core::ids::SequentialToolIds;
use creditgate::core::providers::ProviderProfile;
use creditgate::core::providers::anthropic::AnthropicProfile;
use creditgate::core::providers::gemini::GeminiProfile;
use creditgate::core::providers::openai::OpenAIProfile;
use creditgate::core::streaming::{TranscoderState, feed, finish};
use creditgate::core::types::{CanonicalStreamEvent, ContentDelta};
use serde_json::{Value, json};

fn sse(payloads: &[Value]) -> Vec<u8> {
    payloads
        .iter()
        .map(|p| format!("data: {}\n\n", p))
        .collect::<String>()
        .into_bytes()
}

fn transcode(profile: &dyn ProviderProfile, chunks: &[&[u8]]) -> (Vec<CanonicalStreamEvent>, TranscoderState) {
    let ids = SequentialToolIds::new();
    let mut state = TranscoderState::new();
    let mut events = Vec::new();
    for chunk in chunks {
        events.extend(feed(&mut state, profile, &ids, chunk));
    }
    events.extend(finish(&mut state, profile, &ids));
    (events, state)
}

/// Splitting the body at any byte yields exactly the unsplit output
fn assert_split_invariant(profile: &dyn ProviderProfile, body: &[u8]) -> Vec<CanonicalStreamEvent> {
    let (whole, _) = transcode(profile, &[body]);
    for at in 0..=body.len() {
        let (head, tail) = body.split_at(at);
        let (split, _) = transcode(profile, &[head, tail]);
        assert_eq!(split, whole, "output changed when split at byte {}", at);
    }
    whole
}

fn assert_well_formed(events: &[CanonicalStreamEvent]) {
    let mut open = std::collections::BTreeSet::new();
    let mut deltas = 0;
    for (position, event) in events.iter().enumerate() {
        match event {
            CanonicalStreamEvent::ContentBlockStart { index, .. } => {
                assert_eq!(deltas, 0, "block opened after message_delta");
                assert!(open.insert(*index), "block {} opened twice", index);
            }
            CanonicalStreamEvent::ContentBlockDelta { index, .. } => {
                assert!(open.contains(index), "delta for closed block {}", index);
            }
            CanonicalStreamEvent::ContentBlockStop { index } => {
                assert!(open.remove(index), "block {} closed without open", index);
            }
            CanonicalStreamEvent::MessageDelta { .. } => {
                assert!(open.is_empty(), "message_delta with open blocks");
                deltas += 1;
            }
            CanonicalStreamEvent::MessageStop => {
                assert_eq!(position, events.len() - 1, "events after message_stop");
            }
            _ => {}
        }
    }
    assert_eq!(deltas, 1, "exactly one message_delta");
    assert_eq!(events.last(), Some(&CanonicalStreamEvent::MessageStop));
}

fn tool_arguments(events: &[CanonicalStreamEvent], block: u32) -> String {
    events
        .iter()
        .filter_map(|event| match event {
            CanonicalStreamEvent::ContentBlockDelta {
                index,
                delta: ContentDelta::InputJsonDelta { partial_json },
            } if *index == block => Some(partial_json.as_str()),
            _ => None,
        })
        .collect()
}

fn text_of(events: &[CanonicalStreamEvent]) -> String {
    events
        .iter()
        .filter_map(|event| match event {
            CanonicalStreamEvent::ContentBlockDelta {
                delta: ContentDelta::TextDelta { text },
                ..
            } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

fn openai_tool_stream() -> Vec<u8> {
    let mut body = b"event: response.created\n".to_vec();
    body.extend(sse(&[
        json!({"type": "response.created", "response": {"id": "resp_1"}}),
        json!({"type": "response.output_text.delta", "output_index": 0, "delta": "Grüße aus "}),
        json!({"type": "response.output_text.delta", "output_index": 0, "delta": "Oslo 🌍"}),
        json!({"type": "response.output_item.added", "output_index": 1,
               "item": {"type": "function_call", "id": "fc_1", "call_id": "call_abc", "name": "get_weather"}}),
        json!({"type": "response.function_call_arguments.delta", "output_index": 1, "delta": "{\"ci"}),
        json!({"type": "response.function_call_arguments.delta", "output_index": 1, "delta": "ty\":\"Os"}),
        json!({"type": "response.function_call_arguments.delta", "output_index": 1, "delta": "lo\"}"}),
        json!({"type": "response.function_call_arguments.done", "output_index": 1, "arguments": "{\"city\":\"Oslo\"}"}),
        json!({"type": "response.completed", "response": {
            "output": [{"type": "message"}, {"type": "function_call"}],
            "usage": {"input_tokens": 11, "output_tokens": 7}
        }}),
    ]));
    body
}

#[test]
fn test_openai_stream_survives_every_split_point() {
    let profile = OpenAIProfile::default();
    let events = assert_split_invariant(&profile, &openai_tool_stream());
    assert_well_formed(&events);

    assert_eq!(text_of(&events), "Grüße aus Oslo 🌍");
    assert_eq!(
        events.iter().find(|e| matches!(e, CanonicalStreamEvent::ContentBlockStart { index: 1, .. })),
        Some(&CanonicalStreamEvent::tool_use_start(1, "call_abc", "get_weather", None))
    );
    let arguments: Value = serde_json::from_str(&tool_arguments(&events, 1)).unwrap();
    assert_eq!(arguments, json!({"city": "Oslo"}));
}

#[test]
fn test_openai_stream_ends_with_tool_use_stop() {
    let (events, state) = transcode(&OpenAIProfile::default(), &[&openai_tool_stream()]);
    let deltas: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, CanonicalStreamEvent::MessageDelta { .. }))
        .collect();
    assert_eq!(deltas, vec![&CanonicalStreamEvent::message_delta("tool_use", 7)]);
    assert_eq!(state.usage().input_tokens, 11);
    assert_eq!(state.usage().output_tokens, 7);
}

#[test]
fn test_byte_at_a_time_matches_whole() {
    let body = openai_tool_stream();
    let profile = OpenAIProfile::default();
    let (whole, _) = transcode(&profile, &[&body]);
    let bytes: Vec<&[u8]> = body.chunks(1).collect();
    let (trickled, _) = transcode(&profile, &bytes);
    assert_eq!(trickled, whole);
}

fn gemini_stream() -> Vec<u8> {
    // Gemini frames use CRLF separators
    [
        json!({"candidates": [{"content": {"parts": [{"text": "Let me check"}], "role": "model"}}]}),
        json!({"candidates": [{"content": {"parts": [
            {"functionCall": {"name": "get_weather", "args": {"city": "Bergen"}}, "thoughtSignature": "c2ln"}
        ]}}]}),
        json!({"candidates": [{"content": {"parts": [
            {"functionCall": {"name": "get_time", "args": {"tz": "Europe/Oslo"}}}
        ]}, "finishReason": "STOP"}],
         "usageMetadata": {"promptTokenCount": 20, "candidatesTokenCount": 9}}),
    ]
    .iter()
    .map(|p| format!("data: {}\r\n\r\n", p))
    .collect::<String>()
    .into_bytes()
}

#[test]
fn test_gemini_stream_survives_every_split_point() {
    let profile = GeminiProfile::default();
    let events = assert_split_invariant(&profile, &gemini_stream());
    assert_well_formed(&events);

    assert_eq!(text_of(&events), "Let me check");
    assert!(events.contains(&CanonicalStreamEvent::tool_use_start(
        1,
        "toolu_0001",
        "get_weather",
        Some("c2ln".into())
    )));
    assert!(events.contains(&CanonicalStreamEvent::tool_use_start(2, "toolu_0002", "get_time", None)));
    let first: Value = serde_json::from_str(&tool_arguments(&events, 1)).unwrap();
    assert_eq!(first, json!({"city": "Bergen"}));
    assert!(events.contains(&CanonicalStreamEvent::message_delta("tool_use", 9)));
}

#[test]
fn test_gemini_usage_recorded() {
    let (_, state) = transcode(&GeminiProfile::default(), &[&gemini_stream()]);
    assert_eq!(state.usage().input_tokens, 20);
    assert_eq!(state.usage().output_tokens, 9);
}

fn anthropic_stream() -> Vec<u8> {
    let events = [
        json!({"type": "message_start", "message": {"id": "msg_1", "type": "message", "role": "assistant",
               "content": [], "model": "claude-sonnet-4-6", "usage": {"input_tokens": 25, "output_tokens": 1}}}),
        json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}}),
        json!({"type": "ping"}),
        json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "Hi there"}}),
        json!({"type": "content_block_stop", "index": 0}),
        json!({"type": "message_delta", "delta": {"stop_reason": "end_turn", "stop_sequence": null},
               "usage": {"output_tokens": 4}}),
        json!({"type": "message_stop"}),
    ];
    events
        .iter()
        .map(|e| format!("event: {}\ndata: {}\n\n", e["type"].as_str().unwrap(), e))
        .collect::<String>()
        .into_bytes()
}

#[test]
fn test_anthropic_passthrough_survives_every_split_point() {
    let profile = AnthropicProfile::default();
    let events = assert_split_invariant(&profile, &anthropic_stream());
    assert_well_formed(&events);
    assert_eq!(events[0].event_name(), "message_start");
    assert_eq!(text_of(&events), "Hi there");
}

#[test]
fn test_anthropic_usage_spans_start_and_delta() {
    let (_, state) = transcode(&AnthropicProfile::default(), &[&anthropic_stream()]);
    assert_eq!(state.usage().input_tokens, 25);
    assert_eq!(state.usage().output_tokens, 4);
}

#[test]
fn test_truncated_upstream_is_closed_by_finish() {
    let body = sse(&[json!({"type": "response.output_text.delta", "output_index": 0, "delta": "partial"})]);
    let (events, state) = transcode(&OpenAIProfile::default(), &[&body]);
    assert_well_formed(&events);
    assert!(events.contains(&CanonicalStreamEvent::message_delta("end_turn", 0)));
    assert!(state.is_stopped());
}

#[test]
fn test_final_line_without_newline_is_flushed() {
    let mut body = sse(&[json!({"type": "response.output_text.delta", "output_index": 0, "delta": "a"})]);
    body.extend(format!(
        "data: {}",
        json!({"type": "response.output_text.delta", "output_index": 0, "delta": "b"})
    ).into_bytes());

    let (events, _) = transcode(&OpenAIProfile::default(), &[&body]);
    assert_eq!(text_of(&events), "ab");
}
