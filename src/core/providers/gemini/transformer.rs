//! Gemini Request and Response Transformers

use crate::core::cost::token_field;
use crate::core::ids::ToolIdGenerator;
use crate::core::providers::ProviderError;
use crate::core::types::{
    CanonicalRequest, CanonicalResponse, ContentBlock, MessageContent, Role, ToolChoice,
    stop_reason, tool_result_text,
};
use serde_json::{Map, Value, json};
use std::collections::HashMap;

/// Name sent with a function response when the call cannot be traced back
const UNKNOWN_TOOL_NAME: &str = "tool";

/// Canonical request -> generateContent body
pub struct GeminiRequestTransformer;

impl GeminiRequestTransformer {
    pub fn transform(request: &CanonicalRequest) -> Value {
        // Function responses are keyed by name; remember the names of calls
        // issued earlier in the conversation
        let mut call_names: HashMap<&str, &str> = HashMap::new();
        let mut contents = Vec::new();

        for message in &request.messages {
            let role = match message.role {
                Role::User => "user",
                Role::Assistant => "model",
            };
            let parts = match &message.content {
                MessageContent::Text(text) => vec![json!({ "text": text })],
                MessageContent::Blocks(blocks) => {
                    let mut parts = Vec::new();
                    for block in blocks {
                        Self::transform_block(block, &mut call_names, &mut parts);
                    }
                    parts
                }
            };
            contents.push(json!({ "role": role, "parts": parts }));
        }

        let mut generation_config = Map::new();
        generation_config.insert(
            "maxOutputTokens".into(),
            json!(request.max_tokens_or_default()),
        );
        for (from, to) in [("temperature", "temperature"), ("top_p", "topP")] {
            if let Some(value) = request.extra.get(from) {
                generation_config.insert(to.into(), value.clone());
            }
        }

        let mut body = Map::new();
        body.insert("contents".into(), Value::Array(contents));
        body.insert("generationConfig".into(), Value::Object(generation_config));

        if let Some(system) = &request.system {
            body.insert(
                "systemInstruction".into(),
                json!({ "parts": [{ "text": system.joined() }] }),
            );
        }
        if !request.tools.is_empty() {
            let declarations: Vec<Value> = request
                .tools
                .iter()
                .map(|tool| {
                    json!({
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.input_schema,
                    })
                })
                .collect();
            body.insert(
                "tools".into(),
                json!([{ "functionDeclarations": declarations }]),
            );
        }
        if let Some(choice) = &request.tool_choice {
            let config = match choice {
                ToolChoice::Tool { name } => {
                    json!({ "mode": "ANY", "allowedFunctionNames": [name] })
                }
                ToolChoice::Any => json!({ "mode": "ANY" }),
                ToolChoice::Auto => json!({ "mode": "AUTO" }),
                ToolChoice::None => json!({ "mode": "NONE" }),
            };
            body.insert(
                "toolConfig".into(),
                json!({ "functionCallingConfig": config }),
            );
        }

        Value::Object(body)
    }

    fn transform_block<'a>(
        block: &'a ContentBlock,
        call_names: &mut HashMap<&'a str, &'a str>,
        parts: &mut Vec<Value>,
    ) {
        match block {
            ContentBlock::Text { text, .. } => parts.push(json!({ "text": text })),
            ContentBlock::ToolUse {
                id,
                name,
                input,
                thought_signature,
            } => {
                call_names.insert(id, name);
                let mut part = json!({ "functionCall": { "name": name, "args": input } });
                if let Some(signature) = thought_signature {
                    part["thoughtSignature"] = json!(signature);
                }
                parts.push(part);
            }
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                tool_name,
                ..
            } => {
                let name = tool_name
                    .as_deref()
                    .or_else(|| call_names.get(tool_use_id.as_str()).copied())
                    .unwrap_or(UNKNOWN_TOOL_NAME);
                // Block-array results: text goes into the function response,
                // attached files follow it as their own parts
                let (text, media) = match content.as_array() {
                    Some(items) => Self::split_result_items(items),
                    None => (tool_result_text(content), Vec::new()),
                };
                parts.push(json!({
                    "functionResponse": {
                        "name": name,
                        "response": { "content": text },
                    }
                }));
                parts.extend(media);
            }
            ContentBlock::Image { source, .. } | ContentBlock::Document { source, .. } => {
                parts.extend(Self::transform_media(source))
            }
            ContentBlock::Thinking { .. } | ContentBlock::RedactedThinking { .. } => {}
        }
    }

    fn split_result_items(items: &[Value]) -> (String, Vec<Value>) {
        let mut texts = Vec::new();
        let mut media = Vec::new();
        for item in items {
            match item.get("type").and_then(Value::as_str) {
                Some("text") => {
                    if let Some(text) = item.get("text").and_then(Value::as_str) {
                        texts.push(text);
                    }
                }
                Some("document") | Some("image") => {
                    if let Some(part) = item.get("source").and_then(Self::transform_media) {
                        media.push(part);
                    }
                }
                _ => {}
            }
        }
        (texts.join("\n"), media)
    }

    /// Image or document source -> inline or file part
    fn transform_media(source: &Value) -> Option<Value> {
        match source.get("type").and_then(Value::as_str)? {
            "base64" => Some(json!({
                "inlineData": {
                    "mimeType": source.get("media_type")?,
                    "data": source.get("data")?,
                }
            })),
            "url" => {
                let mut file_data = json!({ "fileUri": source.get("url")? });
                if let Some(media_type) = source.get("media_type") {
                    file_data["mimeType"] = media_type.clone();
                }
                Some(json!({ "fileData": file_data }))
            }
            _ => None,
        }
    }
}

/// generateContent body -> canonical response
pub struct GeminiResponseTransformer;

impl GeminiResponseTransformer {
    pub fn transform(
        body: &Value,
        ids: &dyn ToolIdGenerator,
    ) -> Result<CanonicalResponse, ProviderError> {
        let candidate = body
            .get("candidates")
            .and_then(|c| c.get(0))
            .ok_or_else(|| ProviderError::response_parsing("google", "response has no candidates"))?;

        let parts = candidate
            .pointer("/content/parts")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let content: Vec<ContentBlock> = parts
            .iter()
            .filter_map(|part| part_to_block(part, ids))
            .collect();

        let stop = if content.iter().any(ContentBlock::is_tool_use) {
            stop_reason::TOOL_USE
        } else {
            finish_reason_to_stop(candidate.get("finishReason").and_then(Value::as_str))
        };

        let usage = body.get("usageMetadata");
        Ok(CanonicalResponse::new(
            content,
            body.get("modelVersion")
                .and_then(Value::as_str)
                .unwrap_or("gemini"),
            stop,
            token_field(usage, "promptTokenCount"),
            token_field(usage, "candidatesTokenCount"),
        ))
    }
}

/// One response part as a content block; thought summaries are dropped
pub(super) fn part_to_block(part: &Value, ids: &dyn ToolIdGenerator) -> Option<ContentBlock> {
    if let Some(call) = part.get("functionCall") {
        return Some(ContentBlock::ToolUse {
            id: ids.next_id(),
            name: call
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            input: call.get("args").cloned().unwrap_or_else(|| json!({})),
            thought_signature: part
                .get("thoughtSignature")
                .and_then(Value::as_str)
                .map(str::to_string),
        });
    }
    if part.get("thought").and_then(Value::as_bool) == Some(true) {
        return None;
    }
    part.get("text")
        .and_then(Value::as_str)
        .map(ContentBlock::text)
}

/// Stop reason for a non-tool finish
pub(super) fn finish_reason_to_stop(reason: Option<&str>) -> &'static str {
    match reason {
        Some("MAX_TOKENS") => "max_tokens",
        _ => stop_reason::END_TURN,
    }
}
