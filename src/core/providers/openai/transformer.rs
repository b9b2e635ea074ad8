//! OpenAI Request and Response Transformers
//!
//! Canonical messages flatten into the Responses API `input` array. Tool
//! results and calls become standalone items keyed by call id.

use crate::core::providers::ProviderError;
use crate::core::types::{
    CanonicalRequest, CanonicalResponse, ContentBlock, Message, MessageContent, Role, Tool,
    ToolChoice, stop_reason, tool_result_text,
};
use serde_json::{Map, Value, json};

const PROVIDER: &str = "openai";

/// Sampling parameters the Responses API shares with the canonical request
const FORWARDED_PARAMS: [&str; 3] = ["temperature", "top_p", "metadata"];

/// Filename sent for documents that carry no title
const DEFAULT_DOCUMENT_NAME: &str = "document.pdf";

/// Canonical request -> Responses API body
pub struct OpenAIRequestTransformer;

impl OpenAIRequestTransformer {
    pub fn transform(request: &CanonicalRequest) -> Value {
        let mut input = Vec::new();
        for message in &request.messages {
            Self::transform_message(message, &mut input);
        }

        let mut body = Map::new();
        body.insert("model".into(), json!(request.model));
        body.insert(
            "max_output_tokens".into(),
            json!(request.max_tokens_or_default()),
        );
        body.insert("stream".into(), json!(request.stream));
        body.insert("input".into(), Value::Array(input));

        if let Some(system) = &request.system {
            body.insert("instructions".into(), json!(system.joined()));
        }
        if !request.tools.is_empty() {
            let tools = request.tools.iter().map(Self::transform_tool).collect();
            body.insert("tools".into(), Value::Array(tools));
        }
        if let Some(choice) = &request.tool_choice {
            body.insert("tool_choice".into(), Self::transform_tool_choice(choice));
        }
        if let Some(reasoning) = &request.reasoning {
            body.insert("reasoning".into(), reasoning.clone());
        } else if let Some(effort) = &request.reasoning_effort {
            body.insert(
                "reasoning".into(),
                json!({ "effort": effort, "summary": "auto" }),
            );
        }
        for key in FORWARDED_PARAMS {
            if let Some(value) = request.extra.get(key) {
                body.insert(key.into(), value.clone());
            }
        }

        Value::Object(body)
    }

    fn transform_message(message: &Message, input: &mut Vec<Value>) {
        let blocks = match &message.content {
            MessageContent::Text(text) => {
                input.push(json!({ "role": role_name(message.role), "content": text }));
                return;
            }
            MessageContent::Blocks(blocks) => blocks,
        };

        match message.role {
            Role::User => {
                for block in blocks {
                    match block {
                        ContentBlock::ToolResult {
                            tool_use_id,
                            content,
                            ..
                        } => input.push(json!({
                            "type": "function_call_output",
                            "call_id": tool_use_id,
                            "output": tool_result_text(content),
                        })),
                        ContentBlock::Text { text, .. } => {
                            input.push(json!({ "role": "user", "content": text }))
                        }
                        ContentBlock::Image { source, .. } => {
                            if let Some(url) = image_url(source) {
                                input.push(json!({
                                    "role": "user",
                                    "content": [{ "type": "input_image", "image_url": url }],
                                }));
                            }
                        }
                        ContentBlock::Document { source, title, .. } => {
                            if let Some(file_data) = image_url(source) {
                                let filename = title.as_deref().unwrap_or(DEFAULT_DOCUMENT_NAME);
                                input.push(json!({
                                    "role": "user",
                                    "content": [{
                                        "type": "input_file",
                                        "filename": filename,
                                        "file_data": file_data,
                                    }],
                                }));
                            }
                        }
                        _ => {}
                    }
                }
            }
            Role::Assistant => {
                let text: String = blocks.iter().filter_map(ContentBlock::as_text).collect();
                if !text.is_empty() {
                    input.push(json!({ "role": "assistant", "content": text }));
                }
                for block in blocks {
                    if let ContentBlock::ToolUse {
                        id, name, input: args, ..
                    } = block
                    {
                        input.push(json!({
                            "type": "function_call",
                            "call_id": id,
                            "name": name,
                            "arguments": args.to_string(),
                        }));
                    }
                }
            }
        }
    }

    /// Flat function tool; canonical schemas lack `additionalProperties:
    /// false`, so strict mode stays off
    fn transform_tool(tool: &Tool) -> Value {
        json!({
            "type": "function",
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.input_schema,
            "strict": false,
        })
    }

    fn transform_tool_choice(choice: &ToolChoice) -> Value {
        match choice {
            ToolChoice::Tool { name } => json!({ "type": "function", "name": name }),
            ToolChoice::Any => json!("required"),
            ToolChoice::Auto => json!("auto"),
            ToolChoice::None => json!("none"),
        }
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

/// Data URL for base64 sources, the URL itself for url sources
/// Data URL (or plain URL) for an image or document source
fn image_url(source: &Value) -> Option<String> {
    match source.get("type").and_then(Value::as_str) {
        Some("base64") => {
            let media_type = source.get("media_type").and_then(Value::as_str)?;
            let data = source.get("data").and_then(Value::as_str)?;
            Some(format!("data:{};base64,{}", media_type, data))
        }
        Some("url") => source.get("url").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Responses API body -> canonical response
pub struct OpenAIResponseTransformer;

impl OpenAIResponseTransformer {
    pub fn transform(body: Value) -> Result<CanonicalResponse, ProviderError> {
        let mut content = Vec::new();
        let mut has_tool_calls = false;

        let output = body
            .get("output")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for item in output {
            match item.get("type").and_then(Value::as_str) {
                Some("message") => {
                    let parts = item
                        .get("content")
                        .and_then(Value::as_array)
                        .map(Vec::as_slice)
                        .unwrap_or_default();
                    for part in parts {
                        if part.get("type").and_then(Value::as_str) == Some("output_text") {
                            let text = part.get("text").and_then(Value::as_str).unwrap_or_default();
                            content.push(ContentBlock::text(text));
                        }
                    }
                }
                Some("function_call") => {
                    has_tool_calls = true;
                    content.push(Self::transform_function_call(item)?);
                }
                _ => {}
            }
        }

        let stop = if has_tool_calls {
            stop_reason::TOOL_USE
        } else if body
            .pointer("/incomplete_details/reason")
            .and_then(Value::as_str)
            == Some("max_output_tokens")
        {
            "max_tokens"
        } else {
            stop_reason::END_TURN
        };

        let usage = body.get("usage");
        let mut response = CanonicalResponse::new(
            content,
            body.get("model").and_then(Value::as_str).unwrap_or(PROVIDER),
            stop,
            crate::core::cost::token_field(usage, "input_tokens"),
            crate::core::cost::token_field(usage, "output_tokens"),
        );
        if let Some(id) = body.get("id") {
            response.extra.insert("id".into(), id.clone());
        }
        Ok(response)
    }

    fn transform_function_call(item: &Value) -> Result<ContentBlock, ProviderError> {
        let id = item
            .get("call_id")
            .or_else(|| item.get("id"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        let name = item.get("name").and_then(Value::as_str).unwrap_or_default();
        let arguments = item
            .get("arguments")
            .and_then(Value::as_str)
            .unwrap_or("{}");
        let input: Value = serde_json::from_str(arguments).map_err(|e| {
            ProviderError::response_parsing(
                PROVIDER,
                format!("function_call {} has malformed arguments: {}", name, e),
            )
        })?;
        Ok(ContentBlock::tool_use(id, name, input))
    }
}
