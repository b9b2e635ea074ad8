//! The HTTP surface against wiremock upstreams

use crate::common::TestDatabase;
use crate::common::fixtures::{AccountFactory, bearer, chat_request, config_without, test_config};
use actix_web::http::StatusCode;
use actix_web::{test, web};
use creditgate::config::Config;
use creditgate::core::billing::DisabledRecharger;
use creditgate::core::billing::ledger::MSG_TRIAL_DEPLETED;
use creditgate::core::ids::SequentialToolIds;
use creditgate::core::providers::ProviderKind;
use creditgate::server::{AppState, HttpServer};
use serde_json::{Value, json};
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn state(config: Config, db: &TestDatabase) -> web::Data<AppState> {
    let state = AppState::with_parts(
        config,
        db.storage(),
        Arc::new(DisabledRecharger),
        Arc::new(SequentialToolIds::new()),
    )
    .expect("Failed to build app state");
    web::Data::new(state)
}

fn proxy_request(auth: Option<&str>, provider: Option<&str>, body: &Value) -> test::TestRequest {
    let mut req = test::TestRequest::post().uri("/api/v1/proxy").set_json(body);
    if let Some(auth) = auth {
        req = req.insert_header(("authorization", auth));
    }
    if let Some(provider) = provider {
        req = req.insert_header(("x-provider", provider));
    }
    req
}

fn sse(payloads: &[Value]) -> String {
    payloads.iter().map(|p| format!("data: {}\n\n", p)).collect()
}

/// Frames of an SSE body as (event, data) pairs
fn frames(body: &[u8]) -> Vec<(String, Value)> {
    let text = std::str::from_utf8(body).unwrap();
    text.split("\n\n")
        .filter(|frame| !frame.trim().is_empty())
        .map(|frame| {
            let mut event = String::new();
            let mut data = Value::Null;
            for line in frame.lines() {
                if let Some(name) = line.strip_prefix("event: ") {
                    event = name.to_string();
                } else if let Some(payload) = line.strip_prefix("data: ") {
                    data = serde_json::from_str(payload).unwrap();
                }
            }
            (event, data)
        })
        .collect()
}

#[actix_web::test]
async fn test_openai_tool_call_then_final_answer() {
    let upstream = MockServer::start().await;
    let db = TestDatabase::new().await;
    let account = db.insert(AccountFactory::free(50_000)).await;
    let config = test_config(&upstream.uri());
    let auth = bearer(&config, &account);

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(header("authorization", "Bearer openai-test-key"))
        .and(body_partial_json(json!({"stream": false, "reasoning": {"effort": "low"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "resp_1",
            "model": "gpt-5-mini",
            "output": [{
                "type": "function_call",
                "id": "fc_1",
                "call_id": "call_1",
                "name": "get_weather",
                "arguments": "{\"city\":\"Oslo\"}"
            }],
            "usage": {"input_tokens": 4000, "output_tokens": 1000}
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&upstream)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(body_string_contains("function_call_output"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "resp_2",
            "model": "gpt-5-mini",
            "output": [{
                "type": "message",
                "role": "assistant",
                "content": [{"type": "output_text", "text": "It is 12°C in Oslo."}]
            }],
            "usage": {"input_tokens": 4000, "output_tokens": 1000}
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = test::init_service(HttpServer::create_app(state(config, &db))).await;

    let first = test::call_service(
        &app,
        proxy_request(Some(&auth), Some("openai"), &chat_request("gpt-5-mini", false)).to_request(),
    )
    .await;
    assert_eq!(first.status(), StatusCode::OK);
    let first: Value = test::read_body_json(first).await;

    assert_eq!(first["stop_reason"], "tool_use");
    assert_eq!(first["content"][0]["type"], "tool_use");
    assert_eq!(first["content"][0]["id"], "call_1");
    assert_eq!(first["content"][0]["input"], json!({"city": "Oslo"}));
    // $0.001 input + $0.002 output on gpt-5-mini at list price
    assert_eq!(first["_meta"], json!({"credits": 49_970, "cost_units": 30}));

    let mut follow_up = chat_request("gpt-5-mini", false);
    follow_up["messages"] = json!([
        {"role": "user", "content": "What is the weather in Oslo?"},
        {"role": "assistant", "content": [first["content"][0].clone()]},
        {"role": "user", "content": [{"type": "tool_result", "tool_use_id": "call_1", "content": "12°C"}]}
    ]);
    let second = test::call_service(
        &app,
        proxy_request(Some(&auth), Some("openai"), &follow_up).to_request(),
    )
    .await;
    assert_eq!(second.status(), StatusCode::OK);
    let second: Value = test::read_body_json(second).await;

    assert_eq!(second["stop_reason"], "end_turn");
    assert_eq!(second["content"][0]["text"], "It is 12°C in Oslo.");
    assert_eq!(second["_meta"]["credits"], 49_940);
    assert_eq!(db.credits(account.id).await, 49_940);
}

#[actix_web::test]
async fn test_gemini_tool_ids_are_minted() {
    let upstream = MockServer::start().await;
    let db = TestDatabase::new().await;
    let account = db.insert(AccountFactory::free(50_000)).await;
    let config = test_config(&upstream.uri());
    let auth = bearer(&config, &account);

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-3-flash:generateContent"))
        .and(query_param("key", "google-test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"functionCall": {"name": "get_weather", "args": {"city": "Oslo"}}}
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 2000, "candidatesTokenCount": 1000},
            "modelVersion": "gemini-3-flash"
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = test::init_service(HttpServer::create_app(state(config, &db))).await;
    let resp = test::call_service(
        &app,
        proxy_request(Some(&auth), Some("google"), &chat_request("gemini-3-flash", false)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;

    assert_eq!(body["content"][0]["id"], "toolu_0001");
    assert_eq!(body["stop_reason"], "tool_use");
    assert_eq!(body["_meta"]["cost_units"], 40);
}

#[actix_web::test]
async fn test_streaming_call_ends_with_balance_trailer() {
    let upstream = MockServer::start().await;
    let db = TestDatabase::new().await;
    let account = db.insert(AccountFactory::free(50_000)).await;
    let config = test_config(&upstream.uri());
    let auth = bearer(&config, &account);

    let body = sse(&[
        json!({"type": "response.created", "response": {"id": "resp_3"}}),
        json!({"type": "response.output_text.delta", "output_index": 0, "delta": "Hello"}),
        json!({"type": "response.output_text.delta", "output_index": 0, "delta": " there"}),
        json!({"type": "response.completed", "response": {
            "output": [{"type": "message"}],
            "usage": {"input_tokens": 4000, "output_tokens": 1000}
        }}),
    ]);
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = test::init_service(HttpServer::create_app(state(config, &db))).await;
    let resp = test::call_service(
        &app,
        proxy_request(Some(&auth), Some("openai"), &chat_request("gpt-5-mini", true)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("content-type").unwrap(), "text/event-stream");
    assert_eq!(resp.headers().get("cache-control").unwrap(), "no-cache");
    assert_eq!(resp.headers().get("x-accel-buffering").unwrap(), "no");

    let body = test::read_body(resp).await;
    let frames = frames(&body);
    let names: Vec<&str> = frames.iter().map(|(event, _)| event.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "content_block_start",
            "content_block_delta",
            "content_block_delta",
            "content_block_stop",
            "message_delta",
            "message_stop",
            "balance",
        ]
    );
    assert_eq!(
        frames.last().unwrap().1,
        json!({"type": "balance", "credits": 49_970, "cost_units": 30})
    );
    assert_eq!(db.credits(account.id).await, 49_970);
}

#[actix_web::test]
async fn test_missing_token_is_unauthorized() {
    let db = TestDatabase::new().await;
    let app = test::init_service(HttpServer::create_app(state(test_config("http://127.0.0.1:9"), &db))).await;

    let resp = test::call_service(
        &app,
        proxy_request(None, None, &chat_request("claude-haiku-4-5", false)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_suspended_account_is_forbidden() {
    let db = TestDatabase::new().await;
    let account = db.insert(AccountFactory::suspended()).await;
    let config = test_config("http://127.0.0.1:9");
    let auth = bearer(&config, &account);
    let app = test::init_service(HttpServer::create_app(state(config, &db))).await;

    let resp = test::call_service(
        &app,
        proxy_request(Some(&auth), None, &chat_request("claude-haiku-4-5", false)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_unknown_provider_is_bad_request() {
    let db = TestDatabase::new().await;
    let account = db.insert(AccountFactory::free(50_000)).await;
    let config = test_config("http://127.0.0.1:9");
    let auth = bearer(&config, &account);
    let app = test::init_service(HttpServer::create_app(state(config, &db))).await;

    let resp = test::call_service(
        &app,
        proxy_request(Some(&auth), Some("mistral"), &chat_request("mistral-large", false)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_pdf_document_reaches_anthropic() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_string_contains("\"type\":\"document\""))
        .and(body_string_contains("JVBERi0xLjQK"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_pdf",
            "type": "message",
            "role": "assistant",
            "model": "claude-haiku-4-5",
            "content": [{"type": "text", "text": "One page, mostly blank."}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 1_000, "output_tokens": 10}
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let db = TestDatabase::new().await;
    let account = db.insert(AccountFactory::free(50_000)).await;
    let config = test_config(&upstream.uri());
    let auth = bearer(&config, &account);
    let app = test::init_service(HttpServer::create_app(state(config, &db))).await;

    let body = json!({
        "model": "claude-haiku-4-5",
        "max_tokens": 256,
        "messages": [{
            "role": "user",
            "content": [
                {
                    "type": "document",
                    "source": {"type": "base64", "media_type": "application/pdf", "data": "JVBERi0xLjQK"},
                    "title": "scan.pdf"
                },
                {"type": "text", "text": "Summarize this file"}
            ]
        }]
    });
    let resp = test::call_service(&app, proxy_request(Some(&auth), None, &body).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let reply: Value = test::read_body_json(resp).await;
    assert_eq!(reply["content"][0]["text"], "One page, mostly blank.");
}

#[actix_web::test]
async fn test_depleted_trial_gets_payment_required() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let db = TestDatabase::new().await;
    let account = db.insert(AccountFactory::free(0)).await;
    let config = test_config(&upstream.uri());
    let auth = bearer(&config, &account);
    let app = test::init_service(HttpServer::create_app(state(config, &db))).await;

    let resp = test::call_service(
        &app,
        proxy_request(Some(&auth), Some("anthropic"), &chat_request("claude-haiku-4-5", false)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["message"], MSG_TRIAL_DEPLETED);

    let calls = db.db().recent_api_calls(account.id, 10).await.unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].status, "error");
    assert_eq!(calls[0].model, "claude-haiku-4-5");
    assert_eq!(calls[0].cost_units, 0);
    assert_eq!(calls[0].error_message.as_deref(), Some(MSG_TRIAL_DEPLETED));
}

#[actix_web::test]
async fn test_unconfigured_provider_is_bad_gateway() {
    let db = TestDatabase::new().await;
    let account = db.insert(AccountFactory::free(50_000)).await;
    let config = config_without("http://127.0.0.1:9", ProviderKind::OpenAI);
    let auth = bearer(&config, &account);
    let app = test::init_service(HttpServer::create_app(state(config, &db))).await;

    let resp = test::call_service(
        &app,
        proxy_request(Some(&auth), Some("openai"), &chat_request("gpt-5-mini", false)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["message"], "Provider openai is not configured on this server");

    let calls = db.db().recent_api_calls(account.id, 10).await.unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].status, "error");
    assert_eq!(calls[0].provider, "openai");
    assert_eq!(db.credits(account.id).await, 50_000);
}

#[actix_web::test]
async fn test_upstream_rejection_is_mirrored_and_audited() {
    let upstream = MockServer::start().await;
    let db = TestDatabase::new().await;
    let account = db.insert(AccountFactory::free(50_000)).await;
    let config = test_config(&upstream.uri());
    let auth = bearer(&config, &account);

    let long_error = "x".repeat(2_000);
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "anthropic-test-key"))
        .respond_with(ResponseTemplate::new(429).set_body_string(long_error))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = test::init_service(HttpServer::create_app(state(config, &db))).await;
    let resp = test::call_service(
        &app,
        proxy_request(Some(&auth), None, &chat_request("claude-haiku-4-5", false)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["message"], "API request failed");

    assert_eq!(db.credits(account.id).await, 50_000);
    let calls = db.db().recent_api_calls(account.id, 10).await.unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].status, "error");
    assert_eq!(calls[0].error_message.as_ref().map(|m| m.chars().count()), Some(500));
}

#[actix_web::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    let db = TestDatabase::new().await;
    let account = db.insert(AccountFactory::free(50_000)).await;
    // Nothing listens on the discard port
    let config = test_config("http://127.0.0.1:9");
    let auth = bearer(&config, &account);
    let app = test::init_service(HttpServer::create_app(state(config, &db))).await;

    let resp = test::call_service(
        &app,
        proxy_request(Some(&auth), Some("openai"), &chat_request("gpt-5-mini", false)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["message"], "Upstream provider error");

    let calls = db.db().recent_api_calls(account.id, 10).await.unwrap();
    assert_eq!(calls[0].status, "error");
    assert_eq!(calls[0].input_tokens, 0);
}

#[actix_web::test]
async fn test_proxy_rate_limit() {
    let db = TestDatabase::new().await;
    let account = db.insert(AccountFactory::free(0)).await;
    let mut config = test_config("http://127.0.0.1:9");
    config.gateway.rate_limit.max_requests = 1;
    let auth = bearer(&config, &account);
    let app = test::init_service(HttpServer::create_app(state(config, &db))).await;

    let body = chat_request("claude-haiku-4-5", false);
    let first = test::call_service(&app, proxy_request(Some(&auth), None, &body).to_request()).await;
    assert_eq!(first.status(), StatusCode::PAYMENT_REQUIRED);

    let second = test::call_service(&app, proxy_request(Some(&auth), None, &body).to_request()).await;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[actix_web::test]
async fn test_account_status_and_usage() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "claude-haiku-4-5",
            "content": [{"type": "text", "text": "Hi"}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10_000, "output_tokens": 0}
        })))
        .mount(&upstream)
        .await;

    let db = TestDatabase::new().await;
    let account = db.insert(AccountFactory::pro(50_000)).await;
    let config = test_config(&upstream.uri());
    let auth = bearer(&config, &account);
    let app = test::init_service(HttpServer::create_app(state(config, &db))).await;

    let resp = test::call_service(
        &app,
        proxy_request(Some(&auth), None, &chat_request("claude-haiku-4-5", false)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let status = test::TestRequest::get()
        .uri("/api/v1/auth/status")
        .insert_header(("authorization", auth.as_str()))
        .to_request();
    let status: Value = test::call_and_read_body_json(&app, status).await;
    assert_eq!(status["user"]["email"], account.email.as_str());
    assert_eq!(status["plan"], "pro");
    // 10k haiku input tokens: $0.01
    assert_eq!(status["credits"], 49_900);
    assert_eq!(status["autoRecharge"]["priceCents"], 500);

    let usage = test::TestRequest::get()
        .uri("/api/v1/auth/usage")
        .insert_header(("authorization", auth.as_str()))
        .to_request();
    let usage: Value = test::call_and_read_body_json(&app, usage).await;
    assert_eq!(usage["totalCalls"], 1);
    assert_eq!(usage["totalCredits"], 100);
}

#[actix_web::test]
async fn test_health_reports_database() {
    let db = TestDatabase::new().await;
    let app = test::init_service(HttpServer::create_app(state(test_config("http://127.0.0.1:9"), &db))).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
}
