// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway routes.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use leadgate_agent::{resolution_message, run_turn};
use leadgate_core::{
    ChatTurn, Direction, Lead, LeadId, LeadStatus, LeadgateError, NewLead, NewMessage, NewVisit,
    ResolveRequest, SourceChannel, UNKNOWN_NAME,
};
use leadgate_resolver::resolve_and_merge;

use crate::server::GatewayState;

/// How many transcript messages are replayed to the runtime per chat turn.
pub(crate) const TRANSCRIPT_LIMIT: i64 = 50;

// --- Wire types ---

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Continue an existing conversation; omitted on the first message.
    pub lead_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub lead_id: i64,
    pub reply: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub problem: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub lead_id: i64,
    pub result: String,
}

#[derive(Debug, Serialize)]
pub struct VoiceTokenResponse {
    pub url: String,
    pub room: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct LeadsQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: LeadStatus,
}

/// Map a domain error onto an HTTP response. Storage and runtime failures
/// log and collapse to an opaque 500.
pub(crate) fn error_response(err: &LeadgateError) -> Response {
    let (status, message) = match err {
        LeadgateError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
        LeadgateError::Conflict { field } => (
            StatusCode::CONFLICT,
            format!("{field} already belongs to another lead"),
        ),
        LeadgateError::Timeout { .. } => {
            (StatusCode::GATEWAY_TIMEOUT, "operation timed out".to_string())
        }
        other => {
            warn!(error = %other, "request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
    };
    (status, Json(ErrorResponse { error: message })).into_response()
}

// --- Public routes ---

pub async fn get_health(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

/// Resolve the conversation lead and build the transcript for one chat turn.
///
/// A missing `lead_id` starts a new conversation by inserting a placeholder
/// lead; a present but unknown one is a client error. The inbound message is
/// persisted before the runtime is invoked so it survives a failed turn.
pub(crate) async fn prepare_turn(
    state: &GatewayState,
    body: &ChatRequest,
) -> Result<(LeadId, Vec<ChatTurn>), LeadgateError> {
    if body.message.trim().is_empty() {
        return Err(LeadgateError::Validation("message must not be empty".into()));
    }

    let lead_id = match body.lead_id {
        Some(raw) => {
            let id = LeadId(raw);
            state
                .store
                .get_lead(id)
                .await?
                .ok_or_else(|| LeadgateError::Validation(format!("unknown lead id {raw}")))?;
            id
        }
        None => {
            state
                .store
                .insert_lead(&NewLead {
                    name: UNKNOWN_NAME.to_string(),
                    email: None,
                    phone: None,
                    problem: None,
                    source: SourceChannel::Chat,
                })
                .await?
        }
    };

    state
        .store
        .insert_message(&NewMessage {
            lead_id,
            content: body.message.clone(),
            direction: Direction::Inbound,
        })
        .await?;

    let transcript = state
        .store
        .messages_for_lead(lead_id, Some(TRANSCRIPT_LIMIT))
        .await?
        .into_iter()
        .map(|m| match m.direction {
            Direction::Inbound => ChatTurn::user(m.content),
            Direction::Outbound => ChatTurn::assistant(m.content),
        })
        .collect();

    Ok((lead_id, transcript))
}

/// Chat endpoint. Responds with SSE when the client asks for
/// `text/event-stream`, otherwise runs the turn to completion and returns
/// the reply as JSON.
pub async fn post_chat(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(body): Json<ChatRequest>,
) -> Response {
    let wants_stream = headers
        .get("accept")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/event-stream"));

    if wants_stream {
        return crate::sse::stream_chat(state, body).await;
    }

    let (lead_id, transcript) = match prepare_turn(&state, &body).await {
        Ok(prepared) => prepared,
        Err(e) => return error_response(&e),
    };

    let reply = match run_turn(
        state.runtime.as_ref(),
        &state.tools,
        &state.system_prompt,
        transcript,
        None,
    )
    .await
    {
        Ok(reply) => reply,
        Err(e) => return error_response(&e),
    };

    if let Err(e) = state
        .store
        .insert_message(&NewMessage {
            lead_id,
            content: reply.clone(),
            direction: Direction::Outbound,
        })
        .await
    {
        return error_response(&e);
    }

    Json(ChatResponse {
        lead_id: lead_id.0,
        reply,
        created_at: chrono::Utc::now().to_rfc3339(),
    })
    .into_response()
}

/// Contact form capture: runs the identity resolver directly, no model turn.
pub async fn post_contact(
    State(state): State<GatewayState>,
    Json(body): Json<ContactRequest>,
) -> Response {
    let request = ResolveRequest::new(
        body.name,
        body.email,
        body.phone,
        body.problem,
        SourceChannel::Form,
    );

    match resolve_and_merge(state.store.as_ref(), state.policy, &request).await {
        Ok(res) => {
            let (result, _conflict) = resolution_message(&res);
            Json(ContactResponse {
                lead_id: res.lead_id.0,
                result,
            })
            .into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// Webhook the voice runtime calls to execute the capture tool mid-call.
/// The response body is the plain-text tool result the voice agent speaks from.
pub async fn post_voice_tool(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    if !state.voice.enabled {
        return StatusCode::NOT_FOUND.into_response();
    }

    if let Some(expected) = state.voice.webhook_secret.as_deref() {
        let presented = headers
            .get("x-webhook-secret")
            .and_then(|v| v.to_str().ok());
        if presented != Some(expected) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    match state.voice_tool.invoke(body).await {
        Ok(output) => (StatusCode::OK, output.content).into_response(),
        Err(e) => {
            warn!(error = %e, "voice tool webhook failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "error: could not save lead details".to_string(),
            )
                .into_response()
        }
    }
}

/// Mint connection details for a browser voice session.
pub async fn get_voice_token(State(state): State<GatewayState>) -> Response {
    if !state.voice.enabled {
        return StatusCode::NOT_FOUND.into_response();
    }

    let prefix = state.voice.room_prefix.as_deref().unwrap_or("leadgate");
    let room = format!("{prefix}-{}", uuid::Uuid::new_v4());

    Json(VoiceTokenResponse {
        url: state.voice.url.clone().unwrap_or_default(),
        room,
        token: state.voice.static_token.clone().unwrap_or_default(),
    })
    .into_response()
}

/// Record one website visit with attribution parameters.
pub async fn post_track(
    State(state): State<GatewayState>,
    Json(visit): Json<NewVisit>,
) -> Response {
    match state.store.record_visit(&visit).await {
        Ok(id) => (StatusCode::CREATED, Json(TrackResponse { id })).into_response(),
        Err(e) => error_response(&e),
    }
}

// --- Admin routes ---

pub async fn get_leads(
    State(state): State<GatewayState>,
    Query(query): Query<LeadsQuery>,
) -> Response {
    let status = match query.status.as_deref() {
        Some(raw) => match raw.parse::<LeadStatus>() {
            Ok(status) => Some(status),
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("unknown status filter: {raw}"),
                    }),
                )
                    .into_response();
            }
        },
        None => None,
    };

    match state.store.list_leads(status).await {
        Ok(leads) => Json(leads).into_response(),
        Err(e) => error_response(&e),
    }
}

pub async fn get_lead_messages(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
) -> Response {
    let lead_id = LeadId(id);
    match state.store.get_lead(lead_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return not_found(id),
        Err(e) => return error_response(&e),
    }

    match state.store.messages_for_lead(lead_id, None).await {
        Ok(messages) => Json(messages).into_response(),
        Err(e) => error_response(&e),
    }
}

pub async fn patch_lead_status(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
    Json(body): Json<StatusUpdate>,
) -> Response {
    let lead_id = LeadId(id);
    match state.store.get_lead(lead_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return not_found(id),
        Err(e) => return error_response(&e),
    }

    if let Err(e) = state.store.update_lead_status(lead_id, body.status).await {
        return error_response(&e);
    }

    match state.store.get_lead(lead_id).await {
        Ok(Some(lead)) => Json::<Lead>(lead).into_response(),
        Ok(None) => not_found(id),
        Err(e) => error_response(&e),
    }
}

fn not_found(id: i64) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("no lead with id {id}"),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use leadgate_agent::SaveLeadTool;
    use leadgate_config::model::VoiceConfig;
    use leadgate_core::{LeadStore, ToolCallRequest, TurnEvent};
    use leadgate_test_utils::TestHarness;

    use crate::auth::AuthConfig;
    use crate::server::build_router;

    const ADMIN_TOKEN: &str = "test-admin-token";

    fn voice_config(enabled: bool, secret: Option<&str>) -> VoiceConfig {
        VoiceConfig {
            enabled,
            url: Some("wss://voice.example".to_string()),
            room_prefix: Some("demo".to_string()),
            static_token: Some("voice-token".to_string()),
            webhook_secret: secret.map(str::to_string),
        }
    }

    fn state_from(harness: &TestHarness, voice: VoiceConfig) -> GatewayState {
        let voice_tool = Arc::new(SaveLeadTool::new(
            harness.store.clone(),
            harness.policy,
            SourceChannel::Voice,
        ));
        GatewayState {
            store: harness.store.clone(),
            runtime: harness.runtime.clone(),
            tools: harness.tools.clone(),
            voice_tool,
            system_prompt: Arc::from(harness.system_prompt.as_str()),
            policy: harness.policy,
            voice,
            auth: AuthConfig {
                bearer_token: Some(ADMIN_TOKEN.to_string()),
            },
            start_time: std::time::Instant::now(),
        }
    }

    fn app(harness: &TestHarness) -> axum::Router {
        build_router(state_from(harness, voice_config(true, Some("hook-secret"))))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn admin_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {ADMIN_TOKEN}"))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let harness = TestHarness::builder().build().await.unwrap();
        let app = app(&harness);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn chat_without_lead_creates_one_and_replies() {
        let harness = TestHarness::builder()
            .with_text_reply("Hi! What brings you here?")
            .build()
            .await
            .unwrap();
        let app = app(&harness);

        let response = app
            .oneshot(json_request(
                "POST",
                "/v1/chat",
                serde_json::json!({ "message": "hello" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["reply"], "Hi! What brings you here?");
        let lead_id = LeadId(json["lead_id"].as_i64().unwrap());

        let messages = harness.store.messages_for_lead(lead_id, None).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].direction, Direction::Inbound);
        assert_eq!(messages[1].content, "Hi! What brings you here?");
    }

    #[tokio::test]
    async fn chat_with_unknown_lead_is_unprocessable() {
        let harness = TestHarness::builder().build().await.unwrap();
        let app = app(&harness);

        let response = app
            .oneshot(json_request(
                "POST",
                "/v1/chat",
                serde_json::json!({ "message": "hello", "lead_id": 9999 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn chat_empty_message_is_unprocessable() {
        let harness = TestHarness::builder().build().await.unwrap();
        let app = app(&harness);

        let response = app
            .oneshot(json_request(
                "POST",
                "/v1/chat",
                serde_json::json!({ "message": "   " }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn chat_tool_call_saves_lead_details() {
        let harness = TestHarness::builder()
            .with_script(vec![
                TurnEvent::ToolCall(ToolCallRequest {
                    id: "call_1".to_string(),
                    name: "save_lead_info".to_string(),
                    arguments: serde_json::json!({
                        "name": "Sara", "email": "sara@example.com"
                    }),
                }),
                TurnEvent::Done,
            ])
            .with_text_reply("Thanks Sara, I saved your details.")
            .build()
            .await
            .unwrap();
        let app = app(&harness);

        let response = app
            .oneshot(json_request(
                "POST",
                "/v1/chat",
                serde_json::json!({ "message": "I'm Sara, sara@example.com" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let saved = harness
            .store
            .find_lead_by_email("sara@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.name, "Sara");
    }

    #[tokio::test]
    async fn contact_form_resolves_and_reports() {
        let harness = TestHarness::builder().build().await.unwrap();
        let app = app(&harness);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/v1/contact",
                serde_json::json!({ "name": "Omar", "email": "omar@example.com" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["result"].as_str().unwrap().starts_with("Lead saved"));

        let lead = harness
            .store
            .find_lead_by_email("omar@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(lead.source, SourceChannel::Form);

        // Empty submissions never reach the store.
        let response = app
            .oneshot(json_request("POST", "/v1/contact", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn voice_tool_requires_secret_and_saves() {
        let harness = TestHarness::builder().build().await.unwrap();
        let app = app(&harness);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/v1/voice/tool",
                serde_json::json!({ "phone": "+15550001" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let request = Request::builder()
            .method("POST")
            .uri("/v1/voice/tool")
            .header("content-type", "application/json")
            .header("x-webhook-secret", "hook-secret")
            .body(Body::from(
                serde_json::json!({ "phone": "+15550001" }).to_string(),
            ))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let lead = harness
            .store
            .find_lead_by_phone("+15550001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(lead.source, SourceChannel::Voice);
    }

    #[tokio::test]
    async fn voice_routes_hidden_when_disabled() {
        let harness = TestHarness::builder().build().await.unwrap();
        let app = build_router(state_from(&harness, voice_config(false, None)));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/v1/voice/token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(json_request(
                "POST",
                "/v1/voice/tool",
                serde_json::json!({ "phone": "+1" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn voice_token_mints_prefixed_room() {
        let harness = TestHarness::builder().build().await.unwrap();
        let app = app(&harness);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/voice/token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["url"], "wss://voice.example");
        assert!(json["room"].as_str().unwrap().starts_with("demo-"));
        assert_eq!(json["token"], "voice-token");
    }

    #[tokio::test]
    async fn track_records_a_visit() {
        let harness = TestHarness::builder().build().await.unwrap();
        let app = app(&harness);

        let response = app
            .oneshot(json_request(
                "POST",
                "/v1/track",
                serde_json::json!({
                    "path": "/pricing",
                    "utm_source": "newsletter"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let visits = harness.store.recent_visits(10).await.unwrap();
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].path.as_deref(), Some("/pricing"));
        assert_eq!(visits[0].utm_source.as_deref(), Some("newsletter"));
    }

    #[tokio::test]
    async fn admin_lists_and_filters_leads() {
        let harness = TestHarness::builder().build().await.unwrap();
        let id = harness
            .store
            .insert_lead(&NewLead {
                name: "Sara".to_string(),
                email: Some("s@x.com".to_string()),
                phone: None,
                problem: None,
                source: SourceChannel::Form,
            })
            .await
            .unwrap();
        harness
            .store
            .update_lead_status(id, LeadStatus::Converted)
            .await
            .unwrap();
        let app = app(&harness);

        let response = app
            .clone()
            .oneshot(admin_request("GET", "/v1/leads?status=converted"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json.as_array().unwrap().len(), 1);

        let response = app
            .clone()
            .oneshot(admin_request("GET", "/v1/leads?status=bogus"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // No token, no list.
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/leads")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_reads_transcript() {
        let harness = TestHarness::builder().build().await.unwrap();
        let id = harness
            .store
            .insert_lead(&NewLead {
                name: UNKNOWN_NAME.to_string(),
                email: None,
                phone: None,
                problem: None,
                source: SourceChannel::Chat,
            })
            .await
            .unwrap();
        harness
            .store
            .insert_message(&NewMessage {
                lead_id: id,
                content: "hi".to_string(),
                direction: Direction::Inbound,
            })
            .await
            .unwrap();
        let app = app(&harness);

        let response = app
            .clone()
            .oneshot(admin_request("GET", &format!("/v1/leads/{}/messages", id.0)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json.as_array().unwrap().len(), 1);

        let response = app
            .oneshot(admin_request("GET", "/v1/leads/404/messages"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn admin_updates_lead_status() {
        let harness = TestHarness::builder().build().await.unwrap();
        let id = harness
            .store
            .insert_lead(&NewLead {
                name: "Omar".to_string(),
                email: None,
                phone: None,
                problem: None,
                source: SourceChannel::Form,
            })
            .await
            .unwrap();
        let app = app(&harness);

        let request = Request::builder()
            .method("PATCH")
            .uri(format!("/v1/leads/{}/status", id.0))
            .header("authorization", format!("Bearer {ADMIN_TOKEN}"))
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({ "status": "in-progress" }).to_string(),
            ))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "in-progress");

        let request = Request::builder()
            .method("PATCH")
            .uri("/v1/leads/404/status")
            .header("authorization", format!("Bearer {ADMIN_TOKEN}"))
            .header("content-type", "application/json")
            .body(Body::from(serde_json::json!({ "status": "lost" }).to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
