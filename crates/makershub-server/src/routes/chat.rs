//! The chat endpoint. One request is one conversational turn; the session
//! key scopes flow state (and agent transcript) across turns.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use makershub_agent::LlmMessage;
use makershub_schema::{UserContext, Utterance};

use crate::state::{AppState, ChatBackend};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(chat))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session: String,
    pub text: String,
    #[serde(default)]
    pub attachment_url: Option<String>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub user_email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub messages: Vec<String>,
    pub data_changed: bool,
}

pub struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
}

impl ApiError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        tracing::error!(error = %e, "chat turn failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({"error": self.message}))).into_response()
    }
}

async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if req.session.trim().is_empty() {
        return Err(ApiError::bad_request("session is required"));
    }
    if req.text.trim().is_empty() && req.attachment_url.is_none() {
        return Err(ApiError::bad_request("text is required"));
    }

    let turn = match &req.attachment_url {
        Some(url) => Utterance::with_attachment(req.text.clone(), url.clone()),
        None => Utterance::text(req.text.clone()),
    };
    let user = req.user_id.map(|user_id| UserContext {
        user_id,
        email: req.user_email.clone(),
    });

    // The session entry's own lock is held for the whole turn so two
    // requests with the same key cannot both observe the same flow state.
    let entry = state.session(&req.session).await;
    let response = {
        let mut session = entry.lock().await;
        match &*state.backend {
            ChatBackend::Flow(engine) => {
                let flow = session.flow.clone();
                let outcome = engine.advance(flow, &turn, user.as_ref()).await?;
                session.flow = outcome.flow;
                ChatResponse {
                    messages: outcome.messages,
                    data_changed: outcome.data_changed,
                }
            }
            ChatBackend::Agent(agent) => {
                let reply = agent.respond(&session.history, &turn, user.as_ref()).await?;
                // Only the visible exchange is kept; tool rounds stay per-turn.
                session.push_exchange(
                    LlmMessage::user(&turn.text),
                    LlmMessage::assistant(&reply.text),
                );
                ChatResponse {
                    messages: vec![reply.text],
                    data_changed: reply.data_changed,
                }
            }
        }
    };
    state.evict_if_idle(&req.session).await;
    Ok(Json(response))
}
