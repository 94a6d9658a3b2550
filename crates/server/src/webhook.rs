use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use roombot_slack::{
    events::{EventContext, EventDispatcher, HandlerResult, SlackEnvelope, SlackEvent},
    payloads::{EventsApiPayload, InteractionPayload},
};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::signature::SlackSigner;

#[derive(Clone)]
pub struct WebhookState {
    dispatcher: Arc<EventDispatcher>,
    signer: Option<SlackSigner>,
}

impl WebhookState {
    /// Without a signer every request is accepted.
    pub fn new(dispatcher: Arc<EventDispatcher>, signer: Option<SlackSigner>) -> Self {
        Self { dispatcher, signer }
    }

    fn verify(
        &self,
        headers: &HeaderMap,
        body: &[u8],
        correlation_id: &str,
    ) -> Result<(), Response> {
        let Some(signer) = &self.signer else {
            return Ok(());
        };
        signer.verify(headers, body, Utc::now().timestamp()).map_err(|rejection| {
            warn!(
                event_name = "slack.webhook.rejected",
                correlation_id,
                reason = %rejection,
                "slack request failed signature verification"
            );
            StatusCode::UNAUTHORIZED.into_response()
        })
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: String,
    correlation_id: &'a str,
}

pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/slack/action", post(events_api))
        .route("/slack/interaction", post(interaction))
        .with_state(state)
}

/// Events API: JSON body.
async fn events_api(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    if let Err(rejection) = state.verify(&headers, &body, &correlation_id) {
        return rejection;
    }

    let payload = match serde_json::from_slice::<EventsApiPayload>(&body) {
        Ok(payload) => payload,
        Err(error) => return bad_request("events api body", &error.to_string(), &correlation_id),
    };
    dispatch(&state, correlation_id, SlackEvent::from(payload)).await
}

/// Interactivity: form-encoded body whose `payload` field holds the JSON.
async fn interaction(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    if let Err(rejection) = state.verify(&headers, &body, &correlation_id) {
        return rejection;
    }

    let Some(raw) = form_urlencoded::parse(&body)
        .find(|(key, _)| key == "payload")
        .map(|(_, value)| value.into_owned())
    else {
        return bad_request("interaction body", "missing `payload` field", &correlation_id);
    };
    let payload = match serde_json::from_str::<InteractionPayload>(&raw) {
        Ok(payload) => payload,
        Err(error) => {
            return bad_request("interaction payload", &error.to_string(), &correlation_id)
        }
    };
    dispatch(&state, correlation_id, SlackEvent::from(payload)).await
}

async fn dispatch(state: &WebhookState, correlation_id: String, event: SlackEvent) -> Response {
    let event_type = event.event_type();
    let envelope = SlackEnvelope { request_id: correlation_id.clone(), event };
    let ctx = EventContext { correlation_id };

    match state.dispatcher.dispatch(&envelope, &ctx).await {
        Ok(result) => {
            info!(
                event_name = "slack.webhook.dispatched",
                correlation_id = %ctx.correlation_id,
                event_type = ?event_type,
                result = result_label(&result),
                "slack request handled"
            );
            match result {
                HandlerResult::Challenge(challenge) => {
                    Json(json!({ "challenge": challenge })).into_response()
                }
                HandlerResult::ViewResponse(response) => Json(response).into_response(),
                HandlerResult::Processed | HandlerResult::Ignored => StatusCode::OK.into_response(),
            }
        }
        Err(dispatch_error) => {
            error!(
                event_name = "slack.webhook.dispatch_failed",
                correlation_id = %ctx.correlation_id,
                event_type = ?event_type,
                error = %dispatch_error,
                "slack request handling failed"
            );
            let body = ErrorBody {
                error: "dispatch_failed",
                message: dispatch_error.to_string(),
                correlation_id: &ctx.correlation_id,
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

fn bad_request(what: &str, detail: &str, correlation_id: &str) -> Response {
    warn!(
        event_name = "slack.webhook.bad_request",
        correlation_id,
        detail,
        "could not parse {what}"
    );
    let body = ErrorBody {
        error: "bad_request",
        message: format!("could not parse {what}: {detail}"),
        correlation_id,
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

fn result_label(result: &HandlerResult) -> &'static str {
    match result {
        HandlerResult::Challenge(_) => "challenge",
        HandlerResult::ViewResponse(_) => "view_response",
        HandlerResult::Processed => "processed",
        HandlerResult::Ignored => "ignored",
    }
}
