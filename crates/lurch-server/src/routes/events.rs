use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, info};

use crate::chat::Inbound;
use crate::error::AppError;
use crate::slack::{Envelope, SlackConversation};
use crate::state::AppState;

/// POST /slack/events: the Slack Events API endpoint.
///
/// Slack expects an answer within three seconds, so each command is handled
/// on its own task and the request is acknowledged straight away. Slack
/// retries a request it thinks timed out; those carry `X-Slack-Retry-Num`
/// and are acknowledged without running the command a second time.
pub async fn slack_events(
    State(app): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    if let Some(retry) = headers.get("x-slack-retry-num") {
        debug!(retry = ?retry, "acknowledging slack retry");
        return Ok(StatusCode::OK.into_response());
    }

    let envelope: Envelope = serde_json::from_slice(&body)
        .map_err(|e| AppError::bad_request(format!("invalid event payload: {e}")))?;

    match envelope {
        Envelope::UrlVerification { challenge } => {
            Ok(Json(serde_json::json!({ "challenge": challenge })).into_response())
        }
        Envelope::EventCallback { event } => {
            if let Some(msg) = event.into_inbound() {
                dispatch(app, msg);
            }
            Ok(StatusCode::OK.into_response())
        }
        Envelope::Unknown => Ok(StatusCode::OK.into_response()),
    }
}

fn dispatch(app: AppState, msg: Inbound) {
    info!(channel = %msg.channel, user = %msg.user, "message received");
    tokio::spawn(async move {
        let conv = SlackConversation::thread(app.slack.clone(), &msg);
        app.orchestrator.handle(&msg, &conv).await;
    });
}
