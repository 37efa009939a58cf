//! The lurch server: Slack in, orchestrator in the middle, docker out.

pub mod auth;
pub mod chat;
pub mod error;
pub mod orchestrator;
pub mod routes;
pub mod slack;
pub mod state;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use docker_driver::ContainerRuntime;
use lurch_core::config::Config;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::orchestrator::Orchestrator;
use crate::slack::{SlackClient, SlackConversation};
use crate::state::AppState;

/// Build the axum Router with all routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(state: AppState) -> Router {
    let events = Router::new()
        .route("/slack/events", post(routes::events::slack_events))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::verify_slack_signature,
        ));

    Router::new()
        .route("/health", get(routes::health::health))
        .merge(events)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Assemble the shared state for `config`.
pub fn app_state(config: &Config, runtime: Arc<dyn ContainerRuntime>) -> AppState {
    AppState::new(
        Arc::new(Orchestrator::new(config, runtime)),
        SlackClient::new(&config.slack),
        config.slack.signing_secret.clone(),
    )
}

/// Bind `config.listen` and serve until Ctrl-C or SIGTERM.
pub async fn serve(config: Config, runtime: Arc<dyn ContainerRuntime>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    serve_on(config, runtime, listener).await
}

/// Serve on a pre-bound listener.
///
/// Startup (image refresh, catalogue load, greeting) runs in the background
/// so Slack's URL verification can be answered while the image is pulled.
pub async fn serve_on(
    config: Config,
    runtime: Arc<dyn ContainerRuntime>,
    listener: tokio::net::TcpListener,
) -> anyhow::Result<()> {
    let state = app_state(&config, runtime);
    let addr = listener.local_addr()?;

    let orchestrator = Arc::clone(&state.orchestrator);
    let conv = SlackConversation::channel(state.slack.clone(), &config.deploy_channel.id);
    tokio::spawn(async move {
        if let Err(e) = orchestrator.initialise(&conv).await {
            warn!(error = %e, "startup refresh failed");
        }
    });

    info!(%addr, image = %config.image_ref(), "lurch listening");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("lurch stopped");
    Ok(())
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
