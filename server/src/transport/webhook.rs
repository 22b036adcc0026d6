use crate::{
    config::WebhookConfig,
    router::UpdateHandler,
    telegram::{types::Update, Client},
    transport::Error,
};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};
use log::{info, warn};
use std::sync::Arc;
use tokio::net::TcpListener;

pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";
pub const WEBHOOK_PATH: &str = "/webhook";

#[derive(Clone)]
struct WebhookState {
    handler: Arc<dyn UpdateHandler>,
    secret_token: Option<Arc<str>>,
}

/// `GET /` health check and `POST /webhook` update intake.
pub fn router(handler: Arc<dyn UpdateHandler>, secret_token: Option<String>) -> Router {
    Router::new()
        .route("/", get(health))
        .route(WEBHOOK_PATH, post(receive_update))
        .with_state(WebhookState {
            handler,
            secret_token: secret_token.map(Arc::from),
        })
}

async fn health() -> &'static str {
    "ok"
}

/// Checks the secret token before the body is parsed.
async fn receive_update(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(expected) = &state.secret_token {
        let provided = headers
            .get(SECRET_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());
        if provided != Some(&**expected) {
            warn!("Rejected update with a bad secret token");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!("Rejected malformed update: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };

    state.handler.handle_update(update).await;
    StatusCode::OK
}

/// Registers the webhook with Telegram and serves it until Ctrl-C.
pub async fn serve(
    client: Arc<Client>,
    handler: Arc<dyn UpdateHandler>,
    config: &WebhookConfig,
) -> Result<(), Error> {
    let base_url = config.public_url.trim_end_matches('/');
    let url = format!("{}{}", base_url, WEBHOOK_PATH);
    client
        .set_webhook(&url, config.secret_token.as_deref())
        .await?;
    info!("Webhook registered at {}", url);

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router(handler, config.secret_token.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
    }
    info!("Shutting down");
}
