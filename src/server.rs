//! Read-only HTTP status endpoints for external monitoring.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::session::Session;
use crate::telegram::Transport;

/// How long a status request waits for `getMe`.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

const HOME_FEATURES: &[&str] = &[
    "Voice Messages",
    "PDF Generation",
    "Word Documents",
    "Excel Sheets",
    "Document Analysis",
];

const BOT_FEATURES: &[&str] = &[
    "AI Intelligence",
    "Voice Messages",
    "Document Generation",
    "Document Analysis",
    "Audio Analysis",
];

pub struct AppState {
    pub session: Arc<Session>,
    pub transport: Arc<dyn Transport>,
}

#[derive(Serialize)]
struct HomeResponse {
    status: &'static str,
    bot: String,
    features: &'static [&'static str],
    creator: String,
    deployment: &'static str,
    mode: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: String,
    version: &'static str,
    bot_status: &'static str,
}

#[derive(Serialize)]
struct BotStatusResponse {
    bot_name: String,
    creator: String,
    telegram_connected: bool,
    last_update_id: i64,
    started_at: String,
    features: &'static [&'static str],
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/bot/status", get(bot_status))
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("🌐 Status server listening on http://{}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn telegram_connected(state: &AppState) -> bool {
    match tokio::time::timeout(PROBE_TIMEOUT, state.transport.get_me()).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            debug!("Connectivity probe failed: {}", e);
            false
        }
        Err(_) => {
            debug!("Connectivity probe timed out");
            false
        }
    }
}

async fn home(State(state): State<Arc<AppState>>) -> Json<HomeResponse> {
    let identity = state.session.identity();
    Json(HomeResponse {
        status: "healthy",
        bot: format!("{} AI Telegram Bot", identity.assistant_name),
        features: HOME_FEATURES,
        creator: identity.creator_name.clone(),
        deployment: "Web Service",
        mode: "HTTP Server + Background Bot",
    })
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let connected = telegram_connected(&state).await;
    Json(HealthResponse {
        status: "healthy",
        service: format!("{}-ai-telegram-bot", state.session.identity().assistant_name),
        version: env!("CARGO_PKG_VERSION"),
        bot_status: if connected { "running" } else { "disconnected" },
    })
}

async fn bot_status(State(state): State<Arc<AppState>>) -> Json<BotStatusResponse> {
    let connected = telegram_connected(&state).await;
    let snapshot = state.session.snapshot();
    Json(BotStatusResponse {
        bot_name: snapshot.assistant_name,
        creator: snapshot.creator_name,
        telegram_connected: connected,
        last_update_id: snapshot.last_update_id,
        started_at: snapshot.started_at.to_rfc3339(),
        features: BOT_FEATURES,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::Artifact;
    use crate::relay::Update;
    use crate::session::Identity;
    use crate::telegram::{Activity, BotIdentity, RemoteFile, TransportError};
    use async_trait::async_trait;

    struct ProbeTransport {
        connected: bool,
    }

    #[async_trait]
    impl Transport for ProbeTransport {
        async fn get_updates(&self, _offset: i64, _timeout: Duration) -> Result<Vec<Update>, TransportError> {
            Ok(Vec::new())
        }
        async fn send_text(&self, _chat_id: i64, _text: &str) -> Result<(), TransportError> {
            Ok(())
        }
        async fn send_voice(&self, _chat_id: i64, _voice: &Artifact) -> Result<(), TransportError> {
            Ok(())
        }
        async fn send_document(&self, _chat_id: i64, _doc: &Artifact, _caption: &str) -> Result<(), TransportError> {
            Ok(())
        }
        async fn get_file(&self, _file_id: &str) -> Result<RemoteFile, TransportError> {
            Err(TransportError::Request("unused".to_string()))
        }
        async fn download_file(&self, _path: &str) -> Result<Vec<u8>, TransportError> {
            Err(TransportError::Request("unused".to_string()))
        }
        async fn get_me(&self) -> Result<BotIdentity, TransportError> {
            if self.connected {
                Ok(BotIdentity {
                    id: 7,
                    username: Some("atlas_bot".to_string()),
                    first_name: "ATLAS".to_string(),
                })
            } else {
                Err(TransportError::Request("401 Unauthorized".to_string()))
            }
        }
        async fn send_activity(&self, _chat_id: i64, _activity: Activity) {}
    }

    fn state(connected: bool, last_update_id: i64) -> Arc<AppState> {
        let identity = Identity {
            assistant_name: "ATLAS".to_string(),
            creator_name: "K.V.SARVESH".to_string(),
        };
        Arc::new(AppState {
            session: Arc::new(Session::resume(identity, last_update_id)),
            transport: Arc::new(ProbeTransport { connected }),
        })
    }

    #[tokio::test]
    async fn test_home() {
        let Json(body) = home(State(state(true, 0))).await;
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["bot"], "ATLAS AI Telegram Bot");
        assert_eq!(json["creator"], "K.V.SARVESH");
        assert_eq!(json["features"].as_array().unwrap().len(), HOME_FEATURES.len());
    }

    #[tokio::test]
    async fn test_health_reports_connectivity() {
        let Json(up) = health(State(state(true, 0))).await;
        assert_eq!(up.bot_status, "running");
        assert_eq!(up.service, "ATLAS-ai-telegram-bot");
        let Json(down) = health(State(state(false, 0))).await;
        assert_eq!(down.status, "healthy");
        assert_eq!(down.bot_status, "disconnected");
    }

    #[tokio::test]
    async fn test_bot_status_reads_session() {
        let Json(body) = bot_status(State(state(false, 812))).await;
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["bot_name"], "ATLAS");
        assert_eq!(json["telegram_connected"], false);
        assert_eq!(json["last_update_id"], 812);
    }

    #[tokio::test]
    async fn test_serve_and_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, state(true, 3), async move {
            let _ = stopped.await;
        }));

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let body: serde_json::Value = client
            .get(format!("http://{addr}/bot/status"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["last_update_id"], 3);
        assert_eq!(body["telegram_connected"], true);

        stop.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server should stop")
            .unwrap()
            .unwrap();
    }
}
