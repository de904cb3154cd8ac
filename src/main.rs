use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;

use atlas_relay::media::{transcribe, OfficeGenerator, TtsClient};
use atlas_relay::server::{self, AppState};
use atlas_relay::{groq, Config, Dispatcher, FixedBackoff, Ingestor, Session, TelegramClient, Transport};

#[tokio::main]
async fn main() {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = match Config::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let file_appender = tracing_appender::rolling::never(&log_dir, "atlas-relay.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("🚀 Starting {} AI relay", config.assistant_name);
    if let Some(path) = &config_path {
        info!("Loaded config from {}", path.display());
    }
    info!("Telegram token: {}", config.masked_token());

    let transport: Arc<dyn Transport> =
        match TelegramClient::new(&config.telegram_bot_token, config.poll_timeout, config.request_timeout) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                error!("❌ {e}");
                std::process::exit(1);
            }
        };

    match transport.get_me().await {
        Ok(me) => info!(
            "✅ Bot connected: @{} ({})",
            me.username.as_deref().unwrap_or("?"),
            me.first_name
        ),
        Err(e) => warn!("❌ Bot connection test failed: {e}; polling will keep retrying"),
    }

    let session = Arc::new(Session::new(config.identity()));
    let ai = Arc::new(groq::Client::new(
        config.groq_api_key.clone(),
        config.groq_base_url.clone(),
        config.groq_model.clone(),
        config.request_timeout,
    ));
    let tts = Arc::new(TtsClient::new(config.tts_endpoint.clone(), config.request_timeout));
    let generator = Arc::new(OfficeGenerator::new(config.request_timeout));
    let transcriber = transcribe::from_model_path(config.whisper_model_path.as_deref(), config.request_timeout * 4);

    let dispatcher = Arc::new(Dispatcher::new(
        session.clone(),
        transport.clone(),
        ai,
        tts,
        generator,
        transcriber,
    ));
    let ingestor = Ingestor::new(session.clone(), transport.clone(), dispatcher, config.poll_timeout)
        .with_backoff(FixedBackoff(config.retry_delay));

    let (stop, shutdown) = watch::channel(false);
    let ingest_task = tokio::spawn(async move { ingestor.run(shutdown).await });

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("❌ Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    let state = Arc::new(AppState { session, transport });
    let on_ctrl_c = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
        info!("👋 Shutdown requested");
        let _ = stop.send(true);
    };

    if let Err(e) = server::serve(listener, state, on_ctrl_c).await {
        error!("❌ Status server error: {e}");
    }

    if let Err(e) = ingest_task.await {
        error!("❌ Ingestor task failed: {e}");
    }
    info!("Bye");
}
