// Mdm Teo — process entry point.

use clap::Parser;
use log::{error, info, warn};
use mdmteo::atoms::constants::TELEGRAM_POLL_TIMEOUT_SECS;
use mdmteo::engine::admin::AdminControlPlane;
use mdmteo::engine::chat::ChatEngine;
use mdmteo::engine::config::AppConfig;
use mdmteo::engine::dispatcher::BatchDispatcher;
use mdmteo::engine::telegram::{TelegramBridge, TelegramTransport};
use mdmteo::engine::{health, providers};
use mdmteo_core::{AddressDetector, ChatStore, RandomThresholds};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "mdmteo")]
#[command(about = "Mdm Teo: a group-chat grandmother on Telegram", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, env = "MDMTEO_CONFIG")]
    config: Option<PathBuf>,

    /// Liveness endpoint port (overrides config and PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match AppConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error!("[config] {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(port) = cli.port {
        config.port = port;
    }
    info!("[config] {:?}", config);

    let transport = match TelegramTransport::new(&config.telegram_token) {
        Ok(t) => Arc::new(t),
        Err(e) => {
            error!("[telegram] Cannot build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let store = Arc::new(
        ChatStore::new(Arc::new(RandomThresholds::from_entropy()))
            .with_default_mood(config.default_mood),
    );
    let generator = providers::from_config(&config);

    let mut dispatcher = BatchDispatcher::new(generator, transport.clone());
    if let Some(persona) = &config.persona_prompt {
        dispatcher = dispatcher.with_persona(persona.clone());
    }
    if let Some(fallback) = &config.fallback_reply {
        dispatcher = dispatcher.with_fallback_reply(fallback.clone());
    }
    let dispatcher = Arc::new(dispatcher);

    let engine = Arc::new(ChatEngine::new(
        store.clone(),
        AddressDetector::new(None, config.aliases.as_slice()),
        dispatcher.clone(),
    ));
    let admin = Arc::new(AdminControlPlane::new(
        store.clone(),
        dispatcher,
        config.admin_users.clone(),
    ));

    let (bind, port) = (config.bind_address.clone(), config.port);
    tokio::spawn(async move {
        if let Err(e) = health::serve(&bind, port, store).await {
            error!("[health] Server stopped: {}", e);
        }
    });

    let bridge = Arc::new(TelegramBridge::new(transport, engine, admin));
    let stop = bridge.stop_signal();
    info!("[engine] Mdm Teo starting, default mood {}", config.default_mood);

    let mut bridge_task = tokio::spawn(async move { bridge.run().await });
    tokio::select! {
        _ = &mut bridge_task => {}
        _ = tokio::signal::ctrl_c() => {
            info!("[engine] Ctrl-C received, shutting down");
            stop.store(true, Ordering::Relaxed);
            // The flag is seen once the in-flight long poll returns.
            let grace = Duration::from_secs(TELEGRAM_POLL_TIMEOUT_SECS + 10);
            if tokio::time::timeout(grace, &mut bridge_task).await.is_err() {
                warn!("[telegram] Bridge still polling after {}s, aborting", grace.as_secs());
                bridge_task.abort();
            }
        }
    }
    ExitCode::SUCCESS
}
