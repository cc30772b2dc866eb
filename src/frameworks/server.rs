// Framework bootstrap for the arena server runtime.

use crate::domain::{GameConfig, SystemClock};
use crate::frameworks::config;
use crate::interface_adapters::net::{LoopEvent, health_handler, run_session_loop, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::SessionManager;

use axum::{Router, routing::get};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::net::SocketAddr;
use std::{io::Result, sync::Arc, time::Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let (state, session_loop) = build_state();
    let loop_tx = state.loop_tx.clone();

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("shutdown signal received");
            // Timers are cleared and every socket is told to close before draining.
            let _ = loop_tx.send(LoopEvent::Shutdown).await;
        })
        .await
        .inspect_err(|e| {
            tracing::error!(error = %e, "server error");
        });

    if let Err(e) = session_loop.await {
        tracing::error!(error = %e, "session loop task failed");
    }
    served
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::new(config::bind_host(), config::http_port());

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_state() -> (Arc<AppState>, JoinHandle<()>) {
    let rng = match config::rng_seed() {
        Some(seed) => {
            tracing::info!(seed, "using fixed rng seed");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_os_rng(),
    };

    let game_config = GameConfig::default();
    tracing::debug!(
        tick_rate = game_config.tick_rate,
        max_players = game_config.max_players,
        food_count = game_config.food_count,
        "gameplay tuning loaded"
    );

    // The clock and the loop's sleep deadlines share one origin.
    let origin = Instant::now();
    let manager = SessionManager::new(game_config, SystemClock::new(origin), rng);
    let (loop_tx, loop_rx) = mpsc::channel(config::EVENT_CHANNEL_CAPACITY);
    let session_loop = tokio::spawn(run_session_loop(manager, origin, loop_rx));

    let state = AppState {
        loop_tx,
        outgoing_queue_capacity: config::OUTGOING_QUEUE_CAPACITY,
    };
    (Arc::new(state), session_loop)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
