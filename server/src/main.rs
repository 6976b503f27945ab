use arena_server::config::ServerConfig;
use arena_server::game_loop::{run_game_loop, GameCommand};
use arena_server::ws::{router, AppState};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env();

    // Validate configuration before starting
    if let Err(e) = config.validate() {
        tracing::error!("Invalid server configuration: {}", e);
        std::process::exit(1);
    }

    let listen_addr = config.listen_addr.clone();
    let static_dir = config.static_dir.clone();
    let outbound_queue = config.outbound_queue;

    let (game_tx, game_rx) = mpsc::channel::<GameCommand>(256);

    // Spawn game loop
    tokio::spawn(async move {
        run_game_loop(game_rx, config).await;
    });

    let app = router(AppState::new(game_tx, outbound_queue), &static_dir);

    let listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", listen_addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Arena server listening on {}", listen_addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
