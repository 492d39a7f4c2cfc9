//! Scenecast — scene render orchestration server.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod routes;
mod state;

use state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("SCENECAST_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "--help" | "-h" | "help" => {
                println!("Scenecast — scene render orchestration server");
                println!();
                println!("Usage: scenecast");
                println!();
                println!("Environment:");
                println!("  PORT                  HTTP port (default 3004)");
                println!("  SCENECAST_DATA_DIR    Data directory (default ./data)");
                println!("  SCENECAST_API_KEY     Fallback key for the official provider");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'scenecast help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = scenecast_core::ScenecastConfig::from_env(&data_dir)?;
    let port = config.port;

    let state = Arc::new(AppState::new(config));
    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Scenecast server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
