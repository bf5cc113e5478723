mod config;
mod error;
mod models;
mod server;
mod services;

use anyhow::Result;
use dotenv::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;

use config::Config;
use server::{create_router, AppState};
use services::{AnthropicClient, FoodAnalyzer};

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
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

    log::info!("🛑 Shutting down...");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables (.env may set RUST_LOG too)
    dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("🚀 Starting Healthy Eating relay...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ Configuration error: {}", e);
            eprintln!("\n  Cannot start: {}", e);
            eprintln!("  Put your key in the .env file next to the binary:\n");
            eprintln!("    ANTHROPIC_API_KEY=sk-ant-your-actual-key\n");
            std::process::exit(1);
        }
    };

    match config.upstream_timeout {
        Some(timeout) => log::info!("⏱️ Upstream timeout: {}s", timeout.as_secs()),
        None => log::info!("⏱️ Upstream timeout: none"),
    }

    let analyzer: Arc<dyn FoodAnalyzer> = Arc::new(AnthropicClient::new(&config)?);
    log::info!("✅ Anthropic client initialized with model: {}", config.model);

    let state = Arc::new(AppState::new(analyzer, &config.static_dir));
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("🌐 Server listening on {}", addr);

    println!("\n  Healthy Eating App server running!");
    println!("  Open in your browser: http://localhost:{}", config.port);
    println!("  Serving assets from: {}\n", config.static_dir.display());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
