// src/main.rs

use std::time::Duration;

use assessment::{build_state, config::Config, routes, services::AssessmentService};
use chrono::Utc;
use dotenvy::dotenv;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env()?;

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Open stores (migrations run on connect)
    let state = build_state(config.clone()).await?;
    tracing::info!("Response store ready at {}", config.database_url);

    // Finalize attempts whose candidate stopped polling
    spawn_deadline_sweep(
        state.service.clone(),
        Duration::from_secs(config.sweep_interval_secs.max(1)),
    );

    // Create the Axum application router
    let app = routes::create_router(state);

    tracing::info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;

    // Start the server
    axum::serve(listener, app).await?;
    Ok(())
}

fn spawn_deadline_sweep(service: AssessmentService, period: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let finalized = service.sweep_expired(Utc::now()).await;
            if finalized > 0 {
                tracing::info!("Deadline sweep finalized {} session(s)", finalized);
            }
        }
    });
}
