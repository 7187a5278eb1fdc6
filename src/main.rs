use axum_extra::extract::cookie::Key;
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &polypivot::config::CONFIG;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        bind_addr = %cfg.bind_addr,
        loglevel = %cfg.loglevel,
    );

    let storage = polypivot::Storage::connect(&cfg.database_url).await?;
    storage.init_schema().await?;
    let created = storage
        .seed_languages(polypivot::config::LANGUAGES)
        .await?;
    if created > 0 {
        info!(count = created, "seeded language catalog");
    }

    let key = match cfg.secret_key.as_deref() {
        Some(secret) if secret.len() >= 32 => Key::derive_from(secret.as_bytes()),
        Some(_) => {
            warn!("PIVOT_SECRET_KEY is shorter than 32 bytes; generating an ephemeral key");
            Key::generate()
        }
        None => {
            warn!("no PIVOT_SECRET_KEY set; sessions will not survive a restart");
            Key::generate()
        }
    };

    // Build axum router and serve
    let state = polypivot::PivotState::new(storage, key);
    let app = polypivot::pivot_router(state);

    let listener = TcpListener::bind(&cfg.bind_addr).await?;
    info!("HTTP server listening on {}", cfg.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install ctrl-c handler");
        return;
    }
    info!("shutdown signal received");
}
