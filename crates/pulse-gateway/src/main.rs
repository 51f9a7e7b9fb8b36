//! Contractor Pulse gateway.
//! Serves insight generation (`/api/ai`, `/api/ai/summary`), read-only metrics and the
//! compiled report over the sled metrics store.

mod routes;

use pulse_core::{seed, InsightGenerator, MetricsStore, PulseConfig};
use routes::AppState;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PulseConfig::load()?;
    let store = Arc::new(MetricsStore::open_path(config.store_path())?);
    let contractor = seed(&store)?.contractor;

    let mut generator = InsightGenerator::from_config(&config.llm);
    if config.persist_insights {
        generator = generator.with_persistence(store.clone(), &contractor.id);
    }

    let addr = config.bind_addr();
    tracing::info!(
        app = %config.app_name,
        contractor = %contractor.name,
        ai = generator.has_credential(),
        "[PULSE] gateway listening on {}",
        addr
    );

    let state = Arc::new(AppState {
        config,
        store,
        generator: Arc::new(generator),
    });
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
