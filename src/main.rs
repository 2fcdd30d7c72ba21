use std::net::SocketAddr;
use std::sync::Arc;

use hiring_backend::{
    config::{get_config, init_config},
    database::{pool, MemoryDocumentStore, PgDocumentStore, SharedStore},
    middleware::cors::cors_layer,
    routes,
    services::ai_provider::OpenAiProvider,
    AppState,
};
use tokio::net::TcpListener;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hiring_backend=info,tower_http=info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    init_config()?;
    let config = get_config();

    let store: SharedStore = match config.database_url.as_deref() {
        Some(url) => {
            let pool = pool::create_pool(url).await?;
            pool::run_migrations(&pool).await?;
            info!("Using Postgres document store");
            Arc::new(PgDocumentStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, documents are kept in memory");
            Arc::new(MemoryDocumentStore::new())
        }
    };

    let provider = Arc::new(OpenAiProvider::from_config(config)?);
    let app_state = AppState::new(config.clone(), store, provider);

    let app = routes::router(app_state)
        .layer(CompressionLayer::new())
        .layer(cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
