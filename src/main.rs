use keepalley::{
    config::{
        mail::MailConfig,
        session::{validate_production_config, SessionConfig},
        ServerConfig,
    },
    db, middleware, routes,
    services::create_email_service,
    AppState,
};

use axum::middleware as axum_middleware;
use std::net::SocketAddr;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keepalley=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Refuse to start with an insecure production session setup
    validate_production_config()?;

    let server_config = ServerConfig::from_env()?;
    let mail_config = MailConfig::from_env()?;

    // Database connection
    let pool = db::create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let email_service = create_email_service(&mail_config);
    let app_state = AppState::build(pool.clone(), email_service);

    // Session store
    let session_store = SqliteStore::new(pool.clone()).with_table_name("sessions")?;
    session_store.migrate().await?;
    let session_layer = SessionConfig::from_env().create_layer(session_store);

    let app = routes::build_router(app_state)
        .nest_service("/static", ServeDir::new("static"))
        .layer(session_layer)
        .layer(axum_middleware::from_fn(middleware::add_security_headers))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from((server_config.host.parse::<std::net::IpAddr>()?, server_config.port));
    tracing::info!("Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
