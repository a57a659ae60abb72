use axum::{
    routing::{get, patch, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rust_investor_api::chat::ChatAssistant;
use rust_investor_api::chat_session::ChatSessionRegistry;
use rust_investor_api::config::Config;
use rust_investor_api::db::Database;
use rust_investor_api::handlers::{self, AppState};
use rust_investor_api::persistence::ProfileStorage;
use rust_investor_api::questionnaire::QuestionnaireRegistry;
use rust_investor_api::services::DiversificationService;

/// Main entry point for the application.
///
/// Initializes logging, configuration, the database pool, the session
/// registries and the external clients, then serves the HTTP API.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_investor_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database connection pool established");

    // Idle sessions are dropped; a returning user resumes with /load
    let questionnaires = QuestionnaireRegistry::new(config.session_idle());
    let chats = ChatSessionRegistry::new(config.session_idle());
    tracing::info!(
        "Session registries initialized ({}s idle expiry)",
        config.session_idle_secs
    );

    let app_state = Arc::new(AppState {
        storage: ProfileStorage::new(db.pool.clone()),
        questionnaires,
        chats,
        assistant: ChatAssistant::new(&config),
        diversification: DiversificationService::new(&config),
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("invalid rate limiter configuration"))?,
    );

    let protected_routes = Router::new()
        // Questionnaire
        .route("/api/v1/questionnaire", post(handlers::start_questionnaire))
        .route(
            "/api/v1/questionnaire/:user_id",
            get(handlers::get_questionnaire),
        )
        .route(
            "/api/v1/questionnaire/:user_id/fields",
            patch(handlers::update_questionnaire_field),
        )
        .route(
            "/api/v1/questionnaire/:user_id/advance",
            post(handlers::advance_questionnaire),
        )
        .route(
            "/api/v1/questionnaire/:user_id/retreat",
            post(handlers::retreat_questionnaire),
        )
        .route(
            "/api/v1/questionnaire/:user_id/back",
            post(handlers::back_questionnaire),
        )
        .route(
            "/api/v1/questionnaire/:user_id/save",
            post(handlers::save_questionnaire),
        )
        .route(
            "/api/v1/questionnaire/:user_id/load",
            post(handlers::load_questionnaire),
        )
        .route(
            "/api/v1/questionnaire/:user_id/reset",
            post(handlers::reset_questionnaire),
        )
        .route(
            "/api/v1/questionnaire/:user_id/summary",
            get(handlers::questionnaire_summary),
        )
        .route(
            "/api/v1/profiles/document-availability",
            get(handlers::document_availability),
        )
        // Assistant chat
        .route("/api/v1/chat/sessions", post(handlers::start_chat))
        .route(
            "/api/v1/chat/sessions/:user_id",
            axum::routing::delete(handlers::end_chat),
        )
        .route(
            "/api/v1/chat/sessions/:user_id/messages",
            post(handlers::send_chat_message),
        )
        // Diversification simulator
        .route(
            "/api/v1/diversification/:user_id",
            get(handlers::diversification),
        )
        .layer(
            ServiceBuilder::new()
                // Request size limit: 1MB max payload
                .layer(RequestBodyLimitLayer::new(1024 * 1024))
                // Rate limiting: 10 req/sec per IP, burst of 20
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Health check bypasses rate limiting
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
