use std::sync::{Arc, Mutex};

use axum::routing::{get, post, put};
use axum::Router;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use frontdesk::config::AppConfig;
use frontdesk::db;
use frontdesk::handlers;
use frontdesk::services::content::SqliteContentStore;
use frontdesk::services::notify::log::LogNotifier;
use frontdesk::services::notify::webhook::WebhookNotifier;
use frontdesk::services::notify::Notifier;
use frontdesk::services::submission::SqliteSubmissionStore;
use frontdesk::services::uploads::DiskUploadStore;
use frontdesk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    let db = Arc::new(Mutex::new(conn));

    let notifier: Box<dyn Notifier> = if config.notify_webhook_url.is_empty() {
        tracing::info!("no notification webhook configured, logging notices instead");
        Box::new(LogNotifier)
    } else {
        tracing::info!("posting notifications to {}", config.notify_webhook_url);
        Box::new(WebhookNotifier::new(config.notify_webhook_url.clone()))
    };

    let uploads = DiskUploadStore::new(config.media_dir.clone(), config.public_base_url.clone());

    let (events_tx, _) = broadcast::channel(256);

    let state = Arc::new(AppState {
        db: Arc::clone(&db),
        config: config.clone(),
        submissions: Box::new(SqliteSubmissionStore::new(Arc::clone(&db))),
        content: Box::new(SqliteContentStore::new(Arc::clone(&db))),
        uploads: Box::new(uploads),
        notifier,
        events_tx,
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/slots", get(handlers::booking::list_slots))
        .route(
            "/api/calendar",
            get(handlers::booking::current_month_grid),
        )
        .route(
            "/api/calendar/:year/:month",
            get(handlers::booking::month_grid),
        )
        .route(
            "/api/booking/sessions",
            post(handlers::booking::create_session),
        )
        .route(
            "/api/booking/sessions/:id",
            get(handlers::booking::get_session),
        )
        .route(
            "/api/booking/sessions/:id/events",
            post(handlers::booking::session_event),
        )
        .route("/api/contact", post(handlers::booking::submit_contact))
        .route(
            "/api/content/:collection",
            get(handlers::content::public_list),
        )
        .route("/api/admin/status", get(handlers::admin::get_status))
        .route(
            "/api/admin/appointments",
            get(handlers::admin::get_appointments),
        )
        .route(
            "/api/admin/appointments/:id/status",
            post(handlers::admin::update_appointment_status),
        )
        .route(
            "/api/admin/content/:collection",
            get(handlers::content::admin_list).post(handlers::content::admin_create),
        )
        .route(
            "/api/admin/content/:collection/:id",
            get(handlers::content::admin_get)
                .put(handlers::content::admin_update)
                .delete(handlers::content::admin_delete),
        )
        .route(
            "/api/admin/uploads/:filename",
            put(handlers::admin::upload_media),
        )
        .route("/api/admin/events", get(handlers::admin::events_stream))
        .nest_service("/media", ServeDir::new(&config.media_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
