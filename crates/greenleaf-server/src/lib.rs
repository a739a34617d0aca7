//! Green Leaf Server Library
//!
//! HTTP surface of Green Leaf: sessions, profiles, password resets and
//! image uploads. The library exposes the router for integration testing
//! while the binary handles startup.

pub mod admin;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod uploads;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::state::AppState;

/// Multipart framing on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build CORS layer from the configured origins.
///
/// `*` allows any origin (development); otherwise only the listed ones.
fn cors_layer(origins: &str) -> CorsLayer {
    let allow_origin = if origins.trim() == "*" {
        AllowOrigin::any()
    } else {
        let parsed: Vec<_> = origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .max_age(std::time::Duration::from_secs(3600))
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(routes::register))
        .route("/login", post(routes::login))
        .route("/logout", post(routes::logout))
        .route("/me", get(routes::me).patch(routes::update_me))
        .route("/change-password", post(routes::change_password))
        .route("/forgot-password", post(routes::forgot_password))
        .route("/reset-password", post(routes::reset_password))
        .route("/verify-reset-token", post(routes::verify_reset_token))
}

fn upload_routes(state: &AppState) -> Router<AppState> {
    let router = Router::new()
        .route(
            "/",
            post(uploads::upload).layer(DefaultBodyLimit::max(
                state.config.max_upload_bytes() + MULTIPART_OVERHEAD,
            )),
        )
        .route("/providers", get(uploads::providers))
        .route(
            "/history",
            get(uploads::history).delete(uploads::clear_history),
        )
        .route("/history/:id", delete(uploads::remove_entry))
        .route("/stats", get(uploads::stats));

    match state.uploader.temporary_store() {
        Some(store) => router.nest_service(
            "/temporary",
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::overriding(
                    header::CONTENT_DISPOSITION,
                    HeaderValue::from_static("attachment"),
                ))
                .service(ServeDir::new(store.dir())),
        ),
        None => router,
    }
}

/// Create the main router with all routes configured
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(routes::health))
        .nest("/auth", auth_routes())
        .nest("/uploads", upload_routes(&state))
        .route(
            "/admin/reset-tokens/purge",
            post(admin::purge_reset_tokens),
        )
        .with_state(state)
        .layer(axum_middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process is stopped
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let bind = config.bind.clone();
    let state = AppState::from_config(config).await?;
    let app = create_router(state);

    info!("Starting Green Leaf server on {}", bind);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
