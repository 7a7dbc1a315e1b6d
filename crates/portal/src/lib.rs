// Thesis Portal server library
// Decision: Shared library for binaries (server, OpenAPI export) and router tests

use axum::http::{header, Method};
use axum::{extract::State, middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// API routes and page handlers
pub mod api;

// Authentication module
pub mod auth;

// Server configuration
pub mod config;
pub use config::PortalConfig;

// Edge route filter layer
pub mod edge;

// Services layer
pub mod services;

// Storage layer
pub mod storage;
use storage::StorageBackend;

// OpenAPI spec generation
pub mod openapi;
use openapi::ApiDoc;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    filter_mode: &'static str,
    storage: &'static str,
}

/// State for health endpoint
#[derive(Clone)]
struct HealthState {
    filter_mode: &'static str,
    storage: &'static str,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        filter_mode: state.filter_mode,
        storage: state.storage,
    })
}

/// Build the full application router
pub fn build_app(config: &PortalConfig, db: Arc<StorageBackend>) -> Router {
    let health_state = HealthState {
        filter_mode: config.route_filter.mode.as_str(),
        storage: if db.is_dev_mode() {
            "memory"
        } else {
            "postgres"
        },
    };

    // Create module-specific states
    let auth_state = auth::AuthState::new(config.auth.clone(), db);
    let pages_state = api::pages::PagesState {
        auth: auth_state.clone(),
    };
    let profile_state =
        api::profile::ProfileState::new(auth_state.clone(), config.staff_emails.clone());
    let uploads_state = api::uploads::UploadsState::new(auth_state.clone(), config.upload.clone());

    let app = Router::new()
        .route("/health", get(health).with_state(health_state))
        .merge(api::pages::routes(pages_state))
        .merge(api::profile::routes(profile_state))
        .merge(api::uploads::routes(uploads_state))
        .merge(auth::routes(auth_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    // The edge filter sees every request before any handler
    let app = app.layer(middleware::from_fn_with_state(
        Arc::new(config.route_filter.clone()),
        edge::filter_routes,
    ));

    // Add CORS layer only if origins are configured
    let app = if !config.cors_origins.is_empty() {
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(config.cors_origins.clone()))
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::ORIGIN,
                ])
                .allow_credentials(true),
        )
    } else {
        app
    };

    app.layer(TraceLayer::new_for_http())
}
