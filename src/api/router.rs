//! HTTP API router.
//!
//! Returns a composable `Router` with JSON routes nested under `/api/` and
//! the dashboard push channel at `/ws`.
//!
//! Middleware stack (outermost → innermost):
//! 1. CORS → 2. Access log

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::api::websocket;
use crate::assistant::IntentResolver;
use crate::core_state::CoreState;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>, resolver: Arc<dyn IntentResolver>) -> Router {
    build_router(ApiContext::new(core, resolver))
}

fn build_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/vitals", get(endpoints::vitals::current))
        .route(
            "/vitals/history/:subject_id",
            get(endpoints::vitals::history),
        )
        .route("/emergency", get(endpoints::emergency::current))
        .route("/emergency/manual", post(endpoints::emergency::manual))
        .route("/emergency/confirm", post(endpoints::emergency::confirm))
        .route("/emergency/cancel", post(endpoints::emergency::cancel))
        .route("/emergency/contacts", get(endpoints::emergency::contacts))
        .route(
            "/appointments",
            get(endpoints::records::list_appointments).post(endpoints::records::book_appointment),
        )
        .route(
            "/prescriptions",
            get(endpoints::records::list_prescriptions)
                .post(endpoints::records::generate_prescription),
        )
        .route(
            "/lab-tests",
            get(endpoints::records::list_lab_tests).post(endpoints::records::order_lab_test),
        )
        .route(
            "/doctors",
            get(endpoints::doctors::list).post(endpoints::doctors::register),
        )
        .route("/doctors/recommend", post(endpoints::doctors::recommend))
        .route("/doctors/:id/verify", post(endpoints::doctors::verify))
        .route(
            "/doctor-profile",
            get(endpoints::doctors::profile).put(endpoints::doctors::update_profile),
        )
        .route(
            "/doctor-profile/appointments",
            get(endpoints::doctors::appointments),
        )
        .route(
            "/subjects",
            get(endpoints::subjects::list).post(endpoints::subjects::add_family_member),
        )
        .route("/subjects/:id/select", post(endpoints::subjects::select))
        .route(
            "/subjects/:id/monitoring",
            post(endpoints::subjects::toggle_monitoring),
        )
        .route("/monitored", get(endpoints::subjects::monitored))
        .route("/account/register", post(endpoints::subjects::register))
        .route("/devices/:id/toggle", post(endpoints::subjects::toggle_device))
        .route("/notifications", get(endpoints::notifications::recent))
        .route("/assistant/:flow", post(endpoints::assistant::send));

    Router::new()
        .nest("/api", api)
        .route("/ws", get(websocket::ws_upgrade))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(CorsLayer::permissive())
        .layer(axum::Extension(ctx))
}
