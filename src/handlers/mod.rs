pub mod admin;
pub mod availability;
pub mod bookings;
pub mod calendar;
pub mod health;
pub mod services;

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/services", get(services::list_services))
        .route("/availability", get(availability::get_availability))
        .route(
            "/availability/month",
            get(availability::get_month_availability),
        )
        .route("/bookings", post(bookings::create_booking))
        .route(
            "/calendar/:booking_id",
            get(calendar::download_ics),
        )
        .route("/api/admin/bookings", get(admin::get_bookings))
        .route(
            "/api/admin/bookings/:id/status",
            post(admin::update_booking_status),
        )
        .route("/api/admin/services", put(admin::upsert_service))
        .route("/api/admin/overrides", get(admin::get_overrides))
        .route("/api/admin/overrides", put(admin::upsert_override))
        .route(
            "/api/admin/overrides/:date",
            delete(admin::delete_override),
        )
        .route("/api/admin/opening-hours", get(admin::get_opening_hours))
        .route(
            "/api/admin/opening-hours/:weekday",
            put(admin::upsert_opening_hours),
        )
        .with_state(state)
}
