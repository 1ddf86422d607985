use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::availability::parse_slot;
use crate::models::Booking;
use crate::services::scheduling::{self, BookingRequest};
use crate::state::AppState;

// POST /bookings
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub service_id: String,
    pub starts_at: String,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub notes: Option<String>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let starts_at = parse_slot(&body.starts_at, state.config.business_offset())
        .ok()
        .filter(|starts_at| starts_at.date().succ_opt().is_some())
        .ok_or_else(|| AppError::BadRequest(format!("invalid startsAt: {}", body.starts_at)))?;
    let now = state.clock.now();

    let booking = {
        let mut db = state.db()?;
        let service = queries::get_active_service(&db, &body.service_id)?
            .ok_or_else(|| AppError::NotFound(format!("service {}", body.service_id)))?;

        scheduling::book_slot(
            &mut db,
            &service,
            BookingRequest {
                starts_at,
                client_name: body.client_name,
                client_phone: body.client_phone,
                notes: body.notes,
            },
            state.config.slot_step_minutes,
            now,
        )
        .inspect_err(|e| {
            if let AppError::Scheduling(reason) = e {
                tracing::warn!(service_id = %service.id, %starts_at, %reason, "booking rejected");
            }
        })?
    };

    tracing::info!(
        booking_id = %booking.id,
        service_id = %booking.service_id,
        starts_at = %booking.starts_at,
        "booking created"
    );

    Ok((StatusCode::CREATED, Json(booking)))
}
