use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::opening_hours::parse_time;
use crate::models::{BookingStatus, DateOverride, Service, WeeklyHours};
use crate::services::agenda::{build_agenda, Agenda};
use crate::state::AppState;

const DEFAULT_BOOKINGS_LIMIT: i64 = 200;

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Agenda>, AppError> {
    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            BookingStatus::parse(raw)
                .ok_or_else(|| AppError::BadRequest(format!("unknown status: {raw}")))?,
        ),
        None => None,
    };
    let limit = query.limit.unwrap_or(DEFAULT_BOOKINGS_LIMIT).max(1);

    let bookings = {
        let db = state.db()?;
        queries::get_all_bookings(&db, status, limit)?
    };

    Ok(Json(build_agenda(bookings, state.clock.now())))
}

// POST /api/admin/bookings/:id/status
#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let status = BookingStatus::parse(&body.status)
        .ok_or_else(|| AppError::BadRequest(format!("unknown status: {}", body.status)))?;

    let updated = {
        let db = state.db()?;
        queries::update_booking_status(&db, &id, status, &state.clock.now())?
    };

    if !updated {
        return Err(AppError::NotFound(format!("booking {id}")));
    }

    tracing::info!(booking_id = %id, status = status.as_str(), "booking status updated");
    Ok(Json(serde_json::json!({"ok": true, "status": status.as_str()})))
}

// PUT /api/admin/services
pub async fn upsert_service(
    State(state): State<Arc<AppState>>,
    Json(service): Json<Service>,
) -> Result<Json<Service>, AppError> {
    if service.id.trim().is_empty() {
        return Err(AppError::BadRequest("service id is required".to_string()));
    }
    if service.duration_min <= 0 {
        return Err(AppError::BadRequest("durationMin must be positive".to_string()));
    }
    if service.buffer_min < 0 {
        return Err(AppError::BadRequest("bufferMin must not be negative".to_string()));
    }

    {
        let db = state.db()?;
        queries::upsert_service(&db, &service)?;
    }

    tracing::info!(service_id = %service.id, active = service.active, "service saved");
    Ok(Json(service))
}

// GET /api/admin/overrides
fn with_derived_closed(mut ov: DateOverride) -> DateOverride {
    ov.closed = ov.is_closed();
    ov
}

pub async fn get_overrides(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DateOverride>>, AppError> {
    let overrides = {
        let db = state.db()?;
        queries::list_overrides(&db)?
    };
    Ok(Json(overrides.into_iter().map(with_derived_closed).collect()))
}

// PUT /api/admin/overrides
pub async fn upsert_override(
    State(state): State<Arc<AppState>>,
    Json(mut ov): Json<DateOverride>,
) -> Result<Json<DateOverride>, AppError> {
    if ov.closed {
        ov.open_time = None;
        ov.close_time = None;
    } else {
        match (ov.open_time, ov.close_time) {
            (None, None) => ov.closed = true,
            (Some(open), Some(close)) if open >= close => {
                return Err(AppError::BadRequest(
                    "openTime must be before closeTime".to_string(),
                ));
            }
            (Some(_), Some(_)) => {}
            _ => {
                return Err(AppError::BadRequest(
                    "openTime and closeTime must be given together".to_string(),
                ));
            }
        }
    }

    {
        let db = state.db()?;
        queries::upsert_override(&db, &ov)?;
    }

    tracing::info!(date = %ov.date, closed = ov.closed, "opening hours override saved");
    Ok(Json(with_derived_closed(ov)))
}

// DELETE /api/admin/overrides/:date
pub async fn delete_override(
    State(state): State<Arc<AppState>>,
    Path(raw_date): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("invalid date: {raw_date}")))?;

    let removed = {
        let db = state.db()?;
        queries::delete_override(&db, date)?
    };

    if removed {
        Ok(Json(serde_json::json!({"ok": true})))
    } else {
        Err(AppError::NotFound(format!("override for {raw_date}")))
    }
}

// GET /api/admin/opening-hours
pub async fn get_opening_hours(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<WeeklyHours>>, AppError> {
    let hours = {
        let db = state.db()?;
        queries::list_weekly_hours(&db)?
    };
    Ok(Json(hours))
}

// PUT /api/admin/opening-hours/:weekday
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningHoursRequest {
    pub open_time: String,
    pub close_time: String,
    #[serde(default)]
    pub closed: bool,
}

pub async fn upsert_opening_hours(
    State(state): State<Arc<AppState>>,
    Path(weekday): Path<u8>,
    Json(body): Json<OpeningHoursRequest>,
) -> Result<Json<WeeklyHours>, AppError> {
    if weekday > 6 {
        return Err(AppError::BadRequest(format!(
            "weekday must be 0..=6, got {weekday}"
        )));
    }

    let open_time = parse_time(&body.open_time)
        .map_err(|_| AppError::BadRequest(format!("invalid openTime: {}", body.open_time)))?;
    let close_time = parse_time(&body.close_time)
        .map_err(|_| AppError::BadRequest(format!("invalid closeTime: {}", body.close_time)))?;
    if !body.closed && open_time >= close_time {
        return Err(AppError::BadRequest(
            "openTime must be before closeTime".to_string(),
        ));
    }

    let hours = WeeklyHours {
        weekday,
        open_time,
        close_time,
        closed: body.closed,
    };

    {
        let db = state.db()?;
        queries::upsert_weekly_hours(&db, &hours)?;
    }

    tracing::info!(weekday, closed = hours.closed, "weekly opening hours saved");
    Ok(Json(hours))
}
