use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Duration, Months, NaiveDate};
use rusqlite::Connection;
use serde::Deserialize;

use crate::db::{queries, SqliteSchedule};
use crate::errors::AppError;
use crate::models::{AvailabilityResponse, MonthOverview, Service};
use crate::services::availability::{AvailabilityResolver, ScheduleSnapshot};
use crate::state::AppState;

const NO_SERVICES: &str = "no services";
const NO_AVAILABILITY: &str = "no availability";

// GET /availability
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub service_id: Option<String>,
    pub date: Option<String>,
    pub limit: Option<i64>,
}

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Response {
    let date = match query.date.as_deref().filter(|d| !d.is_empty()) {
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) if date.succ_opt().is_some() => Some(date),
            _ => {
                return AppError::BadRequest(format!("invalid date: {raw}")).into_response();
            }
        },
        None => None,
    };

    match compute_availability(&state, query.service_id.as_deref(), date, query.limit) {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to compute availability");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AvailabilityResponse::internal_error()),
            )
                .into_response()
        }
    }
}

fn compute_availability(
    state: &AppState,
    service_id: Option<&str>,
    date: Option<NaiveDate>,
    limit: Option<i64>,
) -> anyhow::Result<AvailabilityResponse> {
    let config = &state.config;
    let now = state.clock.now();
    let start = date.unwrap_or(now.date());
    let search_days = config.search_days.max(1);
    let days = if date.is_some() { 1 } else { search_days };
    let last = start
        .checked_add_signed(Duration::days(days as i64 - 1))
        .with_context(|| format!("scan from {start} runs past the calendar"))?;

    let (service, snapshot) = {
        let db = state.db()?;
        let Some(service) = choose_service(&db, service_id)? else {
            return Ok(AvailabilityResponse::unavailable(NO_SERVICES));
        };
        let snapshot = ScheduleSnapshot::load(&SqliteSchedule::new(&db), start, last)?;
        (service, snapshot)
    };

    let resolver = AvailabilityResolver::new(&snapshot, config.slot_step_minutes, now);
    let offset = config.business_offset();

    let response = match date {
        Some(date) => {
            let day = resolver.slots_on(&service, date);
            if day.slots.is_empty() {
                AvailabilityResponse::empty_day(date)
            } else {
                AvailabilityResponse::from_day(&day, offset)
            }
        }
        None => {
            let limit = limit.unwrap_or(config.default_slot_limit as i64).max(1) as usize;
            match resolver.find_next_available(&service, start, search_days, Some(limit)) {
                Some(day) => AvailabilityResponse::from_day(&day, offset),
                None => AvailabilityResponse::unavailable(NO_AVAILABILITY),
            }
        }
    };

    Ok(response)
}

/// The requested service when it exists and is active, otherwise the first active
/// service by display order.
fn choose_service(conn: &Connection, service_id: Option<&str>) -> anyhow::Result<Option<Service>> {
    if let Some(id) = service_id.filter(|id| !id.is_empty()) {
        if let Some(service) = queries::get_active_service(conn, id)? {
            return Ok(Some(service));
        }
        tracing::debug!(service_id = id, "unknown or inactive service, using first active");
    }
    queries::first_active_service(conn)
}

// GET /availability/month
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthQuery {
    pub service_id: Option<String>,
    pub month: String,
}

pub async fn get_month_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthOverview>, AppError> {
    let invalid_month = || AppError::BadRequest(format!("invalid month: {}", query.month));
    let first = NaiveDate::parse_from_str(&format!("{}-01", query.month), "%Y-%m-%d")
        .map_err(|_| invalid_month())?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .ok_or_else(invalid_month)?;

    let config = &state.config;
    let now = state.clock.now();
    let today = now.date();
    let horizon = today + Duration::days(config.month_horizon_days as i64);
    let scan_from = first.max(today);
    let scan_to = last.min(horizon);

    let (service, snapshot) = {
        let db = state.db()?;
        let Some(service) = choose_service(&db, query.service_id.as_deref())? else {
            return Ok(Json(MonthOverview {
                month: query.month,
                reason: Some(NO_SERVICES.to_string()),
                ..MonthOverview::default()
            }));
        };
        let snapshot = if scan_from <= scan_to {
            ScheduleSnapshot::load(&SqliteSchedule::new(&db), scan_from, scan_to)?
        } else {
            ScheduleSnapshot::default()
        };
        (service, snapshot)
    };

    let resolver = AvailabilityResolver::new(&snapshot, config.slot_step_minutes, now);
    let mut days = BTreeMap::new();
    for date in first.iter_days().take_while(|d| *d <= last && *d <= horizon) {
        let available = date >= today && resolver.has_availability(&service, date);
        days.insert(date.format("%Y-%m-%d").to_string(), available);
    }

    Ok(Json(MonthOverview {
        service_id: Some(service.id),
        month: query.month,
        days,
        reason: None,
    }))
}
