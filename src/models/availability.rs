use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// The slots found for one calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySlots {
    pub date: NaiveDate,
    pub slots: Vec<NaiveDateTime>,
}

impl DaySlots {
    pub fn first(&self) -> Option<NaiveDateTime> {
        self.slots.first().copied()
    }
}

/// Body of `GET /availability`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub slots: Vec<String>,
    pub next_available: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AvailabilityResponse {
    pub fn from_day(day: &DaySlots, offset: FixedOffset) -> Self {
        Self {
            slots: day.slots.iter().map(|s| format_slot(s, offset)).collect(),
            next_available: day.first().map(|s| format_slot(&s, offset)),
            date: Some(day.date.format("%Y-%m-%d").to_string()),
            ..Self::default()
        }
    }

    pub fn empty_day(date: NaiveDate) -> Self {
        Self {
            date: Some(date.format("%Y-%m-%d").to_string()),
            ..Self::default()
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            reason: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn internal_error() -> Self {
        Self {
            error: Some("internal".to_string()),
            ..Self::default()
        }
    }
}

/// Body of `GET /availability/month`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthOverview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    pub month: String,
    pub days: BTreeMap<String, bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// ISO-8601 local business time with its UTC offset, e.g. `2025-06-16T09:00:00+02:00`.
pub fn format_slot(slot: &NaiveDateTime, offset: FixedOffset) -> String {
    format!("{}{}", slot.format("%Y-%m-%dT%H:%M:%S"), offset)
}

/// Reads a slot back from a client. Accepts the offset form produced by
/// [`format_slot`] (converted to business time) or a bare local timestamp.
pub fn parse_slot(s: &str, offset: FixedOffset) -> anyhow::Result<NaiveDateTime> {
    let s = s.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(s) {
        return Ok(with_offset.with_timezone(&offset).naive_local());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .map_err(|_| anyhow::anyhow!("invalid slot timestamp: {s}"))
}
