use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Default opening hours for one weekday (0 = Sunday .. 6 = Saturday).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyHours {
    pub weekday: u8,
    #[serde(with = "hhmm")]
    pub open_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub close_time: NaiveTime,
    #[serde(default)]
    pub closed: bool,
}

/// Replacement of the weekly default for a single calendar date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DateOverride {
    pub date: NaiveDate,
    #[serde(default, with = "hhmm::option")]
    pub open_time: Option<NaiveTime>,
    #[serde(default, with = "hhmm::option")]
    pub close_time: Option<NaiveTime>,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub note: Option<String>,
}

impl DateOverride {
    /// An override without both times is a closed day, whatever `closed` says.
    pub fn is_closed(&self) -> bool {
        self.closed || self.open_time.is_none() || self.close_time.is_none()
    }
}

/// `[open, close]` wall-clock range during which a date accepts bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpeningWindow {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayWindow {
    Open(OpeningWindow),
    Closed,
}

impl DayWindow {
    pub fn opening(&self) -> Option<OpeningWindow> {
        match self {
            DayWindow::Open(window) => Some(*window),
            DayWindow::Closed => None,
        }
    }

    pub fn to_human_readable(&self) -> String {
        match self {
            DayWindow::Open(w) => format!("{}-{}", w.open.format("%H:%M"), w.close.format("%H:%M")),
            DayWindow::Closed => "closed".to_string(),
        }
    }
}

/// 0 = Sunday .. 6 = Saturday.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| anyhow::anyhow!("invalid time format: {s}"))
}

pub fn format_time(t: &NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_time(t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_time(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(t: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
            match t {
                Some(t) => s.serialize_str(&crate::models::opening_hours::format_time(t)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
            match Option::<String>::deserialize(d)? {
                Some(raw) if !raw.trim().is_empty() => crate::models::opening_hours::parse_time(&raw)
                    .map(Some)
                    .map_err(serde::de::Error::custom),
                _ => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NaiveTime {
        parse_time(s).unwrap()
    }

    #[test]
    fn test_parse_time_formats() {
        assert_eq!(t("09:00"), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(t("17:30:00"), NaiveTime::from_hms_opt(17, 30, 0).unwrap());
        assert!(parse_time("25:00").is_err());
        assert!(parse_time("nine").is_err());
    }

    #[test]
    fn test_weekday_index_sunday_is_zero() {
        // 2025-06-15 is a Sunday
        assert_eq!(weekday_index(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()), 0);
        assert_eq!(weekday_index(NaiveDate::from_ymd_opt(2025, 6, 21).unwrap()), 6);
    }

    #[test]
    fn test_override_without_times_is_closed() {
        let ov: DateOverride =
            serde_json::from_str(r#"{"date":"2025-12-25","openTime":null,"closeTime":null}"#)
                .unwrap();
        assert!(!ov.closed);
        assert!(ov.is_closed());
    }

    #[test]
    fn test_override_with_one_time_is_closed() {
        let ov: DateOverride =
            serde_json::from_str(r#"{"date":"2025-12-24","openTime":"09:00"}"#).unwrap();
        assert!(ov.is_closed());
    }

    #[test]
    fn test_weekly_hours_json_uses_hhmm() {
        let hours = WeeklyHours {
            weekday: 1,
            open_time: t("09:00"),
            close_time: t("17:00"),
            closed: false,
        };
        let json = serde_json::to_value(&hours).unwrap();
        assert_eq!(json["openTime"], "09:00");
        assert_eq!(json["closeTime"], "17:00");
    }

    #[test]
    fn test_day_window_human_readable() {
        let window = DayWindow::Open(OpeningWindow {
            open: t("10:00"),
            close: t("16:00"),
        });
        assert_eq!(window.to_human_readable(), "10:00-16:00");
        assert_eq!(DayWindow::Closed.to_human_readable(), "closed");
    }
}
