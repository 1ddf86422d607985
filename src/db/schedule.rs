use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{Booking, DateOverride, WeeklyHours};
use crate::services::availability::ScheduleSource;

/// [`ScheduleSource`] over the SQLite tables.
pub struct SqliteSchedule<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSchedule<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl ScheduleSource for SqliteSchedule<'_> {
    fn weekly_defaults(&self) -> anyhow::Result<Vec<WeeklyHours>> {
        queries::list_weekly_hours(self.conn)
    }

    fn overrides_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<DateOverride>> {
        queries::get_overrides_between(self.conn, from, to)
    }

    fn confirmed_bookings_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> anyhow::Result<Vec<Booking>> {
        queries::get_confirmed_bookings_overlapping(self.conn, &from, &to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::opening_hours::parse_time;
    use crate::models::{BookingSource, BookingStatus, DayWindow, Service};
    use crate::services::availability::{AvailabilityResolver, ScheduleSnapshot};

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_snapshot_loaded_from_sqlite() {
        let conn = db::init_db(":memory:").unwrap();
        let service = Service {
            id: "svc-1".to_string(),
            category: "Hair".to_string(),
            name: "Blow-dry".to_string(),
            description: None,
            duration_min: 45,
            buffer_min: 15,
            price: 30.0,
            promo_price: None,
            active: true,
            sort_order: Some(1),
        };
        queries::upsert_service(&conn, &service).unwrap();
        for weekday in 0..7 {
            queries::upsert_weekly_hours(
                &conn,
                &WeeklyHours {
                    weekday,
                    open_time: parse_time("09:00").unwrap(),
                    close_time: parse_time("12:00").unwrap(),
                    closed: false,
                },
            )
            .unwrap();
        }
        queries::upsert_override(
            &conn,
            &DateOverride {
                date: d("2025-06-16"),
                open_time: None,
                close_time: None,
                closed: true,
                note: Some("Training day".to_string()),
            },
        )
        .unwrap();
        queries::create_booking(
            &conn,
            &Booking {
                id: "bk-1".to_string(),
                service_id: "svc-1".to_string(),
                client_name: None,
                client_phone: None,
                starts_at: dt("2025-06-17 09:00"),
                ends_at: dt("2025-06-17 10:00"),
                status: BookingStatus::Confirmed,
                notes: None,
                source: BookingSource::Admin,
                created_at: dt("2025-06-01 12:00"),
                updated_at: dt("2025-06-01 12:00"),
            },
        )
        .unwrap();

        let source = SqliteSchedule::new(&conn);
        let snapshot = ScheduleSnapshot::load(&source, d("2025-06-16"), d("2025-06-22")).unwrap();
        assert_eq!(snapshot.window_for(d("2025-06-16")), DayWindow::Closed);
        assert_eq!(snapshot.bookings.len(), 1);

        let resolver = AvailabilityResolver::new(&snapshot, 30, dt("2025-06-01 00:00"));
        let found = resolver
            .find_next_available(&service, d("2025-06-16"), 7, Some(6))
            .unwrap();
        assert_eq!(found.date, d("2025-06-17"));
        // 60-minute span after the 09:00-10:00 booking: 10:00, 10:30, 11:00
        assert_eq!(
            found.slots,
            vec![dt("2025-06-17 10:00"), dt("2025-06-17 10:30"), dt("2025-06-17 11:00")]
        );
    }
}
