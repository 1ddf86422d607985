use chrono::NaiveDateTime;
use rusqlite::{Connection, TransactionBehavior};

use crate::db::{queries, SqliteSchedule};
use crate::errors::AppError;
use crate::models::{Booking, BookingSource, BookingStatus, Service};
use crate::services::availability::{generate_slots, ScheduleSnapshot};

#[derive(Debug)]
pub enum SchedulingError {
    ServiceUnavailable,
    Closed,
    OutsideOpeningHours { hours: String },
    InThePast,
    Conflict,
    NotOnSchedule,
}

impl std::fmt::Display for SchedulingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulingError::ServiceUnavailable => {
                write!(f, "This service can't be booked at the moment.")
            }
            SchedulingError::Closed => write!(f, "We're closed on that day."),
            SchedulingError::OutsideOpeningHours { hours } => {
                write!(
                    f,
                    "That time is outside our opening hours. That day we're open {hours}."
                )
            }
            SchedulingError::InThePast => write!(f, "That time has already passed."),
            SchedulingError::Conflict => {
                write!(
                    f,
                    "Sorry, that time slot is already booked. Could you pick a different time?"
                )
            }
            SchedulingError::NotOnSchedule => {
                write!(f, "Please pick one of the offered start times.")
            }
        }
    }
}

impl std::error::Error for SchedulingError {}

/// Checks that `starts_at` is still a bookable slot for `service` and returns the end
/// of the booking (start plus effective duration).
pub fn validate_booking_time(
    snapshot: &ScheduleSnapshot,
    service: &Service,
    starts_at: NaiveDateTime,
    step_minutes: u32,
    now: NaiveDateTime,
) -> Result<NaiveDateTime, SchedulingError> {
    let Some(duration) = service
        .effective_duration()
        .filter(|_| service.is_bookable())
    else {
        return Err(SchedulingError::ServiceUnavailable);
    };

    let date = starts_at.date();
    let window = snapshot.window_for(date);
    let Some(opening) = window.opening() else {
        return Err(SchedulingError::Closed);
    };

    if starts_at <= now {
        return Err(SchedulingError::InThePast);
    }

    let Some(ends_at) = starts_at.checked_add_signed(duration) else {
        return Err(SchedulingError::OutsideOpeningHours {
            hours: window.to_human_readable(),
        });
    };
    if starts_at < date.and_time(opening.open) || ends_at > date.and_time(opening.close) {
        return Err(SchedulingError::OutsideOpeningHours {
            hours: window.to_human_readable(),
        });
    }

    if snapshot
        .bookings
        .iter()
        .any(|b| b.status.blocks_availability() && b.overlaps(starts_at, ends_at))
    {
        return Err(SchedulingError::Conflict);
    }

    let offered = generate_slots(
        date,
        window,
        service,
        &snapshot.bookings,
        step_minutes,
        now,
    )
    .any(|slot| slot == starts_at);
    if !offered {
        return Err(SchedulingError::NotOnSchedule);
    }

    Ok(ends_at)
}

pub struct BookingRequest {
    pub starts_at: NaiveDateTime,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub notes: Option<String>,
}

/// Re-validates the slot and inserts a confirmed booking under an immediate
/// transaction, so two requests for the same slot cannot both pass the check.
pub fn book_slot(
    conn: &mut Connection,
    service: &Service,
    request: BookingRequest,
    step_minutes: u32,
    now: NaiveDateTime,
) -> Result<Booking, AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let date = request.starts_at.date();
    let snapshot = ScheduleSnapshot::load(&SqliteSchedule::new(&tx), date, date)?;
    let ends_at = validate_booking_time(&snapshot, service, request.starts_at, step_minutes, now)?;

    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        service_id: service.id.clone(),
        client_name: request.client_name,
        client_phone: request.client_phone,
        starts_at: request.starts_at,
        ends_at,
        status: BookingStatus::Confirmed,
        notes: request.notes,
        source: BookingSource::Web,
        created_at: now,
        updated_at: now,
    };
    queries::create_booking(&tx, &booking)?;
    tx.commit()?;

    Ok(booking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::opening_hours::parse_time;
    use crate::models::WeeklyHours;

    fn setup_db() -> Connection {
        let conn = db::init_db(":memory:").unwrap();
        queries::upsert_service(&conn, &service()).unwrap();
        // 2025-06-16 is a Monday
        queries::upsert_weekly_hours(
            &conn,
            &WeeklyHours {
                weekday: 1,
                open_time: parse_time("09:00").unwrap(),
                close_time: parse_time("17:00").unwrap(),
                closed: false,
            },
        )
        .unwrap();
        conn
    }

    fn service() -> Service {
        Service {
            id: "svc-1".to_string(),
            category: "Nails".to_string(),
            name: "Manicure".to_string(),
            description: None,
            duration_min: 60,
            buffer_min: 0,
            price: 40.0,
            promo_price: None,
            active: true,
            sort_order: Some(1),
        }
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn request(start: &str) -> BookingRequest {
        BookingRequest {
            starts_at: dt(start),
            client_name: Some("Alice".to_string()),
            client_phone: Some("+32470000000".to_string()),
            notes: None,
        }
    }

    fn now() -> NaiveDateTime {
        dt("2025-06-10 12:00")
    }

    #[test]
    fn test_book_valid_slot() {
        let mut conn = setup_db();
        let booking = book_slot(&mut conn, &service(), request("2025-06-16 10:00"), 30, now()).unwrap();
        assert_eq!(booking.ends_at, dt("2025-06-16 11:00"));
        assert_eq!(booking.status, BookingStatus::Confirmed);

        let stored = queries::get_booking_by_id(&conn, &booking.id).unwrap().unwrap();
        assert_eq!(stored.starts_at, dt("2025-06-16 10:00"));
    }

    #[test]
    fn test_outside_opening_hours() {
        let mut conn = setup_db();
        // 16:30 + 60min = 17:30, past closing
        let result = book_slot(&mut conn, &service(), request("2025-06-16 16:30"), 30, now());
        assert!(matches!(
            result,
            Err(AppError::Scheduling(SchedulingError::OutsideOpeningHours { .. }))
        ));
    }

    #[test]
    fn test_closed_day() {
        let mut conn = setup_db();
        // Tuesday has no default hours
        let result = book_slot(&mut conn, &service(), request("2025-06-17 10:00"), 30, now());
        assert!(matches!(result, Err(AppError::Scheduling(SchedulingError::Closed))));
    }

    #[test]
    fn test_conflict_with_existing_booking() {
        let mut conn = setup_db();
        book_slot(&mut conn, &service(), request("2025-06-16 10:00"), 30, now()).unwrap();

        // 10:30 overlaps 10:00-11:00
        let result = book_slot(&mut conn, &service(), request("2025-06-16 10:30"), 30, now());
        assert!(matches!(result, Err(AppError::Scheduling(SchedulingError::Conflict))));
    }

    #[test]
    fn test_same_slot_cannot_be_booked_twice() {
        let mut conn = setup_db();
        book_slot(&mut conn, &service(), request("2025-06-16 10:00"), 30, now()).unwrap();
        let result = book_slot(&mut conn, &service(), request("2025-06-16 10:00"), 30, now());
        assert!(matches!(result, Err(AppError::Scheduling(SchedulingError::Conflict))));
    }

    #[test]
    fn test_no_conflict_adjacent_booking() {
        let mut conn = setup_db();
        book_slot(&mut conn, &service(), request("2025-06-16 10:00"), 30, now()).unwrap();

        // 11:00 starts exactly when previous ends
        let result = book_slot(&mut conn, &service(), request("2025-06-16 11:00"), 30, now());
        assert!(result.is_ok());
    }

    #[test]
    fn test_past_slot_rejected() {
        let mut conn = setup_db();
        let result = book_slot(
            &mut conn,
            &service(),
            request("2025-06-16 10:00"),
            30,
            dt("2025-06-16 10:05"),
        );
        assert!(matches!(result, Err(AppError::Scheduling(SchedulingError::InThePast))));
    }

    #[test]
    fn test_off_grid_start_rejected() {
        let mut conn = setup_db();
        let result = book_slot(&mut conn, &service(), request("2025-06-16 10:10"), 30, now());
        assert!(matches!(
            result,
            Err(AppError::Scheduling(SchedulingError::NotOnSchedule))
        ));
    }

    #[test]
    fn test_inactive_service_rejected() {
        let mut conn = setup_db();
        let mut svc = service();
        svc.active = false;
        let result = book_slot(&mut conn, &svc, request("2025-06-16 10:00"), 30, now());
        assert!(matches!(
            result,
            Err(AppError::Scheduling(SchedulingError::ServiceUnavailable))
        ));
    }

    #[test]
    fn test_error_messages_are_readable() {
        let err = SchedulingError::OutsideOpeningHours {
            hours: "09:00-17:00".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "That time is outside our opening hours. That day we're open 09:00-17:00."
        );
    }

    #[test]
    fn test_booking_running_past_last_calendar_day_rejected() {
        let snapshot = ScheduleSnapshot {
            weekly: (0..7)
                .map(|weekday| WeeklyHours {
                    weekday,
                    open_time: parse_time("09:00").unwrap(),
                    close_time: parse_time("23:59").unwrap(),
                    closed: false,
                })
                .collect(),
            ..ScheduleSnapshot::default()
        };
        let starts_at = chrono::NaiveDate::MAX.and_time(parse_time("23:30").unwrap());
        let result = validate_booking_time(&snapshot, &service(), starts_at, 30, now());
        assert!(matches!(
            result,
            Err(SchedulingError::OutsideOpeningHours { .. })
        ));
    }

    #[test]
    fn test_book_slot_on_last_calendar_day_errors_without_panicking() {
        let mut conn = setup_db();
        let mut req = request("2025-06-16 10:00");
        req.starts_at = chrono::NaiveDate::MAX.and_time(parse_time("10:00").unwrap());
        let result = book_slot(&mut conn, &service(), req, 30, now());
        assert!(matches!(result, Err(AppError::Internal(_))));

        // the connection is still usable afterwards
        assert!(book_slot(&mut conn, &service(), request("2025-06-16 10:00"), 30, now()).is_ok());
    }
}
