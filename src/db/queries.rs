use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::opening_hours::{format_time, parse_time};
use crate::models::{
    Booking, BookingSource, BookingStatus, DateOverride, Service, WeeklyHours,
};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

// ── Services ──

const SERVICE_COLUMNS: &str = "id, category, name, description, duration_min, buffer_min, \
     price, promo_price, active, sort_order";

pub fn list_active_services(conn: &Connection) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services WHERE active = 1 \
         ORDER BY sort_order IS NOT NULL, sort_order ASC, name ASC"
    ))?;

    let rows = stmt.query_map([], parse_service_row)?;

    let mut services = vec![];
    for row in rows {
        services.push(row?);
    }
    Ok(services)
}

pub fn get_service(conn: &Connection, id: &str) -> anyhow::Result<Option<Service>> {
    let service = conn
        .query_row(
            &format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1"),
            params![id],
            parse_service_row,
        )
        .optional()?;
    Ok(service)
}

pub fn get_active_service(conn: &Connection, id: &str) -> anyhow::Result<Option<Service>> {
    Ok(get_service(conn, id)?.filter(|s| s.active))
}

/// First active service by display order, NULL sort orders first.
pub fn first_active_service(conn: &Connection) -> anyhow::Result<Option<Service>> {
    Ok(list_active_services(conn)?.into_iter().next())
}

pub fn upsert_service(conn: &Connection, service: &Service) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO services (id, category, name, description, duration_min, buffer_min, price, promo_price, active, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(id) DO UPDATE SET
           category = excluded.category,
           name = excluded.name,
           description = excluded.description,
           duration_min = excluded.duration_min,
           buffer_min = excluded.buffer_min,
           price = excluded.price,
           promo_price = excluded.promo_price,
           active = excluded.active,
           sort_order = excluded.sort_order,
           updated_at = datetime('now')",
        params![
            service.id,
            service.category,
            service.name,
            service.description,
            service.duration_min,
            service.buffer_min,
            service.price,
            service.promo_price,
            service.active as i32,
            service.sort_order,
        ],
    )?;
    Ok(())
}

fn parse_service_row(row: &rusqlite::Row) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        category: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        duration_min: row.get(4)?,
        buffer_min: row.get(5)?,
        price: row.get(6)?,
        promo_price: row.get(7)?,
        active: row.get::<_, i32>(8)? != 0,
        sort_order: row.get(9)?,
    })
}

// ── Opening Hours ──

pub fn list_weekly_hours(conn: &Connection) -> anyhow::Result<Vec<WeeklyHours>> {
    let mut stmt = conn.prepare(
        "SELECT weekday, open_time, close_time, closed FROM opening_hours_default ORDER BY weekday ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        let weekday: u8 = row.get(0)?;
        let open_time: String = row.get(1)?;
        let close_time: String = row.get(2)?;
        let closed: bool = row.get::<_, i32>(3)? != 0;
        Ok((weekday, open_time, close_time, closed))
    })?;

    let mut hours = vec![];
    for row in rows {
        let (weekday, open_time, close_time, closed) = row?;
        hours.push(WeeklyHours {
            weekday,
            open_time: parse_time(&open_time)?,
            close_time: parse_time(&close_time)?,
            closed,
        });
    }
    Ok(hours)
}

pub fn upsert_weekly_hours(conn: &Connection, hours: &WeeklyHours) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO opening_hours_default (weekday, open_time, close_time, closed)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(weekday) DO UPDATE SET
           open_time = excluded.open_time,
           close_time = excluded.close_time,
           closed = excluded.closed",
        params![
            hours.weekday,
            format_time(&hours.open_time),
            format_time(&hours.close_time),
            hours.closed as i32,
        ],
    )?;
    Ok(())
}

pub fn list_overrides(conn: &Connection) -> anyhow::Result<Vec<DateOverride>> {
    query_overrides(
        conn,
        "SELECT date, open_time, close_time, closed, note FROM opening_hours_overrides ORDER BY date ASC",
        &[],
    )
}

pub fn get_overrides_between(
    conn: &Connection,
    from: NaiveDate,
    to: NaiveDate,
) -> anyhow::Result<Vec<DateOverride>> {
    let from = from.format(DATE_FORMAT).to_string();
    let to = to.format(DATE_FORMAT).to_string();
    query_overrides(
        conn,
        "SELECT date, open_time, close_time, closed, note FROM opening_hours_overrides \
         WHERE date >= ?1 AND date <= ?2 ORDER BY date ASC",
        &[&from, &to],
    )
}

pub fn upsert_override(conn: &Connection, ov: &DateOverride) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO opening_hours_overrides (date, open_time, close_time, closed, note)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(date) DO UPDATE SET
           open_time = excluded.open_time,
           close_time = excluded.close_time,
           closed = excluded.closed,
           note = excluded.note",
        params![
            ov.date.format(DATE_FORMAT).to_string(),
            ov.open_time.as_ref().map(format_time),
            ov.close_time.as_ref().map(format_time),
            ov.closed as i32,
            ov.note,
        ],
    )?;
    Ok(())
}

pub fn delete_override(conn: &Connection, date: NaiveDate) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM opening_hours_overrides WHERE date = ?1",
        params![date.format(DATE_FORMAT).to_string()],
    )?;
    Ok(count > 0)
}

fn query_overrides(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> anyhow::Result<Vec<DateOverride>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| {
        let date: String = row.get(0)?;
        let open_time: Option<String> = row.get(1)?;
        let close_time: Option<String> = row.get(2)?;
        let closed: bool = row.get::<_, i32>(3)? != 0;
        let note: Option<String> = row.get(4)?;
        Ok((date, open_time, close_time, closed, note))
    })?;

    let mut overrides = vec![];
    for row in rows {
        let (date, open_time, close_time, closed, note) = row?;
        overrides.push(DateOverride {
            date: NaiveDate::parse_from_str(&date, DATE_FORMAT)
                .with_context(|| format!("invalid override date: {date}"))?,
            open_time: open_time.as_deref().map(parse_time).transpose()?,
            close_time: close_time.as_deref().map(parse_time).transpose()?,
            closed,
            note,
        });
    }
    Ok(overrides)
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, service_id, client_name, client_phone, starts_at, ends_at, \
     status, notes, source, created_at, updated_at";

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, service_id, client_name, client_phone, starts_at, ends_at, status, notes, source, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            booking.id,
            booking.service_id,
            booking.client_name,
            booking.client_phone,
            booking.starts_at.format(TIMESTAMP_FORMAT).to_string(),
            booking.ends_at.format(TIMESTAMP_FORMAT).to_string(),
            booking.status.as_str(),
            booking.notes,
            booking.source.as_str(),
            booking.created_at.format(TIMESTAMP_FORMAT).to_string(),
            booking.updated_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn
        .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
            params![id],
            |row| Ok(parse_booking_row(row)),
        )
        .optional()?;

    result.transpose()
}

/// Confirmed bookings whose `[starts_at, ends_at)` overlaps `[from, to)`.
pub fn get_confirmed_bookings_overlapping(
    conn: &Connection,
    from: &NaiveDateTime,
    to: &NaiveDateTime,
) -> anyhow::Result<Vec<Booking>> {
    let from_str = from.format(TIMESTAMP_FORMAT).to_string();
    let to_str = to.format(TIMESTAMP_FORMAT).to_string();

    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings \
         WHERE status = 'confirmed' AND starts_at < ?2 AND ends_at > ?1 \
         ORDER BY starts_at ASC"
    ))?;

    let rows = stmt.query_map(params![from_str, to_str], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_all_bookings(
    conn: &Connection,
    status_filter: Option<BookingStatus>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = ?1 ORDER BY starts_at ASC LIMIT ?2"
            ),
            vec![
                Box::new(status.as_str()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            format!("SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY starts_at ASC LIMIT ?1"),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
    now: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now.format(TIMESTAMP_FORMAT).to_string(), id],
    )?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: String = row.get(0)?;
    let service_id: String = row.get(1)?;
    let client_name: Option<String> = row.get(2)?;
    let client_phone: Option<String> = row.get(3)?;
    let starts_at_str: String = row.get(4)?;
    let ends_at_str: String = row.get(5)?;
    let status_str: String = row.get(6)?;
    let notes: Option<String> = row.get(7)?;
    let source_str: String = row.get(8)?;
    let created_at_str: String = row.get(9)?;
    let updated_at_str: String = row.get(10)?;

    let timestamp = |s: &str| {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
            .with_context(|| format!("invalid timestamp on booking {id}: {s}"))
    };

    Ok(Booking {
        starts_at: timestamp(&starts_at_str)?,
        ends_at: timestamp(&ends_at_str)?,
        created_at: timestamp(&created_at_str)?,
        updated_at: timestamp(&updated_at_str)?,
        status: BookingStatus::parse(&status_str).unwrap_or(BookingStatus::Pending),
        source: BookingSource::parse(&source_str),
        id,
        service_id,
        client_name,
        client_phone,
        notes,
    })
}
