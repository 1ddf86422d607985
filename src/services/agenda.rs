use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::models::Booking;

#[derive(Debug, Clone, Serialize)]
pub struct BookingGroup {
    pub date: NaiveDate,
    pub items: Vec<Booking>,
}

/// Bookings for the admin list, split around `now` and grouped per calendar day.
#[derive(Debug, Clone, Serialize)]
pub struct Agenda {
    pub upcoming: Vec<BookingGroup>,
    pub past: Vec<BookingGroup>,
}

pub fn build_agenda(bookings: Vec<Booking>, now: NaiveDateTime) -> Agenda {
    let (upcoming, past): (Vec<_>, Vec<_>) =
        bookings.into_iter().partition(|b| b.starts_at >= now);

    Agenda {
        upcoming: group_by_date(upcoming),
        past: group_by_date(past),
    }
}

/// Groups in ascending date order; bookings keep their relative order within a day.
pub fn group_by_date(bookings: Vec<Booking>) -> Vec<BookingGroup> {
    let mut by_date: BTreeMap<NaiveDate, Vec<Booking>> = BTreeMap::new();
    for booking in bookings {
        by_date
            .entry(booking.starts_at.date())
            .or_default()
            .push(booking);
    }

    by_date
        .into_iter()
        .map(|(date, items)| BookingGroup { date, items })
        .collect()
}
