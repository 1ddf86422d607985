//! Slot computation: which start times can a service be booked at on a date.
//!
//! Everything here works on plain data. Reads happen once through a
//! [`ScheduleSource`] into a [`ScheduleSnapshot`]; the resolver then derives slots
//! without touching the store again. The result is advisory: it is only valid at read
//! time and the booking insert has to check it again.

use anyhow::Context;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::models::opening_hours::weekday_index;
use crate::models::{
    Booking, DateOverride, DaySlots, DayWindow, OpeningWindow, Service, WeeklyHours,
};

/// Read access to the reference data and bookings the resolver needs.
pub trait ScheduleSource {
    fn weekly_defaults(&self) -> anyhow::Result<Vec<WeeklyHours>>;

    /// Overrides for dates in `[from, to]`.
    fn overrides_between(&self, from: NaiveDate, to: NaiveDate)
        -> anyhow::Result<Vec<DateOverride>>;

    /// Confirmed bookings whose interval overlaps `[from, to)`.
    fn confirmed_bookings_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> anyhow::Result<Vec<Booking>>;
}

/// Reference data and bookings for a range of days, read in one go.
#[derive(Debug, Clone, Default)]
pub struct ScheduleSnapshot {
    pub weekly: Vec<WeeklyHours>,
    pub overrides: Vec<DateOverride>,
    pub bookings: Vec<Booking>,
}

impl ScheduleSnapshot {
    pub fn load<S: ScheduleSource + ?Sized>(
        source: &S,
        first_day: NaiveDate,
        last_day: NaiveDate,
    ) -> anyhow::Result<Self> {
        let from = first_day.and_time(NaiveTime::MIN);
        let to = last_day
            .succ_opt()
            .with_context(|| format!("no calendar day after {last_day}"))?
            .and_time(NaiveTime::MIN);

        Ok(Self {
            weekly: source.weekly_defaults()?,
            overrides: source.overrides_between(first_day, last_day)?,
            bookings: source.confirmed_bookings_between(from, to)?,
        })
    }

    pub fn window_for(&self, date: NaiveDate) -> DayWindow {
        resolve_day_window(date, &self.weekly, &self.overrides)
    }
}

impl ScheduleSource for ScheduleSnapshot {
    fn weekly_defaults(&self) -> anyhow::Result<Vec<WeeklyHours>> {
        Ok(self.weekly.clone())
    }

    fn overrides_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<DateOverride>> {
        Ok(self
            .overrides
            .iter()
            .filter(|o| o.date >= from && o.date <= to)
            .cloned()
            .collect())
    }

    fn confirmed_bookings_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> anyhow::Result<Vec<Booking>> {
        Ok(self
            .bookings
            .iter()
            .filter(|b| b.status.blocks_availability() && b.overlaps(from, to))
            .cloned()
            .collect())
    }
}

/// Effective opening window for `date`.
///
/// An override for the date replaces the weekly default entirely; fields are never
/// merged. An override is only open when it is not flagged closed and carries both
/// times. Without an override the weekday default applies, and a missing default is a
/// closed day.
pub fn resolve_day_window(
    date: NaiveDate,
    weekly_defaults: &[WeeklyHours],
    overrides: &[DateOverride],
) -> DayWindow {
    if let Some(ov) = overrides.iter().find(|o| o.date == date) {
        return match (ov.closed, ov.open_time, ov.close_time) {
            (false, Some(open), Some(close)) => DayWindow::Open(OpeningWindow { open, close }),
            _ => DayWindow::Closed,
        };
    }

    let weekday = weekday_index(date);
    match weekly_defaults.iter().find(|h| h.weekday == weekday) {
        Some(hours) if !hours.closed => DayWindow::Open(OpeningWindow {
            open: hours.open_time,
            close: hours.close_time,
        }),
        _ => DayWindow::Closed,
    }
}

/// Bookable start times on `date`, in ascending order.
///
/// Candidates start at opening time and advance by `step_minutes`. A candidate spans
/// the service's effective duration and must end no later than closing time. It is
/// dropped when it overlaps a confirmed booking (half-open intervals, touching ends are
/// fine) or when it does not start strictly after `now`, so a date before today
/// yields nothing.
///
/// The returned iterator is lazy and owns no state beyond its cursor; clone it to
/// restart from the first slot.
pub fn generate_slots<'a>(
    date: NaiveDate,
    window: DayWindow,
    service: &Service,
    bookings: &'a [Booking],
    step_minutes: u32,
    now: NaiveDateTime,
) -> Slots<'a> {
    let (Some(window), Some(duration)) = (window.opening(), service.effective_duration()) else {
        return Slots::empty(bookings, now);
    };
    if step_minutes == 0 {
        return Slots::empty(bookings, now);
    }

    Slots {
        cursor: date.and_time(window.open),
        close: date.and_time(window.close),
        duration,
        step: Duration::minutes(step_minutes as i64),
        bookings,
        now,
        done: false,
    }
}

#[derive(Debug, Clone)]
pub struct Slots<'a> {
    cursor: NaiveDateTime,
    close: NaiveDateTime,
    duration: Duration,
    step: Duration,
    bookings: &'a [Booking],
    now: NaiveDateTime,
    done: bool,
}

impl<'a> Slots<'a> {
    fn empty(bookings: &'a [Booking], now: NaiveDateTime) -> Self {
        Self {
            cursor: now,
            close: now,
            duration: Duration::zero(),
            step: Duration::zero(),
            bookings,
            now,
            done: true,
        }
    }

    fn conflicts(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.bookings
            .iter()
            .any(|b| b.status.blocks_availability() && b.overlaps(start, end))
    }
}

impl Iterator for Slots<'_> {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<NaiveDateTime> {
        while !self.done {
            let start = self.cursor;
            let Some(end) = start
                .checked_add_signed(self.duration)
                .filter(|end| *end <= self.close)
            else {
                self.done = true;
                break;
            };
            match start.checked_add_signed(self.step) {
                Some(next) => self.cursor = next,
                None => self.done = true,
            }

            if start <= self.now || self.conflicts(start, end) {
                continue;
            }
            return Some(start);
        }
        None
    }
}

/// Computes slots for a service over a [`ScheduleSnapshot`].
pub struct AvailabilityResolver<'a> {
    snapshot: &'a ScheduleSnapshot,
    step_minutes: u32,
    now: NaiveDateTime,
}

impl<'a> AvailabilityResolver<'a> {
    pub fn new(snapshot: &'a ScheduleSnapshot, step_minutes: u32, now: NaiveDateTime) -> Self {
        Self {
            snapshot,
            step_minutes,
            now,
        }
    }

    pub fn slots(&self, service: &Service, date: NaiveDate) -> Slots<'a> {
        generate_slots(
            date,
            self.snapshot.window_for(date),
            service,
            &self.snapshot.bookings,
            self.step_minutes,
            self.now,
        )
    }

    pub fn slots_on(&self, service: &Service, date: NaiveDate) -> DaySlots {
        DaySlots {
            date,
            slots: self.slots(service, date).collect(),
        }
    }

    pub fn has_availability(&self, service: &Service, date: NaiveDate) -> bool {
        self.slots(service, date).next().is_some()
    }

    /// First day in `[start_date, start_date + search_days)` with at least one slot.
    ///
    /// Days are scanned in ascending order. `limit` truncates the returned slots;
    /// `None` returns the whole day.
    pub fn find_next_available(
        &self,
        service: &Service,
        start_date: NaiveDate,
        search_days: u32,
        limit: Option<usize>,
    ) -> Option<DaySlots> {
        (0..search_days as i64)
            .map_while(|offset| start_date.checked_add_signed(Duration::days(offset)))
            .find_map(|date| {
                let mut slots = self.slots(service, date).peekable();
                slots.peek()?;
                let slots = match limit {
                    Some(n) => slots.take(n).collect(),
                    None => slots.collect(),
                };
                Some(DaySlots { date, slots })
            })
    }
}
