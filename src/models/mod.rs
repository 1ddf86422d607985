pub mod availability;
pub mod booking;
pub mod opening_hours;
pub mod service;

pub use availability::{AvailabilityResponse, DaySlots, MonthOverview};
pub use booking::{Booking, BookingSource, BookingStatus};
pub use opening_hours::{DateOverride, DayWindow, OpeningWindow, WeeklyHours};
pub use service::Service;
