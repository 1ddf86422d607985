use chrono::{FixedOffset, NaiveDateTime, Utc};

/// Source of the current local business time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.offset).naive_local()
    }
}

/// Always reports the same instant.
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_applies_offset() {
        let utc = SystemClock::new(FixedOffset::east_opt(0).unwrap()).now();
        let plus_two = SystemClock::new(FixedOffset::east_opt(2 * 3600).unwrap()).now();
        let diff = (plus_two - utc).num_minutes();
        assert!((119..=120).contains(&diff));
    }
}
