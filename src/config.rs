use std::env;
use std::str::FromStr;

use chrono::{FixedOffset, Offset, Utc};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub slot_step_minutes: u32,
    pub search_days: u32,
    pub default_slot_limit: usize,
    pub month_horizon_days: u32,
    pub utc_offset_minutes: i32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            database_url: "slotbook.db".to_string(),
            slot_step_minutes: 30,
            search_days: 7,
            default_slot_limit: 6,
            month_horizon_days: 90,
            utc_offset_minutes: 0,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: parse_var("PORT").unwrap_or(defaults.port),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            slot_step_minutes: parse_var("SLOT_STEP_MINUTES")
                .filter(|step| *step > 0)
                .unwrap_or(defaults.slot_step_minutes),
            search_days: parse_var("SEARCH_DAYS")
                .filter(|days| *days > 0)
                .unwrap_or(defaults.search_days),
            default_slot_limit: parse_var("DEFAULT_SLOT_LIMIT")
                .unwrap_or(defaults.default_slot_limit),
            month_horizon_days: parse_var("MONTH_HORIZON_DAYS")
                .unwrap_or(defaults.month_horizon_days),
            utc_offset_minutes: parse_var("BUSINESS_UTC_OFFSET_MINUTES")
                .filter(|mins: &i32| mins.abs() < 24 * 60)
                .unwrap_or(defaults.utc_offset_minutes),
        }
    }

    /// Offset of local business time from UTC.
    pub fn business_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }
}

fn parse_var<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_offset_from_minutes() {
        let config = AppConfig {
            utc_offset_minutes: 120,
            ..AppConfig::default()
        };
        assert_eq!(config.business_offset().to_string(), "+02:00");
    }

    #[test]
    fn test_default_policy_values() {
        let config = AppConfig::default();
        assert_eq!(config.slot_step_minutes, 30);
        assert_eq!(config.search_days, 7);
        assert_eq!(config.default_slot_limit, 6);
    }

    #[test]
    fn test_zero_search_days_falls_back_to_default() {
        std::env::set_var("SEARCH_DAYS", "0");
        let config = AppConfig::from_env();
        std::env::remove_var("SEARCH_DAYS");
        assert_eq!(config.search_days, 7);
    }
}
