use chrono::Duration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    #[serde(default)]
    pub category: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub duration_min: i32,
    #[serde(default)]
    pub buffer_min: i32,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub promo_price: Option<f64>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub sort_order: Option<i32>,
}

fn default_active() -> bool {
    true
}

impl Service {
    /// Treatment time plus buffer. `None` when the treatment length is not positive,
    /// which makes the service unbookable. A negative buffer counts as no buffer.
    pub fn effective_duration(&self) -> Option<Duration> {
        if self.duration_min <= 0 {
            return None;
        }
        Some(Duration::minutes(
            self.duration_min as i64 + self.buffer_min.max(0) as i64,
        ))
    }

    pub fn is_bookable(&self) -> bool {
        self.active && self.effective_duration().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(duration_min: i32, buffer_min: i32) -> Service {
        Service {
            id: "svc".to_string(),
            category: "Hair".to_string(),
            name: "Cut".to_string(),
            description: None,
            duration_min,
            buffer_min,
            price: 35.0,
            promo_price: None,
            active: true,
            sort_order: None,
        }
    }

    #[test]
    fn test_effective_duration_adds_buffer() {
        assert_eq!(
            service(60, 15).effective_duration(),
            Some(Duration::minutes(75))
        );
    }

    #[test]
    fn test_zero_duration_is_unbookable() {
        let svc = service(0, 15);
        assert_eq!(svc.effective_duration(), None);
        assert!(!svc.is_bookable());
    }

    #[test]
    fn test_negative_buffer_ignored() {
        assert_eq!(
            service(30, -10).effective_duration(),
            Some(Duration::minutes(30))
        );
    }

    #[test]
    fn test_inactive_service_not_bookable() {
        let mut svc = service(30, 0);
        svc.active = false;
        assert!(!svc.is_bookable());
    }

    #[test]
    fn test_deserialize_defaults() {
        let svc: Service =
            serde_json::from_str(r#"{"id":"a","name":"Nails","durationMin":45}"#).unwrap();
        assert!(svc.active);
        assert_eq!(svc.buffer_min, 0);
        assert_eq!(svc.sort_order, None);
    }
}
