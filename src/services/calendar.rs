use crate::models::{Booking, BookingStatus};

pub fn generate_ics(booking: &Booking, service_name: &str) -> String {
    let dtstart = booking.starts_at.format("%Y%m%dT%H%M%S").to_string();
    let dtend = booking.ends_at.format("%Y%m%dT%H%M%S").to_string();
    let dtstamp = booking.created_at.format("%Y%m%dT%H%M%S").to_string();
    let uid = format!("{}@slotbook", booking.id);

    let summary = format!("Appointment: {service_name}");
    let description = booking
        .notes
        .as_deref()
        .unwrap_or("No additional notes");
    let status = if booking.status == BookingStatus::Cancelled {
        "CANCELLED"
    } else {
        "CONFIRMED"
    };

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Slotbook//Booking//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         STATUS:{status}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingSource;
    use chrono::NaiveDateTime;

    fn booking(notes: Option<&str>, status: BookingStatus) -> Booking {
        Booking {
            id: "test-123".to_string(),
            service_id: "svc-1".to_string(),
            client_name: Some("Alice".to_string()),
            client_phone: None,
            starts_at: NaiveDateTime::parse_from_str("2025-03-15 14:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
            ends_at: NaiveDateTime::parse_from_str("2025-03-15 15:15:00", "%Y-%m-%d %H:%M:%S").unwrap(),
            status,
            notes: notes.map(str::to_string),
            source: BookingSource::Web,
            created_at: NaiveDateTime::parse_from_str("2025-03-10 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
            updated_at: NaiveDateTime::parse_from_str("2025-03-10 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
        }
    }

    #[test]
    fn test_generate_ics() {
        let ics = generate_ics(&booking(Some("Sensitive skin"), BookingStatus::Confirmed), "Facial");
        assert!(ics.contains("BEGIN:VCALENDAR"));
        assert!(ics.contains("BEGIN:VEVENT"));
        assert!(ics.contains("DTSTART:20250315T140000"));
        assert!(ics.contains("DTEND:20250315T151500"));
        assert!(ics.contains("SUMMARY:Appointment: Facial"));
        assert!(ics.contains("DESCRIPTION:Sensitive skin"));
        assert!(ics.contains("UID:test-123@slotbook"));
        assert!(ics.contains("STATUS:CONFIRMED"));
        assert!(ics.contains("END:VCALENDAR"));
    }

    #[test]
    fn test_generate_ics_cancelled_no_notes() {
        let ics = generate_ics(&booking(None, BookingStatus::Cancelled), "Facial");
        assert!(ics.contains("DESCRIPTION:No additional notes"));
        assert!(ics.contains("STATUS:CANCELLED"));
    }
}
