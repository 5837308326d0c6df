use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// A booked appointment. Immutable once created.
///
/// `date` and `time` stay in their wire form (`YYYY-MM-DD`, `HH:MM`) so a
/// malformed record can still be listed; consumers parse on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: u64,
    pub doctor_id: u64,
    pub doctor_name: String,
    pub date: String,
    pub time: String,
    pub patient_name: String,
    pub issue: String,
}

impl Appointment {
    /// Combined local date+time, or `None` when either part is unparsable.
    pub fn scheduled_at(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT).ok()?;
        let time = NaiveTime::parse_from_str(self.time.trim(), TIME_FORMAT).ok()?;
        Some(date.and_time(time))
    }
}

/// Booking request, from the dashboard form or the `bookAppointment` tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRequest {
    pub doctor_id: u64,
    pub doctor_name: String,
    pub date: String,
    pub time: String,
    pub patient_name: String,
    pub issue: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appointment(date: &str, time: &str) -> Appointment {
        Appointment {
            id: 1,
            doctor_id: 1,
            doctor_name: "Dr. Emily Carter".into(),
            date: date.into(),
            time: time.into(),
            patient_name: "John Doe".into(),
            issue: "Palpitations".into(),
        }
    }

    #[test]
    fn parses_date_and_time() {
        let at = appointment("2025-01-01", "10:00").scheduled_at().unwrap();
        assert_eq!(at.to_string(), "2025-01-01 10:00:00");
    }

    #[test]
    fn malformed_parts_yield_none() {
        assert!(appointment("01/01/2025", "10:00").scheduled_at().is_none());
        assert!(appointment("2025-01-01", "10am").scheduled_at().is_none());
        assert!(appointment("2025-02-30", "10:00").scheduled_at().is_none());
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(appointment("2025-01-01", "10:00")).unwrap();
        assert_eq!(json["doctorName"], "Dr. Emily Carter");
        assert_eq!(json["patientName"], "John Doe");
    }
}
