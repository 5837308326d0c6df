//! One-time appointment reminders at 60 and 30 minutes out.
//!
//! A reminder fires when the scan lands inside its one-minute window
//! (`(59, 60]` or `(29, 30]` minutes before the appointment). With a 60 s
//! scan period each window is hit by exactly one scan; the `(id, bucket)`
//! guard keeps a re-entered window from firing twice.

use std::collections::HashSet;

use chrono::NaiveDateTime;

use crate::models::appointment::Appointment;
use crate::models::doctor::with_title;
use crate::notifications::Notification;

pub const REMINDER_TITLE: &str = "Appointment Reminder";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReminderBucket {
    SixtyMinutes,
    ThirtyMinutes,
}

impl ReminderBucket {
    pub const ALL: [ReminderBucket; 2] = [ReminderBucket::SixtyMinutes, ReminderBucket::ThirtyMinutes];

    pub fn minutes(self) -> f64 {
        match self {
            ReminderBucket::SixtyMinutes => 60.0,
            ReminderBucket::ThirtyMinutes => 30.0,
        }
    }

    /// Half-open window `(minutes - 1, minutes]`.
    pub fn contains(self, minutes_until: f64) -> bool {
        minutes_until > self.minutes() - 1.0 && minutes_until <= self.minutes()
    }

    fn phrase(self) -> &'static str {
        match self {
            ReminderBucket::SixtyMinutes => "1 hour",
            ReminderBucket::ThirtyMinutes => "30 minutes",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DueReminder {
    pub appointment_id: u64,
    pub bucket: ReminderBucket,
    pub doctor_name: String,
}

impl DueReminder {
    pub fn message(&self) -> String {
        format!(
            "Your appointment with {} is in {}.",
            with_title(&self.doctor_name),
            self.bucket.phrase()
        )
    }

    pub fn to_notification(&self) -> Notification {
        Notification::info(REMINDER_TITLE, &self.message())
    }
}

/// Fractional minutes from `now` until `at`; negative once it has passed.
pub fn minutes_until(at: NaiveDateTime, now: NaiveDateTime) -> f64 {
    (at - now).num_milliseconds() as f64 / 60_000.0
}

#[derive(Debug, Default)]
pub struct ReminderScheduler {
    fired: HashSet<(u64, ReminderBucket)>,
}

impl ReminderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_fired(&self, appointment_id: u64, bucket: ReminderBucket) -> bool {
        self.fired.contains(&(appointment_id, bucket))
    }

    /// Reminders due at `now`. Each `(appointment, bucket)` is returned at most once.
    pub fn check(&mut self, appointments: &[Appointment], now: NaiveDateTime) -> Vec<DueReminder> {
        let mut due = Vec::new();
        for appointment in appointments {
            let Some(at) = appointment.scheduled_at() else {
                tracing::debug!(
                    appointment_id = appointment.id,
                    date = %appointment.date,
                    time = %appointment.time,
                    "Skipping appointment with unparsable date/time"
                );
                continue;
            };
            let minutes = minutes_until(at, now);
            for bucket in ReminderBucket::ALL {
                if bucket.contains(minutes) && self.fired.insert((appointment.id, bucket)) {
                    due.push(DueReminder {
                        appointment_id: appointment.id,
                        bucket,
                        doctor_name: appointment.doctor_name.clone(),
                    });
                }
            }
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn appointment(id: u64, date: &str, time: &str) -> Appointment {
        Appointment {
            id,
            doctor_id: 1,
            doctor_name: "Emily Carter".into(),
            date: date.into(),
            time: time.into(),
            patient_name: "John Doe".into(),
            issue: "Checkup".into(),
        }
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn sixty_minute_reminder_fires_once() {
        let mut scheduler = ReminderScheduler::new();
        let book = vec![appointment(1, "2025-01-01", "10:00")];

        let due = scheduler.check(&book, at(9, 0, 30));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].bucket, ReminderBucket::SixtyMinutes);
        assert_eq!(
            due[0].message(),
            "Your appointment with Dr. Emily Carter is in 1 hour."
        );

        assert!(scheduler.check(&book, at(9, 1, 30)).is_empty());
    }

    #[test]
    fn re_entered_window_does_not_refire() {
        let mut scheduler = ReminderScheduler::new();
        let book = vec![appointment(1, "2025-01-01", "10:00")];
        assert_eq!(scheduler.check(&book, at(9, 0, 10)).len(), 1);
        assert!(scheduler.check(&book, at(9, 0, 50)).is_empty());
        assert!(scheduler.has_fired(1, ReminderBucket::SixtyMinutes));
    }

    #[test]
    fn thirty_minute_reminder_has_its_own_guard() {
        let mut scheduler = ReminderScheduler::new();
        let book = vec![appointment(7, "2025-01-01", "10:00")];
        scheduler.check(&book, at(9, 0, 0));

        let due = scheduler.check(&book, at(9, 30, 0));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].bucket, ReminderBucket::ThirtyMinutes);
        assert_eq!(
            due[0].to_notification().description,
            "Your appointment with Dr. Emily Carter is in 30 minutes."
        );
        assert!(scheduler.check(&book, at(9, 30, 40)).is_empty());
    }

    #[test]
    fn window_bounds_are_half_open() {
        assert!(ReminderBucket::SixtyMinutes.contains(60.0));
        assert!(!ReminderBucket::SixtyMinutes.contains(59.0));
        assert!(!ReminderBucket::SixtyMinutes.contains(60.01));
        assert!(ReminderBucket::ThirtyMinutes.contains(29.5));
    }

    #[test]
    fn past_and_far_appointments_are_ignored() {
        let mut scheduler = ReminderScheduler::new();
        let book = vec![
            appointment(1, "2025-01-01", "08:00"),
            appointment(2, "2025-01-01", "15:00"),
        ];
        assert!(scheduler.check(&book, at(9, 0, 30)).is_empty());
    }

    #[test]
    fn malformed_records_are_skipped() {
        let mut scheduler = ReminderScheduler::new();
        let book = vec![
            appointment(1, "tomorrow", "10:00"),
            appointment(2, "2025-01-01", "10:00"),
        ];
        let due = scheduler.check(&book, at(9, 0, 30));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].appointment_id, 2);
    }

    #[test]
    fn minutes_until_is_fractional() {
        assert_eq!(minutes_until(at(10, 0, 0), at(9, 0, 30)), 59.5);
        assert!(minutes_until(at(9, 0, 0), at(9, 0, 30)) < 0.0);
    }
}
