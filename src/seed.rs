//! Demo data every fresh process starts with.

use chrono::{Duration, NaiveDate};
use rand::Rng;

use crate::models::appointment::DATE_FORMAT;
use crate::models::doctor::Doctor;
use crate::models::enums::DeviceStatus;
use crate::models::subject::{Device, EmergencyContact, HistoricalReading, Subject};
use crate::models::vital_sign::{VitalKind, VitalsState};

/// Days of history generated per subject.
pub const HISTORY_DAYS: i64 = 7;

/// Seven days of readings ending `today`, oldest first. `heart_offset` shifts
/// the heart rate band (65–75 bpm) for subjects with a higher resting rate.
pub fn generate_history<R: Rng>(rng: &mut R, today: NaiveDate, heart_offset: f64) -> Vec<HistoricalReading> {
    (0..HISTORY_DAYS)
        .rev()
        .map(|days_back| {
            let date = today - Duration::days(days_back);
            HistoricalReading {
                date: date.format(DATE_FORMAT).to_string(),
                heart_rate: (rng.gen_range(65.0..75.0_f64) + heart_offset).round(),
                oxygen_saturation: (rng.gen_range(97.0..99.0_f64) * 10.0).round() / 10.0,
                body_temperature: (rng.gen_range(36.5..37.0_f64) * 10.0).round() / 10.0,
            }
        })
        .collect()
}

fn devices() -> Vec<Device> {
    vec![
        Device {
            id: 1,
            name: "Smartwatch".into(),
            device_type: "watch".into(),
            battery_level: 85,
            status: DeviceStatus::Disconnected,
        },
        Device {
            id: 2,
            name: "Health Chain".into(),
            device_type: "chain".into(),
            battery_level: 70,
            status: DeviceStatus::Disconnected,
        },
    ]
}

pub fn subjects<R: Rng>(rng: &mut R, today: NaiveDate) -> Vec<Subject> {
    let baseline = VitalsState::baseline();
    vec![
        Subject {
            id: 1,
            name: "John Doe".into(),
            email: "john.doe@example.com".into(),
            avatar: "https://i.pravatar.cc/150?u=john".into(),
            device_code: None,
            is_monitored: true,
            points: 120,
            devices: devices(),
            vitals: baseline.clone(),
            historical_data: generate_history(rng, today, 0.0),
        },
        Subject {
            id: 2,
            name: "Jane Doe".into(),
            email: "jane.doe@example.com".into(),
            avatar: "https://i.pravatar.cc/150?u=jane".into(),
            device_code: Some("JANE-456".into()),
            is_monitored: true,
            points: 80,
            devices: devices(),
            vitals: baseline.clone().with_value(VitalKind::HeartRate, 78.0),
            historical_data: generate_history(rng, today, 5.0),
        },
        Subject {
            id: 3,
            name: "Junior Doe".into(),
            email: "junior.doe@example.com".into(),
            avatar: "https://i.pravatar.cc/150?u=junior".into(),
            device_code: Some("JUNIOR-123".into()),
            is_monitored: false,
            points: 40,
            devices: devices(),
            vitals: baseline
                .with_value(VitalKind::HeartRate, 85.0)
                .with_value(VitalKind::BodyTemperature, 37.1),
            historical_data: generate_history(rng, today, 15.0),
        },
    ]
}

pub fn doctors() -> Vec<Doctor> {
    vec![
        Doctor {
            id: 1,
            name: "Dr. Emily Carter".into(),
            degree: "MD, PhD".into(),
            experience: 15,
            is_verified: true,
            specialty: Some("Cardiology".into()),
            points: 250,
        },
        Doctor {
            id: 2,
            name: "Dr. Ben Hanson".into(),
            degree: "MBBS".into(),
            experience: 8,
            is_verified: true,
            specialty: Some("Dermatology".into()),
            points: 180,
        },
    ]
}

pub fn emergency_contacts() -> Vec<EmergencyContact> {
    vec![
        EmergencyContact {
            id: 1,
            name: "Dr. Evelyn Reed".into(),
            phone: "(555) 123-4567".into(),
        },
        EmergencyContact {
            id: 2,
            name: "Alex Miller".into(),
            phone: "(555) 987-6543".into(),
        },
    ]
}
