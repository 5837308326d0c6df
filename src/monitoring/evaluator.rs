//! Threshold evaluation: value + thresholds + breach direction → status.

use crate::models::vital_sign::{AlertStatus, Direction, Thresholds};

/// Classify a reading. Pure and total.
pub fn evaluate(value: f64, thresholds: Thresholds, direction: Direction) -> AlertStatus {
    match direction {
        Direction::Up => {
            if value >= thresholds.danger {
                AlertStatus::Danger
            } else if value >= thresholds.alert {
                AlertStatus::Alert
            } else {
                AlertStatus::Normal
            }
        }
        Direction::Down => {
            if value <= thresholds.danger {
                AlertStatus::Danger
            } else if value <= thresholds.alert {
                AlertStatus::Alert
            } else {
                AlertStatus::Normal
            }
        }
    }
}
