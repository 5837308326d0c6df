use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::monitoring::evaluator::evaluate;

/// One of the four vitals tracked for every monitored subject.
///
/// Declaration order is the fixed scan order used when picking the
/// triggering vital of an emergency episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VitalKind {
    HeartRate,
    OxygenSaturation,
    BodyTemperature,
    HydrationLevel,
}

impl VitalKind {
    pub const ALL: [VitalKind; 4] = [
        VitalKind::HeartRate,
        VitalKind::OxygenSaturation,
        VitalKind::BodyTemperature,
        VitalKind::HydrationLevel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VitalKind::HeartRate => "heartRate",
            VitalKind::OxygenSaturation => "oxygenSaturation",
            VitalKind::BodyTemperature => "bodyTemperature",
            VitalKind::HydrationLevel => "hydrationLevel",
        }
    }

    /// Human-readable label shown on the dashboard.
    pub fn display_name(self) -> &'static str {
        match self {
            VitalKind::HeartRate => "Heart Rate",
            VitalKind::OxygenSaturation => "Oxygen Saturation",
            VitalKind::BodyTemperature => "Body Temperature",
            VitalKind::HydrationLevel => "Hydration",
        }
    }

    pub fn default_unit(self) -> &'static str {
        match self {
            VitalKind::HeartRate => "bpm",
            VitalKind::OxygenSaturation => "%",
            VitalKind::BodyTemperature => "°C",
            VitalKind::HydrationLevel => "%",
        }
    }

    /// Physiologically plausible range the simulator never leaves.
    pub fn clamp_range(self) -> ClampRange {
        match self {
            VitalKind::HeartRate => ClampRange::new(50.0, 130.0),
            VitalKind::OxygenSaturation => ClampRange::new(90.0, 100.0),
            VitalKind::BodyTemperature => ClampRange::new(36.0, 39.5),
            VitalKind::HydrationLevel => ClampRange::new(70.0, 100.0),
        }
    }

    pub fn precision(self) -> Precision {
        match self {
            VitalKind::HeartRate => Precision::Integer,
            _ => Precision::Tenths,
        }
    }

    /// Scale of one random-walk step.
    pub fn step_scale(self) -> f64 {
        match self {
            VitalKind::HeartRate => 2.0,
            VitalKind::BodyTemperature => 0.2,
            VitalKind::OxygenSaturation | VitalKind::HydrationLevel => 0.5,
        }
    }
}

impl fmt::Display for VitalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which way a vital moves when it becomes dangerous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub alert: f64,
    pub danger: f64,
}

/// Severity derived from a vital's current value. Never stored.
///
/// Variants are ordered by severity so `Normal < Alert < Danger`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Normal,
    Alert,
    Danger,
}

impl AlertStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertStatus::Normal => "normal",
            AlertStatus::Alert => "alert",
            AlertStatus::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClampRange {
    pub min: f64,
    pub max: f64,
}

impl ClampRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Integer,
    Tenths,
}

impl Precision {
    pub fn round(self, value: f64) -> f64 {
        match self {
            Precision::Integer => value.round(),
            Precision::Tenths => (value * 10.0).round() / 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vital {
    pub value: f64,
    pub unit: String,
    pub thresholds: Thresholds,
    pub direction: Direction,
}

impl Vital {
    pub fn new(value: f64, unit: &str, alert: f64, danger: f64, direction: Direction) -> Self {
        Self {
            value,
            unit: unit.to_string(),
            thresholds: Thresholds { alert, danger },
            direction,
        }
    }

    pub fn status(&self) -> AlertStatus {
        evaluate(self.value, self.thresholds, self.direction)
    }

    /// e.g. `Heart Rate is 125bpm`, used as the triggering description.
    pub fn describe(&self, kind: VitalKind) -> String {
        format!("{} is {}{}", kind.display_name(), self.value, self.unit)
    }

    /// Alert threshold strictly less extreme than danger in the breach direction.
    pub fn thresholds_ordered(&self) -> bool {
        match self.direction {
            Direction::Up => self.thresholds.alert < self.thresholds.danger,
            Direction::Down => self.thresholds.alert > self.thresholds.danger,
        }
    }
}

/// Fixed-key vitals of one monitored subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalsState {
    pub heart_rate: Vital,
    pub oxygen_saturation: Vital,
    pub body_temperature: Vital,
    pub hydration_level: Vital,
}

impl VitalsState {
    /// Resting baseline every seeded subject starts from.
    pub fn baseline() -> Self {
        Self {
            heart_rate: Vital::new(72.0, "bpm", 100.0, 120.0, Direction::Up),
            oxygen_saturation: Vital::new(98.0, "%", 94.0, 90.0, Direction::Down),
            body_temperature: Vital::new(36.8, "°C", 38.0, 39.0, Direction::Up),
            hydration_level: Vital::new(95.0, "%", 85.0, 75.0, Direction::Down),
        }
    }

    pub fn get(&self, kind: VitalKind) -> &Vital {
        match kind {
            VitalKind::HeartRate => &self.heart_rate,
            VitalKind::OxygenSaturation => &self.oxygen_saturation,
            VitalKind::BodyTemperature => &self.body_temperature,
            VitalKind::HydrationLevel => &self.hydration_level,
        }
    }

    pub fn get_mut(&mut self, kind: VitalKind) -> &mut Vital {
        match kind {
            VitalKind::HeartRate => &mut self.heart_rate,
            VitalKind::OxygenSaturation => &mut self.oxygen_saturation,
            VitalKind::BodyTemperature => &mut self.body_temperature,
            VitalKind::HydrationLevel => &mut self.hydration_level,
        }
    }

    pub fn with_value(mut self, kind: VitalKind, value: f64) -> Self {
        self.get_mut(kind).value = value;
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (VitalKind, &Vital)> + '_ {
        VitalKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }

    pub fn statuses(&self) -> BTreeMap<VitalKind, AlertStatus> {
        self.iter().map(|(kind, vital)| (kind, vital.status())).collect()
    }

    /// `Heart Rate: 72 bpm, Oxygen Saturation: 98 %, ...` for every tracked vital.
    pub fn summary(&self) -> String {
        self.iter()
            .map(|(kind, vital)| format!("{}: {} {}", kind.display_name(), vital.value, vital.unit))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Check threshold ordering and that every danger threshold lies inside
    /// the vital's clamp range, so the simulator can actually reach it.
    pub fn validate(&self) -> Result<(), VitalsError> {
        for (kind, vital) in self.iter() {
            if !vital.thresholds_ordered() {
                return Err(VitalsError::ThresholdsUnordered(kind));
            }
            if !kind.clamp_range().contains(vital.thresholds.danger) {
                return Err(VitalsError::DangerUnreachable(kind));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VitalsError {
    #[error("{0}: alert threshold is not below danger")]
    ThresholdsUnordered(VitalKind),
    #[error("{0}: danger threshold outside clamp range")]
    DangerUnreachable(VitalKind),
}
