//! Bounded random walk over a subject's vitals.
//!
//! Each tick, per vital: `value += (u - drift_bias) * step_scale` with
//! `u ∈ [0, 1)`, then clamp to the vital's physiological range, then round
//! to its precision. Every clamp bound is representable at that precision,
//! so rounding never leaves the range.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::vital_sign::{AlertStatus, VitalKind, VitalsState};

#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub kind: VitalKind,
    pub before: AlertStatus,
    pub after: AlertStatus,
}

/// First vital (in scan order) found in danger during a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct DangerReading {
    pub kind: VitalKind,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub statuses: BTreeMap<VitalKind, AlertStatus>,
    pub changes: Vec<StatusChange>,
    pub first_danger: Option<DangerReading>,
}

impl TickReport {
    pub fn danger_count(&self) -> usize {
        self.statuses
            .values()
            .filter(|s| **s == AlertStatus::Danger)
            .count()
    }
}

pub struct VitalsSimulator {
    rng: StdRng,
    drift_bias: f64,
}

impl VitalsSimulator {
    pub fn new(drift_bias: f64) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            drift_bias,
        }
    }

    /// Deterministic simulator for reproducible runs.
    pub fn seeded(seed: u64, drift_bias: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            drift_bias,
        }
    }

    pub fn next_value(&mut self, kind: VitalKind, current: f64) -> f64 {
        let u: f64 = self.rng.gen();
        let stepped = current + (u - self.drift_bias) * kind.step_scale();
        let clamped = kind.clamp_range().clamp(stepped);
        kind.precision().round(clamped)
    }

    /// Advance every vital one step and report the resulting statuses.
    pub fn tick(&mut self, vitals: &mut VitalsState) -> TickReport {
        let mut statuses = BTreeMap::new();
        let mut changes = Vec::new();
        let mut first_danger = None;

        for kind in VitalKind::ALL {
            let before = vitals.get(kind).status();
            let next = self.next_value(kind, vitals.get(kind).value);

            let vital = vitals.get_mut(kind);
            vital.value = next;
            let after = vital.status();

            if after != before {
                changes.push(StatusChange { kind, before, after });
            }
            if after == AlertStatus::Danger && first_danger.is_none() {
                first_danger = Some(DangerReading {
                    kind,
                    description: vital.describe(kind),
                });
            }
            statuses.insert(kind, after);
        }

        TickReport {
            statuses,
            changes,
            first_danger,
        }
    }
}
