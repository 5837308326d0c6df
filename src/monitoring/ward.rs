//! Doctor-side view of every subject flagged for monitoring.
//!
//! Each monitored subject gets its own random walk, independent of the
//! current subject's session, advanced on the same vitals tick. A patient
//! is critical while any vital sits at danger level.

use std::collections::BTreeMap;

use serde::Serialize;

use super::simulator::VitalsSimulator;
use crate::models::subject::Subject;
use crate::models::vital_sign::{AlertStatus, VitalKind, VitalsState};

/// One card of the monitored-patients board.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoredPatient {
    pub subject_id: u64,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub vitals: VitalsState,
    pub statuses: BTreeMap<VitalKind, AlertStatus>,
    pub critical: bool,
}

struct Bed {
    vitals: VitalsState,
    simulator: VitalsSimulator,
    critical: bool,
}

impl Bed {
    fn refresh_critical(&mut self) -> bool {
        let critical = self
            .vitals
            .statuses()
            .values()
            .any(|status| *status == AlertStatus::Danger);
        let became_critical = critical && !self.critical;
        self.critical = critical;
        became_critical
    }
}

pub struct WardMonitor {
    beds: BTreeMap<u64, Bed>,
    drift_bias: f64,
    seed: Option<u64>,
}

impl WardMonitor {
    /// `seed` makes every bed's walk reproducible (mixed with the subject id).
    pub fn new(drift_bias: f64, seed: Option<u64>) -> Self {
        Self {
            beds: BTreeMap::new(),
            drift_bias,
            seed,
        }
    }

    /// Admit newly monitored subjects from their stored vitals and
    /// discharge the ones no longer monitored.
    pub fn sync(&mut self, subjects: &[Subject]) {
        self.beds
            .retain(|id, _| subjects.iter().any(|s| s.id == *id && s.is_monitored));

        for subject in subjects.iter().filter(|s| s.is_monitored) {
            if self.beds.contains_key(&subject.id) {
                continue;
            }
            let simulator = match self.seed {
                Some(seed) => VitalsSimulator::seeded(seed ^ subject.id, self.drift_bias),
                None => VitalsSimulator::new(self.drift_bias),
            };
            let mut bed = Bed {
                vitals: subject.vitals.clone(),
                simulator,
                critical: false,
            };
            bed.refresh_critical();
            self.beds.insert(subject.id, bed);
            tracing::debug!(subject = subject.id, "Patient admitted to monitoring board");
        }
    }

    /// Advance every bed one step. Returns the subjects that just turned critical.
    pub fn tick(&mut self) -> Vec<u64> {
        let mut newly_critical = Vec::new();
        for (id, bed) in &mut self.beds {
            bed.simulator.tick(&mut bed.vitals);
            if bed.refresh_critical() {
                newly_critical.push(*id);
            }
        }
        newly_critical
    }

    pub fn len(&self) -> usize {
        self.beds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beds.is_empty()
    }

    /// Board cards in subject order; subjects without a bed are skipped.
    pub fn patients(&self, subjects: &[Subject]) -> Vec<MonitoredPatient> {
        self.beds
            .iter()
            .filter_map(|(id, bed)| {
                let subject = subjects.iter().find(|s| s.id == *id)?;
                Some(MonitoredPatient {
                    subject_id: subject.id,
                    name: subject.name.clone(),
                    email: subject.email.clone(),
                    avatar: subject.avatar.clone(),
                    vitals: bed.vitals.clone(),
                    statuses: bed.vitals.statuses(),
                    critical: bed.critical,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_DRIFT_BIAS;
    use crate::seed;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn subjects() -> Vec<Subject> {
        let mut rng = StdRng::seed_from_u64(8);
        seed::subjects(&mut rng, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
    }

    #[test]
    fn admits_only_monitored_subjects() {
        let subjects = subjects();
        let mut ward = WardMonitor::new(DEFAULT_DRIFT_BIAS, Some(4));
        ward.sync(&subjects);

        let ids: Vec<u64> = ward.patients(&subjects).iter().map(|p| p.subject_id).collect();
        assert_eq!(ids, vec![1, 2]);
        let jane = &ward.patients(&subjects)[1];
        assert_eq!(jane.name, "Jane Doe");
        assert_eq!(jane.vitals.heart_rate.value, 78.0);
        assert!(!jane.critical);
    }

    #[test]
    fn unmonitoring_discharges_and_remonitoring_restarts_from_stored_vitals() {
        let mut subjects = subjects();
        let mut ward = WardMonitor::new(DEFAULT_DRIFT_BIAS, Some(4));
        ward.sync(&subjects);
        for _ in 0..10 {
            ward.tick();
        }

        subjects[1].is_monitored = false;
        subjects[2].is_monitored = true;
        ward.sync(&subjects);
        let ids: Vec<u64> = ward.patients(&subjects).iter().map(|p| p.subject_id).collect();
        assert_eq!(ids, vec![1, 3]);

        subjects[1].is_monitored = true;
        ward.sync(&subjects);
        assert_eq!(ward.len(), 3);
        assert_eq!(ward.patients(&subjects)[1].vitals.heart_rate.value, 78.0);
    }

    #[test]
    fn danger_level_marks_patient_critical_once() {
        let mut subjects = subjects();
        subjects[0].vitals = subjects[0].vitals.clone().with_value(VitalKind::HeartRate, 130.0);
        let mut ward = WardMonitor::new(0.0, Some(4));
        ward.sync(&subjects);

        let board = ward.patients(&subjects);
        assert!(board[0].critical);
        assert_eq!(board[0].statuses[&VitalKind::HeartRate], AlertStatus::Danger);
        assert!(!ward.tick().contains(&1));
    }

    #[test]
    fn upward_drift_turns_patient_critical() {
        let subjects = subjects();
        let mut ward = WardMonitor::new(0.0, Some(4));
        ward.sync(&subjects);

        let mut turned = Vec::new();
        for _ in 0..100 {
            turned.extend(ward.tick());
        }
        assert!(turned.contains(&1));
        assert!(ward.patients(&subjects).iter().all(|p| p.critical));
    }

    #[test]
    fn empty_board_when_nobody_is_monitored() {
        let mut subjects = subjects();
        for subject in &mut subjects {
            subject.is_monitored = false;
        }
        let mut ward = WardMonitor::new(DEFAULT_DRIFT_BIAS, None);
        ward.sync(&subjects);
        assert!(ward.is_empty());
        assert!(ward.tick().is_empty());
    }
}
