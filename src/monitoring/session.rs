use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use super::emergency::{CountdownStep, EmergencyAlertMachine, EmergencyEpisode, ResolvedEpisode};
use super::simulator::{TickReport, VitalsSimulator};
use crate::config::MonitorConfig;
use crate::models::subject::Subject;
use crate::models::vital_sign::{AlertStatus, VitalKind, VitalsError, VitalsState};

/// Live vitals view pushed to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalsSnapshot {
    pub subject_id: u64,
    pub vitals: VitalsState,
    pub statuses: BTreeMap<VitalKind, AlertStatus>,
    pub emergency: EmergencyEpisode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionTick {
    pub report: TickReport,
    /// Set when this tick opened an emergency episode.
    pub opened_episode: Option<Uuid>,
}

/// Monitoring context for one subject: its vitals, simulator and alert machine.
///
/// Dropped when the subject changes or its last device disconnects, taking
/// any active episode with it.
pub struct MonitoringSession {
    subject_id: u64,
    vitals: VitalsState,
    simulator: VitalsSimulator,
    machine: EmergencyAlertMachine,
}

impl MonitoringSession {
    pub fn start(subject: &Subject, config: &MonitorConfig) -> Result<Self, VitalsError> {
        Self::with_simulator(
            subject,
            config,
            VitalsSimulator::new(config.drift_bias),
        )
    }

    /// Fails when the subject's thresholds could never trigger an alert.
    pub fn with_simulator(
        subject: &Subject,
        config: &MonitorConfig,
        simulator: VitalsSimulator,
    ) -> Result<Self, VitalsError> {
        subject.vitals.validate()?;
        tracing::info!(subject = subject.id, name = %subject.name, "Monitoring session started");
        Ok(Self {
            subject_id: subject.id,
            vitals: subject.vitals.clone(),
            simulator,
            machine: EmergencyAlertMachine::new(config.countdown_secs),
        })
    }

    pub fn subject_id(&self) -> u64 {
        self.subject_id
    }

    pub fn vitals(&self) -> &VitalsState {
        &self.vitals
    }

    pub fn episode(&self) -> EmergencyEpisode {
        self.machine.episode()
    }

    pub fn active_episode_id(&self) -> Option<Uuid> {
        self.machine.active_episode_id()
    }

    /// Advance the vitals; a danger reading opens an episode when none is active.
    pub fn tick(&mut self) -> SessionTick {
        let report = self.simulator.tick(&mut self.vitals);
        tracing::trace!(subject = self.subject_id, summary = %self.vitals.summary(), "Vitals tick");

        let opened_episode = report.first_danger.as_ref().and_then(|danger| {
            let opened = self.machine.on_danger_detected(danger.description.clone());
            if opened.is_some() {
                tracing::info!(
                    subject = self.subject_id,
                    vital = %danger.kind,
                    description = %danger.description,
                    "Emergency episode opened"
                );
            }
            opened
        });

        SessionTick {
            report,
            opened_episode,
        }
    }

    pub fn raise_manual_alert(&mut self) -> Option<Uuid> {
        let opened = self.machine.raise_manual();
        if opened.is_some() {
            tracing::info!(subject = self.subject_id, "Manual emergency raised");
        }
        opened
    }

    pub fn countdown_tick(&mut self, episode_id: Uuid) -> CountdownStep {
        self.machine.countdown_tick(episode_id)
    }

    pub fn cancel(&mut self) -> Option<ResolvedEpisode> {
        self.machine.cancel()
    }

    pub fn confirm_send(&mut self) -> Option<ResolvedEpisode> {
        self.machine.confirm_send()
    }

    pub fn snapshot(&self) -> VitalsSnapshot {
        VitalsSnapshot {
            subject_id: self.subject_id,
            vitals: self.vitals.clone(),
            statuses: self.vitals.statuses(),
            emergency: self.machine.episode(),
        }
    }
}
