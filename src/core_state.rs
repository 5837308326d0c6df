//! Application state shared by the API server and the monitoring tasks.
//!
//! Every collection lives here, behind `std::sync` locks that are only held
//! for synchronous critical sections. Nothing awaits while holding a guard.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Local;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::MonitorConfig;
use crate::directory::{DirectoryError, DoctorDirectory};
use crate::household::{DeviceToggle, Household, HouseholdError};
use crate::location::{self, GeolocationProvider};
use crate::models::appointment::AppointmentRequest;
use crate::models::appointment::Appointment;
use crate::models::subject::{EmergencyContact, Subject};
use crate::models::vital_sign::VitalsError;
use crate::monitoring::emergency::EmergencyEpisode;
use crate::monitoring::reminder::ReminderScheduler;
use crate::monitoring::session::{MonitoringSession, VitalsSnapshot};
use crate::monitoring::simulator::VitalsSimulator;
use crate::monitoring::ward::{MonitoredPatient, WardMonitor};
use crate::notifications::{Notification, NotificationCenter, NotificationSink};
use crate::records::{BookingConfirmation, ClinicalRecords, RecordsError};
use crate::seed;

const VITALS_CHANNEL_CAPACITY: usize = 16;

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

/// Wrapped in `Arc` at startup and handed to the router and every task.
pub struct CoreState {
    pub config: MonitorConfig,
    household: RwLock<Household>,
    directory: RwLock<DoctorDirectory>,
    records: RwLock<ClinicalRecords>,
    contacts: RwLock<Vec<EmergencyContact>>,
    /// Monitoring context of the current subject. `None` while no device is connected.
    session: Mutex<Option<MonitoringSession>>,
    /// Countdown task of the active episode, keyed by episode id.
    countdown: Mutex<Option<(Uuid, JoinHandle<()>)>>,
    reminders: Mutex<ReminderScheduler>,
    /// Random walks of every subject flagged for monitoring. Locked after `household`.
    ward: Mutex<WardMonitor>,
    notifications: NotificationCenter,
    location: Box<dyn GeolocationProvider>,
    vitals_tx: broadcast::Sender<VitalsSnapshot>,
    /// Fixed simulator seed for reproducible sessions.
    simulator_seed: Option<u64>,
}

impl CoreState {
    /// State seeded with the demo household, doctors and contacts.
    pub fn new(config: MonitorConfig) -> Result<Self, CoreError> {
        let mut rng = rand::thread_rng();
        let subjects = seed::subjects(&mut rng, Local::now().date_naive());
        let location = location::provider_for(config.fixed_location);
        Self::with_parts(
            config,
            subjects,
            seed::doctors(),
            seed::emergency_contacts(),
            location,
        )
    }

    pub fn with_parts(
        config: MonitorConfig,
        subjects: Vec<Subject>,
        doctors: Vec<crate::models::doctor::Doctor>,
        contacts: Vec<EmergencyContact>,
        location: Box<dyn GeolocationProvider>,
    ) -> Result<Self, CoreError> {
        let (vitals_tx, _) = broadcast::channel(VITALS_CHANNEL_CAPACITY);
        let household = Household::new(subjects)?;
        let ward = WardMonitor::new(config.drift_bias, None);
        Ok(Self {
            config,
            household: RwLock::new(household),
            directory: RwLock::new(DoctorDirectory::new(doctors)),
            records: RwLock::new(ClinicalRecords::new()),
            contacts: RwLock::new(contacts),
            session: Mutex::new(None),
            countdown: Mutex::new(None),
            reminders: Mutex::new(ReminderScheduler::new()),
            ward: Mutex::new(ward),
            notifications: NotificationCenter::new(),
            location,
            vitals_tx,
            simulator_seed: None,
        })
    }

    pub fn with_simulator_seed(mut self, seed: u64) -> Self {
        self.simulator_seed = Some(seed);
        self.ward = Mutex::new(WardMonitor::new(self.config.drift_bias, Some(seed)));
        self
    }

    // ── Lock access ─────────────────────────────────────────

    pub fn read_household(&self) -> Result<RwLockReadGuard<'_, Household>, CoreError> {
        self.household.read().map_err(|_| CoreError::LockPoisoned)
    }

    pub fn write_household(&self) -> Result<RwLockWriteGuard<'_, Household>, CoreError> {
        self.household.write().map_err(|_| CoreError::LockPoisoned)
    }

    pub fn read_directory(&self) -> Result<RwLockReadGuard<'_, DoctorDirectory>, CoreError> {
        self.directory.read().map_err(|_| CoreError::LockPoisoned)
    }

    pub fn write_directory(&self) -> Result<RwLockWriteGuard<'_, DoctorDirectory>, CoreError> {
        self.directory.write().map_err(|_| CoreError::LockPoisoned)
    }

    pub fn read_records(&self) -> Result<RwLockReadGuard<'_, ClinicalRecords>, CoreError> {
        self.records.read().map_err(|_| CoreError::LockPoisoned)
    }

    pub fn write_records(&self) -> Result<RwLockWriteGuard<'_, ClinicalRecords>, CoreError> {
        self.records.write().map_err(|_| CoreError::LockPoisoned)
    }

    pub fn reminders(&self) -> Result<MutexGuard<'_, ReminderScheduler>, CoreError> {
        self.reminders.lock().map_err(|_| CoreError::LockPoisoned)
    }

    pub fn emergency_contacts(&self) -> Result<Vec<EmergencyContact>, CoreError> {
        Ok(self
            .contacts
            .read()
            .map_err(|_| CoreError::LockPoisoned)?
            .clone())
    }

    pub fn location(&self) -> &dyn GeolocationProvider {
        self.location.as_ref()
    }

    // ── Notifications and live updates ──────────────────────

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn notify(&self, notification: Notification) {
        self.notifications.notify(notification);
    }

    pub fn subscribe_vitals(&self) -> broadcast::Receiver<VitalsSnapshot> {
        self.vitals_tx.subscribe()
    }

    pub fn publish_vitals(&self, snapshot: VitalsSnapshot) {
        let _ = self.vitals_tx.send(snapshot);
    }

    // ── Monitoring session ──────────────────────────────────

    /// Run `f` against the live session inside one critical section.
    pub fn with_session<R>(
        &self,
        f: impl FnOnce(&mut MonitoringSession) -> R,
    ) -> Result<R, CoreError> {
        let mut guard = self.session.lock().map_err(|_| CoreError::LockPoisoned)?;
        let session = guard.as_mut().ok_or(CoreError::NotMonitoring)?;
        Ok(f(session))
    }

    pub fn is_monitoring(&self) -> bool {
        self.session
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    pub fn snapshot(&self) -> Result<VitalsSnapshot, CoreError> {
        self.with_session(|session| session.snapshot())
    }

    /// Current episode; inactive when nothing is being monitored.
    pub fn emergency_episode(&self) -> Result<EmergencyEpisode, CoreError> {
        match self.with_session(|session| session.episode()) {
            Err(CoreError::NotMonitoring) => Ok(EmergencyEpisode::inactive()),
            other => other,
        }
    }

    fn start_session(&self, subject: &Subject) -> Result<(), CoreError> {
        let mut guard = self.session.lock().map_err(|_| CoreError::LockPoisoned)?;
        if guard.as_ref().map(|s| s.subject_id()) == Some(subject.id) {
            return Ok(());
        }
        let session = match self.simulator_seed {
            Some(seed) => MonitoringSession::with_simulator(
                subject,
                &self.config,
                VitalsSimulator::seeded(seed, self.config.drift_bias),
            )?,
            None => MonitoringSession::start(subject, &self.config)?,
        };
        *guard = Some(session);
        Ok(())
    }

    /// Drop the monitoring session together with any running countdown.
    pub fn end_session(&self) -> Result<(), CoreError> {
        let ended = self
            .session
            .lock()
            .map_err(|_| CoreError::LockPoisoned)?
            .take();
        self.abort_countdown();
        if let Some(session) = ended {
            tracing::info!(subject = session.subject_id(), "Monitoring session ended");
        }
        Ok(())
    }

    // ── Countdown task slot ─────────────────────────────────

    /// Spawn the countdown of `episode_id` and register it while holding the
    /// slot, so the task cannot release its entry before it exists.
    pub fn install_countdown<F>(&self, episode_id: Uuid, spawn: F)
    where
        F: FnOnce() -> JoinHandle<()>,
    {
        match self.countdown.lock() {
            Ok(mut slot) => {
                if let Some((previous_id, previous)) = slot.replace((episode_id, spawn())) {
                    previous.abort();
                    tracing::debug!(episode = %previous_id, "Superseded countdown aborted");
                }
            }
            Err(_) => tracing::error!(episode = %episode_id, "Countdown slot lock poisoned"),
        }
    }

    /// Forget the countdown of `episode_id` without aborting it (called by the task itself).
    pub fn release_countdown(&self, episode_id: Uuid) {
        if let Ok(mut slot) = self.countdown.lock() {
            if slot.as_ref().map(|(id, _)| *id) == Some(episode_id) {
                slot.take();
            }
        }
    }

    /// Abort whatever countdown is running. Used when the session goes away.
    pub fn abort_countdown(&self) {
        if let Ok(mut slot) = self.countdown.lock() {
            if let Some((id, handle)) = slot.take() {
                handle.abort();
                tracing::debug!(episode = %id, "Countdown aborted");
            }
        }
    }

    /// Abort the countdown only if it still belongs to `episode_id`.
    pub fn abort_countdown_for(&self, episode_id: Uuid) {
        if let Ok(mut slot) = self.countdown.lock() {
            if slot.as_ref().map(|(id, _)| *id) == Some(episode_id) {
                if let Some((_, handle)) = slot.take() {
                    handle.abort();
                    tracing::debug!(episode = %episode_id, "Countdown aborted");
                }
            }
        }
    }

    pub fn countdown_episode(&self) -> Option<Uuid> {
        self.countdown
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(|(id, _)| *id))
    }

    // ── Household operations that touch the session ─────────

    /// Switch the current subject. The previous subject's session is dropped.
    pub fn select_subject(&self, id: u64) -> Result<Subject, CoreError> {
        let subject = self.write_household()?.select(id)?.clone();
        self.end_session()?;
        tracing::info!(subject = id, "Current subject selected");
        Ok(subject)
    }

    /// Flip a device of the current subject; the session follows connectivity.
    pub fn toggle_device(&self, device_id: u64) -> Result<DeviceToggle, CoreError> {
        let (toggle, subject) = {
            let mut household = self.write_household()?;
            let toggle = household.toggle_device(device_id)?;
            let subject = household.current()?.clone();
            (toggle, subject)
        };
        tracing::info!(
            subject = toggle.subject_id,
            device = device_id,
            status = %toggle.device.status,
            "Device toggled"
        );

        if toggle.any_connected {
            self.start_session(&subject)?;
        } else {
            self.end_session()?;
        }
        Ok(toggle)
    }

    // ── Monitored patients board ────────────────────────────

    pub fn toggle_monitoring(&self, id: u64) -> Result<bool, CoreError> {
        let monitored = self.write_household()?.toggle_monitoring(id)?;
        tracing::info!(subject = id, monitored, "Patient monitoring toggled");
        Ok(monitored)
    }

    /// Advance every monitored patient one step; returns the ones that just turned critical.
    pub fn ward_tick(&self) -> Result<Vec<u64>, CoreError> {
        let household = self.read_household()?;
        let mut ward = self.ward.lock().map_err(|_| CoreError::LockPoisoned)?;
        ward.sync(household.users());
        Ok(ward.tick())
    }

    pub fn monitored_patients(&self) -> Result<Vec<MonitoredPatient>, CoreError> {
        let household = self.read_household()?;
        let mut ward = self.ward.lock().map_err(|_| CoreError::LockPoisoned)?;
        ward.sync(household.users());
        Ok(ward.patients(household.users()))
    }

    // ── Records ─────────────────────────────────────────────

    /// Appointments booked with the signed-in doctor.
    pub fn current_doctor_appointments(&self) -> Result<Vec<Appointment>, CoreError> {
        let doctor_id = self
            .read_directory()?
            .current()
            .map(|doctor| doctor.id)
            .ok_or(DirectoryError::NoCurrentDoctor)?;
        Ok(self.read_records()?.appointments_for(doctor_id))
    }

    pub fn book_appointment(
        &self,
        req: AppointmentRequest,
    ) -> Result<BookingConfirmation, CoreError> {
        self.read_directory()?.get(req.doctor_id)?;
        Ok(self.write_records()?.book_appointment(req)?)
    }
}

impl Drop for CoreState {
    fn drop(&mut self) {
        self.abort_countdown();
    }
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("No device connected for the current subject")]
    NotMonitoring,
    #[error("No active emergency alert")]
    NoActiveEpisode,
    #[error(transparent)]
    Household(#[from] HouseholdError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Records(#[from] RecordsError),
    #[error(transparent)]
    Vitals(#[from] VitalsError),
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::location::{Coordinates, FixedLocation};
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Deterministic state for tests across the crate.
    pub(crate) fn test_state(config: MonitorConfig) -> CoreState {
        let mut rng = StdRng::seed_from_u64(5);
        CoreState::with_parts(
            config,
            seed::subjects(&mut rng, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
            seed::doctors(),
            seed::emergency_contacts(),
            Box::new(FixedLocation(Coordinates {
                latitude: 40.7128,
                longitude: -74.006,
            })),
        )
        .unwrap()
        .with_simulator_seed(17)
    }

    #[test]
    fn no_session_until_a_device_connects() {
        let state = test_state(MonitorConfig::default());
        assert!(!state.is_monitoring());
        assert!(matches!(state.snapshot(), Err(CoreError::NotMonitoring)));
        assert!(!state.emergency_episode().unwrap().active);

        state.toggle_device(1).unwrap();
        assert!(state.is_monitoring());
        assert_eq!(state.snapshot().unwrap().subject_id, 1);
    }

    #[test]
    fn session_survives_second_device_and_ends_with_last() {
        let state = test_state(MonitorConfig::default());
        state.toggle_device(1).unwrap();
        state.with_session(|s| s.raise_manual_alert()).unwrap();
        state.toggle_device(2).unwrap();
        assert!(state.emergency_episode().unwrap().active);

        state.toggle_device(1).unwrap();
        assert!(state.is_monitoring());
        state.toggle_device(2).unwrap();
        assert!(!state.is_monitoring());
    }

    #[tokio::test]
    async fn subject_switch_drops_session_and_countdown() {
        let state = test_state(MonitorConfig::default());
        state.toggle_device(1).unwrap();
        let id = state
            .with_session(|s| s.raise_manual_alert())
            .unwrap()
            .unwrap();
        state.install_countdown(id, || tokio::spawn(std::future::pending::<()>()));
        assert_eq!(state.countdown_episode(), Some(id));

        let jane = state.select_subject(2).unwrap();
        assert_eq!(jane.id, 2);
        assert!(!state.is_monitoring());
        assert_eq!(state.countdown_episode(), None);
        assert!(!state.emergency_episode().unwrap().active);
    }

    #[test]
    fn schedule_needs_a_signed_in_doctor() {
        let mut rng = StdRng::seed_from_u64(5);
        let state = CoreState::with_parts(
            MonitorConfig::default(),
            seed::subjects(&mut rng, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
            Vec::new(),
            seed::emergency_contacts(),
            Box::new(FixedLocation(Coordinates {
                latitude: 40.7128,
                longitude: -74.006,
            })),
        )
        .unwrap();
        assert!(matches!(
            state.current_doctor_appointments(),
            Err(CoreError::Directory(DirectoryError::NoCurrentDoctor))
        ));
    }

    #[test]
    fn invalid_seed_vitals_fail_construction() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut subjects = seed::subjects(&mut rng, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        subjects[0].vitals.hydration_level.thresholds.danger = 60.0;
        let result = CoreState::with_parts(
            MonitorConfig::default(),
            subjects,
            seed::doctors(),
            seed::emergency_contacts(),
            Box::new(FixedLocation(Coordinates {
                latitude: 40.7128,
                longitude: -74.006,
            })),
        );
        assert!(matches!(
            result,
            Err(CoreError::Household(HouseholdError::InvalidVitals { subject: 1, .. }))
        ));
    }

    #[test]
    fn board_tracks_monitoring_flag() {
        let state = test_state(MonitorConfig::default());
        assert_eq!(state.monitored_patients().unwrap().len(), 2);
        assert!(!state.toggle_monitoring(1).unwrap());
        let board = state.monitored_patients().unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].subject_id, 2);
        assert!(state.ward_tick().unwrap().is_empty());
    }

    #[tokio::test]
    async fn release_only_clears_matching_episode() {
        let state = test_state(MonitorConfig::default());
        let id = Uuid::new_v4();
        state.install_countdown(id, || tokio::spawn(async {}));
        state.release_countdown(Uuid::new_v4());
        assert_eq!(state.countdown_episode(), Some(id));
        state.release_countdown(id);
        assert_eq!(state.countdown_episode(), None);
    }

    #[tokio::test]
    async fn targeted_abort_spares_a_newer_countdown() {
        let state = test_state(MonitorConfig::default());
        let newer = Uuid::new_v4();
        state.install_countdown(newer, || tokio::spawn(std::future::pending::<()>()));
        state.abort_countdown_for(Uuid::new_v4());
        assert_eq!(state.countdown_episode(), Some(newer));
        state.abort_countdown_for(newer);
        assert_eq!(state.countdown_episode(), None);
    }

    #[test]
    fn booking_requires_known_doctor() {
        let state = test_state(MonitorConfig::default());
        let req = AppointmentRequest {
            doctor_id: 99,
            doctor_name: "Nobody".into(),
            date: "2025-01-01".into(),
            time: "10:00".into(),
            patient_name: "John Doe".into(),
            issue: "Checkup".into(),
        };
        assert!(matches!(
            state.book_appointment(req),
            Err(CoreError::Directory(DirectoryError::NotFound(99)))
        ));
        assert!(state.read_records().unwrap().appointments().is_empty());
    }
}
