//! Background tasks driving the monitoring core.
//!
//! - vitals loop: one simulator tick every `vitals_tick` (2 s), session and board
//! - countdown: one task per active episode, 1 s period
//! - reminder loop: one appointment scan every `reminder_interval` (60 s)
//!
//! Each step locks `CoreState` for a synchronous critical section and
//! releases it before any `.await`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use uuid::Uuid;

use super::emergency::{compose_alert, AlertDelivery, CountdownStep, EmergencyEpisode, ResolvedEpisode};
use crate::core_state::{CoreError, CoreState};
use crate::location::locate_with_timeout;
use crate::models::vital_sign::VitalsState;
use crate::notifications::Notification;

const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);

// ═══════════════════════════════════════════════════════════
// Vitals
// ═══════════════════════════════════════════════════════════

/// One simulator tick for the monitored-patients board and the current
/// subject's session. Returns the id of an episode opened by this tick.
pub fn vitals_tick(core: &Arc<CoreState>) -> Result<Option<Uuid>, CoreError> {
    for subject in core.ward_tick()? {
        tracing::warn!(subject, "Monitored patient reached a critical reading");
    }

    let (tick, snapshot) = match core.with_session(|s| {
        let tick = s.tick();
        (tick, s.snapshot())
    }) {
        Ok(result) => result,
        Err(CoreError::NotMonitoring) => return Ok(None),
        Err(e) => return Err(e),
    };

    for change in &tick.report.changes {
        tracing::debug!(
            vital = %change.kind,
            from = change.before.as_str(),
            to = change.after.as_str(),
            "Vital status changed"
        );
    }
    core.publish_vitals(snapshot);

    if let (Some(episode_id), Some(danger)) = (tick.opened_episode, tick.report.first_danger) {
        core.notify(Notification::destructive(
            "Critical Alert Detected!",
            &format!(
                "A critical vital sign has been detected ({}). An alert will be sent automatically.",
                danger.description
            ),
        ));
        spawn_countdown(core, episode_id);
    }
    Ok(tick.opened_episode)
}

// ═══════════════════════════════════════════════════════════
// Emergency countdown and delivery
// ═══════════════════════════════════════════════════════════

/// Start the 1 s countdown for `episode_id` and register it for abortion.
pub fn spawn_countdown(core: &Arc<CoreState>, episode_id: Uuid) {
    let task_core = Arc::clone(core);
    core.install_countdown(episode_id, move || {
        tokio::spawn(async move {
            run_countdown(task_core, episode_id).await;
        })
    });
    tracing::info!(episode = %episode_id, secs = core.config.countdown_secs, "Countdown started");
}

async fn run_countdown(core: Arc<CoreState>, episode_id: Uuid) {
    let mut ticker = interval_at(Instant::now() + COUNTDOWN_PERIOD, COUNTDOWN_PERIOD);
    loop {
        ticker.tick().await;
        let step = core.with_session(|s| {
            let step = s.countdown_tick(episode_id);
            (step, s.vitals().clone(), s.snapshot())
        });
        let (step, vitals, snapshot) = match step {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(episode = %episode_id, error = %e, "Countdown stopped");
                core.release_countdown(episode_id);
                return;
            }
        };

        match step {
            CountdownStep::Remaining(left) => {
                tracing::trace!(episode = %episode_id, remaining = left, "Countdown tick");
                core.publish_vitals(snapshot);
            }
            CountdownStep::Expired(resolved) => {
                core.release_countdown(episode_id);
                core.publish_vitals(snapshot);
                if let Err(e) = deliver_alert(&core, &resolved, &vitals).await {
                    tracing::error!(episode = %episode_id, error = %e, "Emergency alert delivery failed");
                }
                return;
            }
            CountdownStep::Stale => {
                core.release_countdown(episode_id);
                return;
            }
        }
    }
}

/// Look up the location (bounded by the configured timeout), compose the
/// alert and push the resulting notifications.
pub async fn deliver_alert(
    core: &CoreState,
    episode: &ResolvedEpisode,
    vitals: &VitalsState,
) -> Result<AlertDelivery, CoreError> {
    let location = locate_with_timeout(core.location(), core.config.location_timeout).await;
    if let Err(e) = &location {
        tracing::warn!(episode = %episode.episode_id, error = %e, "Location unavailable for emergency alert");
    }
    let contacts = core.emergency_contacts()?;

    let delivery = compose_alert(episode, vitals, &contacts, location, core.config.location_policy);
    match &delivery {
        AlertDelivery::Sent { .. } => {
            tracing::info!(episode = %episode.episode_id, contacts = contacts.len(), "Emergency alert sent")
        }
        AlertDelivery::Aborted(_) => {
            tracing::warn!(episode = %episode.episode_id, "Emergency alert aborted: location required")
        }
    }
    for notification in delivery.clone().notifications() {
        core.notify(notification);
    }
    Ok(delivery)
}

/// Open a manual episode. While one is already active the current episode is returned unchanged.
pub fn raise_manual_alert(core: &Arc<CoreState>) -> Result<EmergencyEpisode, CoreError> {
    let (opened, episode) = core.with_session(|s| (s.raise_manual_alert(), s.episode()))?;
    if let Some(episode_id) = opened {
        spawn_countdown(core, episode_id);
    }
    Ok(episode)
}

pub fn cancel_alert(core: &CoreState) -> Result<ResolvedEpisode, CoreError> {
    let (resolved, snapshot) = core.with_session(|s| (s.cancel(), s.snapshot()))?;
    let resolved = resolved.ok_or(CoreError::NoActiveEpisode)?;
    core.abort_countdown_for(resolved.episode_id);
    core.publish_vitals(snapshot);
    tracing::info!(episode = %resolved.episode_id, "Emergency alert cancelled");
    Ok(resolved)
}

/// Send the active episode's alert now instead of waiting for the countdown.
pub async fn confirm_alert(core: &CoreState) -> Result<AlertDelivery, CoreError> {
    let confirmed = core.with_session(|s| {
        s.confirm_send()
            .map(|resolved| (resolved, s.vitals().clone(), s.snapshot()))
    })?;
    let (resolved, vitals, snapshot) = confirmed.ok_or(CoreError::NoActiveEpisode)?;
    core.abort_countdown_for(resolved.episode_id);
    core.publish_vitals(snapshot);
    deliver_alert(core, &resolved, &vitals).await
}

// ═══════════════════════════════════════════════════════════
// Reminders
// ═══════════════════════════════════════════════════════════

/// Scan the appointment book at `now` and notify every due reminder.
pub fn reminder_tick(core: &CoreState, now: NaiveDateTime) -> Result<usize, CoreError> {
    let appointments = core.read_records()?.appointments().to_vec();
    let due = core.reminders()?.check(&appointments, now);
    for reminder in &due {
        tracing::info!(
            appointment = reminder.appointment_id,
            bucket = ?reminder.bucket,
            "Appointment reminder due"
        );
        core.notify(reminder.to_notification());
    }
    Ok(due.len())
}

// ═══════════════════════════════════════════════════════════
// Task handles
// ═══════════════════════════════════════════════════════════

fn spawn_periodic<F>(name: &'static str, period: Duration, mut step: F) -> JoinHandle<()>
where
    F: FnMut() + Send + 'static,
{
    tokio::spawn(async move {
        tracing::info!(task = name, period_secs = period.as_secs(), "Periodic task started");
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            step();
        }
    })
}

/// Handle for the vitals loop. Stops the loop and any countdown on shutdown or drop.
pub struct MonitorHandle {
    core: Arc<CoreState>,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    pub fn spawn(core: Arc<CoreState>) -> Self {
        let loop_core = Arc::clone(&core);
        let task = spawn_periodic("vitals", core.config.vitals_tick, move || {
            if let Err(e) = vitals_tick(&loop_core) {
                tracing::error!(error = %e, "Vitals tick failed");
            }
        });
        Self {
            core,
            task: Some(task),
        }
    }

    pub fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.core.abort_countdown();
            tracing::info!("Vitals monitor stopped");
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Handle for the appointment reminder scan.
pub struct ReminderHandle {
    task: Option<JoinHandle<()>>,
}

impl ReminderHandle {
    pub fn spawn(core: Arc<CoreState>) -> Self {
        let period = core.config.reminder_interval;
        let task = spawn_periodic("reminders", period, move || {
            if let Err(e) = reminder_tick(&core, Local::now().naive_local()) {
                tracing::error!(error = %e, "Reminder scan failed");
            }
        });
        Self { task: Some(task) }
    }

    pub fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::info!("Reminder scheduler stopped");
        }
    }
}

impl Drop for ReminderHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LocationPolicy, MonitorConfig};
    use crate::core_state::tests::test_state;
    use crate::location::{LocationError, PendingLocation, UnavailableLocation};
    use crate::models::appointment::AppointmentRequest;
    use crate::models::vital_sign::VitalKind;
    use crate::monitoring::emergency::Resolution;
    use crate::notifications::Severity;
    use crate::seed;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config(countdown_secs: u32) -> MonitorConfig {
        MonitorConfig {
            countdown_secs,
            ..MonitorConfig::default()
        }
    }

    fn monitoring(config: MonitorConfig) -> Arc<CoreState> {
        let core = Arc::new(test_state(config));
        core.toggle_device(1).unwrap();
        core
    }

    fn with_location(
        config: MonitorConfig,
        location: Box<dyn crate::location::GeolocationProvider>,
        heart_rate: Option<f64>,
    ) -> Arc<CoreState> {
        let mut rng = StdRng::seed_from_u64(5);
        let mut subjects = seed::subjects(&mut rng, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        if let Some(hr) = heart_rate {
            subjects[0].vitals = subjects[0].vitals.clone().with_value(VitalKind::HeartRate, hr);
        }
        let core = Arc::new(
            CoreState::with_parts(
                config,
                subjects,
                seed::doctors(),
                seed::emergency_contacts(),
                location,
            )
            .unwrap()
            .with_simulator_seed(17),
        );
        core.toggle_device(1).unwrap();
        core
    }

    fn titles(core: &CoreState) -> Vec<String> {
        core.notifications()
            .recent(50)
            .into_iter()
            .map(|n| n.title)
            .collect()
    }

    fn sent_count(core: &CoreState) -> usize {
        titles(core)
            .iter()
            .filter(|t| *t == "Emergency Alert Sent")
            .count()
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_expiry_sends_once() {
        let core = monitoring(config(3));
        let episode = raise_manual_alert(&core).unwrap();
        assert!(episode.active && episode.is_manual_trigger);
        assert_eq!(episode.remaining_seconds, 3);

        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(sent_count(&core), 1);
        let alert = &core.notifications().recent(1)[0];
        assert!(alert.description.starts_with("Alert sent to Dr. Evelyn Reed, Alex Miller"));
        assert!(alert.description.ends_with("at Lat: 40.7128, Lon: -74.0060"));
        assert!(!core.emergency_episode().unwrap().active);
        assert_eq!(core.countdown_episode(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_countdown() {
        let core = monitoring(config(5));
        raise_manual_alert(&core).unwrap();
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(core.emergency_episode().unwrap().remaining_seconds, 3);

        let resolved = cancel_alert(&core).unwrap();
        assert_eq!(resolved.resolution, Resolution::Cancelled);
        assert_eq!(core.countdown_episode(), None);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(sent_count(&core), 0);
        assert!(matches!(cancel_alert(&core), Err(CoreError::NoActiveEpisode)));
    }

    #[tokio::test(start_paused = true)]
    async fn confirm_sends_immediately_and_stops_countdown() {
        let core = monitoring(config(120));
        raise_manual_alert(&core).unwrap();
        let delivery = confirm_alert(&core).await.unwrap();
        assert!(matches!(delivery, AlertDelivery::Sent { location_warning: None, .. }));

        tokio::time::sleep(Duration::from_secs(200)).await;
        assert_eq!(sent_count(&core), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn episode_opened_between_resolve_and_abort_keeps_its_countdown() {
        let nyc = crate::location::FixedLocation(crate::location::Coordinates {
            latitude: 40.7128,
            longitude: -74.006,
        });
        let core = with_location(config(3), Box::new(nyc), Some(130.0));
        raise_manual_alert(&core).unwrap();
        let first = core
            .with_session(|s| s.confirm_send())
            .unwrap()
            .expect("manual episode active");

        // Vitals are still critical, so the next tick opens a new episode
        // before the confirm path gets to clean up its countdown.
        let second = vitals_tick(&core).unwrap().expect("new episode expected");
        assert_ne!(first.episode_id, second);
        core.abort_countdown_for(first.episode_id);
        assert_eq!(core.countdown_episode(), Some(second));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!core.emergency_episode().unwrap().active);
        assert_eq!(core.countdown_episode(), None);
        assert_eq!(sent_count(&core), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_for_ended_session_releases_its_slot() {
        let core = monitoring(config(120));
        core.end_session().unwrap();
        let orphan = Uuid::new_v4();
        spawn_countdown(&core, orphan);
        assert_eq!(core.countdown_episode(), Some(orphan));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(core.countdown_episode(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_countdown_releases_its_slot() {
        let core = monitoring(config(120));
        let stale = Uuid::new_v4();
        spawn_countdown(&core, stale);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(core.countdown_episode(), None);
        assert!(!core.emergency_episode().unwrap().active);
    }

    #[tokio::test]
    async fn manual_trigger_while_active_is_ignored() {
        let core = monitoring(config(120));
        let first = raise_manual_alert(&core).unwrap();
        let second = raise_manual_alert(&core).unwrap();
        assert_eq!(first.id, second.id);
        cancel_alert(&core).unwrap();
    }

    #[tokio::test]
    async fn operations_require_monitoring() {
        let core = Arc::new(test_state(config(120)));
        assert!(matches!(raise_manual_alert(&core), Err(CoreError::NotMonitoring)));
        assert!(matches!(confirm_alert(&core).await, Err(CoreError::NotMonitoring)));
        assert_eq!(vitals_tick(&core).unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn danger_tick_opens_episode_and_countdown() {
        let core = with_location(config(120), Box::new(PendingLocation), Some(130.0));
        let mut vitals_rx = core.subscribe_vitals();

        let opened = vitals_tick(&core).unwrap().expect("episode expected");
        assert_eq!(core.countdown_episode(), Some(opened));
        assert_eq!(titles(&core)[0], "Critical Alert Detected!");
        assert!(vitals_rx.recv().await.unwrap().emergency.active);

        assert_eq!(vitals_tick(&core).unwrap(), None);
        assert_eq!(core.countdown_episode(), Some(opened));
        cancel_alert(&core).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn required_location_aborts_send() {
        let core = with_location(
            MonitorConfig {
                location_policy: LocationPolicy::Required,
                ..config(120)
            },
            Box::new(UnavailableLocation(LocationError::PermissionDenied)),
            None,
        );
        raise_manual_alert(&core).unwrap();
        let delivery = confirm_alert(&core).await.unwrap();
        assert!(matches!(delivery, AlertDelivery::Aborted(_)));

        let latest = &core.notifications().recent(1)[0];
        assert_eq!(latest.title, "Error: Could not get location");
        assert_eq!(latest.severity, Severity::Destructive);
        assert!(!core.emergency_episode().unwrap().active);
        assert_eq!(sent_count(&core), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_location_times_out_and_sends_without_it() {
        let core = with_location(
            MonitorConfig {
                location_timeout: Duration::from_secs(2),
                ..config(120)
            },
            Box::new(PendingLocation),
            None,
        );
        raise_manual_alert(&core).unwrap();
        let delivery = confirm_alert(&core).await.unwrap();
        let AlertDelivery::Sent { alert, location_warning } = delivery else {
            panic!("expected a sent alert");
        };
        assert!(alert.description.ends_with("with no location data."));
        assert!(location_warning
            .unwrap()
            .description
            .contains("timed out"));
    }

    #[tokio::test]
    async fn reminder_tick_notifies_once() {
        let core = test_state(config(120));
        core.book_appointment(AppointmentRequest {
            doctor_id: 1,
            doctor_name: "Dr. Emily Carter".into(),
            date: "2025-01-01".into(),
            time: "10:00".into(),
            patient_name: "John Doe".into(),
            issue: "Follow-up".into(),
        })
        .unwrap();
        let now = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 30)
            .unwrap();

        assert_eq!(reminder_tick(&core, now).unwrap(), 1);
        assert_eq!(
            reminder_tick(&core, now + chrono::Duration::minutes(1)).unwrap(),
            0
        );
        let latest = &core.notifications().recent(1)[0];
        assert_eq!(latest.title, "Appointment Reminder");
        assert_eq!(
            latest.description,
            "Your appointment with Dr. Emily Carter is in 1 hour."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn monitor_handle_publishes_and_stops() {
        let core = monitoring(config(120));
        let mut rx = core.subscribe_vitals();
        let mut handle = MonitorHandle::spawn(Arc::clone(&core));

        let snapshot = rx.recv().await.unwrap();
        assert_eq!(snapshot.subject_id, 1);

        handle.shutdown();
        tokio::time::sleep(Duration::from_secs(10)).await;
        while rx.try_recv().is_ok() {}
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }
}
