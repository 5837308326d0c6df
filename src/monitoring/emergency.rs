//! Emergency alert state machine and alert payload composition.
//!
//! ```text
//!            danger tick / manual trigger
//!   Idle ─────────────────────────────────▶ CountdownActive
//!    ▲                                          │  │  │
//!    │     remaining hits 0 / confirm ──────────┘  │  │
//!    │     cancel ─────────────────────────────────┘  │
//!    └────────── Resolved(sent | cancelled) ◀─────────┘
//! ```
//!
//! The machine holds no timers; the runtime drives `countdown_tick` once a
//! second. Every tick carries the episode id so a countdown left over from an
//! earlier episode is recognised as stale and ignored.

use serde::Serialize;
use uuid::Uuid;

use crate::config::LocationPolicy;
use crate::location::{Coordinates, LocationError};
use crate::models::subject::EmergencyContact;
use crate::models::vital_sign::VitalsState;
use crate::notifications::Notification;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPhase {
    Idle,
    CountdownActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Sent,
    Cancelled,
}

/// UI view of the current episode. Inactive when the machine is idle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyEpisode {
    pub id: Option<Uuid>,
    pub active: bool,
    pub triggering_vital_description: Option<String>,
    pub remaining_seconds: u32,
    pub is_manual_trigger: bool,
}

impl EmergencyEpisode {
    pub fn inactive() -> Self {
        Self {
            id: None,
            active: false,
            triggering_vital_description: None,
            remaining_seconds: 0,
            is_manual_trigger: false,
        }
    }
}

/// An episode that just left `CountdownActive`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEpisode {
    pub episode_id: Uuid,
    pub resolution: Resolution,
    pub triggering_vital_description: Option<String>,
    pub is_manual_trigger: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CountdownStep {
    Remaining(u32),
    Expired(ResolvedEpisode),
    /// The tick belongs to an episode that is no longer active.
    Stale,
}

#[derive(Debug, Clone)]
struct ActiveEpisode {
    id: Uuid,
    description: Option<String>,
    remaining: u32,
    manual: bool,
}

impl ActiveEpisode {
    fn resolve(self, resolution: Resolution) -> ResolvedEpisode {
        ResolvedEpisode {
            episode_id: self.id,
            resolution,
            triggering_vital_description: self.description,
            is_manual_trigger: self.manual,
        }
    }
}

/// At most one active episode per monitored subject.
#[derive(Debug, Clone)]
pub struct EmergencyAlertMachine {
    countdown_secs: u32,
    active: Option<ActiveEpisode>,
}

impl EmergencyAlertMachine {
    pub fn new(countdown_secs: u32) -> Self {
        Self {
            countdown_secs: countdown_secs.max(1),
            active: None,
        }
    }

    pub fn phase(&self) -> AlertPhase {
        if self.active.is_some() {
            AlertPhase::CountdownActive
        } else {
            AlertPhase::Idle
        }
    }

    pub fn active_episode_id(&self) -> Option<Uuid> {
        self.active.as_ref().map(|e| e.id)
    }

    pub fn episode(&self) -> EmergencyEpisode {
        match &self.active {
            Some(active) => EmergencyEpisode {
                id: Some(active.id),
                active: true,
                triggering_vital_description: active.description.clone(),
                remaining_seconds: active.remaining,
                is_manual_trigger: active.manual,
            },
            None => EmergencyEpisode::inactive(),
        }
    }

    /// Open an episode for a vital that entered danger. `None` while one is active.
    pub fn on_danger_detected(&mut self, description: String) -> Option<Uuid> {
        self.open(Some(description), false)
    }

    /// Open an episode on explicit user request. `None` while one is active.
    pub fn raise_manual(&mut self) -> Option<Uuid> {
        self.open(None, true)
    }

    fn open(&mut self, description: Option<String>, manual: bool) -> Option<Uuid> {
        if self.active.is_some() {
            return None;
        }
        let id = Uuid::new_v4();
        self.active = Some(ActiveEpisode {
            id,
            description,
            remaining: self.countdown_secs,
            manual,
        });
        Some(id)
    }

    /// One second of countdown for `episode_id`.
    pub fn countdown_tick(&mut self, episode_id: Uuid) -> CountdownStep {
        match self.active.as_mut() {
            Some(active) if active.id == episode_id => {
                active.remaining = active.remaining.saturating_sub(1);
                if active.remaining > 0 {
                    return CountdownStep::Remaining(active.remaining);
                }
            }
            _ => return CountdownStep::Stale,
        }
        match self.active.take() {
            Some(active) => CountdownStep::Expired(active.resolve(Resolution::Sent)),
            None => CountdownStep::Stale,
        }
    }

    pub fn cancel(&mut self) -> Option<ResolvedEpisode> {
        self.active
            .take()
            .map(|active| active.resolve(Resolution::Cancelled))
    }

    /// Send immediately without waiting for the countdown.
    pub fn confirm_send(&mut self) -> Option<ResolvedEpisode> {
        self.active.take().map(|active| active.resolve(Resolution::Sent))
    }
}

// ─── Alert composition ───────────────────────────────────────────────────────

/// Outcome of trying to send an emergency alert.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertDelivery {
    Sent {
        alert: Notification,
        /// Present when the alert went out without a location.
        location_warning: Option<Notification>,
    },
    Aborted(Notification),
}

impl AlertDelivery {
    pub fn notifications(self) -> Vec<Notification> {
        match self {
            AlertDelivery::Sent {
                alert,
                location_warning,
            } => std::iter::once(alert).chain(location_warning).collect(),
            AlertDelivery::Aborted(error) => vec![error],
        }
    }
}

pub fn format_location(location: Option<&Coordinates>) -> String {
    match location {
        Some(c) => format!("at Lat: {:.4}, Lon: {:.4}", c.latitude, c.longitude),
        None => "with no location data.".to_string(),
    }
}

/// Build the notification(s) for a resolved-as-sent episode.
pub fn compose_alert(
    episode: &ResolvedEpisode,
    vitals: &VitalsState,
    contacts: &[EmergencyContact],
    location: Result<Coordinates, LocationError>,
    policy: LocationPolicy,
) -> AlertDelivery {
    let (coordinates, location_error) = match location {
        Ok(c) => (Some(c), None),
        Err(e) => (None, Some(e)),
    };

    if let (Some(err), LocationPolicy::Required) = (&location_error, policy) {
        return AlertDelivery::Aborted(Notification::destructive(
            "Error: Could not get location",
            &err.to_string(),
        ));
    }

    let recipients = if contacts.is_empty() {
        "emergency contacts".to_string()
    } else {
        contacts
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut description = format!(
        "Alert sent to {recipients} with vitals ({}) {}",
        vitals.summary(),
        format_location(coordinates.as_ref())
    );
    if let Some(critical) = &episode.triggering_vital_description {
        description = format!("Critical condition detected: {critical}. {description}");
    }

    AlertDelivery::Sent {
        alert: Notification::destructive("Emergency Alert Sent", &description),
        location_warning: location_error.map(|e| {
            Notification::warning("Location unavailable", &format!("Alert sent without location: {e}"))
        }),
    }
}
