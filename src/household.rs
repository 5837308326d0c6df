//! Household: the account holder, linked family members and their devices.
//!
//! All known users live in one list. The family is the subset linked to the
//! account holder (always including them); the current subject is the one
//! whose devices and vitals the dashboard shows.

use rand::Rng;

use crate::models::enums::DeviceStatus;
use crate::models::subject::{Device, HistoricalReading, Subject};
use crate::models::vital_sign::VitalsError;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum HouseholdError {
    #[error("Subject {0} not found")]
    SubjectNotFound(u64),
    #[error("Device {0} not found")]
    DeviceNotFound(u64),
    #[error("The device code you entered is not valid. Please try again.")]
    InvalidDeviceCode(String),
    #[error("Invalid registration: {0}")]
    InvalidRegistration(String),
    #[error("Subject {subject} has invalid vitals: {source}")]
    InvalidVitals { subject: u64, source: VitalsError },
}

/// Result of flipping one device of the current subject.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceToggle {
    pub subject_id: u64,
    pub device: Device,
    pub any_connected: bool,
}

pub struct Household {
    users: Vec<Subject>,
    family: Vec<u64>,
    self_id: u64,
    current_id: u64,
}

impl Household {
    /// `users[0]` is the account holder and the initial current subject.
    /// Every subject's thresholds must be reachable by the simulator.
    pub fn new(users: Vec<Subject>) -> Result<Self, HouseholdError> {
        for user in &users {
            user.vitals
                .validate()
                .map_err(|source| HouseholdError::InvalidVitals { subject: user.id, source })?;
        }
        let self_id = users.first().map(|u| u.id).unwrap_or_default();
        Ok(Self {
            users,
            family: vec![self_id],
            self_id,
            current_id: self_id,
        })
    }

    /// Every known user, monitored or not.
    pub fn users(&self) -> &[Subject] {
        &self.users
    }

    pub fn self_id(&self) -> u64 {
        self.self_id
    }

    pub fn current_id(&self) -> u64 {
        self.current_id
    }

    pub fn get(&self, id: u64) -> Result<&Subject, HouseholdError> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .ok_or(HouseholdError::SubjectNotFound(id))
    }

    fn get_mut(&mut self, id: u64) -> Result<&mut Subject, HouseholdError> {
        self.users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(HouseholdError::SubjectNotFound(id))
    }

    pub fn current(&self) -> Result<&Subject, HouseholdError> {
        self.get(self.current_id)
    }

    /// Family members in the order they were linked, account holder first.
    pub fn family(&self) -> Vec<Subject> {
        self.family
            .iter()
            .filter_map(|id| self.get(*id).ok())
            .cloned()
            .collect()
    }

    /// Link the user owning `device_code`. Linking twice is a no-op.
    pub fn add_family_member(&mut self, device_code: &str) -> Result<Subject, HouseholdError> {
        let code = device_code.trim();
        let member = self
            .users
            .iter()
            .find(|u| u.device_code.as_deref() == Some(code))
            .cloned()
            .ok_or_else(|| HouseholdError::InvalidDeviceCode(code.to_string()))?;

        if !self.family.contains(&member.id) {
            self.family.push(member.id);
            tracing::info!(subject = member.id, name = %member.name, "Family member added");
        }
        Ok(member)
    }

    pub fn toggle_monitoring(&mut self, id: u64) -> Result<bool, HouseholdError> {
        let subject = self.get_mut(id)?;
        subject.is_monitored = !subject.is_monitored;
        Ok(subject.is_monitored)
    }

    /// Make `id` the current subject. Its devices start out disconnected.
    pub fn select(&mut self, id: u64) -> Result<&Subject, HouseholdError> {
        let subject = self.get_mut(id)?;
        for device in &mut subject.devices {
            device.status = DeviceStatus::Disconnected;
        }
        self.current_id = id;
        self.current()
    }

    pub fn toggle_device(&mut self, device_id: u64) -> Result<DeviceToggle, HouseholdError> {
        let subject_id = self.current_id;
        let subject = self.get_mut(subject_id)?;
        let device = subject
            .devices
            .iter_mut()
            .find(|d| d.id == device_id)
            .ok_or(HouseholdError::DeviceNotFound(device_id))?;
        device.status = device.status.toggled();
        let device = device.clone();

        Ok(DeviceToggle {
            subject_id,
            device,
            any_connected: subject.any_device_connected(),
        })
    }

    pub fn history(&self, id: u64) -> Result<Vec<HistoricalReading>, HouseholdError> {
        Ok(self.get(id)?.historical_data.clone())
    }

    /// Replace the account holder's identity with a newly registered user
    /// and issue them a device code like `MARIA-4821`.
    pub fn register_self<R: Rng>(
        &mut self,
        rng: &mut R,
        name: &str,
        email: &str,
    ) -> Result<Subject, HouseholdError> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() {
            return Err(HouseholdError::InvalidRegistration("name is required".into()));
        }
        if !email.contains('@') {
            return Err(HouseholdError::InvalidRegistration(format!(
                "invalid email: {email}"
            )));
        }

        let first = name.split_whitespace().next().unwrap_or(name).to_uppercase();
        let device_code = format!("{first}-{}", rng.gen_range(1000..10000));

        let self_id = self.self_id;
        let subject = self.get_mut(self_id)?;
        subject.name = name.to_string();
        subject.email = email.to_string();
        subject.device_code = Some(device_code);
        tracing::info!(subject = self_id, "Account holder registered");
        Ok(subject.clone())
    }
}
