use serde::{Deserialize, Serialize};

use super::enums::DeviceStatus;
use super::vital_sign::VitalsState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub battery_level: u8,
    pub status: DeviceStatus,
}

/// One day of recorded readings for the trend charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalReading {
    pub date: String,
    pub heart_rate: f64,
    pub oxygen_saturation: f64,
    pub body_temperature: f64,
}

/// A person whose vitals can be monitored: the account holder or a family member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub device_code: Option<String>,
    pub is_monitored: bool,
    pub points: u32,
    pub devices: Vec<Device>,
    /// Values a new monitoring session starts from.
    pub vitals: VitalsState,
    pub historical_data: Vec<HistoricalReading>,
}

impl Subject {
    pub fn any_device_connected(&self) -> bool {
        self.devices
            .iter()
            .any(|d| d.status == DeviceStatus::Connected)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub id: u64,
    pub name: String,
    pub phone: String,
}
