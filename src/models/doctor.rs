use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: u64,
    pub name: String,
    pub degree: String,
    pub experience: u32,
    pub is_verified: bool,
    pub specialty: Option<String>,
    pub points: u32,
}

impl Doctor {
    /// Name with a single `Dr.` honorific, whether or not it was registered with one.
    pub fn titled_name(&self) -> String {
        with_title(&self.name)
    }
}

/// Prefix `Dr. ` unless the name already carries it.
pub fn with_title(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.starts_with("Dr. ") || trimmed.starts_with("Dr ") {
        trimmed.to_string()
    } else {
        format!("Dr. {trimmed}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDoctor {
    pub name: String,
    pub degree: String,
    pub experience: u32,
    pub specialty: Option<String>,
}

/// Partial profile update for the signed-in doctor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorUpdate {
    pub name: Option<String>,
    pub degree: Option<String>,
    pub experience: Option<u32>,
    pub specialty: Option<String>,
}
