use serde::{Deserialize, Serialize};

use super::enums::{LabTestStatus, PrescriptionStatus};

pub const PRESCRIPTION_DISCLAIMER: &str =
    "This is a digitally generated prescription. Please consult your pharmacist.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationLine {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionRequest {
    pub patient_name: String,
    pub doctor_name: String,
    pub date: String,
    pub medications: Vec<MedicationLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: String,
    pub patient_name: String,
    pub doctor_name: String,
    pub date: String,
    pub medications: Vec<MedicationLine>,
    pub status: PrescriptionStatus,
    pub disclaimer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabTestRequest {
    pub patient_name: String,
    pub test_name: String,
    pub doctor_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabTestOrder {
    pub id: String,
    pub patient_name: String,
    pub test_name: String,
    pub doctor_name: String,
    pub date_ordered: String,
    pub status: LabTestStatus,
    pub report_url: Option<String>,
}
