//! Tools the model may invoke, and their dispatch against `CoreState`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::analysis::analyze_history;
use crate::core_state::{CoreError, CoreState};
use crate::models::appointment::AppointmentRequest;
use crate::models::prescription::{LabTestRequest, PrescriptionRequest};

/// Arguments of the `findDoctors` tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FindDoctorsArgs {
    pub symptoms: String,
    pub issue: String,
}

/// Arguments of the `analyzeHealthData` tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzeHealthDataArgs {
    /// Defaults to the current subject.
    pub subject_id: Option<u64>,
}

/// Tools without arguments still receive an (ignored) object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoArgs {}

/// `{"name": "bookAppointment", "arguments": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "arguments", rename_all = "camelCase")]
pub enum ToolCall {
    FindDoctors(FindDoctorsArgs),
    BookAppointment(AppointmentRequest),
    ViewAppointments(NoArgs),
    GeneratePrescription(PrescriptionRequest),
    ViewPrescriptions(NoArgs),
    OrderLabTest(LabTestRequest),
    AnalyzeHealthData(AnalyzeHealthDataArgs),
}

impl ToolCall {
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::FindDoctors(_) => "findDoctors",
            ToolCall::BookAppointment(_) => "bookAppointment",
            ToolCall::ViewAppointments(_) => "viewAppointments",
            ToolCall::GeneratePrescription(_) => "generatePrescription",
            ToolCall::ViewPrescriptions(_) => "viewPrescriptions",
            ToolCall::OrderLabTest(_) => "orderLabTest",
            ToolCall::AnalyzeHealthData(_) => "analyzeHealthData",
        }
    }

    /// Parse a call from a tool name and its JSON arguments.
    pub fn from_parts(name: &str, arguments: Value) -> Result<Self, serde_json::Error> {
        let arguments = if arguments.is_null() { json!({}) } else { arguments };
        serde_json::from_value(json!({ "name": name, "arguments": arguments }))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Could not encode tool result: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Execute `call`. `today` dates lab orders.
pub fn dispatch(core: &CoreState, call: &ToolCall, today: NaiveDate) -> Result<Value, ToolError> {
    tracing::debug!(tool = call.name(), "Dispatching assistant tool");
    let value = match call {
        ToolCall::FindDoctors(args) => {
            let directory = core.read_directory()?;
            let recommendation = directory.recommend(&args.symptoms, &args.issue);
            json!({
                "doctors": directory.list(true),
                "recommendation": recommendation,
            })
        }
        ToolCall::BookAppointment(req) => serde_json::to_value(core.book_appointment(req.clone())?)?,
        ToolCall::ViewAppointments(_) => serde_json::to_value(core.read_records()?.appointments())?,
        ToolCall::GeneratePrescription(req) => {
            let prescription = core
                .write_records()?
                .generate_prescription(req.clone())
                .map_err(CoreError::from)?;
            serde_json::to_value(prescription)?
        }
        ToolCall::ViewPrescriptions(_) => serde_json::to_value(core.read_records()?.prescriptions())?,
        ToolCall::OrderLabTest(req) => {
            let order = core
                .write_records()?
                .order_lab_test(req.clone(), today)
                .map_err(CoreError::from)?;
            serde_json::to_value(order)?
        }
        ToolCall::AnalyzeHealthData(args) => {
            let household = core.read_household()?;
            let subject = match args.subject_id {
                Some(id) => household.get(id),
                None => household.current(),
            }
            .map_err(CoreError::from)?;
            let analysis = analyze_history(subject.id, &subject.historical_data, &subject.vitals);
            serde_json::to_value(analysis)?
        }
    };
    Ok(value)
}
