//! System instructions and tool schemas per assistant flow.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::enums::AssistantFlow;
use crate::models::subject::Subject;
use crate::models::vital_sign::VitalsState;

const APPOINTMENT_INSTRUCTIONS: &str = "You are the appointment assistant of a health monitoring app. \
You help users find a suitable doctor and book appointments.
- To recommend a doctor, call findDoctors with the user's symptoms and issue.
- To book, call bookAppointment. It needs the doctor's id and name, a date (YYYY-MM-DD), a time (HH:MM), the patient's name and the issue. Ask the user for anything missing instead of guessing.
- To list existing bookings, call viewAppointments.
Answer conversationally and confirm what was booked.";

const PRESCRIPTION_INSTRUCTIONS: &str = "You are the records assistant of a health monitoring app, used by doctors. \
You generate prescriptions and order lab tests on their behalf.
- generatePrescription needs the patient, the prescribing doctor, a date (YYYY-MM-DD) and at least one medication with dosage and frequency.
- orderLabTest needs the patient, the test name and the ordering doctor.
- viewPrescriptions lists prescriptions already generated.
Ask for missing details before calling a tool.";

const CHAT_INSTRUCTIONS: &str = "You are the friendly assistant of a health monitoring app. \
You answer questions about the app and talk about general health and wellness.
You are not a medical professional: never give medical advice, a diagnosis, or recommend a medicine or medication. \
When asked for any of these, decline and suggest consulting a qualified doctor.
Do not handle appointments here; point the user to the Appointment Manager instead.";

const INSIGHTS_INSTRUCTIONS: &str = "You are the health assistant of a health monitoring app. \
You give personalized insights and recommendations from the user's health data.
Analyze the health data and the user's preferences, if any. Point out areas that could improve and suggest lifestyle adjustments such as sleep, activity, hydration and diet.
You are not a medical professional: do not diagnose or recommend medication. When a reading looks concerning, suggest consulting a doctor.
Keep the answer clear, concise and easy to understand.";

const TREND_SUMMARY_INSTRUCTIONS: &str = "You are the health analyst of a health monitoring app. \
Summarize the trends in the user's health data and look for abnormal correlations between vitals.
- Call analyzeHealthData to compute statistics over the daily history before writing the summary.
- Mention the direction of each vital, days outside the normal range and any vitals that move together.
Do not diagnose; recommend a doctor when the trends are concerning.";

/// What the dashboard sends along with the user's message.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserContext {
    pub symptoms: Option<String>,
    pub issue: Option<String>,
    pub medical_history: Option<String>,
    /// Goals or preferences for the insights flow.
    pub user_preferences: Option<String>,
    pub message: String,
}

pub fn system_prompt(flow: AssistantFlow) -> &'static str {
    match flow {
        AssistantFlow::Appointment => APPOINTMENT_INSTRUCTIONS,
        AssistantFlow::Prescription => PRESCRIPTION_INSTRUCTIONS,
        AssistantFlow::Chat => CHAT_INSTRUCTIONS,
        AssistantFlow::Insights => INSIGHTS_INSTRUCTIONS,
        AssistantFlow::TrendSummary => TREND_SUMMARY_INSTRUCTIONS,
    }
}

/// Names of the tools a flow may invoke.
pub fn allowed_tools(flow: AssistantFlow) -> &'static [&'static str] {
    match flow {
        AssistantFlow::Appointment => &["findDoctors", "bookAppointment", "viewAppointments"],
        AssistantFlow::Prescription => &["generatePrescription", "viewPrescriptions", "orderLabTest"],
        AssistantFlow::Chat | AssistantFlow::Insights => &[],
        AssistantFlow::TrendSummary => &["analyzeHealthData"],
    }
}

/// Flows whose user turn carries the current subject's health data.
pub fn uses_health_data(flow: AssistantFlow) -> bool {
    matches!(flow, AssistantFlow::Insights | AssistantFlow::TrendSummary)
}

/// Render the user turn; blank context fields are left out.
pub fn render_user_prompt(context: &UserContext) -> String {
    let mut lines = Vec::new();
    let fields = [
        ("Symptoms", &context.symptoms),
        ("Issue", &context.issue),
        ("Medical History", &context.medical_history),
        ("User Preferences", &context.user_preferences),
    ];
    for (label, value) in fields {
        if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            lines.push(format!("{label}: {value}"));
        }
    }
    lines.push(format!("User's message: {}", context.message.trim()));
    lines.join("\n")
}

/// Health data block for the insights flows: latest vitals, devices and
/// the daily history as JSON. `live` overrides the stored vitals while a
/// session is running for the subject.
pub fn render_health_data(subject: &Subject, live: Option<&VitalsState>) -> String {
    let vitals = live.unwrap_or(&subject.vitals);
    let devices = subject
        .devices
        .iter()
        .map(|d| format!("{} ({}, {}% battery)", d.name, d.status, d.battery_level))
        .collect::<Vec<_>>()
        .join(", ");
    let history = serde_json::to_string(&subject.historical_data).unwrap_or_else(|_| "[]".into());
    format!(
        "Health Data for {}:\nCurrent vitals: {}\nDevices: {}\nDaily history: {}",
        subject.name,
        vitals.summary(),
        if devices.is_empty() { "none" } else { devices.as_str() },
        history
    )
}

fn function(name: &str, description: &str, parameters: Value) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": name,
            "description": description,
            "parameters": parameters,
        }
    })
}

fn object(properties: Value, required: &[&str]) -> Value {
    json!({ "type": "object", "properties": properties, "required": required })
}

fn tool_spec(name: &str) -> Option<Value> {
    let string = json!({ "type": "string" });
    let spec = match name {
        "findDoctors" => function(
            name,
            "Recommend a verified doctor from the symptoms and issue the user described.",
            object(json!({ "symptoms": string, "issue": string }), &[]),
        ),
        "bookAppointment" => function(
            name,
            "Book an appointment with a doctor.",
            object(
                json!({
                    "doctorId": { "type": "integer" },
                    "doctorName": string,
                    "date": { "type": "string", "description": "YYYY-MM-DD" },
                    "time": { "type": "string", "description": "HH:MM, 24-hour" },
                    "patientName": string,
                    "issue": string,
                }),
                &["doctorId", "doctorName", "date", "time", "patientName", "issue"],
            ),
        ),
        "viewAppointments" => function(name, "List booked appointments.", object(json!({}), &[])),
        "generatePrescription" => function(
            name,
            "Generate a prescription for a patient.",
            object(
                json!({
                    "patientName": string,
                    "doctorName": string,
                    "date": { "type": "string", "description": "YYYY-MM-DD" },
                    "medications": {
                        "type": "array",
                        "items": object(
                            json!({ "name": string, "dosage": string, "frequency": string }),
                            &["name", "dosage", "frequency"],
                        ),
                    },
                }),
                &["patientName", "doctorName", "date", "medications"],
            ),
        ),
        "viewPrescriptions" => function(name, "List generated prescriptions.", object(json!({}), &[])),
        "orderLabTest" => function(
            name,
            "Order a lab test for a patient.",
            object(
                json!({ "patientName": string, "testName": string, "doctorName": string }),
                &["patientName", "testName", "doctorName"],
            ),
        ),
        "analyzeHealthData" => function(
            name,
            "Compute trend statistics and correlations over a subject's daily health history.",
            object(
                json!({
                    "subjectId": {
                        "type": "integer",
                        "description": "Subject to analyse; defaults to the current subject",
                    },
                }),
                &[],
            ),
        ),
        _ => return None,
    };
    Some(spec)
}

/// Ollama tool schemas for the tools `flow` offers.
pub fn tool_specs(flow: AssistantFlow) -> Vec<Value> {
    allowed_tools(flow)
        .iter()
        .filter_map(|name| tool_spec(name))
        .collect()
}
