pub mod appointment;
pub mod doctor;
pub mod enums;
pub mod prescription;
pub mod subject;
pub mod vital_sign;

pub use appointment::{Appointment, AppointmentRequest};
pub use doctor::{Doctor, DoctorUpdate, NewDoctor};
pub use enums::{AssistantFlow, DeviceStatus, LabTestStatus, PrescriptionStatus};
pub use prescription::{
    LabTestOrder, LabTestRequest, MedicationLine, Prescription, PrescriptionRequest,
};
pub use subject::{Device, EmergencyContact, HistoricalReading, Subject};
pub use vital_sign::{
    AlertStatus, ClampRange, Direction, Precision, Thresholds, Vital, VitalKind, VitalsState,
};
