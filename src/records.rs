//! Append-only clinical records: appointments, prescriptions and lab orders.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::models::appointment::{Appointment, AppointmentRequest, DATE_FORMAT, TIME_FORMAT};
use crate::models::doctor::with_title;
use crate::models::enums::{LabTestStatus, PrescriptionStatus};
use crate::models::prescription::{
    LabTestOrder, LabTestRequest, Prescription, PrescriptionRequest, PRESCRIPTION_DISCLAIMER,
};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RecordsError {
    #[error("Invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Invalid time {0:?}, expected HH:MM")]
    InvalidTime(String),
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    pub success: bool,
    pub message: String,
    pub appointment: Appointment,
}

#[derive(Default)]
pub struct ClinicalRecords {
    appointments: Vec<Appointment>,
    prescriptions: Vec<Prescription>,
    lab_tests: Vec<LabTestOrder>,
    next_appointment_id: u64,
    next_prescription_id: u64,
    next_lab_test_id: u64,
}

fn require(value: &str, field: &'static str) -> Result<(), RecordsError> {
    if value.trim().is_empty() {
        Err(RecordsError::MissingField(field))
    } else {
        Ok(())
    }
}

impl ClinicalRecords {
    pub fn new() -> Self {
        Self {
            next_appointment_id: 1,
            next_prescription_id: 1,
            next_lab_test_id: 1,
            ..Default::default()
        }
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    /// Appointments booked with `doctor_id`, in booking order.
    pub fn appointments_for(&self, doctor_id: u64) -> Vec<Appointment> {
        self.appointments
            .iter()
            .filter(|appt| appt.doctor_id == doctor_id)
            .cloned()
            .collect()
    }

    pub fn prescriptions(&self) -> &[Prescription] {
        &self.prescriptions
    }

    pub fn lab_tests(&self) -> &[LabTestOrder] {
        &self.lab_tests
    }

    /// Append an appointment. Doctor existence is checked by the caller.
    pub fn book_appointment(
        &mut self,
        req: AppointmentRequest,
    ) -> Result<BookingConfirmation, RecordsError> {
        let date = req.date.trim().to_string();
        let time = req.time.trim().to_string();
        NaiveDate::parse_from_str(&date, DATE_FORMAT)
            .map_err(|_| RecordsError::InvalidDate(date.clone()))?;
        NaiveTime::parse_from_str(&time, TIME_FORMAT)
            .map_err(|_| RecordsError::InvalidTime(time.clone()))?;
        require(&req.patient_name, "patientName")?;
        require(&req.doctor_name, "doctorName")?;

        let appointment = Appointment {
            id: self.next_appointment_id,
            doctor_id: req.doctor_id,
            doctor_name: req.doctor_name.trim().to_string(),
            date,
            time,
            patient_name: req.patient_name.trim().to_string(),
            issue: req.issue,
        };
        self.next_appointment_id += 1;
        self.appointments.push(appointment.clone());
        tracing::info!(
            appointment = appointment.id,
            doctor = appointment.doctor_id,
            date = %appointment.date,
            time = %appointment.time,
            "Appointment booked"
        );

        Ok(BookingConfirmation {
            success: true,
            message: format!(
                "Appointment confirmed for {} with {} on {} at {}.",
                appointment.patient_name,
                with_title(&appointment.doctor_name),
                appointment.date,
                appointment.time
            ),
            appointment,
        })
    }

    pub fn generate_prescription(
        &mut self,
        req: PrescriptionRequest,
    ) -> Result<Prescription, RecordsError> {
        require(&req.patient_name, "patientName")?;
        require(&req.doctor_name, "doctorName")?;
        if req.medications.is_empty() {
            return Err(RecordsError::MissingField("medications"));
        }

        let prescription = Prescription {
            id: format!("PRES-{}", self.next_prescription_id),
            patient_name: req.patient_name,
            doctor_name: req.doctor_name,
            date: req.date,
            medications: req.medications,
            status: PrescriptionStatus::Generated,
            disclaimer: PRESCRIPTION_DISCLAIMER.to_string(),
        };
        self.next_prescription_id += 1;
        self.prescriptions.push(prescription.clone());
        tracing::info!(prescription = %prescription.id, "Prescription generated");
        Ok(prescription)
    }

    pub fn order_lab_test(
        &mut self,
        req: LabTestRequest,
        today: NaiveDate,
    ) -> Result<LabTestOrder, RecordsError> {
        require(&req.patient_name, "patientName")?;
        require(&req.test_name, "testName")?;
        require(&req.doctor_name, "doctorName")?;

        let order = LabTestOrder {
            id: format!("TEST-{}", self.next_lab_test_id),
            patient_name: req.patient_name,
            test_name: req.test_name,
            doctor_name: req.doctor_name,
            date_ordered: today.format(DATE_FORMAT).to_string(),
            status: LabTestStatus::Ordered,
            report_url: None,
        };
        self.next_lab_test_id += 1;
        self.lab_tests.push(order.clone());
        tracing::info!(lab_test = %order.id, test = %order.test_name, "Lab test ordered");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::prescription::MedicationLine;

    fn booking(date: &str, time: &str) -> AppointmentRequest {
        AppointmentRequest {
            doctor_id: 1,
            doctor_name: "Emily Carter".into(),
            date: date.into(),
            time: time.into(),
            patient_name: "John Doe".into(),
            issue: "Palpitations".into(),
        }
    }

    #[test]
    fn booking_confirms_and_appends() {
        let mut records = ClinicalRecords::new();
        let confirmation = records.book_appointment(booking("2025-01-01", "10:00")).unwrap();
        assert!(confirmation.success);
        assert_eq!(
            confirmation.message,
            "Appointment confirmed for John Doe with Dr. Emily Carter on 2025-01-01 at 10:00."
        );
        assert_eq!(confirmation.appointment.id, 1);

        let second = records.book_appointment(booking("2025-01-02", "11:30")).unwrap();
        assert_eq!(second.appointment.id, 2);
        assert_eq!(records.appointments().len(), 2);
    }

    #[test]
    fn appointments_filter_by_doctor() {
        let mut records = ClinicalRecords::new();
        records.book_appointment(booking("2025-01-01", "10:00")).unwrap();
        let mut other = booking("2025-01-01", "11:00");
        other.doctor_id = 2;
        other.doctor_name = "Ben Hanson".into();
        records.book_appointment(other).unwrap();
        records.book_appointment(booking("2025-01-03", "09:15")).unwrap();

        let mine: Vec<u64> = records.appointments_for(1).iter().map(|a| a.id).collect();
        assert_eq!(mine, vec![1, 3]);
        assert_eq!(records.appointments_for(2)[0].doctor_name, "Ben Hanson");
        assert!(records.appointments_for(7).is_empty());
    }

    #[test]
    fn titled_doctor_name_is_not_doubled() {
        let mut records = ClinicalRecords::new();
        let mut req = booking("2025-01-01", "10:00");
        req.doctor_name = "Dr. Ben Hanson".into();
        let confirmation = records.book_appointment(req).unwrap();
        assert!(confirmation.message.contains("with Dr. Ben Hanson on"));
    }

    #[test]
    fn booking_rejects_bad_date_and_time() {
        let mut records = ClinicalRecords::new();
        assert_eq!(
            records.book_appointment(booking("01/02/2025", "10:00")).unwrap_err(),
            RecordsError::InvalidDate("01/02/2025".into())
        );
        assert_eq!(
            records.book_appointment(booking("2025-01-02", "25:00")).unwrap_err(),
            RecordsError::InvalidTime("25:00".into())
        );
        assert!(records.appointments().is_empty());
    }

    #[test]
    fn prescription_requires_medications() {
        let mut records = ClinicalRecords::new();
        let mut req = PrescriptionRequest {
            patient_name: "John Doe".into(),
            doctor_name: "Dr. Emily Carter".into(),
            date: "2025-01-01".into(),
            medications: Vec::new(),
        };
        assert_eq!(
            records.generate_prescription(req.clone()).unwrap_err(),
            RecordsError::MissingField("medications")
        );

        req.medications.push(MedicationLine {
            name: "Amoxicillin".into(),
            dosage: "500mg".into(),
            frequency: "Twice a day".into(),
        });
        let prescription = records.generate_prescription(req).unwrap();
        assert_eq!(prescription.id, "PRES-1");
        assert_eq!(prescription.status, PrescriptionStatus::Generated);
        assert_eq!(prescription.disclaimer, PRESCRIPTION_DISCLAIMER);
    }

    #[test]
    fn lab_order_is_dated_today() {
        let mut records = ClinicalRecords::new();
        let order = records
            .order_lab_test(
                LabTestRequest {
                    patient_name: "John Doe".into(),
                    test_name: "Lipid Panel".into(),
                    doctor_name: "Dr. Emily Carter".into(),
                },
                NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
            )
            .unwrap();
        assert_eq!(order.id, "TEST-1");
        assert_eq!(order.date_ordered, "2025-04-02");
        assert_eq!(order.status, LabTestStatus::Ordered);
        assert!(order.report_url.is_none());
        assert_eq!(records.lab_tests().len(), 1);
    }
}
