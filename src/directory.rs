//! Doctor directory: registration, verification and rule-based recommendation.

use serde::Serialize;

use crate::models::doctor::{with_title, Doctor, DoctorUpdate, NewDoctor};

pub const NO_MATCH_MESSAGE: &str = "I couldn't find a suitable doctor based on the information provided. Please provide more details about your symptoms or issue.";

const DEFAULT_SPECIALTY: &str = "General Medicine";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DirectoryError {
    #[error("Doctor {0} not found")]
    NotFound(u64),
    #[error("A doctor named {0} is already registered")]
    DuplicateName(String),
    #[error("Invalid doctor profile: {0}")]
    Invalid(String),
    #[error("No doctor profile is signed in")]
    NoCurrentDoctor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub recommendation: String,
    pub doctor_id: Option<u64>,
}

pub struct DoctorDirectory {
    doctors: Vec<Doctor>,
    next_id: u64,
    /// Profile edited from the doctor portal.
    current: Option<u64>,
}

impl DoctorDirectory {
    pub fn new(doctors: Vec<Doctor>) -> Self {
        let next_id = doctors.iter().map(|d| d.id).max().unwrap_or(0) + 1;
        let current = doctors.first().map(|d| d.id);
        Self {
            doctors,
            next_id,
            current,
        }
    }

    pub fn list(&self, verified_only: bool) -> Vec<Doctor> {
        self.doctors
            .iter()
            .filter(|d| !verified_only || d.is_verified)
            .cloned()
            .collect()
    }

    pub fn get(&self, id: u64) -> Result<&Doctor, DirectoryError> {
        self.doctors
            .iter()
            .find(|d| d.id == id)
            .ok_or(DirectoryError::NotFound(id))
    }

    /// New doctors start unverified. Names are compared with the `Dr.` prefix normalised.
    pub fn register(&mut self, new: NewDoctor) -> Result<Doctor, DirectoryError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(DirectoryError::Invalid("name is required".into()));
        }
        let titled = with_title(name);
        if self.doctors.iter().any(|d| d.titled_name() == titled) {
            return Err(DirectoryError::DuplicateName(titled));
        }

        let doctor = Doctor {
            id: self.next_id,
            name: titled,
            degree: new.degree.trim().to_string(),
            experience: new.experience,
            is_verified: false,
            specialty: new.specialty.filter(|s| !s.trim().is_empty()),
            points: 0,
        };
        self.next_id += 1;
        self.doctors.push(doctor.clone());
        tracing::info!(doctor = doctor.id, name = %doctor.name, "Doctor registered");
        Ok(doctor)
    }

    pub fn verify(&mut self, id: u64) -> Result<Doctor, DirectoryError> {
        let doctor = self
            .doctors
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(DirectoryError::NotFound(id))?;
        doctor.is_verified = true;
        tracing::info!(doctor = id, "Doctor verified");
        Ok(doctor.clone())
    }

    /// Apply the set fields of `update` to the signed-in doctor's profile.
    pub fn update_current(&mut self, update: DoctorUpdate) -> Result<Doctor, DirectoryError> {
        let id = self.current.ok_or(DirectoryError::NoCurrentDoctor)?;
        let doctor = self
            .doctors
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(DirectoryError::NotFound(id))?;

        if let Some(name) = update.name {
            doctor.name = with_title(&name);
        }
        if let Some(degree) = update.degree {
            doctor.degree = degree;
        }
        if let Some(experience) = update.experience {
            doctor.experience = experience;
        }
        if let Some(specialty) = update.specialty {
            doctor.specialty = Some(specialty);
        }
        Ok(doctor.clone())
    }

    pub fn current(&self) -> Option<&Doctor> {
        self.current.and_then(|id| self.get(id).ok())
    }

    /// Recommend the first verified doctor when the user described anything at all.
    pub fn recommend(&self, symptoms: &str, issue: &str) -> Recommendation {
        let described = !symptoms.trim().is_empty() || !issue.trim().is_empty();
        match self.doctors.iter().find(|d| d.is_verified) {
            Some(doctor) if described => Recommendation {
                recommendation: format!(
                    "Based on your information, I recommend {}, who is a specialist in {}.",
                    doctor.titled_name(),
                    doctor.specialty.as_deref().unwrap_or(DEFAULT_SPECIALTY)
                ),
                doctor_id: Some(doctor.id),
            },
            _ => Recommendation {
                recommendation: NO_MATCH_MESSAGE.to_string(),
                doctor_id: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;

    fn directory() -> DoctorDirectory {
        DoctorDirectory::new(seed::doctors())
    }

    fn new_doctor(name: &str) -> NewDoctor {
        NewDoctor {
            name: name.into(),
            degree: "MD".into(),
            experience: 3,
            specialty: None,
        }
    }

    #[test]
    fn recommends_first_verified_doctor() {
        let rec = directory().recommend("chest pain", "");
        assert_eq!(rec.doctor_id, Some(1));
        assert_eq!(
            rec.recommendation,
            "Based on your information, I recommend Dr. Emily Carter, who is a specialist in Cardiology."
        );
    }

    #[test]
    fn blank_input_gets_no_match() {
        let rec = directory().recommend("  ", "");
        assert_eq!(rec.doctor_id, None);
        assert_eq!(rec.recommendation, NO_MATCH_MESSAGE);
    }

    #[test]
    fn no_verified_doctor_gets_no_match() {
        let mut directory = DoctorDirectory::new(Vec::new());
        directory.register(new_doctor("Sam Lee")).unwrap();
        assert_eq!(directory.recommend("rash", "itching").doctor_id, None);
    }

    #[test]
    fn missing_specialty_falls_back_to_general_medicine() {
        let mut directory = DoctorDirectory::new(Vec::new());
        let doctor = directory.register(new_doctor("Sam Lee")).unwrap();
        directory.verify(doctor.id).unwrap();
        let rec = directory.recommend("", "headache");
        assert!(rec
            .recommendation
            .ends_with("I recommend Dr. Sam Lee, who is a specialist in General Medicine."));
    }

    #[test]
    fn registration_is_unverified_and_name_deduped() {
        let mut directory = directory();
        let doctor = directory.register(new_doctor("Priya Shah")).unwrap();
        assert_eq!(doctor.id, 3);
        assert!(!doctor.is_verified);
        assert_eq!(directory.list(true).len(), 2);
        assert_eq!(directory.list(false).len(), 3);

        let err = directory.register(new_doctor("Dr. Priya Shah")).unwrap_err();
        assert_eq!(err, DirectoryError::DuplicateName("Dr. Priya Shah".into()));
    }

    #[test]
    fn verify_unknown_doctor_fails() {
        assert_eq!(directory().verify(77).unwrap_err(), DirectoryError::NotFound(77));
    }

    #[test]
    fn updates_current_profile() {
        let mut directory = directory();
        let updated = directory
            .update_current(DoctorUpdate {
                experience: Some(16),
                specialty: Some("Interventional Cardiology".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(updated.experience, 16);
        assert_eq!(updated.name, "Dr. Emily Carter");
        assert_eq!(directory.current().unwrap().experience, 16);
    }
}
