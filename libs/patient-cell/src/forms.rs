//! Multipart field mapping for the patient forms of the admin panel and
//! patient portal. Both snake_case and the panels' camelCase names are read.

use doctor_cell::models::Address;
use shared_models::error::AppError;
use shared_utils::form::MultipartForm;

use crate::models::{Billing, PatientIntake, PatientUpdate, ProfileUpdate};

const INTAKE_REQUIRED: [&str; 6] = ["name", "email", "phone", "dob", "gender", "address"];
const PROFILE_REQUIRED: [&str; 5] = ["name", "phone", "address", "dob", "gender"];

/// The first of `names` present in the form, else the canonical (first) name.
fn key<'a>(form: &MultipartForm, names: &[&'a str]) -> &'a str {
    names
        .iter()
        .copied()
        .find(|name| form.contains(name))
        .unwrap_or(names[0])
}

fn text(form: &MultipartForm, names: &[&str]) -> Option<String> {
    form.text_owned(key(form, names))
}

fn amount(form: &MultipartForm, names: &[&str]) -> Result<Option<f64>, AppError> {
    form.amount(key(form, names))
}

fn address(form: &MultipartForm) -> Result<Option<Address>, AppError> {
    form.json("address")
        .map_err(|_| AppError::ValidationError("Invalid address format".to_string()))
}

pub fn patient_intake_from_form(form: &MultipartForm) -> Result<PatientIntake, AppError> {
    if !form.missing(&INTAKE_REQUIRED).is_empty() {
        return Err(AppError::ValidationError("Please provide all required fields".to_string()));
    }

    Ok(PatientIntake {
        name: text(form, &["name"]).unwrap_or_default(),
        email: text(form, &["email"]).unwrap_or_default(),
        phone: text(form, &["phone"]).unwrap_or_default(),
        dob: text(form, &["dob"]).unwrap_or_default(),
        gender: text(form, &["gender"]).unwrap_or_default(),
        address: address(form)?.unwrap_or_default(),
        medical_history: text(form, &["medical_history", "medicalHistory"]).unwrap_or_default(),
        assigned_doctor: text(form, &["assigned_doctor", "assignedDoctor"]),
        appointment_date: text(form, &["appointment_date", "appointmentDate", "slotDate"]),
        appointment_time: text(form, &["appointment_time", "appointmentTime", "slotTime"]),
        treatment: text(form, &["treatment"]).unwrap_or_default(),
        billing: Billing {
            fees: amount(form, &["fees"])?.unwrap_or_default(),
            xray: form.flag("xray").unwrap_or(false),
            cost_of_treatment: amount(form, &["cost_of_treatment", "costOfTreatment"])?.unwrap_or_default(),
            medicine: amount(form, &["medicine"])?.unwrap_or_default(),
            received: amount(form, &["received"])?.unwrap_or_default(),
        },
    })
}

pub fn patient_update_from_form(form: &MultipartForm) -> Result<PatientUpdate, AppError> {
    let history_key = key(form, &["medical_history", "medicalHistory"]);

    Ok(PatientUpdate {
        name: text(form, &["name"]),
        email: text(form, &["email"]),
        phone: text(form, &["phone"]),
        dob: text(form, &["dob"]),
        gender: text(form, &["gender"]),
        address: address(form)?,
        assigned_doctor: text(form, &["assigned_doctor", "assignedDoctor"]),
        appointment_date: text(form, &["appointment_date", "appointmentDate", "slotDate"]),
        appointment_time: text(form, &["appointment_time", "appointmentTime", "slotTime"]),
        // An explicitly blank history clears it.
        medical_history: form
            .contains(history_key)
            .then(|| form.text_owned(history_key).unwrap_or_default()),
        treatment: text(form, &["treatment"]),
        fees: amount(form, &["fees"])?,
        cost_of_treatment: amount(form, &["cost_of_treatment", "costOfTreatment"])?,
        medicine: amount(form, &["medicine"])?,
        xray: form.flag("xray"),
        received: amount(form, &["received"])?,
    })
}

pub fn profile_update_from_form(form: &MultipartForm) -> Result<ProfileUpdate, AppError> {
    if !form.missing(&PROFILE_REQUIRED).is_empty() {
        return Err(AppError::ValidationError("Please provide all the fields".to_string()));
    }

    Ok(ProfileUpdate {
        name: text(form, &["name"]).unwrap_or_default(),
        phone: text(form, &["phone"]).unwrap_or_default(),
        address: address(form)?.unwrap_or_default(),
        dob: text(form, &["dob"]).unwrap_or_default(),
        gender: text(form, &["gender"]).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_intake_reads_camel_case_fields() {
        let form = MultipartForm::from_fields([
            ("name", "Asha Mehta"),
            ("email", "asha@example.com"),
            ("phone", "9876543210"),
            ("dob", "1990-04-02"),
            ("gender", "Female"),
            ("address", r#"{"line1":"MG Road","line2":"Pune"}"#),
            ("assignedDoctor", "doc-1"),
            ("appointmentDate", "16-06-2025"),
            ("appointmentTime", "10:30 AM"),
            ("costOfTreatment", "1200"),
            ("fees", "500"),
            ("xray", "true"),
            ("total", "1"),
        ]);

        let intake = patient_intake_from_form(&form).unwrap();
        assert_eq!(intake.assigned_doctor.as_deref(), Some("doc-1"));
        assert_eq!(intake.appointment_time.as_deref(), Some("10:30 AM"));
        assert_eq!(intake.billing.total(), 1800.0);
        assert_eq!(intake.address.line2, "Pune");
    }

    #[test]
    fn test_intake_requires_core_fields() {
        let form = MultipartForm::from_fields([("name", "Asha")]);
        assert_matches!(
            patient_intake_from_form(&form),
            Err(AppError::ValidationError(msg)) if msg == "Please provide all required fields"
        );
    }

    #[test]
    fn test_intake_rejects_bad_address() {
        let form = MultipartForm::from_fields([
            ("name", "Asha"),
            ("email", "asha@example.com"),
            ("phone", "1"),
            ("dob", "x"),
            ("gender", "Female"),
            ("address", "MG Road"),
        ]);
        assert_matches!(
            patient_intake_from_form(&form),
            Err(AppError::ValidationError(msg)) if msg == "Invalid address format"
        );
    }

    #[test]
    fn test_update_only_sets_sent_fields() {
        let form = MultipartForm::from_fields([("medicine", "40"), ("medicalHistory", "")]);
        let update = patient_update_from_form(&form).unwrap();

        assert_eq!(update.medicine, Some(40.0));
        assert_eq!(update.medical_history.as_deref(), Some(""));
        assert!(update.fees.is_none());
        assert!(update.xray.is_none());
        assert!(update.name.is_none());
    }

    #[test]
    fn test_update_rejects_negative_amount() {
        let form = MultipartForm::from_fields([("received", "-1")]);
        assert!(patient_update_from_form(&form).is_err());
    }
}
