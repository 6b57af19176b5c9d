//! Browser form submissions

use crate::error::ValidationError;
use crate::types::patient::{parse_field, PatientInput};
use serde::Deserialize;

/// Urlencoded prediction form, every field as typed by the user
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientForm {
    pub pregnancies: Option<String>,
    pub glucose: Option<String>,
    pub blood_pressure: Option<String>,
    pub skin_thickness: Option<String>,
    pub insulin: Option<String>,
    pub bmi: Option<String>,
    pub diabetes_pedigree_function: Option<String>,
    pub age: Option<String>,
}

/// Form field metadata: name, label, step
pub const FORM_FIELDS: [(&str, &str, &str); 8] = [
    ("pregnancies", "Number of pregnancies", "1"),
    ("glucose", "Plasma glucose", "any"),
    ("blood_pressure", "Diastolic blood pressure (mm Hg)", "any"),
    ("skin_thickness", "Triceps skin fold thickness (mm)", "any"),
    ("insulin", "2-hour serum insulin (mu U/ml)", "any"),
    ("bmi", "Body mass index", "any"),
    ("diabetes_pedigree_function", "Diabetes pedigree function", "0.001"),
    ("age", "Age (years)", "1"),
];

impl PatientForm {
    /// Raw text for each field in form order, used to re-fill the form
    pub fn raw_values(&self) -> [Option<&str>; 8] {
        [
            self.pregnancies.as_deref(),
            self.glucose.as_deref(),
            self.blood_pressure.as_deref(),
            self.skin_thickness.as_deref(),
            self.insulin.as_deref(),
            self.bmi.as_deref(),
            self.diabetes_pedigree_function.as_deref(),
            self.age.as_deref(),
        ]
    }

    /// Parse the text fields. Blank fields stay absent so the assembler
    /// reports them as missing.
    pub fn to_input(&self) -> Result<PatientInput, ValidationError> {
        Ok(PatientInput {
            pregnancies: parse("pregnancies", &self.pregnancies)?,
            glucose: parse("glucose", &self.glucose)?,
            blood_pressure: parse("blood_pressure", &self.blood_pressure)?,
            skin_thickness: parse("skin_thickness", &self.skin_thickness)?,
            insulin: parse("insulin", &self.insulin)?,
            bmi: parse("bmi", &self.bmi)?,
            diabetes_pedigree_function: parse(
                "diabetes_pedigree_function",
                &self.diabetes_pedigree_function,
            )?,
            age: parse("age", &self.age)?,
        })
    }
}

fn parse(field: &'static str, raw: &Option<String>) -> Result<Option<f64>, ValidationError> {
    match raw {
        Some(text) => parse_field(field, text),
        None => Ok(None),
    }
}
