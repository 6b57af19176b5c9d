//! Assembly of validated feature vectors from raw patient input.
//!
//! The assembler is the only place a [`FeatureVector`] is built. It checks each
//! field against its domain and lays the values out in the exact column order
//! the scaler and classifier were fitted on.

use crate::config::ZeroPolicy;
use crate::error::ValidationError;
use crate::types::patient::{FeatureVector, PatientInput, FEATURE_COUNT};

/// Fields where a zero reading usually means "not measured" in the source data
pub const CLINICAL_ZERO_FIELDS: [&str; 5] = [
    "glucose",
    "blood_pressure",
    "skin_thickness",
    "insulin",
    "bmi",
];

/// Validates patient input and builds feature vectors.
#[derive(Debug, Clone, Default)]
pub struct FeatureAssembler {
    zero_policy: ZeroPolicy,
}

impl FeatureAssembler {
    pub fn new(zero_policy: ZeroPolicy) -> Self {
        Self { zero_policy }
    }

    pub fn zero_policy(&self) -> ZeroPolicy {
        self.zero_policy
    }

    /// Validate every field and assemble them in the fixed order.
    ///
    /// Fails on the first field that is absent or outside its domain.
    pub fn assemble(&self, input: &PatientInput) -> Result<FeatureVector, ValidationError> {
        Ok(FeatureVector {
            pregnancies: self.count("pregnancies", input.pregnancies)?,
            glucose: self.measurement("glucose", input.glucose)?,
            blood_pressure: self.measurement("blood_pressure", input.blood_pressure)?,
            skin_thickness: self.measurement("skin_thickness", input.skin_thickness)?,
            insulin: self.measurement("insulin", input.insulin)?,
            bmi: self.measurement("bmi", input.bmi)?,
            diabetes_pedigree_function: self
                .real("diabetes_pedigree_function", input.diabetes_pedigree_function)?,
            age: self.count("age", input.age)?,
        })
    }

    /// Assemble from values already in the fixed column order
    pub fn assemble_values(
        &self,
        values: [f64; FEATURE_COUNT],
    ) -> Result<FeatureVector, ValidationError> {
        self.assemble(&PatientInput::from_values(values))
    }

    /// Non-negative finite real
    fn real(&self, field: &'static str, value: Option<f64>) -> Result<f64, ValidationError> {
        let value = value.ok_or(ValidationError::Missing { field })?;
        if !value.is_finite() {
            return Err(ValidationError::NotFinite { field });
        }
        if value < 0.0 {
            return Err(ValidationError::Negative { field, value });
        }
        // Normalise -0.0 so identical inputs stay bit-identical downstream
        Ok(value + 0.0)
    }

    /// Clinical measurement, subject to the zero policy
    fn measurement(&self, field: &'static str, value: Option<f64>) -> Result<f64, ValidationError> {
        let value = self.real(field, value)?;
        if value == 0.0 && self.zero_policy == ZeroPolicy::Reject {
            return Err(ValidationError::ZeroMeasurement { field });
        }
        Ok(value)
    }

    /// Non-negative whole number
    fn count(&self, field: &'static str, value: Option<f64>) -> Result<u32, ValidationError> {
        let value = self.real(field, value)?;
        if value.fract() != 0.0 || value > u32::MAX as f64 {
            return Err(ValidationError::NotInteger { field, value });
        }
        Ok(value as u32)
    }
}
