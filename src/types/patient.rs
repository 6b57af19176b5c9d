//! Patient measurement structures

use crate::error::ValidationError;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Number of features the scaler and classifier were fitted on
pub const FEATURE_COUNT: usize = 8;

/// Dataset column names, in the order the scaler and classifier expect them
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
];

/// Submission field names, in the same order as [`FEATURE_COLUMNS`]
pub const FEATURE_FIELDS: [&str; FEATURE_COUNT] = [
    "pregnancies",
    "glucose",
    "blood_pressure",
    "skin_thickness",
    "insulin",
    "bmi",
    "diabetes_pedigree_function",
    "age",
];

/// Raw, unvalidated patient measurements as submitted by a client.
///
/// Every field is optional here; the assembler decides what is acceptable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientInput {
    /// Number of pregnancies
    #[serde(default, alias = "Pregnancies")]
    pub pregnancies: Option<f64>,

    /// Plasma glucose concentration (2 hour oral glucose tolerance test)
    #[serde(default, alias = "Glucose")]
    pub glucose: Option<f64>,

    /// Diastolic blood pressure (mm Hg)
    #[serde(default, alias = "BloodPressure")]
    pub blood_pressure: Option<f64>,

    /// Triceps skin fold thickness (mm)
    #[serde(default, alias = "SkinThickness")]
    pub skin_thickness: Option<f64>,

    /// 2-hour serum insulin (mu U/ml)
    #[serde(default, alias = "Insulin")]
    pub insulin: Option<f64>,

    /// Body mass index
    #[serde(default, alias = "BMI")]
    pub bmi: Option<f64>,

    /// Diabetes pedigree function
    #[serde(default, alias = "DiabetesPedigreeFunction")]
    pub diabetes_pedigree_function: Option<f64>,

    /// Age in years
    #[serde(default, alias = "Age")]
    pub age: Option<f64>,
}

impl PatientInput {
    /// Build a fully populated input in the fixed feature order
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self::from_options(values.map(Some))
    }

    /// Build an input from optional values in the fixed feature order
    pub fn from_options(values: [Option<f64>; FEATURE_COUNT]) -> Self {
        let [
            pregnancies,
            glucose,
            blood_pressure,
            skin_thickness,
            insulin,
            bmi,
            diabetes_pedigree_function,
            age,
        ] = values;
        Self {
            pregnancies,
            glucose,
            blood_pressure,
            skin_thickness,
            insulin,
            bmi,
            diabetes_pedigree_function,
            age,
        }
    }

    /// Read a JSON object field by field.
    ///
    /// Each field may use its snake_case name or the dataset column name.
    /// Numbers and numeric strings are accepted; anything else is reported
    /// against the field that carried it.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let object = body.as_object().ok_or_else(|| ValidationError::MalformedBody {
            reason: "expected a JSON object".to_string(),
        })?;

        let mut values = [None; FEATURE_COUNT];
        for ((slot, field), column) in values.iter_mut().zip(FEATURE_FIELDS).zip(FEATURE_COLUMNS) {
            let raw = object.get(field).or_else(|| object.get(column));
            *slot = match raw {
                None | Some(Value::Null) => None,
                Some(Value::Number(n)) => n.as_f64(),
                Some(Value::String(text)) => parse_field(field, text)?,
                Some(other) => {
                    return Err(ValidationError::Unparseable {
                        field,
                        raw: other.to_string(),
                    })
                }
            };
        }
        Ok(Self::from_options(values))
    }
}

/// Parse one submitted text value. Blank text counts as absent.
pub fn parse_field(field: &'static str, raw: &str) -> Result<Option<f64>, ValidationError> {
    match raw.trim() {
        "" => Ok(None),
        text => text
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ValidationError::Unparseable {
                field,
                raw: text.to_string(),
            }),
    }
}

/// A validated patient observation.
///
/// Only the assembler constructs these, so every instance has all eight
/// fields present, finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    pub(crate) pregnancies: u32,
    pub(crate) glucose: f64,
    pub(crate) blood_pressure: f64,
    pub(crate) skin_thickness: f64,
    pub(crate) insulin: f64,
    pub(crate) bmi: f64,
    pub(crate) diabetes_pedigree_function: f64,
    pub(crate) age: u32,
}

impl FeatureVector {
    pub fn pregnancies(&self) -> u32 {
        self.pregnancies
    }

    pub fn glucose(&self) -> f64 {
        self.glucose
    }

    pub fn blood_pressure(&self) -> f64 {
        self.blood_pressure
    }

    pub fn skin_thickness(&self) -> f64 {
        self.skin_thickness
    }

    pub fn insulin(&self) -> f64 {
        self.insulin
    }

    pub fn bmi(&self) -> f64 {
        self.bmi
    }

    pub fn diabetes_pedigree_function(&self) -> f64 {
        self.diabetes_pedigree_function
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    /// Values in the fixed column order of [`FEATURE_COLUMNS`]
    pub fn values(&self) -> [f64; FEATURE_COUNT] {
        [
            self.pregnancies as f64,
            self.glucose,
            self.blood_pressure,
            self.skin_thickness,
            self.insulin,
            self.bmi,
            self.diabetes_pedigree_function,
            self.age as f64,
        ]
    }

    /// Single-row matrix (1 x 8) ready for the scaler
    pub fn to_row(&self) -> Array2<f64> {
        let values = self.values();
        Array2::from_shape_fn((1, FEATURE_COUNT), |(_, col)| values[col])
    }
}
