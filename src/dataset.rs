//! Reference dataset used for the exploratory analysis tab

use crate::types::patient::{FEATURE_COLUMNS, FEATURE_COUNT};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Column name of the ground-truth label
pub const OUTCOME_COLUMN: &str = "Outcome";

/// One row of the reference dataset
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PatientRecord {
    #[serde(rename = "Pregnancies")]
    pub pregnancies: f64,
    #[serde(rename = "Glucose")]
    pub glucose: f64,
    #[serde(rename = "BloodPressure")]
    pub blood_pressure: f64,
    #[serde(rename = "SkinThickness")]
    pub skin_thickness: f64,
    #[serde(rename = "Insulin")]
    pub insulin: f64,
    #[serde(rename = "BMI")]
    pub bmi: f64,
    #[serde(rename = "DiabetesPedigreeFunction")]
    pub diabetes_pedigree_function: f64,
    #[serde(rename = "Age")]
    pub age: f64,
    /// Ground truth, display only
    #[serde(rename = "Outcome")]
    pub outcome: u8,
}

impl PatientRecord {
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [
            self.pregnancies,
            self.glucose,
            self.blood_pressure,
            self.skin_thickness,
            self.insulin,
            self.bmi,
            self.diabetes_pedigree_function,
            self.age,
        ]
    }
}

/// The tabular dataset the model was trained on, held read-only
#[derive(Debug, Clone)]
pub struct ReferenceDataset {
    records: Vec<PatientRecord>,
}

impl ReferenceDataset {
    /// Read a CSV whose header is exactly the eight feature columns plus `Outcome`
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let mut reader = csv::Reader::from_path(path.as_ref()).map_err(|e| e.to_string())?;

        let headers = reader.headers().map_err(|e| e.to_string())?.clone();
        let expected: Vec<&str> = FEATURE_COLUMNS
            .iter()
            .copied()
            .chain(std::iter::once(OUTCOME_COLUMN))
            .collect();
        let found: Vec<&str> = headers.iter().map(str::trim).collect();
        if found != expected {
            return Err(format!(
                "unexpected columns [{}], expected [{}]",
                found.join(", "),
                expected.join(", ")
            ));
        }

        let records = reader
            .deserialize::<PatientRecord>()
            .enumerate()
            .map(|(idx, row)| row.map_err(|e| format!("row {}: {e}", idx + 1)))
            .collect::<Result<Vec<_>, String>>()?;

        if let Some(bad) = records.iter().position(|r| r.outcome > 1) {
            return Err(format!("row {}: Outcome must be 0 or 1", bad + 1));
        }

        Ok(Self { records })
    }

    pub fn from_records(records: Vec<PatientRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[PatientRecord] {
        &self.records
    }

    /// Descriptive statistics for the exploratory analysis tab
    pub fn summary(&self) -> DatasetSummary {
        let columns = (0..FEATURE_COUNT)
            .map(|col| {
                let values: Vec<f64> = self.records.iter().map(|r| r.features()[col]).collect();
                ColumnStats::from_values(FEATURE_COLUMNS[col], &values)
            })
            .collect();

        let positives = self.records.iter().filter(|r| r.outcome == 1).count();

        DatasetSummary {
            rows: self.records.len(),
            positives,
            negatives: self.records.len() - positives,
            columns,
            mean_by_outcome: [self.means_for(0), self.means_for(1)],
        }
    }

    fn means_for(&self, outcome: u8) -> Option<[f64; FEATURE_COUNT]> {
        let group: Vec<&PatientRecord> =
            self.records.iter().filter(|r| r.outcome == outcome).collect();
        if group.is_empty() {
            return None;
        }
        let mut sums = [0.0; FEATURE_COUNT];
        for record in &group {
            for (sum, value) in sums.iter_mut().zip(record.features()) {
                *sum += value;
            }
        }
        Some(sums.map(|s| s / group.len() as f64))
    }
}

/// Whole-dataset statistics
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub positives: usize,
    pub negatives: usize,
    pub columns: Vec<ColumnStats>,
    /// Per-feature means for Outcome = 0 and Outcome = 1
    pub mean_by_outcome: [Option<[f64; FEATURE_COUNT]>; 2],
}

impl DatasetSummary {
    /// Share of rows with a positive outcome (0.0 - 1.0)
    pub fn positive_rate(&self) -> f64 {
        if self.rows == 0 {
            0.0
        } else {
            self.positives as f64 / self.rows as f64
        }
    }
}

/// Descriptive statistics for one column
#[derive(Debug, Clone, Serialize)]
pub struct ColumnStats {
    pub name: &'static str,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1)
    pub std: f64,
    pub min: f64,
    pub median: f64,
    pub max: f64,
    /// Rows where the value is exactly zero
    pub zeros: usize,
}

impl ColumnStats {
    fn from_values(name: &'static str, values: &[f64]) -> Self {
        let count = values.len();
        if count == 0 {
            return Self {
                name,
                count,
                mean: 0.0,
                std: 0.0,
                min: 0.0,
                median: 0.0,
                max: 0.0,
                zeros: 0,
            };
        }

        let mean = values.iter().sum::<f64>() / count as f64;
        let std = if count > 1 {
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            var.sqrt()
        } else {
            0.0
        };

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let median = if count % 2 == 0 {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        } else {
            sorted[count / 2]
        };

        Self {
            name,
            count,
            mean,
            std,
            min: sorted[0],
            median,
            max: sorted[count - 1],
            zeros: values.iter().filter(|v| **v == 0.0).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "Pregnancies,Glucose,BloodPressure,SkinThickness,Insulin,BMI,DiabetesPedigreeFunction,Age,Outcome";

    fn write_csv(body: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diabetes.csv");
        std::fs::write(&path, body).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_and_summarize() {
        let (_dir, path) = write_csv(&format!(
            "{HEADER}\n6,148,72,35,0,33.6,0.627,50,1\n1,85,66,29,0,26.6,0.351,31,0\n8,183,64,0,0,23.3,0.672,32,1\n"
        ));
        let dataset = ReferenceDataset::from_csv(&path).unwrap();
        assert_eq!(dataset.len(), 3);

        let summary = dataset.summary();
        assert_eq!(summary.positives, 2);
        assert_eq!(summary.negatives, 1);
        assert!((summary.positive_rate() - 2.0 / 3.0).abs() < 1e-12);

        let glucose = &summary.columns[1];
        assert_eq!(glucose.name, "Glucose");
        assert_eq!(glucose.min, 85.0);
        assert_eq!(glucose.median, 148.0);
        assert_eq!(glucose.max, 183.0);
        assert!((glucose.mean - 138.666_666_666_666_66).abs() < 1e-9);

        let insulin = &summary.columns[4];
        assert_eq!(insulin.zeros, 3);

        let positive_means = summary.mean_by_outcome[1].unwrap();
        assert_eq!(positive_means[0], 7.0);
    }

    #[test]
    fn test_wrong_header_rejected() {
        let (_dir, path) = write_csv("Glucose,Age,Outcome\n100,30,0\n");
        let err = ReferenceDataset::from_csv(&path).unwrap_err();
        assert!(err.contains("unexpected columns"), "{err}");
    }

    #[test]
    fn test_bad_outcome_rejected() {
        let (_dir, path) = write_csv(&format!("{HEADER}\n1,85,66,29,0,26.6,0.351,31,2\n"));
        assert!(ReferenceDataset::from_csv(&path).is_err());
    }

    #[test]
    fn test_missing_file_reported() {
        assert!(ReferenceDataset::from_csv("does/not/exist.csv").is_err());
    }

    #[test]
    fn test_empty_dataset_summary() {
        let summary = ReferenceDataset::from_records(Vec::new()).summary();
        assert_eq!(summary.rows, 0);
        assert_eq!(summary.positive_rate(), 0.0);
        assert!(summary.mean_by_outcome[0].is_none());
    }
}
