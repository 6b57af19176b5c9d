//! Fitted binary classifiers exported from the training notebook

use crate::error::InferenceError;
use crate::models::check_columns;
use crate::types::patient::FEATURE_COUNT;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::Deserialize;

/// A fitted binary classifier over scaled feature rows.
///
/// Column 0 of `predict_proba` is the negative class, column 1 the positive.
pub trait Classifier: Send + Sync {
    /// Number of columns the classifier was fitted on
    fn n_features(&self) -> usize;

    /// Class label (0 or 1) for every row
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<u8>, InferenceError>;

    /// Probability distribution over {negative, positive} for every row
    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, InferenceError>;

    /// Labels and probabilities together. Backends that produce both from
    /// one evaluation override this to avoid scoring each row twice.
    fn predict_with_proba(
        &self,
        x: ArrayView2<'_, f64>,
    ) -> Result<(Array1<u8>, Array2<f64>), InferenceError> {
        Ok((self.predict(x)?, self.predict_proba(x)?))
    }
}

/// Serialized classifier document, tagged by `kind`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
}

impl ClassifierArtifact {
    /// Check fitted parameters before the artifact is put into service
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ClassifierArtifact::LogisticRegression(m) => m.validate(),
            ClassifierArtifact::RandomForest(m) => m.validate(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClassifierArtifact::LogisticRegression(_) => "logistic_regression",
            ClassifierArtifact::RandomForest(_) => "random_forest",
        }
    }
}

impl Classifier for ClassifierArtifact {
    fn n_features(&self) -> usize {
        match self {
            ClassifierArtifact::LogisticRegression(m) => m.n_features(),
            ClassifierArtifact::RandomForest(m) => m.n_features(),
        }
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<u8>, InferenceError> {
        match self {
            ClassifierArtifact::LogisticRegression(m) => m.predict(x),
            ClassifierArtifact::RandomForest(m) => m.predict(x),
        }
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, InferenceError> {
        match self {
            ClassifierArtifact::LogisticRegression(m) => m.predict_proba(x),
            ClassifierArtifact::RandomForest(m) => m.predict_proba(x),
        }
    }
}

/// Binary logistic regression: `p1 = sigmoid(coef . x + intercept)`
#[derive(Debug, Clone, Deserialize)]
pub struct LogisticRegression {
    pub coef: Vec<f64>,
    pub intercept: f64,
}

impl LogisticRegression {
    fn validate(&self) -> Result<(), String> {
        if self.coef.len() != FEATURE_COUNT {
            return Err(format!(
                "coef has {} entries, expected {FEATURE_COUNT}",
                self.coef.len()
            ));
        }
        if self.coef.iter().any(|c| !c.is_finite()) || !self.intercept.is_finite() {
            return Err("coefficients must be finite".to_string());
        }
        Ok(())
    }

    fn decision_function(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, InferenceError> {
        check_columns(x, self.n_features())?;
        let coef = ArrayView1::from(&self.coef[..]);
        Ok(x.dot(&coef) + self.intercept)
    }
}

impl Classifier for LogisticRegression {
    fn n_features(&self) -> usize {
        self.coef.len()
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<u8>, InferenceError> {
        Ok(self.decision_function(x)?.mapv(|d| u8::from(d > 0.0)))
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, InferenceError> {
        let decision = self.decision_function(x)?;
        let mut proba = Array2::zeros((decision.len(), 2));
        for (mut row, d) in proba.rows_mut().into_iter().zip(decision.iter()) {
            let positive = sigmoid(*d);
            row[0] = 1.0 - positive;
            row[1] = positive;
        }
        Ok(proba)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Marker the exporter writes for "no child" / "no split feature"
const LEAF: i64 = -1;

/// One binary decision tree in flattened, parallel-array form.
///
/// Node `i` is a leaf when `children_left[i] == -1`; otherwise rows with
/// `x[feature[i]] <= threshold[i]` go left. `value[i]` holds the class
/// weights (negative, positive) seen at the node during fitting.
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<[f64; 2]>,
}

impl DecisionTree {
    fn validate(&self) -> Result<(), String> {
        let n = self.children_left.len();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err("tree arrays differ in length".to_string());
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF || right == LEAF {
                if left != right {
                    return Err(format!("node {node} has exactly one child"));
                }
                let [neg, pos] = self.value[node];
                if !(neg >= 0.0 && pos >= 0.0 && neg + pos > 0.0) {
                    return Err(format!("leaf {node} has no usable class weights"));
                }
                continue;
            }
            // Children always point forward, which also rules out cycles
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(format!("node {node} has out-of-order child {child}"));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature >= FEATURE_COUNT as i64 {
                return Err(format!("node {node} splits on unknown feature {feature}"));
            }
            if !self.threshold[node].is_finite() {
                return Err(format!("node {node} has a non-finite threshold"));
            }
        }
        Ok(())
    }

    /// Normalized class weights of the leaf `row` falls into
    fn leaf_proba(&self, row: ArrayView1<'_, f64>) -> [f64; 2] {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let feature = self.feature[node] as usize;
            node = if row[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        let [neg, pos] = self.value[node];
        let total = neg + pos;
        [neg / total, pos / total]
    }
}

/// Averaging ensemble of decision trees
#[derive(Debug, Clone, Deserialize)]
pub struct RandomForest {
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| format!("tree {idx}: {e}"))?;
        }
        Ok(())
    }
}

impl Classifier for RandomForest {
    fn n_features(&self) -> usize {
        FEATURE_COUNT
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<u8>, InferenceError> {
        // Ties go to the negative class, as argmax picks the first maximum
        let proba = self.predict_proba(x)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| u8::from(row[1] > row[0]))
            .collect())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, InferenceError> {
        check_columns(x, self.n_features())?;
        let n_trees = self.trees.len() as f64;
        let mut proba = Array2::zeros((x.nrows(), 2));
        for (row, mut out) in x.rows().into_iter().zip(proba.rows_mut()) {
            let mut sum = [0.0, 0.0];
            for tree in &self.trees {
                let [neg, pos] = tree.leaf_proba(row);
                sum[0] += neg;
                sum[1] += pos;
            }
            out[0] = sum[0] / n_trees;
            out[1] = sum[1] / n_trees;
        }
        Ok(proba)
    }
}
