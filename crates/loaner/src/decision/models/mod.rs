//! Serialized linear predictors exported by the offline training pipeline.
//!
//! An artifact carries the fitted intercept, one coefficient per numeric column (with the
//! centering and scaling applied during training), and one coefficient per known level of
//! each categorical column. Levels not seen during training contribute nothing.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::domain::{FeatureRecord, CATEGORICAL_FEATURES, NUMERIC_FEATURES};
use super::predictor::{
    AmountPrediction, AmountPredictor, EligibilityPrediction, EligibilityPredictor,
    PredictorError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Logistic,
    Linear,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NumericTerm {
    pub feature: String,
    pub coefficient: f64,
    #[serde(default)]
    pub center: f64,
    #[serde(default = "unit_scale")]
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoricalTerm {
    pub feature: String,
    pub levels: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelArtifact {
    pub kind: ModelKind,
    pub intercept: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub numeric: Vec<NumericTerm>,
    #[serde(default)]
    pub categorical: Vec<CategoricalTerm>,
}

fn unit_scale() -> f64 {
    1.0
}

fn default_threshold() -> f64 {
    0.5
}

impl ModelArtifact {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ModelError> {
        let artifact: ModelArtifact = serde_json::from_reader(reader)?;
        artifact.validate()?;
        Ok(artifact)
    }

    fn validate(&self) -> Result<(), ModelError> {
        for term in &self.numeric {
            if !NUMERIC_FEATURES.contains(&term.feature.as_str()) {
                return Err(ModelError::UnknownFeature(term.feature.clone()));
            }
            if !(term.scale.is_finite() && term.scale > 0.0) {
                return Err(ModelError::InvalidScale(term.feature.clone()));
            }
        }

        for term in &self.categorical {
            if !CATEGORICAL_FEATURES.contains(&term.feature.as_str()) {
                return Err(ModelError::UnknownFeature(term.feature.clone()));
            }
        }

        if self.kind == ModelKind::Logistic && !(0.0..=1.0).contains(&self.threshold) {
            return Err(ModelError::InvalidThreshold(self.threshold));
        }

        Ok(())
    }

    /// Linear predictor `intercept + Σ coefficient · x`.
    pub fn linear_term(&self, features: &FeatureRecord) -> f64 {
        let numeric: f64 = self
            .numeric
            .iter()
            .filter_map(|term| {
                features
                    .numeric(&term.feature)
                    .map(|value| term.coefficient * (value - term.center) / term.scale)
            })
            .sum();

        let categorical: f64 = self
            .categorical
            .iter()
            .filter_map(|term| {
                features
                    .categorical(&term.feature)
                    .and_then(|level| term.levels.get(level))
            })
            .sum();

        self.intercept + numeric + categorical
    }

    fn expect_kind(self, expected: ModelKind) -> Result<Self, ModelError> {
        if self.kind == expected {
            Ok(self)
        } else {
            Err(ModelError::WrongKind {
                expected,
                found: self.kind,
            })
        }
    }
}

/// Logistic-regression classifier: eligible when the probability reaches the threshold.
#[derive(Debug, Clone)]
pub struct LogisticEligibilityModel {
    artifact: ModelArtifact,
}

impl LogisticEligibilityModel {
    pub fn new(artifact: ModelArtifact) -> Result<Self, ModelError> {
        Ok(Self {
            artifact: artifact.expect_kind(ModelKind::Logistic)?,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        Self::new(ModelArtifact::from_path(path)?)
    }

    pub fn probability(&self, features: &FeatureRecord) -> f64 {
        let z = self.artifact.linear_term(features);
        1.0 / (1.0 + (-z).exp())
    }
}

impl EligibilityPredictor for LogisticEligibilityModel {
    fn predict(&self, features: &FeatureRecord) -> Result<EligibilityPrediction, PredictorError> {
        let probability = self.probability(features);
        if probability.is_nan() {
            return Err(PredictorError::InvalidOutput(
                "classifier probability is NaN".to_string(),
            ));
        }

        let label = i64::from(probability >= self.artifact.threshold);
        EligibilityPrediction::from_label(label)
    }
}

/// Linear-regression amount model.
#[derive(Debug, Clone)]
pub struct LinearAmountModel {
    artifact: ModelArtifact,
}

impl LinearAmountModel {
    pub fn new(artifact: ModelArtifact) -> Result<Self, ModelError> {
        Ok(Self {
            artifact: artifact.expect_kind(ModelKind::Linear)?,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        Self::new(ModelArtifact::from_path(path)?)
    }
}

impl AmountPredictor for LinearAmountModel {
    fn predict(&self, features: &FeatureRecord) -> Result<AmountPrediction, PredictorError> {
        AmountPrediction::new(self.artifact.linear_term(features))
    }
}

/// Stand-in installed when an artifact could not be loaded; every call fails.
#[derive(Debug, Clone)]
pub struct UnavailablePredictor {
    reason: String,
}

impl UnavailablePredictor {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl EligibilityPredictor for UnavailablePredictor {
    fn predict(&self, _features: &FeatureRecord) -> Result<EligibilityPrediction, PredictorError> {
        Err(PredictorError::Unavailable(self.reason.clone()))
    }
}

impl AmountPredictor for UnavailablePredictor {
    fn predict(&self, _features: &FeatureRecord) -> Result<AmountPrediction, PredictorError> {
        Err(PredictorError::Unavailable(self.reason.clone()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to read model artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid model artifact: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("model artifact references unknown feature '{0}'")]
    UnknownFeature(String),
    #[error("model artifact has a non-positive scale for '{0}'")]
    InvalidScale(String),
    #[error("model artifact threshold {0} is outside 0..=1")]
    InvalidThreshold(f64),
    #[error("expected a {expected:?} model artifact, found {found:?}")]
    WrongKind { expected: ModelKind, found: ModelKind },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::domain::{ApplicantProfile, ProfileDefaults};

    const CLASSIFIER: &str = r#"{
        "kind": "logistic",
        "intercept": -2.0,
        "numeric": [
            { "feature": "Credit_History", "coefficient": 3.0 },
            { "feature": "ApplicantIncome", "coefficient": 0.5, "center": 4000, "scale": 2000 }
        ],
        "categorical": [
            { "feature": "Property_Area", "levels": { "Urban": 0.25, "Rural": -0.5 } }
        ]
    }"#;

    fn features(credit_history: u8, income: u64, area: &str) -> FeatureRecord {
        ApplicantProfile {
            credit_history: Some(credit_history),
            applicant_income: Some(income),
            property_area: Some(area.to_string()),
            ..ApplicantProfile::default()
        }
        .features(&ProfileDefaults::default())
    }

    #[test]
    fn logistic_model_applies_scaling_and_one_hot_levels() {
        let artifact = ModelArtifact::from_reader(CLASSIFIER.as_bytes()).expect("artifact parses");
        let z = artifact.linear_term(&features(1, 6000, "Urban"));
        assert!((z - (-2.0 + 3.0 + 0.5 + 0.25)).abs() < 1e-9);

        let unseen = artifact.linear_term(&features(1, 4000, "Semiurban"));
        assert!((unseen - 1.0).abs() < 1e-9);

        let model = LogisticEligibilityModel::new(artifact).expect("logistic kind");
        assert_eq!(
            model.predict(&features(1, 6000, "Urban")).expect("predicts"),
            EligibilityPrediction::Eligible
        );
        assert_eq!(
            model.predict(&features(0, 4000, "Rural")).expect("predicts"),
            EligibilityPrediction::Ineligible
        );
    }

    #[test]
    fn linear_model_floors_negative_amounts() {
        let artifact = ModelArtifact::from_reader(
            r#"{ "kind": "linear", "intercept": -50.0,
                 "numeric": [{ "feature": "ApplicantIncome", "coefficient": 0.02 }] }"#
                .as_bytes(),
        )
        .expect("artifact parses");
        let model = LinearAmountModel::new(artifact).expect("linear kind");

        let amount = model.predict(&features(1, 10_000, "Urban")).expect("predicts");
        assert!((amount.value() - 150.0).abs() < 1e-9);

        let floored = model.predict(&features(1, 0, "Urban")).expect("predicts");
        assert_eq!(floored.value(), 0.0);
    }

    #[test]
    fn artifacts_naming_unknown_features_are_rejected() {
        let error = ModelArtifact::from_reader(
            r#"{ "kind": "linear", "intercept": 0.0,
                 "numeric": [{ "feature": "LoanAmount", "coefficient": 1.0 }] }"#
                .as_bytes(),
        )
        .expect_err("unknown feature");
        assert!(matches!(error, ModelError::UnknownFeature(name) if name == "LoanAmount"));
    }

    #[test]
    fn artifact_kind_must_match_the_predictor() {
        let artifact = ModelArtifact::from_reader(CLASSIFIER.as_bytes()).expect("artifact parses");
        let error = LinearAmountModel::new(artifact).expect_err("wrong kind");
        assert!(matches!(
            error,
            ModelError::WrongKind {
                expected: ModelKind::Linear,
                found: ModelKind::Logistic
            }
        ));
    }

    #[test]
    fn missing_artifact_reports_its_path() {
        let error = LogisticEligibilityModel::load("./does-not-exist.json").expect_err("io error");
        match error {
            ModelError::Io { path, .. } => assert!(path.ends_with("does-not-exist.json")),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn unavailable_predictor_always_fails() {
        let predictor = UnavailablePredictor::new("eligibility model missing");
        let record = features(1, 5000, "Urban");
        assert_eq!(
            EligibilityPredictor::predict(&predictor, &record),
            Err(PredictorError::Unavailable(
                "eligibility model missing".to_string()
            ))
        );
        assert!(AmountPredictor::predict(&predictor, &record).is_err());
    }
}
