//! Applicant input as it arrives at the boundary, the validated profile, and the canonical
//! feature record shared by the predictors and the credit-score estimator.

use serde::{Deserialize, Serialize};

/// Loan type used for offer lookup when the request names none.
pub const DEFAULT_LOAN_TYPE: &str = "Home Loan";

/// Numeric columns of [`FeatureRecord`], by request field name.
pub const NUMERIC_FEATURES: [&str; 4] = [
    "ApplicantIncome",
    "CoapplicantIncome",
    "Loan_Amount_Term",
    "Credit_History",
];

/// Categorical columns of [`FeatureRecord`], by request field name.
pub const CATEGORICAL_FEATURES: [&str; 6] = [
    "Gender",
    "Married",
    "Dependents",
    "Education",
    "Self_Employed",
    "Property_Area",
];

/// Raw value of one request field before coercion.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    /// Integers above `i64::MAX`; always out of range for a field.
    Unsigned(u64),
    Float(f64),
    Text(String),
    Other(serde_json::Value),
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Flat applicant payload accepted by the HTTP and CLI boundaries.
///
/// Every field is optional; `null` is treated the same as an absent key.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LoanApplication {
    #[serde(rename = "Gender", default)]
    pub gender: Option<FieldValue>,
    #[serde(rename = "Married", default)]
    pub married: Option<FieldValue>,
    #[serde(rename = "Dependents", default)]
    pub dependents: Option<FieldValue>,
    #[serde(rename = "Education", default)]
    pub education: Option<FieldValue>,
    #[serde(rename = "Self_Employed", default)]
    pub self_employed: Option<FieldValue>,
    #[serde(rename = "ApplicantIncome", default)]
    pub applicant_income: Option<FieldValue>,
    #[serde(rename = "CoapplicantIncome", default)]
    pub coapplicant_income: Option<FieldValue>,
    #[serde(rename = "Loan_Amount_Term", default)]
    pub loan_amount_term: Option<FieldValue>,
    #[serde(rename = "Credit_History", default)]
    pub credit_history: Option<FieldValue>,
    #[serde(rename = "Property_Area", default)]
    pub property_area: Option<FieldValue>,
    #[serde(rename = "DesiredLoanAmount", default)]
    pub desired_loan_amount: Option<FieldValue>,
    #[serde(rename = "LoanType", default)]
    pub loan_type: Option<FieldValue>,
}

impl LoanApplication {
    /// Coerce every present field, failing on the first one that cannot be interpreted.
    pub fn validate(self) -> Result<LoanRequest, ValidationError> {
        let profile = ApplicantProfile {
            gender: optional_text("Gender", self.gender)?,
            married: optional_text("Married", self.married)?,
            dependents: optional_text("Dependents", self.dependents)?,
            education: optional_text("Education", self.education)?,
            self_employed: optional_text("Self_Employed", self.self_employed)?,
            applicant_income: optional_amount("ApplicantIncome", self.applicant_income)?,
            coapplicant_income: optional_amount("CoapplicantIncome", self.coapplicant_income)?,
            loan_amount_term: self
                .loan_amount_term
                .map(|value| coerce_term("Loan_Amount_Term", &value))
                .transpose()?,
            credit_history: self
                .credit_history
                .map(|value| coerce_credit_history("Credit_History", &value))
                .transpose()?,
            property_area: optional_text("Property_Area", self.property_area)?,
        };

        let desired_loan_amount =
            optional_amount("DesiredLoanAmount", self.desired_loan_amount)?.unwrap_or(0);
        let loan_type = optional_text("LoanType", self.loan_type)?
            .unwrap_or_else(|| DEFAULT_LOAN_TYPE.to_string());

        Ok(LoanRequest {
            profile,
            loan_type,
            desired_loan_amount,
        })
    }
}

/// Validated request: the profile to decide on plus the offer query.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanRequest {
    pub profile: ApplicantProfile,
    pub loan_type: String,
    /// Informational only; never feeds the decision.
    pub desired_loan_amount: u64,
}

/// Applicant attributes after type coercion. `None` means the caller omitted the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    pub gender: Option<String>,
    pub married: Option<String>,
    pub dependents: Option<String>,
    pub education: Option<String>,
    pub self_employed: Option<String>,
    pub applicant_income: Option<u64>,
    pub coapplicant_income: Option<u64>,
    pub loan_amount_term: Option<u32>,
    pub credit_history: Option<u8>,
    pub property_area: Option<String>,
}

impl ApplicantProfile {
    /// Fill omitted fields from `defaults`, producing the record both predictors receive.
    pub fn features(&self, defaults: &ProfileDefaults) -> FeatureRecord {
        fn text(value: &Option<String>, fallback: &str) -> String {
            value.clone().unwrap_or_else(|| fallback.to_string())
        }

        FeatureRecord {
            gender: text(&self.gender, &defaults.gender),
            married: text(&self.married, &defaults.married),
            dependents: text(&self.dependents, &defaults.dependents),
            education: text(&self.education, &defaults.education),
            self_employed: text(&self.self_employed, &defaults.self_employed),
            applicant_income: self.applicant_income.unwrap_or(defaults.applicant_income),
            coapplicant_income: self
                .coapplicant_income
                .unwrap_or(defaults.coapplicant_income),
            loan_amount_term: self.loan_amount_term.unwrap_or(defaults.loan_amount_term),
            credit_history: self.credit_history.unwrap_or(defaults.credit_history),
            property_area: text(&self.property_area, &defaults.property_area),
        }
    }
}

/// Neutral values substituted for omitted applicant fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDefaults {
    pub gender: String,
    pub married: String,
    pub dependents: String,
    pub education: String,
    pub self_employed: String,
    pub applicant_income: u64,
    pub coapplicant_income: u64,
    pub loan_amount_term: u32,
    pub credit_history: u8,
    pub property_area: String,
}

impl Default for ProfileDefaults {
    fn default() -> Self {
        Self {
            gender: "Male".to_string(),
            married: "No".to_string(),
            dependents: "0".to_string(),
            education: String::new(),
            self_employed: "No".to_string(),
            applicant_income: 0,
            coapplicant_income: 0,
            loan_amount_term: 360,
            credit_history: 0,
            property_area: String::new(),
        }
    }
}

/// Fully populated applicant record, keyed by the request field names when serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureRecord {
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "Married")]
    pub married: String,
    #[serde(rename = "Dependents")]
    pub dependents: String,
    #[serde(rename = "Education")]
    pub education: String,
    #[serde(rename = "Self_Employed")]
    pub self_employed: String,
    #[serde(rename = "ApplicantIncome")]
    pub applicant_income: u64,
    #[serde(rename = "CoapplicantIncome")]
    pub coapplicant_income: u64,
    #[serde(rename = "Loan_Amount_Term")]
    pub loan_amount_term: u32,
    #[serde(rename = "Credit_History")]
    pub credit_history: u8,
    #[serde(rename = "Property_Area")]
    pub property_area: String,
}

impl FeatureRecord {
    pub fn numeric(&self, name: &str) -> Option<f64> {
        match name {
            "ApplicantIncome" => Some(self.applicant_income as f64),
            "CoapplicantIncome" => Some(self.coapplicant_income as f64),
            "Loan_Amount_Term" => Some(f64::from(self.loan_amount_term)),
            "Credit_History" => Some(f64::from(self.credit_history)),
            _ => None,
        }
    }

    pub fn categorical(&self, name: &str) -> Option<&str> {
        match name {
            "Gender" => Some(&self.gender),
            "Married" => Some(&self.married),
            "Dependents" => Some(&self.dependents),
            "Education" => Some(&self.education),
            "Self_Employed" => Some(&self.self_employed),
            "Property_Area" => Some(&self.property_area),
            _ => None,
        }
    }
}

/// A request field that could not be coerced to its expected type or range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn optional_text(
    field: &'static str,
    value: Option<FieldValue>,
) -> Result<Option<String>, ValidationError> {
    value.map(|value| coerce_text(field, value)).transpose()
}

fn optional_amount(
    field: &'static str,
    value: Option<FieldValue>,
) -> Result<Option<u64>, ValidationError> {
    value
        .map(|value| {
            let raw = coerce_integer(field, &value)?;
            u64::try_from(raw)
                .map_err(|_| ValidationError::new(field, format!("must be non-negative, got {raw}")))
        })
        .transpose()
}

fn coerce_text(field: &'static str, value: FieldValue) -> Result<String, ValidationError> {
    match value {
        FieldValue::Text(text) => Ok(text),
        FieldValue::Integer(number) => Ok(number.to_string()),
        FieldValue::Unsigned(number) => Ok(number.to_string()),
        FieldValue::Float(number) => Ok(number.to_string()),
        FieldValue::Other(other) => Err(ValidationError::new(
            field,
            format!("expected text, got {other}"),
        )),
    }
}

/// Integers pass through, floats truncate toward zero, strings must hold a base-10 integer.
/// Values outside the `i64` range are rejected rather than saturated.
fn coerce_integer(field: &'static str, value: &FieldValue) -> Result<i64, ValidationError> {
    match value {
        FieldValue::Integer(number) => Ok(*number),
        FieldValue::Unsigned(number) => i64::try_from(*number)
            .map_err(|_| ValidationError::new(field, format!("{number} is out of range"))),
        FieldValue::Float(number)
            if number.is_finite()
                && number.trunc() >= i64::MIN as f64
                && number.trunc() < i64::MAX as f64 =>
        {
            Ok(number.trunc() as i64)
        }
        FieldValue::Float(number) if number.is_finite() => Err(ValidationError::new(
            field,
            format!("{number} is out of range"),
        )),
        FieldValue::Float(number) => Err(ValidationError::new(
            field,
            format!("expected an integer, got {number}"),
        )),
        FieldValue::Text(text) => text.trim().parse::<i64>().map_err(|_| {
            ValidationError::new(field, format!("expected an integer, got '{text}'"))
        }),
        FieldValue::Other(other) => Err(ValidationError::new(
            field,
            format!("expected an integer, got {other}"),
        )),
    }
}

fn coerce_term(field: &'static str, value: &FieldValue) -> Result<u32, ValidationError> {
    let raw = coerce_integer(field, value)?;
    match u32::try_from(raw) {
        Ok(term) if term > 0 => Ok(term),
        _ => Err(ValidationError::new(
            field,
            format!("must be a positive number of months, got {raw}"),
        )),
    }
}

fn coerce_credit_history(field: &'static str, value: &FieldValue) -> Result<u8, ValidationError> {
    match coerce_integer(field, value)? {
        0 => Ok(0),
        1 => Ok(1),
        other => Err(ValidationError::new(
            field,
            format!("must be 0 or 1, got {other}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn application(value: serde_json::Value) -> LoanApplication {
        serde_json::from_value(value).expect("payload deserializes")
    }

    #[test]
    fn numeric_fields_accept_numbers_and_numeric_strings() {
        let request = application(json!({
            "ApplicantIncome": "5000",
            "CoapplicantIncome": 1200.9,
            "Loan_Amount_Term": " 180 ",
            "Credit_History": 1,
        }))
        .validate()
        .expect("coerces");

        assert_eq!(request.profile.applicant_income, Some(5000));
        assert_eq!(request.profile.coapplicant_income, Some(1200));
        assert_eq!(request.profile.loan_amount_term, Some(180));
        assert_eq!(request.profile.credit_history, Some(1));
    }

    #[test]
    fn non_numeric_income_is_rejected_with_field_name() {
        let error = application(json!({ "ApplicantIncome": "lots" }))
            .validate()
            .expect_err("rejected");

        assert_eq!(error.field, "ApplicantIncome");
        assert!(error.to_string().contains("lots"));
    }

    #[test]
    fn range_violations_are_rejected() {
        let negative = application(json!({ "CoapplicantIncome": -5 }))
            .validate()
            .expect_err("negative income rejected");
        assert_eq!(negative.field, "CoapplicantIncome");

        let zero_term = application(json!({ "Loan_Amount_Term": 0 }))
            .validate()
            .expect_err("zero term rejected");
        assert_eq!(zero_term.field, "Loan_Amount_Term");

        let credit = application(json!({ "Credit_History": 2 }))
            .validate()
            .expect_err("credit history rejected");
        assert_eq!(credit.field, "Credit_History");

        let boolean = application(json!({ "ApplicantIncome": true }))
            .validate()
            .expect_err("boolean rejected");
        assert_eq!(boolean.field, "ApplicantIncome");
    }

    #[test]
    fn integers_beyond_i64_are_rejected_not_clamped() {
        let request: LoanApplication =
            serde_json::from_str(r#"{ "ApplicantIncome": 18446744073709551615 }"#)
                .expect("payload deserializes");
        let error = request.validate().expect_err("out of range");
        assert_eq!(error.field, "ApplicantIncome");
        assert!(error.to_string().contains("out of range"));

        let error = application(json!({ "CoapplicantIncome": 1.0e30 }))
            .validate()
            .expect_err("out of range");
        assert_eq!(error.field, "CoapplicantIncome");

        let request = application(json!({ "ApplicantIncome": 9_223_372_036_854_775_807_i64 }))
            .validate()
            .expect("largest integer accepted");
        assert_eq!(request.profile.applicant_income, Some(i64::MAX as u64));
    }

    #[test]
    fn null_and_missing_fields_fall_back_to_defaults() {
        let request = application(json!({ "ApplicantIncome": null, "Education": null }))
            .validate()
            .expect("coerces");

        assert_eq!(request.profile, ApplicantProfile::default());
        assert_eq!(request.loan_type, DEFAULT_LOAN_TYPE);
        assert_eq!(request.desired_loan_amount, 0);

        let features = request.profile.features(&ProfileDefaults::default());
        assert_eq!(features.applicant_income, 0);
        assert_eq!(features.loan_amount_term, 360);
        assert_eq!(features.credit_history, 0);
        assert_eq!(features.dependents, "0");
        assert_eq!(features.self_employed, "No");
        assert_eq!(features.education, "");
        assert_eq!(features.property_area, "");
    }

    #[test]
    fn numeric_dependents_are_rendered_as_text() {
        let request = application(json!({ "Dependents": 2, "LoanType": "car" }))
            .validate()
            .expect("coerces");

        assert_eq!(request.profile.dependents.as_deref(), Some("2"));
        assert_eq!(request.loan_type, "car");
    }

    #[test]
    fn malformed_desired_amount_is_still_validated() {
        let error = application(json!({ "DesiredLoanAmount": "a lot" }))
            .validate()
            .expect_err("rejected");
        assert_eq!(error.field, "DesiredLoanAmount");
    }

    #[test]
    fn feature_lookup_by_column_name() {
        let profile = ApplicantProfile {
            applicant_income: Some(4200),
            education: Some("Graduate".to_string()),
            ..ApplicantProfile::default()
        };
        let features = profile.features(&ProfileDefaults::default());

        for name in NUMERIC_FEATURES {
            assert!(features.numeric(name).is_some(), "{name} resolves");
        }
        for name in CATEGORICAL_FEATURES {
            assert!(features.categorical(name).is_some(), "{name} resolves");
        }
        assert_eq!(features.numeric("ApplicantIncome"), Some(4200.0));
        assert_eq!(features.categorical("Education"), Some("Graduate"));
        assert_eq!(features.numeric("Education"), None);
    }
}
