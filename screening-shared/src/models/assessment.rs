use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

const LOW_LIKELIHOOD_MESSAGE: &str = "Based on the assessment, there is a low likelihood of Autism Spectrum Disorder (ASD). However, this is not a clinical diagnosis. If you have concerns, please consult with a healthcare professional.";
const INDICATORS_PRESENT_MESSAGE: &str = "Based on the assessment, there may be indicators of Autism Spectrum Disorder (ASD). This is not a clinical diagnosis. We strongly recommend consulting with a qualified healthcare professional for a comprehensive evaluation.";

/// Request body for `POST /predict`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub age: String,
    pub responses: Vec<String>,
}

/// Successful response from `POST /predict`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: Prediction,
    pub age_group: String,
}

/// The screening outcome as returned by the server.
///
/// The server sends a number today but has been seen sending strings, so the
/// value is kept in its canonical text form: `0` and `"0"` both stage as `"0"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction(String);

impl Prediction {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Loose comparison with zero: any text that reads as the number zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0
            .trim()
            .parse::<f64>()
            .is_ok_and(|value| value == 0.0)
    }

    #[must_use]
    pub fn outcome(&self) -> Outcome {
        if self.is_zero() {
            Outcome::LowLikelihood
        } else {
            Outcome::IndicatorsPresent
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Prediction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Prediction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(text) => Ok(Self(text)),
            serde_json::Value::Number(number) => Ok(Self(number.to_string())),
            serde_json::Value::Bool(flag) => Ok(Self(if flag { "1" } else { "0" }.to_string())),
            other => Err(de::Error::custom(format!(
                "expected a number, string or boolean, got {other}"
            ))),
        }
    }
}

/// What a prediction means for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    LowLikelihood,
    IndicatorsPresent,
}

impl Outcome {
    /// The full result-screen message.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::LowLikelihood => LOW_LIKELIHOOD_MESSAGE,
            Self::IndicatorsPresent => INDICATORS_PRESENT_MESSAGE,
        }
    }

    /// The one-line form used in assessment history.
    #[must_use]
    pub fn summary(self) -> &'static str {
        match self {
            Self::LowLikelihood => "Low likelihood of ASD",
            Self::IndicatorsPresent => "Indicators of ASD present",
        }
    }

    /// Whether the nearby care provider lookup applies.
    #[must_use]
    pub fn suggests_providers(self) -> bool {
        matches!(self, Self::IndicatorsPresent)
    }
}

/// One entry of `GET /user/assessments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub id: i64,
    pub age: serde_json::Value,
    pub age_group: String,
    /// Stored answers as `"1"`/`"0"`; the server may send them as numbers or booleans.
    #[serde(default, deserialize_with = "answer_texts")]
    pub responses: Vec<String>,
    pub prediction: Prediction,
    pub created_at: String,
}

fn answer_texts<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let answers = Vec::<Prediction>::deserialize(deserializer)?;
    Ok(answers.into_iter().map(|answer| answer.0).collect())
}

impl AssessmentRecord {
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.prediction.outcome()
    }

    /// The age as the server sent it, without JSON quoting.
    #[must_use]
    pub fn age_display(&self) -> String {
        match &self.age {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }

    /// `created_at` as `October 19, 2026, 03:04 PM`; the raw value when it
    /// is not an ISO-8601 timestamp.
    #[must_use]
    pub fn created_at_display(&self) -> String {
        const FORMAT: &str = "%B %-d, %Y, %I:%M %p";

        if let Ok(naive) = NaiveDateTime::parse_from_str(&self.created_at, "%Y-%m-%dT%H:%M:%S%.f") {
            return naive.format(FORMAT).to_string();
        }
        if let Ok(stamped) = DateTime::parse_from_rfc3339(&self.created_at) {
            return stamped.format(FORMAT).to_string();
        }
        self.created_at.clone()
    }
}
