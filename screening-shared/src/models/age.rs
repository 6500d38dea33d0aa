use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when user-supplied age text is not a positive number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("please enter a valid age (got {input:?})")]
pub struct InvalidAge {
    /// The rejected input, as entered.
    pub input: String,
}

/// A validated age, kept in the textual form the user entered.
///
/// The text is what gets staged and sent to the server; the numeric value is
/// only used for validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Age {
    raw: String,
    value: f64,
}

impl Age {
    /// Validate `input` as an age.
    ///
    /// # Errors
    /// Returns [`InvalidAge`] when the trimmed input is empty, not numeric,
    /// not finite, or not greater than zero.
    pub fn parse(input: &str) -> Result<Self, InvalidAge> {
        let raw = input.trim();
        let invalid = || InvalidAge {
            input: input.to_string(),
        };

        let value: f64 = raw.parse().map_err(|_| invalid())?;
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid());
        }

        Ok(Self {
            raw: raw.to_string(),
            value,
        })
    }

    /// The age as entered, trimmed.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Returns `true` when `input` parses as a number greater than zero.
#[must_use]
pub fn is_valid_age(input: &str) -> bool {
    Age::parse(input).is_ok()
}

impl FromStr for Age {
    type Err = InvalidAge;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for Age {
    type Error = InvalidAge;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Age> for String {
    fn from(age: Age) -> Self {
        age.raw
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
