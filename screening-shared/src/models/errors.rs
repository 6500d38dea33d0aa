use serde::{Deserialize, Serialize};

/// Error body returned by the API on non-2xx responses: `{ "error": "..." }`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// The server-provided error message, shown verbatim when present.
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorResponse {
    /// Reads an error body from arbitrary JSON; anything without an
    /// `error` string yields an empty response.
    #[must_use]
    pub fn from_value(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// The server message, or `fallback` when the server sent none.
    #[must_use]
    pub fn message_or(&self, fallback: &str) -> String {
        self.error
            .as_deref()
            .filter(|message| !message.trim().is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn server_message_wins_over_fallback() {
        let error = ErrorResponse::from_value(&json!({ "error": "Token is missing" }));
        assert_eq!(error.message_or("Error submitting assessment"), "Token is missing");
    }

    #[test]
    fn fallback_used_when_error_absent_or_blank() {
        assert_eq!(
            ErrorResponse::default().message_or("Invalid credentials"),
            "Invalid credentials"
        );
        assert_eq!(
            ErrorResponse::from_value(&json!({ "error": " " })).message_or("Invalid credentials"),
            "Invalid credentials"
        );
    }

    #[test]
    fn from_value_tolerates_unexpected_bodies() {
        assert_eq!(ErrorResponse::from_value(&json!([1, 2])), ErrorResponse::default());
        assert_eq!(
            ErrorResponse::from_value(&json!({ "error": 5 })),
            ErrorResponse::default()
        );
        assert_eq!(
            ErrorResponse::from_value(&json!({ "error": "Invalid token", "message": "expired" }))
                .error
                .as_deref(),
            Some("Invalid token")
        );
    }
}
