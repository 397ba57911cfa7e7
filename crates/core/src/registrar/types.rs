//! Registrar call outcomes.

use serde::{Deserialize, Serialize};

use crate::record::ResultFields;

/// What a registrar call produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Outcome {
    /// The call succeeded and returned result fields.
    Results(ResultFields),
    /// Accepted but not processed yet; nothing to record.
    Pending,
    /// The registrar (or the transport) reported errors.
    Errors(Vec<String>),
}

impl Outcome {
    /// Shorthand for a single error message.
    pub fn error(message: impl Into<String>) -> Self {
        Outcome::Errors(vec![message.into()])
    }

    /// Metric label for this outcome.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Results(_) => "results",
            Outcome::Pending => "pending",
            Outcome::Errors(_) => "errors",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serialization() {
        let mut fields = ResultFields::new();
        fields.insert("erz_accession".to_string(), "ERZ1".to_string());
        let json = serde_json::to_value(Outcome::Results(fields)).unwrap();
        assert_eq!(json["type"], "results");
        assert_eq!(json["data"]["erz_accession"], "ERZ1");

        let json = serde_json::to_value(Outcome::Pending).unwrap();
        assert_eq!(json["type"], "pending");
    }

    #[test]
    fn test_error_shorthand() {
        assert_eq!(
            Outcome::error("boom"),
            Outcome::Errors(vec!["boom".to_string()])
        );
        assert_eq!(Outcome::error("boom").label(), "errors");
    }
}
