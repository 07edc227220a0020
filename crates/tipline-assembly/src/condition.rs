//! Condition mini-language gating custom statements.
//!
//! Grammar:
//!   - empty string            -> always true
//!   - esp_name == "X"         -> case-insensitive substring match
//!   - esp_name in ["A", "B"]  -> true if any listed value matches
//!
//! Evaluation of a stored raw condition fails closed: a statement with a
//! malformed condition is omitted, never included by accident.

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConditionError {
    #[error("unknown condition field: {0}")]
    UnknownField(String),
    #[error("malformed condition: {0}")]
    Malformed(String),
}

/// The only field the mini-language currently exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    EspName,
}

impl Field {
    fn parse(name: &str) -> Result<Self, ConditionError> {
        match name {
            "esp_name" => Ok(Field::EspName),
            other => Err(ConditionError::UnknownField(other.to_string())),
        }
    }
}

/// Parsed condition expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Always,
    Equals { field: Field, literal: String },
    OneOf { field: Field, literals: Vec<String> },
}

impl Condition {
    pub fn parse(raw: &str) -> Result<Self, ConditionError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Condition::Always);
        }

        let equals = Regex::new(r#"^(\w+)\s*==\s*"([^"]*)"$"#).unwrap();
        if let Some(caps) = equals.captures(raw) {
            return Ok(Condition::Equals {
                field: Field::parse(&caps[1])?,
                literal: caps[2].to_string(),
            });
        }

        let one_of = Regex::new(r#"^(\w+)\s+in\s+\[([^\]]*)\]$"#).unwrap();
        if let Some(caps) = one_of.captures(raw) {
            let field = Field::parse(&caps[1])?;
            let literal = Regex::new(r#""([^"]*)""#).unwrap();
            let literals: Vec<String> = literal
                .captures_iter(&caps[2])
                .map(|c| c[1].to_string())
                .collect();
            if literals.is_empty() {
                return Err(ConditionError::Malformed(raw.to_string()));
            }
            return Ok(Condition::OneOf { field, literals });
        }

        Err(ConditionError::Malformed(raw.to_string()))
    }

    /// Substring containment, case-insensitive, so stored values like
    /// "Facebook" match reports from "Facebook, Inc.".
    pub fn matches(&self, esp_name: &str) -> bool {
        let subject = esp_name.to_lowercase();
        match self {
            Condition::Always => true,
            Condition::Equals { literal, .. } => subject.contains(&literal.to_lowercase()),
            Condition::OneOf { literals, .. } => literals
                .iter()
                .any(|lit| subject.contains(&lit.to_lowercase())),
        }
    }

    /// Parse-and-match for stored raw conditions. Malformed input logs a
    /// warning and evaluates false.
    pub fn evaluate(raw: &str, esp_name: &str) -> bool {
        match Condition::parse(raw) {
            Ok(cond) => cond.matches(esp_name),
            Err(err) => {
                tracing::warn!(condition = raw, %err, "skipping statement with bad condition");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_condition_always_matches() {
        assert_eq!(Condition::parse("").unwrap(), Condition::Always);
        assert!(Condition::evaluate("", "Anything"));
        assert!(Condition::evaluate("   ", ""));
    }

    #[test]
    fn equals_is_case_insensitive_substring() {
        let cond = Condition::parse(r#"esp_name == "Facebook""#).unwrap();
        assert!(cond.matches("Facebook"));
        assert!(cond.matches("facebook, inc."));
        assert!(!cond.matches("Instagram"));
    }

    #[test]
    fn one_of_matches_any_listed_value() {
        let cond = Condition::parse(r#"esp_name in ["Instagram, Inc.", "Facebook"]"#).unwrap();
        assert!(cond.matches("Facebook"));
        assert!(cond.matches("Instagram, Inc."));
        assert!(!cond.matches("Snapchat"));
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert_eq!(
            Condition::parse(r#"report_id == "1""#),
            Err(ConditionError::UnknownField("report_id".to_string()))
        );
    }

    #[test]
    fn malformed_input_fails_closed() {
        assert!(Condition::parse("esp_name ==").is_err());
        assert!(Condition::parse(r#"esp_name in []"#).is_err());
        assert!(!Condition::evaluate("esp_name ==", "Facebook"));
        assert!(!Condition::evaluate("nonsense", "Facebook"));
    }
}
