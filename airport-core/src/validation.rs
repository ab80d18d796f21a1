use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Key used for errors that belong to the whole object rather than one field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

pub const REQUIRED: &str = "This field is required.";

/// Field-keyed validation messages, rendered as `{"field": ["message", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single-field error.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Records `message` under `field`; a repeated message is kept once.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let message = message.into();
        let messages = self.0.entry(field.into()).or_default();
        if !messages.contains(&message) {
            messages.push(message);
        }
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.0 {
            for message in messages {
                self.add(field.clone(), message);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when nothing was collected.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Checks a required text field: trimmed, non-empty, at most `max` chars.
    pub fn check_text(&mut self, field: &str, value: &str, max: usize) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.add(field, REQUIRED);
        } else if trimmed.chars().count() > max {
            self.add(field, format!("Ensure this field has no more than {} characters.", max));
        }
    }

    pub fn check_positive(&mut self, field: &str, value: i32) {
        if value <= 0 {
            self.add(field, "Ensure this value is greater than 0.");
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_field_map() {
        let mut errors = ValidationErrors::new();
        errors.add("row", "bad row");
        errors.add("row", "still bad");
        errors.add("seat", "bad seat");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({
            "row": ["bad row", "still bad"],
            "seat": ["bad seat"],
        }));
    }

    #[test]
    fn test_repeated_messages_are_kept_once() {
        let mut errors = ValidationErrors::single("row", "bad row");
        errors.merge(ValidationErrors::single("row", "bad row"));
        assert_eq!(errors.messages("row").len(), 1);
    }

    #[test]
    fn test_check_text_limits() {
        let mut errors = ValidationErrors::new();
        errors.check_text("name", "   ", 10);
        errors.check_text("code", "ABCDEFGHIJK", 8);
        errors.check_text("city", "Anaa", 255);

        assert_eq!(errors.messages("name"), [REQUIRED]);
        assert_eq!(errors.messages("code"), ["Ensure this field has no more than 8 characters."]);
        assert!(!errors.has("city"));
    }

    #[test]
    fn test_into_result() {
        assert!(ValidationErrors::new().into_result().is_ok());
        assert!(ValidationErrors::single("x", "y").into_result().is_err());
    }
}
