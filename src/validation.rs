// Field validation rules for request payloads.
//
// Messages are client-facing and follow the API's language. Every failing rule
// is collected, so a single response reports all problems at once.

use std::collections::HashMap;
use std::fmt;

/// Accumulated field-level validation failures, in the order they were found
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<(String, String)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: String) {
        self.errors.push((field.to_string(), message));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// First message per field
    pub fn field_errors(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for (field, message) in &self.errors {
            map.entry(field.clone()).or_insert_with(|| message.clone());
        }
        map
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn required(&mut self, field: &str, value: &str) -> bool {
        if value.trim().is_empty() {
            self.add(field, format!("El campo '{}' es requerido", field));
            return false;
        }
        true
    }

    pub fn min_chars(&mut self, field: &str, value: &str, min: usize) {
        if value.chars().count() < min {
            self.add(
                field,
                format!("El campo '{}' debe tener al menos {} caracteres", field, min),
            );
        }
    }

    pub fn max_chars(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.add(
                field,
                format!("El campo '{}' debe tener como máximo {} caracteres", field, max),
            );
        }
    }

    pub fn exact_chars(&mut self, field: &str, value: &str, len: usize) {
        if value.chars().count() != len {
            self.add(
                field,
                format!("El campo '{}' debe tener exactamente {} caracteres", field, len),
            );
        }
    }

    pub fn greater_than(&mut self, field: &str, value: i64, bound: i64) {
        if value <= bound {
            self.add(field, format!("El campo '{}' debe ser mayor que {}", field, bound));
        }
    }

    pub fn at_least(&mut self, field: &str, value: i64, bound: i64) {
        if value < bound {
            self.add(
                field,
                format!("El campo '{}' debe ser mayor o igual que {}", field, bound),
            );
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if !is_email(value) {
            self.add(field, format!("El campo '{}' debe contener un correo válido", field));
        }
    }

    pub fn numeric(&mut self, field: &str, value: &str) {
        if !value.chars().all(|c| c.is_ascii_digit()) {
            self.add(field, format!("El campo '{}' debe ser numérico", field));
        }
    }

    /// Any rule whose failure reads as "wrong format"
    pub fn format(&mut self, field: &str, valid: bool) {
        if !valid {
            self.add(field, format!("El campo '{}' debe presentar un formato válido", field));
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|(_, m)| m.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Implemented by every payload that carries field rules
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Single `@`, non-empty local part, dotted domain without empty labels
pub fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || value.chars().any(char::is_whitespace) {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

/// At least 8 characters with an uppercase letter, a lowercase letter, a digit and
/// an ASCII punctuation symbol
pub fn is_strong_password(value: &str) -> bool {
    value.chars().count() >= 8
        && value.chars().any(char::is_uppercase)
        && value.chars().any(char::is_lowercase)
        && value.chars().any(char::is_numeric)
        && value.chars().any(|c| c.is_ascii_punctuation())
}

/// Exactly 24 hexadecimal characters
pub fn is_object_id(value: &str) -> bool {
    value.len() == 24 && value.chars().all(|c| c.is_ascii_hexdigit())
}
