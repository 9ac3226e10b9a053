use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, FieldError};

fn is_hex_color(value: &str) -> bool {
    lazy_static! {
        static ref HEX_RE: Regex = Regex::new(r"^#([A-Fa-f0-9]{6}|[A-Fa-f0-9]{3})$").unwrap();
    }
    HEX_RE.is_match(value)
}

fn default_color() -> String {
    "#2196F3".into()
}

fn default_icon() -> String {
    "category".into()
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

impl CategoryRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        let name = self.name.trim();
        if name.is_empty() {
            errors.push(FieldError::new("name", "name is required"));
        } else if name.len() > 50 {
            errors.push(FieldError::new("name", "name must be at most 50 characters"));
        }
        if let Some(description) = &self.description {
            if description.len() > 200 {
                errors.push(FieldError::new(
                    "description",
                    "description must be at most 200 characters",
                ));
            }
        }
        if !is_hex_color(&self.color) {
            errors.push(FieldError::new("color", "color must be a hex code"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, color: &str) -> CategoryRequest {
        CategoryRequest {
            name: name.into(),
            description: None,
            color: color.into(),
            icon: "category".into(),
            parent_id: None,
        }
    }

    #[test]
    fn accepts_three_and_six_digit_hex() {
        assert!(request("Bebidas", "#fff").validate().is_ok());
        assert!(request("Bebidas", "#2196F3").validate().is_ok());
    }

    #[test]
    fn rejects_non_hex_colors() {
        assert!(request("Bebidas", "blue").validate().is_err());
        assert!(request("Bebidas", "#12345").validate().is_err());
        assert!(request("Bebidas", "2196F3").validate().is_err());
    }

    #[test]
    fn rejects_overlong_name() {
        let long = "x".repeat(51);
        assert!(request(&long, "#fff").validate().is_err());
    }
}
