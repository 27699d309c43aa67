use std::collections::HashMap;
use std::fmt;

use rust_decimal::Decimal;

/// Per-field validation messages collected before touching the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldErrors(HashMap<String, String>);

/// Inline images arrive as data URIs; anything beyond this is refused
pub const MAX_IMAGE_LEN: usize = 5 * 1024 * 1024;

/// Largest value a NUMERIC(12, 2) price column holds
pub const MAX_PRICE: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn into_inner(self) -> HashMap<String, String> {
        self.0
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    pub fn require_text(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "This field is required");
        }
    }

    pub fn require_non_negative_quantity(&mut self, field: &str, value: i32) {
        if value < 0 {
            self.add(field, "Must be zero or greater");
        }
    }

    /// Prices are stored to the cent; the range check runs on the rounded value
    pub fn require_price(&mut self, field: &str, value: Decimal) {
        if value.is_sign_negative() && !value.is_zero() {
            self.add(field, "Must be zero or greater");
        } else if value.round_dp(2) > MAX_PRICE {
            self.add(field, format!("Must be at most {}", MAX_PRICE));
        }
    }

    pub fn require_one_of(&mut self, field: &str, value: &str, allowed: &[&str]) {
        if value.trim().is_empty() {
            self.add(field, "This field is required");
        } else if !allowed.contains(&value) {
            self.add(field, format!("Must be one of: {}", allowed.join(", ")));
        }
    }

    pub fn check_image(&mut self, field: &str, value: Option<&str>) {
        if let Some(image) = value {
            if image.len() > MAX_IMAGE_LEN {
                self.add(field, "Image is larger than 5MB");
            } else if image.starts_with("data:") && !image.starts_with("data:image/") {
                self.add(field, "Inline data must be an image");
            }
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<_> = self.0.iter().collect();
        fields.sort();
        let parts: Vec<String> = fields.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Trim and treat blank as absent
pub fn normalize_image(image: Option<String>) -> Option<String> {
    image.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn collects_first_message_per_field() {
        let mut errors = FieldErrors::new();
        errors.require_text("name", "  ");
        errors.add("name", "second message");
        errors.require_non_negative_quantity("quantity", -1);
        errors.require_price("price", Decimal::from_str("-0.01").unwrap());
        let map = errors.clone().into_inner();
        assert_eq!(map["name"], "This field is required");
        assert!(errors.contains("quantity"));
        assert!(errors.contains("price"));
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn zero_values_are_valid() {
        let mut errors = FieldErrors::new();
        errors.require_non_negative_quantity("quantity", 0);
        errors.require_price("price", Decimal::ZERO);
        assert!(errors.into_result().is_ok());
    }

    #[test]
    fn price_must_fit_the_column() {
        assert_eq!(MAX_PRICE, Decimal::from_str("9999999999.99").unwrap());

        let mut errors = FieldErrors::new();
        errors.require_price("max", Decimal::from_str("9999999999.99").unwrap());
        errors.require_price("cents", Decimal::from_str("850.5").unwrap());
        assert!(errors.into_result().is_ok());

        let mut errors = FieldErrors::new();
        errors.require_price("huge", Decimal::from_str("100000000000").unwrap());
        errors.require_price("rounds_up", Decimal::from_str("9999999999.995").unwrap());
        let map = errors.into_inner();
        assert_eq!(map["huge"], "Must be at most 9999999999.99");
        assert!(map.contains_key("rounds_up"));
    }

    #[test]
    fn one_of_lists_choices() {
        let mut errors = FieldErrors::new();
        errors.require_one_of("make", "Toyota", &["Generic", "OEM"]);
        assert_eq!(errors.into_inner()["make"], "Must be one of: Generic, OEM");
    }

    #[test]
    fn inline_image_must_be_image_mime() {
        let mut errors = FieldErrors::new();
        errors.check_image("image", Some("data:text/html;base64,PGgxPg=="));
        errors.check_image("other", Some("https://cdn.example.com/a.png"));
        assert!(errors.contains("image"));
        assert!(!errors.contains("other"));
    }

    #[test]
    fn blank_image_is_absent() {
        assert_eq!(normalize_image(Some("   ".to_string())), None);
        assert_eq!(normalize_image(Some(" a.png ".to_string())), Some("a.png".to_string()));
    }
}
