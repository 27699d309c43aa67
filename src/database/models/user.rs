use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::filter::{FilterColumns, FilterKey};
use crate::validation::FieldErrors;

text_enum! {
    Role {
        Admin => "admin",
        Staff => "staff",
    }
}

impl Role {
    /// Roles allowed to manage other accounts
    pub const PRIVILEGED: &'static [Role] = &[Role::Admin, Role::Staff];

    pub fn is_privileged(&self) -> bool {
        Self::PRIVILEGED.contains(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account payload for registration and admin creation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(default, alias = "full_name")]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Ignored on self-registration
    #[serde(default)]
    pub role: Option<String>,
}

impl NewUser {
    pub fn normalized_email(&self) -> String {
        normalize_email(&self.email)
    }

    /// Field checks shared by registration and admin creation. The password
    /// policy is checked separately.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("fullName", &self.full_name);
        check_email(&mut errors, &self.email);
        if let Some(role) = &self.role {
            errors.require_one_of("role", role.trim(), Role::LABELS);
        }
        errors.into_result()
    }
}

/// Profile edit by an admin or staff actor
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[serde(alias = "full_name")]
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl User {
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }

    pub fn merge(&mut self, patch: UpdateUser) {
        if let Some(full_name) = patch.full_name { self.full_name = full_name.trim().to_string(); }
        if let Some(email) = patch.email { self.email = normalize_email(&email); }
        if let Some(role) = patch.role { self.role = role.trim().to_string(); }
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("fullName", &self.full_name);
        check_email(&mut errors, &self.email);
        errors.require_one_of("role", &self.role, Role::LABELS);
        errors.into_result()
    }
}

pub static COLUMNS: FilterColumns = FilterColumns {
    table: "users",
    columns: &[(FilterKey::Role, "role")],
    search: Some(("full_name", "email")),
};

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    let email = email.trim();
    if email.is_empty() {
        errors.add("email", "This field is required");
        return;
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.'),
        None => false,
    };
    if !valid || email.chars().any(char::is_whitespace) {
        errors.add("email", "Must be a valid email address");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> User {
        let now = Utc::now();
        User {
            id: 1,
            full_name: "Maria Santos".to_string(),
            email: "maria@multicab.ph".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            role: "staff".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let value = serde_json::to_value(stored()).unwrap();
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["fullName"], "Maria Santos");
        assert_eq!(value["isActive"], true);
    }

    #[test]
    fn roles() {
        assert!(Role::Admin.is_privileged());
        assert_eq!(stored().role(), Some(Role::Staff));
        assert_eq!("owner".parse::<Role>().ok(), None);
    }

    #[test]
    fn new_user_checks_email_shape() {
        let input = NewUser {
            full_name: "Juan".to_string(),
            email: "juan-at-example".to_string(),
            password: "secret123".to_string(),
            role: Some("superuser".to_string()),
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.contains("email"));
        assert!(errors.contains("role"));
        assert!(!errors.contains("fullName"));
    }

    #[test]
    fn accepts_snake_case_full_name() {
        let input: NewUser = serde_json::from_value(serde_json::json!({
            "full_name": "Juan Dela Cruz",
            "email": " Juan@Example.com ",
            "password": "secret123"
        }))
        .unwrap();
        assert!(input.validate().is_ok());
        assert_eq!(input.normalized_email(), "juan@example.com");
    }

    #[test]
    fn profile_patch_merges_present_fields() {
        let mut user = stored();
        user.merge(UpdateUser { role: Some("admin".to_string()), ..Default::default() });
        assert_eq!(user.role, "admin");
        assert_eq!(user.email, "maria@multicab.ph");
        assert!(user.validate().is_ok());
    }
}
