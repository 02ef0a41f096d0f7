//! Domain-specific shared validations

use crate::{
    eos_client::{UserRole, UserStatus},
    errors::AppError,
};

/// Placeholder substituted for the raw session token in tool output.
pub const REDACTED_TOKEN: &str = "***";

pub fn require_non_empty(field: &'static str, value: Option<&str>) -> Result<String, AppError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::bad_request(
                "missing_field",
                format!("{field} is required and must not be empty"),
            )
        })
}

pub fn parse_role(value: &str) -> Result<UserRole, AppError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "admin" => Ok(UserRole::Admin),
        "manager" => Ok(UserRole::Manager),
        "user" => Ok(UserRole::User),
        _ => Err(AppError::bad_request(
            "invalid_role",
            format!(
                "role must be one of: {}",
                UserRole::VALID_ROLES.join(", ")
            ),
        )),
    }
}

pub fn parse_status(value: &str) -> Result<UserStatus, AppError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "active" => Ok(UserStatus::Active),
        "inactive" => Ok(UserStatus::Inactive),
        _ => Err(AppError::bad_request(
            "invalid_status",
            format!(
                "status must be one of: {}",
                UserStatus::VALID_STATUSES.join(", ")
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_non_empty_trims_whitespace() {
        let value = require_non_empty("username", Some("  mp5@eigital.com  "))
            .expect("value should be accepted");
        assert_eq!(value, "mp5@eigital.com");
    }

    #[test]
    fn require_non_empty_rejects_blank_and_absent() {
        assert!(require_non_empty("username", Some("   ")).is_err());
        assert!(require_non_empty("username", None).is_err());
    }

    #[test]
    fn parse_role_accepts_closed_set_case_insensitively() {
        assert_eq!(parse_role("Admin").expect("valid"), UserRole::Admin);
        assert_eq!(parse_role("manager").expect("valid"), UserRole::Manager);
        assert_eq!(parse_role(" user ").expect("valid"), UserRole::User);
    }

    #[test]
    fn parse_role_rejects_unknown_values() {
        let error = parse_role("owner").expect_err("owner is not a role");
        assert!(error.to_string().contains("role must be one of"));
    }

    #[test]
    fn parse_status_rejects_deleted() {
        let error = parse_status("deleted").expect_err("deleted is not a status");
        assert!(error.to_string().contains("status must be one of"));
    }
}
