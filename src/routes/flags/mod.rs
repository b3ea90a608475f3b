pub mod routes;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::evaluation::EvaluationReason;

// MODELS

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Flag {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub rollout_percentage: i32,
    pub allowed_users: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateFlagRequest {
    pub name: String,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    pub rollout_percentage: Option<i32>,
    pub allowed_users: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFlagRequest {
    pub description: Option<String>,
    pub enabled: Option<bool>,
    pub rollout_percentage: Option<i32>,
    pub allowed_users: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct FlagListResponse {
    pub flags: Vec<Flag>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateParams {
    pub user_id: String,
    pub flag: String,
}

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub flag_name: String,
    pub enabled: bool,
    pub reason: EvaluationReason,
}

// HELPER FUNCTIONS

/// Flag names are stored lowercase; lookups and writes normalize first.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
}

/// Validate an already-normalized flag name.
pub fn validate_flag_name(name: &str) -> Result<(), ApiError> {
    if name.is_empty() || name.len() > 100 {
        return Err(ApiError::InvalidFlagName(name.to_string()));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        return Err(ApiError::InvalidFlagName(name.to_string()));
    }

    Ok(())
}

pub fn validate_rollout_percentage(percentage: i32) -> Result<(), ApiError> {
    if !(0..=100).contains(&percentage) {
        return Err(ApiError::InvalidRolloutPercentage(percentage));
    }

    Ok(())
}

pub fn validate_allowed_users(allowed_users: &[String]) -> Result<(), ApiError> {
    if allowed_users.iter().any(|u| u.trim().is_empty()) {
        return Err(ApiError::InvalidAllowedUsers);
    }

    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), ApiError> {
    if description.len() > 500 {
        return Err(ApiError::DescriptionTooLong);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_mixed_case_names_to_lowercase() {
        assert_eq!(normalize_name("New-Homepage"), "new-homepage");
        assert_eq!(normalize_name("dark_mode"), "dark_mode");
    }

    #[test]
    fn accepts_valid_flag_names() {
        for name in ["new-homepage", "dark_mode", "feature2", "a", "x-y_z9"] {
            assert!(validate_flag_name(name).is_ok(), "rejected {name}");
        }
    }

    #[test]
    fn rejects_malformed_flag_names() {
        let too_long = "a".repeat(101);
        let bad = ["", "has space", "UPPER", "café", "semi;colon", too_long.as_str()];
        for name in bad {
            assert!(
                matches!(validate_flag_name(name), Err(ApiError::InvalidFlagName(_))),
                "accepted {name:?}"
            );
        }
    }

    #[test]
    fn accepts_name_at_max_length() {
        let name = "a".repeat(100);
        assert!(validate_flag_name(&name).is_ok());
    }

    #[test]
    fn rollout_percentage_bounds_are_inclusive() {
        assert!(validate_rollout_percentage(0).is_ok());
        assert!(validate_rollout_percentage(100).is_ok());
        assert!(validate_rollout_percentage(50).is_ok());

        for bad in [-1, 101, 1000] {
            assert!(matches!(
                validate_rollout_percentage(bad),
                Err(ApiError::InvalidRolloutPercentage(v)) if v == bad
            ));
        }
    }

    #[test]
    fn allowed_users_must_be_non_empty() {
        assert!(validate_allowed_users(&[]).is_ok());
        assert!(validate_allowed_users(&["user-1".into(), "user-2".into()]).is_ok());

        assert!(validate_allowed_users(&["".into()]).is_err());
        assert!(validate_allowed_users(&["user-1".into(), "   ".into()]).is_err());
    }

    #[test]
    fn description_capped_at_500_chars() {
        assert!(validate_description(&"d".repeat(500)).is_ok());
        assert!(validate_description(&"d".repeat(501)).is_err());
    }
}
