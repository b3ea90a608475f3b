use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Everything the API surface can fail with, one variant per failure
/// kind. Data-carrying variants keep the offending value so responses
/// can echo it back.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("flag '{0}' was not found")]
    FlagNotFound(String),

    #[error("a flag named '{0}' already exists")]
    DuplicateFlag(String),

    #[error("invalid flag name: '{0}'. Use only lowercase alphanumeric characters, hyphens and underscores, 1-100 characters, no spaces")]
    InvalidFlagName(String),

    #[error("invalid rollout percentage: {0}. Must be between 0 and 100")]
    InvalidRolloutPercentage(i32),

    #[error("allowed_users entries must be non-empty strings")]
    InvalidAllowedUsers,

    #[error("description is too long (max 500 characters)")]
    DescriptionTooLong,

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::FlagNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DuplicateFlag(_) => StatusCode::CONFLICT,
            ApiError::InvalidFlagName(_)
            | ApiError::InvalidRolloutPercentage(_)
            | ApiError::InvalidAllowedUsers
            | ApiError::DescriptionTooLong => StatusCode::BAD_REQUEST,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn category(&self) -> &'static str {
        match self {
            ApiError::FlagNotFound(_) => "flag_not_found",
            ApiError::DuplicateFlag(_) => "duplicate_flag",
            ApiError::InvalidFlagName(_) => "invalid_flag_name",
            ApiError::InvalidRolloutPercentage(_) => "invalid_rollout_percentage",
            ApiError::InvalidAllowedUsers => "invalid_allowed_users",
            ApiError::DescriptionTooLong => "invalid_description",
            ApiError::Database(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();

        // Never leak driver details to the client.
        let message = match &self {
            ApiError::Database(e) => {
                tracing::error!("database error: {e:?}");
                "An unexpected error occurred. Please try again later.".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "error": self.category(),
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_failure_kinds() {
        assert_eq!(
            ApiError::FlagNotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::DuplicateFlag("x".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::InvalidFlagName("Bad Name".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidRolloutPercentage(150).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidAllowedUsers.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Database(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn messages_carry_the_offending_value() {
        let err = ApiError::DuplicateFlag("dark-mode".into());
        assert!(err.to_string().contains("dark-mode"));

        let err = ApiError::InvalidRolloutPercentage(120);
        assert!(err.to_string().contains("120"));
    }
}
