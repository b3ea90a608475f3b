use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;

use super::{
    normalize_name, validate_allowed_users, validate_description, validate_flag_name,
    validate_rollout_percentage, CreateFlagRequest, EvaluateParams, EvaluateResponse, Flag,
    FlagListResponse, UpdateFlagRequest,
};
use crate::error::ApiError;
use crate::evaluation::{evaluate_flag, FlagState};
use crate::state::AppState;

/// Single lookup the evaluation path depends on: flag by normalized name.
async fn find_by_name(db: &PgPool, name: &str) -> Result<Option<Flag>, ApiError> {
    let flag = sqlx::query_as::<_, Flag>(
        r#"
        SELECT id, name, description, enabled, rollout_percentage, allowed_users, created_at
        FROM flags
        WHERE name = $1
        "#,
    )
    .bind(name)
    .fetch_optional(db)
    .await?;

    Ok(flag)
}

/// Create a new feature flag
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateFlagRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = normalize_name(&payload.name);
    validate_flag_name(&name)?;

    if let Some(percentage) = payload.rollout_percentage {
        validate_rollout_percentage(percentage)?;
    }

    if let Some(ref allowed_users) = payload.allowed_users {
        validate_allowed_users(allowed_users)?;
    }

    if let Some(ref description) = payload.description {
        validate_description(description)?;
    }

    let flag = match sqlx::query_as::<_, Flag>(
        r#"
        INSERT INTO flags (name, description, enabled, rollout_percentage, allowed_users)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, name, description, enabled, rollout_percentage, allowed_users, created_at
        "#,
    )
    .bind(&name)
    .bind(&payload.description)
    .bind(payload.enabled.unwrap_or(true))
    .bind(payload.rollout_percentage.unwrap_or(0))
    .bind(payload.allowed_users.unwrap_or_default())
    .fetch_one(&state.db)
    .await
    {
        Ok(flag) => flag,
        Err(e) => {
            if let Some(db_error) = e.as_database_error() {
                if db_error.code() == Some(std::borrow::Cow::Borrowed("23505")) {
                    return Err(ApiError::DuplicateFlag(name));
                }
            }
            return Err(e.into());
        }
    };

    Ok((StatusCode::CREATED, Json(flag)))
}

/// List all flags
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let flags = sqlx::query_as::<_, Flag>(
        r#"
        SELECT id, name, description, enabled, rollout_percentage, allowed_users, created_at
        FROM flags
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    let total = flags.len();
    Ok(Json(FlagListResponse { flags, total }))
}

/// Get a single flag by name
pub async fn get(
    State(state): State<AppState>,
    Path(flag_name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let name = normalize_name(&flag_name);

    match find_by_name(&state.db, &name).await? {
        Some(flag) => Ok(Json(flag)),
        None => Err(ApiError::FlagNotFound(flag_name)),
    }
}

/// Partially update a flag. Name, id and created_at are immutable.
pub async fn update(
    State(state): State<AppState>,
    Path(flag_name): Path<String>,
    Json(payload): Json<UpdateFlagRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = normalize_name(&flag_name);

    if let Some(percentage) = payload.rollout_percentage {
        validate_rollout_percentage(percentage)?;
    }

    if let Some(ref allowed_users) = payload.allowed_users {
        validate_allowed_users(allowed_users)?;
    }

    if let Some(ref description) = payload.description {
        validate_description(description)?;
    }

    // Single statement keeps the update all-or-nothing.
    let flag = sqlx::query_as::<_, Flag>(
        r#"
        UPDATE flags
        SET
            description = COALESCE($2, description),
            enabled = COALESCE($3, enabled),
            rollout_percentage = COALESCE($4, rollout_percentage),
            allowed_users = COALESCE($5, allowed_users)
        WHERE name = $1
        RETURNING id, name, description, enabled, rollout_percentage, allowed_users, created_at
        "#,
    )
    .bind(&name)
    .bind(payload.description.as_deref())
    .bind(payload.enabled)
    .bind(payload.rollout_percentage)
    .bind(payload.allowed_users)
    .fetch_optional(&state.db)
    .await?;

    match flag {
        Some(flag) => Ok(Json(flag)),
        None => Err(ApiError::FlagNotFound(flag_name)),
    }
}

/// Evaluate a flag for a user: fetch the record, run the pure engine,
/// report the verdict with its reason.
pub async fn evaluate(
    State(state): State<AppState>,
    Query(params): Query<EvaluateParams>,
) -> Result<impl IntoResponse, ApiError> {
    let name = normalize_name(&params.flag);

    let flag = find_by_name(&state.db, &name)
        .await?
        .ok_or_else(|| ApiError::FlagNotFound(params.flag.clone()))?;

    let flag_state = FlagState {
        name: flag.name.clone(),
        enabled: flag.enabled,
        rollout_percentage: flag.rollout_percentage,
        allowed_users: flag.allowed_users,
    };

    let verdict = evaluate_flag(&flag_state, &params.user_id);

    Ok(Json(EvaluateResponse {
        flag_name: flag.name,
        enabled: verdict.enabled,
        reason: verdict.reason,
    }))
}
