// src/handlers/profile.rs

use axum::{
    Extension,
    extract::{Multipart, State, multipart::MultipartRejection},
    response::IntoResponse,
};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, Utc};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, is_unique_violation},
    extract::Json,
    models::user::{
        AwardExperienceRequest, Level, MeResponse, USER_COLUMNS, UpdateLevelRequest,
        UpdateProfileRequest, User,
    },
    services::{leveling::award_experience, streak::touch_visit},
    utils::jwt::Claims,
};

/// Maximum accepted avatar size, equal to the default request body limit.
const MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;

async fn fetch_user(pool: &PgPool, user_id: i64) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Get current user's profile and statistics.
///
/// The first request of a calendar day also advances the visit streak.
pub async fn get_me(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let mut user = fetch_user(&pool, user_id).await?;

    let today = Local::now().date_naive();
    let visit = touch_visit(user.last_visit_date, user.current_streak, today);

    if visit.changed {
        sqlx::query("UPDATE users SET last_visit_date = $1, current_streak = $2 WHERE id = $3")
            .bind(visit.last_visit_date)
            .bind(visit.current_streak)
            .bind(user_id)
            .execute(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update visit streak: {:?}", e);
                AppError::from(e)
            })?;

        tracing::debug!(user_id, streak = visit.current_streak, "Visit streak updated");
        user.last_visit_date = Some(visit.last_visit_date);
        user.current_streak = visit.current_streak;
    }

    let count_completed_tests: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM test_results WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&pool)
            .await?;

    Ok(Json(MeResponse {
        user,
        count_completed_tests,
    }))
}

/// Edit name, email and birth date of the current user.
pub async fn update_me(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.normalized();
    payload.validate()?;

    let user_id = claims.user_id()?;

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
    let mut separated = builder.separated(", ");

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name);
    }

    if let Some(email) = payload.email {
        separated.push("email = ");
        separated.push_bind_unseparated(email.to_lowercase());
    }

    if let Some(birth_date) = payload.birth_date {
        // Format was checked by validation.
        let birth_date = birth_date
            .map(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d"))
            .transpose()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        separated.push("birth_date = ");
        separated.push_bind_unseparated(birth_date);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(user_id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Email is already in use by another account".to_string())
        } else {
            tracing::error!("Failed to update profile: {:?}", e);
            AppError::from(e)
        }
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(Json(json!({ "message": "Profile updated successfully" })))
}

/// Persist level and experience computed by the client.
pub async fn update_level(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateLevelRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let result = sqlx::query("UPDATE users SET level = $1, exp = $2 WHERE id = $3")
        .bind(payload.level)
        .bind(payload.exp)
        .bind(user_id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update level: {:?}", e);
            AppError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(Json(json!({ "message": "Level updated successfully" })))
}

/// Award experience for an action and apply any level transition server-side.
pub async fn award_exp(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AwardExperienceRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let (level, exp): (Level, i32) = sqlx::query_as("SELECT level, exp FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let progress = award_experience(level, exp, payload.action.trim());

    sqlx::query("UPDATE users SET level = $1, exp = $2 WHERE id = $3")
        .bind(progress.level)
        .bind(progress.exp)
        .bind(user_id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to award experience: {:?}", e);
            AppError::from(e)
        })?;

    if progress.leveled_up {
        tracing::info!(user_id, level = ?progress.level, "User leveled up");
    }

    Ok(Json(progress))
}

/// Maps an accepted image content type to its file extension.
fn avatar_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Public URL prefix of stored avatars.
const AVATAR_URL_PREFIX: &str = "/uploads/avatars/";

/// Resolves an avatar URL written by [`upload_avatar`] back to its file.
/// Anything else (external URLs, path tricks) yields `None`.
fn stored_avatar_path(upload_dir: &Path, avatar_url: &str) -> Option<PathBuf> {
    let name = avatar_url.strip_prefix(AVATAR_URL_PREFIX)?;
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return None;
    }
    Some(upload_dir.join("avatars").join(name))
}

async fn remove_avatar_file(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!(path = %path.display(), "Failed to remove avatar file: {:?}", e);
    }
}

/// Upload a new avatar image (multipart field `avatar`).
///
/// Files land in `<upload_dir>/avatars/` and are served under `/uploads`.
/// The previous avatar file is removed once the new one is recorded.
pub async fn upload_avatar(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let mut multipart = multipart?;
    let user_id = claims.user_id()?;
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("avatar") {
            continue;
        }

        let ext = field
            .content_type()
            .and_then(avatar_extension)
            .ok_or_else(|| AppError::BadRequest("Invalid type".to_string()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        upload = Some((ext, data));
    }

    let (ext, data) = upload
        .filter(|(_, data)| !data.is_empty())
        .ok_or_else(|| AppError::BadRequest("No file".to_string()))?;

    if data.len() > MAX_AVATAR_BYTES {
        return Err(AppError::BadRequest("File too large".to_string()));
    }

    let previous: Option<String> =
        sqlx::query_scalar::<_, Option<String>>("SELECT avatar_url FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let dir = config.upload_dir.join("avatars");
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let filename = format!("{}-{}.{}", user_id, Utc::now().timestamp_millis(), ext);
    let path = dir.join(&filename);
    tokio::fs::write(&path, &data)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let url = format!("{AVATAR_URL_PREFIX}{filename}");
    let updated = sqlx::query("UPDATE users SET avatar_url = $1 WHERE id = $2")
        .bind(&url)
        .bind(user_id)
        .execute(&pool)
        .await;

    match updated {
        Ok(result) if result.rows_affected() > 0 => {}
        Ok(_) => {
            remove_avatar_file(&path).await;
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Err(e) => {
            tracing::error!("Failed to store avatar url: {:?}", e);
            remove_avatar_file(&path).await;
            return Err(AppError::from(e));
        }
    }

    if let Some(old) = previous
        .as_deref()
        .filter(|old| *old != url)
        .and_then(|old| stored_avatar_path(&config.upload_dir, old))
    {
        remove_avatar_file(&old).await;
    }

    tracing::info!(user_id, avatar = %url, "Avatar updated");

    Ok(Json(json!({ "avatar_url": url })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avatar_extension() {
        assert_eq!(avatar_extension("image/png"), Some("png"));
        assert_eq!(avatar_extension("image/jpeg"), Some("jpg"));
        assert_eq!(avatar_extension("image/gif"), None);
        assert_eq!(avatar_extension("application/octet-stream"), None);
    }

    #[test]
    fn test_stored_avatar_path() {
        let dir = Path::new("uploads");
        assert_eq!(
            stored_avatar_path(dir, "/uploads/avatars/7-1700000000000.png"),
            Some(PathBuf::from("uploads/avatars/7-1700000000000.png"))
        );
        assert_eq!(stored_avatar_path(dir, "https://cdn.example.com/a.png"), None);
        assert_eq!(stored_avatar_path(dir, "/uploads/avatars/"), None);
        assert_eq!(stored_avatar_path(dir, "/uploads/avatars/../secret.png"), None);
        assert_eq!(stored_avatar_path(dir, "/uploads/avatars/a/b.png"), None);
        assert_eq!(stored_avatar_path(dir, "/uploads/avatars/..\\b.png"), None);
    }
}
