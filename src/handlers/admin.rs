// src/handlers/admin.rs

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use serde_json::json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::{AppError, is_foreign_key_violation},
    extract::{Json, Path, Query},
    models::{
        pagination::{ListParams, Page},
        user::{AdminUpdateUserRequest, Role, UserListItem},
    },
    utils::jwt::Claims,
};

const USER_LIST_COLUMNS: &str = "id, name, email, avatar_url, created_at, last_visit_date, \
    role, level, exp, current_streak";

/// Dashboard counters.
#[derive(Debug, Serialize, FromRow)]
pub struct Overview {
    pub tests: i64,
    pub categories: i64,
    pub users: i64,
    pub questions: i64,
}

/// Counts of everything an admin manages.
pub async fn overview(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let overview = sqlx::query_as::<_, Overview>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM tests) AS tests,
            (SELECT COUNT(*) FROM categories) AS categories,
            (SELECT COUNT(*) FROM users) AS users,
            (SELECT COUNT(*) FROM questions) AS questions
        "#,
    )
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to load admin overview: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(overview))
}

/// Pushes the WHERE clause shared by the user list and its count.
fn push_user_filters(builder: &mut QueryBuilder<'_, Postgres>, params: &ListParams) -> Result<(), AppError> {
    builder.push(" WHERE 1 = 1");

    if let Some(pattern) = params.search_pattern() {
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(role) = params.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        let role = Role::parse(role)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown role '{role}'")))?;
        builder.push(" AND role = ").push_bind(role);
    }

    Ok(())
}

/// Whitelisted ORDER BY for the user list.
fn user_order_by(params: &ListParams) -> String {
    let dir = params.sort_dir().as_sql();
    match params.sort_by() {
        Some("created_at") => format!("created_at {dir}, id {dir}"),
        Some("last_visit_date") => format!("last_visit_date {dir} NULLS LAST, id {dir}"),
        Some("level") => format!("level {dir}, exp {dir}, id {dir}"),
        _ => "id DESC".to_string(),
    }
}

/// Lists users with search, role filter and sorting.
/// Admin only.
pub async fn list_users(
    State(pool): State<PgPool>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut count: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM users");
    push_user_filters(&mut count, &params)?;
    let total: i64 = count.build_query_scalar().fetch_one(&pool).await?;

    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {USER_LIST_COLUMNS} FROM users"));
    push_user_filters(&mut query, &params)?;
    query.push(" ORDER BY ").push(user_order_by(&params));
    query.push(" LIMIT ").push_bind(params.limit());
    query.push(" OFFSET ").push_bind(params.offset());

    let users: Vec<UserListItem> = query.build_query_as().fetch_all(&pool).await.map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(Page::new(users, total, &params)))
}

/// A user with the number of tests they have taken.
#[derive(Debug, Serialize)]
pub struct AdminUserDetail {
    #[serde(flatten)]
    pub user: UserListItem,
    pub test_count: i64,
}

/// Gets a single user.
/// Admin only.
pub async fn get_user(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = sqlx::query_as::<_, UserListItem>(&format!(
        "SELECT {USER_LIST_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let test_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM test_results WHERE user_id = $1")
        .bind(id)
        .fetch_one(&pool)
        .await?;

    Ok(Json(AdminUserDetail { user, test_count }))
}

/// Updates a user's name and/or role.
/// Admin only.
pub async fn update_user(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    if name.is_none() && payload.role.is_none() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
    let mut separated = builder.separated(", ");

    if let Some(name) = name {
        separated.push("name = ");
        separated.push_bind_unseparated(name.to_string());
    }

    if let Some(role) = payload.role {
        separated.push("role = ");
        separated.push_bind_unseparated(role);
    }

    builder.push(" WHERE id = ").push_bind(id);
    builder.push(format!(" RETURNING {USER_LIST_COLUMNS}"));

    let user: UserListItem = builder
        .build_query_as()
        .fetch_optional(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update user: {:?}", e);
            AppError::from(e)
        })?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = id, role = ?user.role, "User updated by admin");

    Ok(Json(user))
}

/// Deletes a user by ID.
/// Admin only. Prevents deleting self.
pub async fn delete_user(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if id == claims.user_id()? {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::Conflict("User has test results and cannot be deleted".to_string())
            } else {
                tracing::error!("Failed to delete user: {:?}", e);
                AppError::from(e)
            }
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok((StatusCode::OK, Json(json!({ "message": "User deleted" }))))
}
