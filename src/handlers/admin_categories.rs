// src/handlers/admin_categories.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::{AppError, is_foreign_key_violation},
    extract::{Json, Path, Query},
    models::{
        category::{Category, CategoryRequest, CategoryWithCount},
        pagination::{ListParams, Page},
    },
    utils::html::clean_html,
};

const CATEGORY_COLUMNS: &str = "id, title, description, technologies, created_at";


fn push_category_filters(builder: &mut QueryBuilder<'_, Postgres>, params: &ListParams) {
    if let Some(pattern) = params.search_pattern() {
        builder
            .push(" WHERE (c.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR c.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn category_order_by(params: &ListParams) -> String {
    let dir = params.sort_dir().as_sql();
    match params.sort_by() {
        Some("created_at") => format!("c.created_at {dir}, c.id {dir}"),
        Some("tests_count") => format!("tests_count {dir}, c.id {dir}"),
        _ => "c.id DESC".to_string(),
    }
}

/// Lists categories with their test counts.
/// Admin only.
pub async fn list_categories(
    State(pool): State<PgPool>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut count: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM categories c");
    push_category_filters(&mut count, &params);
    let total: i64 = count.build_query_scalar().fetch_one(&pool).await?;

    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
        r#"
        SELECT c.id, c.title, c.description, c.technologies, c.created_at,
               COUNT(t.id) AS tests_count
        FROM categories c
        LEFT JOIN tests t ON t.category_id = c.id
        "#,
    );
    push_category_filters(&mut query, &params);
    query.push(" GROUP BY c.id ORDER BY ").push(category_order_by(&params));
    query.push(" LIMIT ").push_bind(params.limit());
    query.push(" OFFSET ").push_bind(params.offset());

    let categories: Vec<CategoryWithCount> = query.build_query_as().fetch_all(&pool).await?;

    Ok(Json(Page::new(categories, total, &params)))
}

/// Gets a single category.
/// Admin only.
pub async fn get_category(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let category = sqlx::query_as::<_, Category>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    Ok(Json(category))
}

/// Creates a new category.
/// Admin only.
pub async fn create_category(
    State(pool): State<PgPool>,
    Json(payload): Json<CategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.normalized();
    payload.validate()?;

    let category = sqlx::query_as::<_, Category>(&format!(
        r#"
        INSERT INTO categories (title, description, technologies)
        VALUES ($1, $2, $3)
        RETURNING {CATEGORY_COLUMNS}
        "#
    ))
    .bind(&payload.title)
    .bind(clean_html(payload.description.as_deref().unwrap_or_default()))
    .bind(&payload.technologies)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create category: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!(category_id = category.id, "Category created");

    Ok((StatusCode::CREATED, Json(category)))
}

/// Replaces a category's fields.
/// Admin only.
pub async fn update_category(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.normalized();
    payload.validate()?;

    let category = sqlx::query_as::<_, Category>(&format!(
        r#"
        UPDATE categories
        SET title = $1, description = $2, technologies = $3
        WHERE id = $4
        RETURNING {CATEGORY_COLUMNS}
        "#
    ))
    .bind(&payload.title)
    .bind(clean_html(payload.description.as_deref().unwrap_or_default()))
    .bind(&payload.technologies)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    Ok(Json(category))
}

/// Deletes a category. Refused while tests still reference it.
/// Admin only.
pub async fn delete_category(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::Conflict("Category still has tests".to_string())
            } else {
                tracing::error!("Failed to delete category: {:?}", e);
                AppError::from(e)
            }
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    Ok(Json(json!({ "message": "Category deleted" })))
}
