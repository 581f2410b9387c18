// src/handlers/catalog.rs

use axum::{extract::State, response::IntoResponse};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::AppError,
    extract::{Json, Path, Query},
    models::{
        category::{CategoryCatalogParams, CategoryWithCount},
        pagination::{Page, clamp_limit, page_offset},
        question::{PublicQuestion, Question},
        test::{CatalogSort, Test, TestCatalogParams, TestDetail, TestSummary},
    },
    services::leveling::level_table,
};

/// Default page size of the public catalogue.
const CATALOG_PAGE_SIZE: i64 = 12;
/// Default number of categories on the landing page.
const CATEGORY_PAGE_SIZE: i64 = 6;

/// Shared SELECT for test rows with category title and question count.
pub(crate) const TEST_SUMMARY_SELECT: &str = r#"
    SELECT
        t.id, t.title, t.description, t.category_id,
        c.title AS category,
        t.created_at,
        COUNT(q.id) AS questions_count
    FROM tests t
    LEFT JOIN questions q ON q.test_id = t.id
    LEFT JOIN categories c ON c.id = t.category_id
"#;

/// Lists categories with their test counts.
pub async fn list_categories(
    State(pool): State<PgPool>,
    Query(params): Query<CategoryCatalogParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = clamp_limit(params.limit, CATEGORY_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0).max(0);

    let categories = sqlx::query_as::<_, CategoryWithCount>(
        r#"
        SELECT c.id, c.title, c.description, c.technologies, c.created_at,
               COUNT(t.id) AS tests_count
        FROM categories c
        LEFT JOIN tests t ON t.category_id = c.id
        GROUP BY c.id
        ORDER BY c.id
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch categories: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(categories))
}

/// Lists tests for the catalogue, optionally filtered by category title.
pub async fn list_tests(
    State(pool): State<PgPool>,
    Query(params): Query<TestCatalogParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = clamp_limit(params.limit, CATALOG_PAGE_SIZE);
    let page = params.page.unwrap_or(1).max(1);
    let category = params
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty() && *c != "All");
    let sort = CatalogSort::parse(params.sort.as_deref());

    let mut count: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT COUNT(*) FROM tests t LEFT JOIN categories c ON c.id = t.category_id",
    );
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(TEST_SUMMARY_SELECT);

    if let Some(category) = category {
        count.push(" WHERE c.title = ").push_bind(category.to_string());
        query.push(" WHERE c.title = ").push_bind(category.to_string());
    }

    query.push(" GROUP BY t.id, c.title ORDER BY ");
    query.push(sort.order_by());
    query.push(" LIMIT ").push_bind(limit);
    query.push(" OFFSET ").push_bind(page_offset(page, limit));

    let total: i64 = count.build_query_scalar().fetch_one(&pool).await?;
    let tests: Vec<TestSummary> = query
        .build_query_as()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch tests: {:?}", e);
            AppError::from(e)
        })?;

    Ok(Json(Page {
        items: tests,
        total,
        page,
        limit,
    }))
}

/// Returns a random selection of tests.
pub async fn random_tests(
    State(pool): State<PgPool>,
    Query(params): Query<TestCatalogParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = clamp_limit(params.limit, CATALOG_PAGE_SIZE);

    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(TEST_SUMMARY_SELECT);
    query.push(" GROUP BY t.id, c.title ORDER BY RANDOM() LIMIT ");
    query.push_bind(limit);

    let tests: Vec<TestSummary> = query.build_query_as().fetch_all(&pool).await?;

    Ok(Json(tests))
}

pub(crate) async fn fetch_test(pool: &PgPool, id: i64) -> Result<Test, AppError> {
    sqlx::query_as::<_, Test>(
        r#"
        SELECT t.id, t.title, t.description, t.category_id,
               c.title AS category, t.created_at
        FROM tests t
        LEFT JOIN categories c ON c.id = t.category_id
        WHERE t.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Test not found".to_string()))
}

pub(crate) async fn fetch_questions(pool: &PgPool, test_id: i64) -> Result<Vec<Question>, AppError> {
    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, test_id, question_text, answers, correct_answer_id
        FROM questions
        WHERE test_id = $1
        ORDER BY id
        "#,
    )
    .bind(test_id)
    .fetch_all(pool)
    .await?;

    Ok(questions)
}

/// Gets a test with its questions for taking it. Correct answers are hidden.
pub async fn get_test(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if id <= 0 {
        return Err(AppError::BadRequest("Invalid test id".to_string()));
    }

    let test = fetch_test(&pool, id).await?;
    let questions = fetch_questions(&pool, id)
        .await?
        .into_iter()
        .map(PublicQuestion::from)
        .collect();

    Ok(Json(TestDetail { test, questions }))
}

/// Lists levels with the experience needed to reach each.
pub async fn list_levels() -> impl IntoResponse {
    Json(level_table())
}
