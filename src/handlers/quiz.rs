// src/handlers/quiz.rs

use axum::{Extension, extract::State, response::IntoResponse};
use sqlx::{PgPool, types::Json as SqlJson};

use crate::{
    error::AppError,
    extract::Json,
    handlers::catalog::fetch_questions,
    models::test_result::{RecentResult, SubmitTestRequest, SubmitTestResponse, TestResult},
    services::scoring::score_submission,
    utils::jwt::Claims,
};

/// Number of results shown in the "recent tests" list.
const RECENT_RESULTS_LIMIT: i64 = 10;

/// Submits a user's answers for a test and scores them.
///
/// * Grades against the answer key as stored right now.
/// * Always appends a new `test_results` row; resubmitting is allowed.
/// * Returns a per-answer review so the client can render results directly.
pub async fn submit_result(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitTestRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let test_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tests WHERE id = $1)")
        .bind(req.test_id)
        .fetch_one(&pool)
        .await?;

    if !test_exists {
        return Err(AppError::NotFound("Test not found".to_string()));
    }

    let questions = fetch_questions(&pool, req.test_id).await?;

    let outcome = score_submission(&questions, &req.answers);

    let result = sqlx::query_as::<_, TestResult>(
        r#"
        INSERT INTO test_results (user_id, test_id, score, total_questions, answers, finished_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
        RETURNING id, user_id, test_id, score, total_questions, answers, finished_at
        "#,
    )
    .bind(user_id)
    .bind(req.test_id)
    .bind(outcome.score)
    .bind(outcome.total_questions)
    .bind(SqlJson(&outcome.graded))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to save test result: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!(
        user_id,
        test_id = result.test_id,
        score = result.score,
        total = result.total_questions,
        "Test result recorded"
    );

    Ok(Json(SubmitTestResponse {
        id: result.id,
        score: result.score,
        total_questions: result.total_questions,
        percentage: outcome.percentage,
        review: outcome.review,
    }))
}

/// Lists the current user's most recent test results.
pub async fn recent_results(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let results = sqlx::query_as::<_, RecentResult>(
        r#"
        SELECT
            tr.id,
            tr.test_id,
            t.title,
            t.description,
            t.category_id,
            c.title AS category_title,
            tr.total_questions,
            tr.score,
            tr.finished_at
        FROM test_results tr
        JOIN tests t ON t.id = tr.test_id
        LEFT JOIN categories c ON c.id = t.category_id
        WHERE tr.user_id = $1
        ORDER BY tr.finished_at DESC, tr.id DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(RECENT_RESULTS_LIMIT)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch recent results: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(results))
}
