// src/models/test_result.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};

use crate::models::question::AnswerOption;

/// Represents the 'test_results' table in the database.
/// Rows are append-only: every submission creates a new one.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TestResult {
    pub id: i64,
    pub user_id: i64,
    pub test_id: i64,
    pub score: i32,
    pub total_questions: i32,
    pub answers: Json<Vec<GradedAnswer>>,
    pub finished_at: DateTime<Utc>,
}

/// One answer as submitted by the test taker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    pub answer_id: i64,
}

/// A submitted answer with its correctness flag, as persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradedAnswer {
    pub question_id: i64,
    pub answer_id: i64,
    pub is_correct: bool,
}

/// DTO for submitting a test attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitTestRequest {
    pub test_id: i64,
    #[serde(default)]
    pub answers: Vec<SubmittedAnswer>,
}

/// Per-answer feedback, enough to render results without another fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewItem {
    pub question_id: i64,
    pub question_text: String,
    pub answers: Vec<AnswerOption>,
    pub selected_answer_id: i64,
    pub is_correct: bool,
    pub correct_answer_id: Option<i64>,
}

/// Response for a scored submission.
#[derive(Debug, Serialize)]
pub struct SubmitTestResponse {
    pub id: i64,
    pub score: i32,
    pub total_questions: i32,
    pub percentage: f64,
    pub review: Vec<ReviewItem>,
}

/// Recent result joined with its test and category, for the profile page.
#[derive(Debug, Serialize, FromRow)]
pub struct RecentResult {
    pub id: i64,
    pub test_id: i64,
    pub title: String,
    pub description: String,
    pub category_id: Option<i64>,
    pub category_title: Option<String>,
    pub total_questions: i32,
    pub score: i32,
    pub finished_at: DateTime<Utc>,
}
