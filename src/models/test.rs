// src/models/test.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{
    error::{AppError, FieldError},
    models::question::{NormalizedQuestion, PublicQuestion, Question, QuestionInput, QuestionMode},
    utils::html::clean_html,
};

/// Represents the 'tests' table joined with its category title.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Test {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category_id: Option<i64>,
    /// Title of the owning category, if any.
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Test row for list views, with its question count.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TestSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category_id: Option<i64>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub questions_count: i64,
}

/// A test with questions, as shown to test takers.
#[derive(Debug, Serialize)]
pub struct TestDetail {
    pub test: Test,
    pub questions: Vec<PublicQuestion>,
}

/// A test with questions including correct answers, for the admin editor.
#[derive(Debug, Serialize)]
pub struct AdminTestDetail {
    pub test: Test,
    pub questions: Vec<Question>,
}

/// Query parameters for the public test catalogue.
#[derive(Debug, Default, Deserialize)]
pub struct TestCatalogParams {
    pub category: Option<String>,
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Catalogue ordering keyed by the `sort` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSort {
    Newest,
    Oldest,
    MostQuestions,
    FewestQuestions,
    Random,
}

impl CatalogSort {
    /// Unknown values fall back to newest first.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("old") => CatalogSort::Oldest,
            Some("most") => CatalogSort::MostQuestions,
            Some("fewest") => CatalogSort::FewestQuestions,
            Some("random") => CatalogSort::Random,
            _ => CatalogSort::Newest,
        }
    }

    pub fn order_by(self) -> &'static str {
        match self {
            CatalogSort::Newest => "t.created_at DESC, t.id DESC",
            CatalogSort::Oldest => "t.created_at ASC, t.id ASC",
            CatalogSort::MostQuestions => "questions_count DESC, t.id DESC",
            CatalogSort::FewestQuestions => "questions_count ASC, t.id DESC",
            CatalogSort::Random => "RANDOM()",
        }
    }
}

/// DTO for creating or replacing a test definition.
#[derive(Debug, Clone, Deserialize)]
pub struct TestDefinitionRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    #[serde(default)]
    pub questions: Vec<QuestionInput>,
}

/// A test definition that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTest {
    pub title: String,
    pub description: String,
    pub category_id: Option<i64>,
    pub questions: Vec<NormalizedQuestion>,
}

impl TestDefinitionRequest {
    /// Validates the whole definition before anything is written.
    /// Returns every field error at once.
    pub fn normalize(&self, mode: QuestionMode) -> Result<NormalizedTest, AppError> {
        let mut errors = Vec::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.push(FieldError::new("title", "Title is required"));
        } else if title.chars().count() > 200 {
            errors.push(FieldError::new("title", "Title must be at most 200 characters"));
        }

        if self.category_id.is_some_and(|id| id <= 0) {
            errors.push(FieldError::new("category_id", "Invalid category_id"));
        }

        if mode == QuestionMode::Create && self.questions.is_empty() {
            errors.push(FieldError::new("questions", "At least one question is required"));
        }

        let questions: Vec<NormalizedQuestion> = self
            .questions
            .iter()
            .enumerate()
            .filter_map(|(idx, q)| q.normalize(&format!("questions[{idx}]"), mode, &mut errors))
            .collect();

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        Ok(NormalizedTest {
            title: title.to_string(),
            description: clean_html(self.description.as_deref().unwrap_or_default()),
            category_id: self.category_id,
            questions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::AnswerOptionInput;

    fn answers(ids: &[i64]) -> Vec<AnswerOptionInput> {
        ids.iter()
            .map(|id| AnswerOptionInput {
                answer_id: Some(*id),
                id: None,
                text: format!("Option {id}"),
            })
            .collect()
    }

    fn definition(questions: Vec<QuestionInput>) -> TestDefinitionRequest {
        TestDefinitionRequest {
            title: "  Ownership basics ".to_string(),
            description: Some("<b>Borrowing</b><script>alert(1)</script>".to_string()),
            category_id: Some(3),
            questions,
        }
    }

    #[test]
    fn test_valid_definition_normalized() {
        let req = definition(vec![QuestionInput {
            id: None,
            question_text: "Which keyword moves?".to_string(),
            answers: answers(&[10, 20]),
            correct_answer_id: Some(10),
        }]);

        let normalized = req.normalize(QuestionMode::Create).unwrap();
        assert_eq!(normalized.title, "Ownership basics");
        assert!(!normalized.description.contains("<script>"));
        assert!(normalized.description.contains("<b>Borrowing</b>"));
        assert_eq!(normalized.questions.len(), 1);
    }

    #[test]
    fn test_create_requires_questions() {
        let err = definition(vec![]).normalize(QuestionMode::Create).unwrap_err();
        let AppError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        assert!(fields.iter().any(|f| f.field == "questions"));

        // Editing may leave the question list untouched.
        assert!(definition(vec![]).normalize(QuestionMode::Update).is_ok());
    }

    #[test]
    fn test_errors_collected_across_questions() {
        let mut req = definition(vec![
            QuestionInput {
                id: None,
                question_text: "".to_string(),
                answers: answers(&[1, 2]),
                correct_answer_id: Some(1),
            },
            QuestionInput {
                id: None,
                question_text: "Second".to_string(),
                answers: answers(&[1, 1]),
                correct_answer_id: Some(1),
            },
        ]);
        req.title = " ".to_string();

        let AppError::Validation(fields) = req.normalize(QuestionMode::Create).unwrap_err() else {
            panic!("expected validation error");
        };
        let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
        assert!(names.contains(&"title"));
        assert!(names.contains(&"questions[0].question_text"));
        assert!(names.contains(&"questions[1].answers[1].answer_id"));
    }

    #[test]
    fn test_catalog_sort_fallback() {
        assert_eq!(CatalogSort::parse(Some("most")), CatalogSort::MostQuestions);
        assert_eq!(CatalogSort::parse(Some("; DROP TABLE tests")), CatalogSort::Newest);
        assert_eq!(CatalogSort::parse(None), CatalogSort::Newest);
    }
}
