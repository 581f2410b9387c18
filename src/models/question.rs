// src/models/question.rs

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

use crate::error::FieldError;

/// A labeled answer choice within a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    /// Author-assigned identifier, unique within the question.
    pub answer_id: i64,
    pub text: String,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Question {
    pub id: i64,
    pub test_id: i64,
    pub question_text: String,

    /// Ordered list of options, stored as a JSONB array.
    pub answers: Json<Vec<AnswerOption>>,

    /// The `answer_id` of the correct option.
    pub correct_answer_id: Option<i64>,
}

/// DTO for sending a question to test takers (excludes the correct answer).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub test_id: i64,
    pub question_text: String,
    pub answers: Json<Vec<AnswerOption>>,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            test_id: q.test_id,
            question_text: q.question_text,
            answers: q.answers,
        }
    }
}

/// Option as sent by the admin editor. `id` is accepted as a legacy alias
/// for `answer_id`; when both are absent the 1-based position is used.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerOptionInput {
    pub answer_id: Option<i64>,
    pub id: Option<i64>,
    #[serde(default)]
    pub text: String,
}

/// Question as sent by the admin editor.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionInput {
    /// Existing question id; required when editing a test.
    pub id: Option<i64>,
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub answers: Vec<AnswerOptionInput>,
    pub correct_answer_id: Option<i64>,
}

/// A question that passed validation, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuestion {
    pub id: Option<i64>,
    pub question_text: String,
    pub answers: Vec<AnswerOption>,
    pub correct_answer_id: Option<i64>,
}

/// Controls the rules that differ between creating and editing a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionMode {
    /// New questions: at least two answers and a correct answer are required.
    Create,
    /// Existing questions: `id` required, correct answer may be cleared.
    Update,
}

impl QuestionInput {
    /// Validates the question and resolves option identifiers.
    ///
    /// Errors are appended to `errors` with paths rooted at `path`
    /// (e.g. `questions[2].answers`).
    pub fn normalize(
        &self,
        path: &str,
        mode: QuestionMode,
        errors: &mut Vec<FieldError>,
    ) -> Option<NormalizedQuestion> {
        let before = errors.len();

        if mode == QuestionMode::Update && !self.id.is_some_and(|id| id > 0) {
            errors.push(FieldError::new(format!("{path}.id"), "Invalid question id"));
        }

        let question_text = self.question_text.trim();
        if question_text.is_empty() {
            errors.push(FieldError::new(
                format!("{path}.question_text"),
                "Question text is required",
            ));
        }

        let min_answers = match mode {
            QuestionMode::Create => 2,
            QuestionMode::Update => 1,
        };
        if self.answers.len() < min_answers {
            errors.push(FieldError::new(
                format!("{path}.answers"),
                format!("Each question must have at least {min_answers} answer(s)"),
            ));
        }

        let mut answers = Vec::with_capacity(self.answers.len());
        let mut seen = HashSet::new();
        for (idx, option) in self.answers.iter().enumerate() {
            let option_path = format!("{path}.answers[{idx}]");
            let answer_id = match option.answer_id.or(option.id) {
                Some(id) if id > 0 => id,
                Some(_) => {
                    errors.push(FieldError::new(
                        format!("{option_path}.answer_id"),
                        "Invalid answer_id",
                    ));
                    continue;
                }
                None => idx as i64 + 1,
            };

            if !seen.insert(answer_id) {
                errors.push(FieldError::new(
                    format!("{option_path}.answer_id"),
                    format!("Duplicate answer_id {answer_id}"),
                ));
            }

            let text = option.text.trim();
            if text.is_empty() {
                errors.push(FieldError::new(
                    format!("{option_path}.text"),
                    "Answer text is required",
                ));
            }

            answers.push(AnswerOption {
                answer_id,
                text: text.to_string(),
            });
        }

        match self.correct_answer_id {
            None if mode == QuestionMode::Create => errors.push(FieldError::new(
                format!("{path}.correct_answer_id"),
                "Each question must have a correct answer",
            )),
            None => {}
            Some(id) if id <= 0 => errors.push(FieldError::new(
                format!("{path}.correct_answer_id"),
                "Invalid correct_answer_id",
            )),
            Some(id) if !seen.contains(&id) => errors.push(FieldError::new(
                format!("{path}.correct_answer_id"),
                "correct_answer_id must match one of answers.answer_id",
            )),
            Some(_) => {}
        }

        if errors.len() > before {
            return None;
        }

        Some(NormalizedQuestion {
            id: self.id,
            question_text: question_text.to_string(),
            answers,
            correct_answer_id: self.correct_answer_id,
        })
    }
}
