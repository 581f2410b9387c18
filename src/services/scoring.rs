// src/services/scoring.rs

//! Scoring of test submissions against the stored answer key.

use std::collections::{HashMap, HashSet};

use crate::models::{
    question::Question,
    test_result::{GradedAnswer, ReviewItem, SubmittedAnswer},
};

/// Result of grading one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutcome {
    pub score: i32,
    pub total_questions: i32,
    pub percentage: f64,
    /// The submission with correctness flags, in submission order.
    pub graded: Vec<GradedAnswer>,
    pub review: Vec<ReviewItem>,
}

/// Percentage of correct answers, 0 when the test has no questions.
pub fn percentage(score: i32, total_questions: i32) -> f64 {
    if total_questions <= 0 {
        return 0.0;
    }
    f64::from(score) * 100.0 / f64::from(total_questions)
}

/// Grades `answers` against the current answer key of `questions`.
///
/// * An answer is correct iff its `answer_id` equals the question's
///   `correct_answer_id`. Unknown questions are simply incorrect.
/// * `total_questions` is the size of the test, not of the submission,
///   so unanswered questions lower the percentage.
/// * A question counts at most once towards the score, so the score never
///   exceeds `total_questions` even if an answer is repeated.
pub fn score_submission(questions: &[Question], answers: &[SubmittedAnswer]) -> ScoreOutcome {
    let by_id: HashMap<i64, &Question> = questions.iter().map(|q| (q.id, q)).collect();

    let mut credited = HashSet::new();
    let mut graded = Vec::with_capacity(answers.len());
    let mut review = Vec::with_capacity(answers.len());

    for answer in answers {
        let question = by_id.get(&answer.question_id);
        let correct_answer_id = question.and_then(|q| q.correct_answer_id);
        let is_correct = correct_answer_id == Some(answer.answer_id);

        if is_correct {
            credited.insert(answer.question_id);
        }

        graded.push(GradedAnswer {
            question_id: answer.question_id,
            answer_id: answer.answer_id,
            is_correct,
        });

        review.push(ReviewItem {
            question_id: answer.question_id,
            question_text: question.map(|q| q.question_text.clone()).unwrap_or_default(),
            answers: question.map(|q| q.answers.0.clone()).unwrap_or_default(),
            selected_answer_id: answer.answer_id,
            is_correct,
            correct_answer_id,
        });
    }

    let score = credited.len() as i32;
    let total_questions = questions.len() as i32;

    ScoreOutcome {
        score,
        total_questions,
        percentage: percentage(score, total_questions),
        graded,
        review,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::AnswerOption;
    use sqlx::types::Json;

    fn question(id: i64, correct: Option<i64>) -> Question {
        Question {
            id,
            test_id: 1,
            question_text: format!("Question {id}"),
            answers: Json(vec![
                AnswerOption {
                    answer_id: 10 * id,
                    text: "right".to_string(),
                },
                AnswerOption {
                    answer_id: 99,
                    text: "wrong".to_string(),
                },
            ]),
            correct_answer_id: correct,
        }
    }

    fn submit(question_id: i64, answer_id: i64) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id,
            answer_id,
        }
    }

    #[test]
    fn test_half_correct() {
        let questions = vec![question(1, Some(10)), question(2, Some(20))];
        let outcome = score_submission(&questions, &[submit(1, 10), submit(2, 99)]);

        assert_eq!(outcome.score, 1);
        assert_eq!(outcome.total_questions, 2);
        assert_eq!(outcome.percentage, 50.0);

        assert!(outcome.review[0].is_correct);
        assert!(!outcome.review[1].is_correct);
        assert_eq!(outcome.review[1].correct_answer_id, Some(20));
        assert_eq!(outcome.review[1].selected_answer_id, 99);
        assert_eq!(outcome.review[1].answers.len(), 2);
        assert_eq!(outcome.review[1].question_text, "Question 2");
    }

    #[test]
    fn test_partial_submission_scored_against_full_test() {
        let questions = vec![
            question(1, Some(10)),
            question(2, Some(20)),
            question(3, Some(30)),
            question(4, Some(40)),
        ];
        let outcome = score_submission(&questions, &[submit(1, 10)]);

        assert_eq!(outcome.score, 1);
        assert_eq!(outcome.total_questions, 4);
        assert_eq!(outcome.percentage, 25.0);
    }

    #[test]
    fn test_unknown_question_is_incorrect() {
        let questions = vec![question(1, Some(10))];
        let outcome = score_submission(&questions, &[submit(42, 10)]);

        assert_eq!(outcome.score, 0);
        assert!(!outcome.graded[0].is_correct);
        assert_eq!(outcome.review[0].question_text, "");
        assert!(outcome.review[0].answers.is_empty());
        assert_eq!(outcome.review[0].correct_answer_id, None);
    }

    #[test]
    fn test_question_without_answer_key_never_matches() {
        let questions = vec![question(1, None)];
        let outcome = score_submission(&questions, &[submit(1, 10)]);
        assert_eq!(outcome.score, 0);
    }

    #[test]
    fn test_empty_test_is_zero_percent() {
        let outcome = score_submission(&[], &[submit(1, 1)]);
        assert_eq!(outcome.total_questions, 0);
        assert_eq!(outcome.percentage, 0.0);
        assert!(!outcome.percentage.is_nan());
    }

    #[test]
    fn test_repeated_answer_counted_once() {
        let questions = vec![question(1, Some(10)), question(2, Some(20))];
        let outcome = score_submission(&questions, &[submit(1, 10), submit(1, 10), submit(1, 10)]);

        assert_eq!(outcome.score, 1);
        assert!(outcome.score <= outcome.total_questions);
        assert_eq!(outcome.graded.len(), 3);
    }

    #[test]
    fn test_graded_keeps_submission_order() {
        let questions = vec![question(1, Some(10)), question(2, Some(20))];
        let outcome = score_submission(&questions, &[submit(2, 20), submit(1, 99)]);

        assert_eq!(
            outcome.graded,
            vec![
                GradedAnswer {
                    question_id: 2,
                    answer_id: 20,
                    is_correct: true
                },
                GradedAnswer {
                    question_id: 1,
                    answer_id: 99,
                    is_correct: false
                },
            ]
        );
    }
}
