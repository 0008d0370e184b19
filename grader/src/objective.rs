//! Objective grading.
//!
//! All-or-nothing comparison of a candidate answer against the canonical
//! answer: full points on an exact normalized match, zero otherwise. There
//! is no partial credit on objective types, so a subset or superset of a
//! multi-select answer is always incorrect.

use crate::normalize::answers_match;
use crate::types::QuestionGrade;

/// Grade an objective question.
///
/// `candidate` is `None` when the candidate never saved an answer; blanks
/// score zero and are marked incorrect.
pub fn grade_objective(
    question_id: i64,
    canonical: &str,
    candidate: Option<&str>,
    points: i32,
    multi_select: bool,
) -> QuestionGrade {
    let is_correct = match candidate {
        Some(answer) => answers_match(canonical, answer, multi_select),
        None => false,
    };

    QuestionGrade {
        question_id,
        awarded: if is_correct { points } else { 0 },
        possible: points,
        is_correct,
        degraded: false,
        ai_evaluation: None,
    }
}
