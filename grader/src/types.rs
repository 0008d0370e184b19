//! # Types Module
//!
//! Core data structures shared by the grading strategies.

use serde::{Deserialize, Serialize};

use crate::error::GraderError;

/// Structured evaluation of a free-text answer.
///
/// This is the parse-or-reject boundary for the language-model response:
/// once an `AiEvaluation` exists, the payload is known to be well-formed and
/// in range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiEvaluation {
    /// Quality score in [0, 100].
    pub score: u32,
    /// Why the score was given.
    pub reasoning: String,
    /// Up to three improvement suggestions.
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl AiEvaluation {
    /// Parse the raw text returned by the evaluation service.
    ///
    /// Accepts the JSON object directly or wrapped in a markdown code fence,
    /// which some models insist on emitting. Anything else is rejected.
    pub fn from_response_text(text: &str) -> Result<Self, GraderError> {
        let trimmed = text.trim();
        let body = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .and_then(|rest| rest.strip_suffix("```"))
            .unwrap_or(trimmed)
            .trim();

        let evaluation: AiEvaluation = serde_json::from_str(body)
            .map_err(|e| GraderError::InvalidResponse(format!("{}: {}", e, body)))?;

        if evaluation.score > 100 {
            return Err(GraderError::InvalidResponse(format!(
                "score {} out of range",
                evaluation.score
            )));
        }
        if evaluation.suggestions.len() > 3 {
            return Err(GraderError::InvalidResponse(format!(
                "{} suggestions exceed the contract maximum of 3",
                evaluation.suggestions.len()
            )));
        }

        Ok(evaluation)
    }
}

/// Represents the grading result of a single question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionGrade {
    /// The question this grade belongs to.
    pub question_id: i64,
    /// Points awarded.
    pub awarded: i32,
    /// Maximum points possible.
    pub possible: i32,
    /// Whether the answer was judged correct.
    pub is_correct: bool,
    /// True when the evaluation service failed and the zero score needs
    /// human review.
    pub degraded: bool,
    /// Structured evaluation, present for subjective questions.
    pub ai_evaluation: Option<AiEvaluation>,
}
