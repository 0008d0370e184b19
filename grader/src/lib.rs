//! # Grader Library
//!
//! This crate provides the grading logic for candidate answers, independent
//! of storage. It supports normalizing and comparing objective answers
//! (true/false, single-choice, multi-select) and evaluating free-text
//! answers through an external language-model service with a strict output
//! contract.
//!
//! ## Key Concepts
//! - **Normalization**: objective answers are trimmed, case-folded and (for
//!   multi-select) token-sorted before comparison, making correctness
//!   order-independent but exact on content.
//! - **SubjectiveEvaluator**: pluggable strategy for scoring free-text
//!   answers; the production implementation calls an LLM endpoint.
//! - **Degraded grading**: a failed or malformed evaluation never fails the
//!   caller; it yields a zero-score result flagged for human review.

pub mod error;
pub mod normalize;
pub mod objective;
pub mod subjective;
pub mod types;

pub use error::GraderError;
pub use objective::grade_objective;
pub use subjective::{
    LlmEvaluator, SubjectiveEvaluator, SubjectiveRequest, grade_subjective, PASS_QUALITY,
};
pub use types::{AiEvaluation, QuestionGrade};
