//! Shared test fixtures for the service tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

use db::models::assignment::{self, AssignmentStatus};
use db::models::exam::{self, ExamStatus, GradingMethod};
use db::models::question::{self, QuestionType};
use db::models::submission;
use db::models::user::{self, Role};
use grader::{AiEvaluation, GraderError, SubjectiveEvaluator, SubjectiveRequest};

pub async fn candidate(db: &DatabaseConnection, name: &str) -> user::Model {
    user::Model::create(db, name, &format!("{name}@example.com"), Role::Candidate)
        .await
        .unwrap()
}

pub async fn staff(db: &DatabaseConnection, name: &str, role: Role) -> user::Model {
    user::Model::create(db, name, &format!("{name}@example.com"), role)
        .await
        .unwrap()
}

pub async fn exam(db: &DatabaseConnection, created_by: i64, passing_score: i32) -> exam::Model {
    let now = Utc::now();
    exam::ActiveModel {
        title: Set("Rust fundamentals".to_string()),
        description: Set(None),
        time_limit_minutes: Set(Some(60)),
        passing_score: Set(passing_score),
        total_score: Set(0),
        grading_method: Set(GradingMethod::Auto),
        status: Set(ExamStatus::Published),
        created_by: Set(created_by),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn question(
    db: &DatabaseConnection,
    exam_id: i64,
    question_type: QuestionType,
    answer: &str,
    points: i32,
    category: Option<&str>,
) -> question::Model {
    let now = Utc::now();
    question::ActiveModel {
        exam_id: Set(exam_id),
        question_type: Set(question_type),
        content: Set("What does the borrow checker enforce?".to_string()),
        options: Set(None),
        answer: Set(answer.to_string()),
        points: Set(points),
        category: Set(category.map(str::to_string)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn assignment(
    db: &DatabaseConnection,
    exam_id: i64,
    user_id: i64,
    status: AssignmentStatus,
    deadline: Option<DateTime<Utc>>,
    is_practice: bool,
) -> assignment::Model {
    let now = Utc::now();
    assignment::ActiveModel {
        exam_id: Set(exam_id),
        user_id: Set(user_id),
        status: Set(status),
        assigned_at: Set(now),
        started_at: Set(None),
        submitted_at: Set(None),
        deadline: Set(deadline),
        is_practice: Set(is_practice),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn answer(
    db: &DatabaseConnection,
    assignment_id: i64,
    question_id: i64,
    text: &str,
) -> submission::Model {
    submission::Model::save_answer(db, assignment_id, question_id, text)
        .await
        .unwrap()
}

/// Evaluator that scores every answer the same, standing in for the LLM.
pub struct StubEvaluator {
    pub score: u32,
}

#[async_trait]
impl SubjectiveEvaluator for StubEvaluator {
    async fn evaluate(&self, _request: &SubjectiveRequest) -> Result<AiEvaluation, GraderError> {
        Ok(AiEvaluation {
            score: self.score,
            reasoning: "stubbed evaluation".to_string(),
            suggestions: Vec::new(),
        })
    }
}

/// Evaluator that always fails, standing in for an unreachable service.
pub struct FailingEvaluator;

#[async_trait]
impl SubjectiveEvaluator for FailingEvaluator {
    async fn evaluate(&self, _request: &SubjectiveRequest) -> Result<AiEvaluation, GraderError> {
        Err(GraderError::InvalidResponse(
            "stubbed service outage".to_string(),
        ))
    }
}
