//! # Exam Grading Orchestrator
//!
//! Grades a submitted assignment end to end: loads the exam's questions and
//! the candidate's submissions, dispatches each question to the grader
//! matching its type, aggregates the totals, and persists the results —
//! per-submission verdicts, the single score row and the `graded` status
//! flip — inside one transaction. Grading is wholesale re-runnable: a crash
//! mid-way leaves no partial score, and re-grading an already-graded
//! assignment overwrites the score row.
//!
//! Derived bookkeeping (wrong-question ledger, makeup workflow,
//! notifications) runs only on the first grading pass, so a retried or
//! staff-triggered re-grade never double-applies side effects.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Set, TransactionTrait,
};
use serde::Serialize;

use crate::error::{ServiceError, ServiceResult};
use crate::{makeup, notifications, wrong_questions};
use db::models::assignment::{AssignmentStatus, Model as Assignment};
use db::models::exam::{Entity as ExamEntity, Model as Exam};
use db::models::notification::{NoticeRefs, NotificationType};
use db::models::question::{Model as Question, QuestionType};
use db::models::score::Model as Score;
use db::models::submission::Model as Submission;
use grader::{
    grade_objective, grade_subjective, QuestionGrade, SubjectiveEvaluator, SubjectiveRequest,
};

/// Aggregate result of grading one assignment.
#[derive(Debug, Clone, Serialize)]
pub struct GradeOutcome {
    pub assignment_id: i64,
    pub total_score: i32,
    pub max_score: i32,
    /// Rounded percentage in [0, 100]; 0 when there are no points at stake.
    pub percentage: i32,
    pub passed: bool,
    pub detail: Vec<QuestionGrade>,
}

/// Percentage from totals, guarding the empty-exam case.
pub fn aggregate_percentage(total_score: i32, max_score: i32) -> i32 {
    if max_score <= 0 {
        return 0;
    }
    ((total_score as f64 / max_score as f64) * 100.0).round() as i32
}

/// Grade every question of an assignment and persist the result.
///
/// Legal from `submitted` (first grading) and from `graded` (re-grade
/// overwriting the score row). Questions without a submission grade as
/// blank: zero points, incorrect.
pub async fn grade_assignment(
    db: &DatabaseConnection,
    evaluator: &dyn SubjectiveEvaluator,
    assignment_id: i64,
) -> ServiceResult<GradeOutcome> {
    let assignment = Assignment::find_by_id(db, assignment_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("assignment", assignment_id))?;

    let entry_status = assignment.status;
    if !entry_status.can_transition(AssignmentStatus::Graded) {
        return Err(ServiceError::invalid_transition(
            entry_status,
            AssignmentStatus::Graded,
            "grading requires a submitted assignment",
        ));
    }

    let exam = ExamEntity::find_by_id(assignment.exam_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("exam", assignment.exam_id))?;

    let questions = Question::find_by_exam(db, exam.id).await?;
    let submissions = Submission::find_by_assignment(db, assignment_id).await?;
    let by_question: HashMap<i64, &Submission> =
        submissions.iter().map(|s| (s.question_id, s)).collect();

    let mut detail = Vec::with_capacity(questions.len());
    for question in &questions {
        let submission = by_question.get(&question.id).copied();
        detail.push(grade_question(evaluator, question, submission).await);
    }

    let total_score: i32 = detail.iter().map(|grade| grade.awarded).sum();
    let max_score: i32 = detail.iter().map(|grade| grade.possible).sum();
    let percentage = aggregate_percentage(total_score, max_score);
    let passed = percentage >= exam.passing_score;
    let any_degraded = detail.iter().any(|grade| grade.degraded);

    persist_results(
        db,
        &assignment,
        &detail,
        &by_question,
        total_score,
        max_score,
        percentage,
        passed,
        any_degraded,
    )
    .await?;

    log::info!(
        "assignment {} graded: {}/{} ({}%), passed={}",
        assignment_id,
        total_score,
        max_score,
        percentage,
        passed
    );

    // Derived bookkeeping only on the first pass; re-grades must not
    // double-apply side effects.
    if entry_status == AssignmentStatus::Submitted && !assignment.is_practice {
        apply_side_effects(db, &assignment, &exam, percentage, passed).await?;
    }

    Ok(GradeOutcome {
        assignment_id,
        total_score,
        max_score,
        percentage,
        passed,
        detail,
    })
}

async fn grade_question(
    evaluator: &dyn SubjectiveEvaluator,
    question: &Question,
    submission: Option<&Submission>,
) -> QuestionGrade {
    let answer = submission
        .map(|s| s.answer.as_str())
        .filter(|text| !text.trim().is_empty());

    if question.question_type.is_objective() {
        let multi_select = question.question_type == QuestionType::MultipleAnswer;
        return grade_objective(
            question.id,
            &question.answer,
            answer,
            question.points,
            multi_select,
        );
    }

    match answer {
        Some(text) => {
            let request = SubjectiveRequest {
                question: question.content.clone(),
                reference_answer: question.answer.clone(),
                candidate_answer: text.to_string(),
                max_points: question.points,
            };
            grade_subjective(evaluator, question.id, &request).await
        }
        // Blank free-text answers score zero without bothering the service.
        None => QuestionGrade {
            question_id: question.id,
            awarded: 0,
            possible: question.points,
            is_correct: false,
            degraded: false,
            ai_evaluation: None,
        },
    }
}

/// Write every graded submission, the score row and the status flip as one
/// unit. The transaction also serializes racing re-grades of the same
/// assignment, preventing a lost update on the score row.
#[allow(clippy::too_many_arguments)]
async fn persist_results(
    db: &DatabaseConnection,
    assignment: &Assignment,
    detail: &[QuestionGrade],
    by_question: &HashMap<i64, &Submission>,
    total_score: i32,
    max_score: i32,
    percentage: i32,
    passed: bool,
    any_degraded: bool,
) -> ServiceResult<()> {
    let now = Utc::now();
    let txn = db.begin().await?;

    for grade in detail {
        if let Some(submission) = by_question.get(&grade.question_id) {
            let mut active = (*submission).clone().into_active_model();
            active.is_correct = Set(Some(grade.is_correct));
            active.score = Set(Some(grade.awarded));
            active.ai_evaluation = Set(match &grade.ai_evaluation {
                Some(evaluation) => Some(
                    serde_json::to_value(evaluation)
                        .map_err(|e| ServiceError::Validation(e.to_string()))?,
                ),
                None => None,
            });
            active.updated_at = Set(now);
            active.update(&txn).await?;
        }
    }

    let feedback = any_degraded.then(|| {
        "One or more answers could not be graded automatically and need human review."
            .to_string()
    });
    Score::upsert(
        &txn,
        assignment.id,
        total_score,
        max_score,
        percentage,
        passed,
        None,
        feedback,
    )
    .await?;

    let mut active = assignment.clone().into_active_model();
    active.status = Set(AssignmentStatus::Graded);
    active.updated_at = Set(now);
    active.update(&txn).await?;

    txn.commit().await?;
    Ok(())
}

async fn apply_side_effects(
    db: &DatabaseConnection,
    assignment: &Assignment,
    exam: &Exam,
    percentage: i32,
    passed: bool,
) -> ServiceResult<()> {
    wrong_questions::collect_wrong_questions(db, assignment.id, assignment.user_id).await?;

    notifications::notify(
        db,
        assignment.user_id,
        NotificationType::GradeReleased,
        &format!("Your result for \"{}\"", exam.title),
        &format!("You scored {}% on \"{}\".", percentage, exam.title),
        NoticeRefs {
            exam_id: Some(exam.id),
            assignment_id: Some(assignment.id),
            makeup_exam_id: None,
        },
    )
    .await?;

    if let Some(makeup_record) =
        db::models::makeup_exam::Model::find_by_makeup_assignment(db, assignment.id).await?
    {
        // This grading run was a makeup attempt; close the loop on the
        // originating record instead of opening a new one.
        makeup::complete_makeup(db, makeup_record.id, percentage).await?;
    } else if !passed {
        let reason = format!(
            "Scored {}%, below the passing threshold of {}%.",
            percentage, exam.passing_score
        );
        makeup::trigger_makeup(db, assignment, percentage, &reason, &makeup::MakeupPolicy::current())
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, FailingEvaluator, StubEvaluator};
    use db::models::makeup_exam::{Entity as MakeupExamEntity, MakeupStatus};
    use db::models::score::Entity as ScoreEntity;
    use db::models::wrong_question::Model as WrongQuestion;
    use db::test_utils::setup_test_db;

    #[test]
    fn test_aggregate_percentage_guards_zero_max() {
        assert_eq!(aggregate_percentage(0, 0), 0);
        assert_eq!(aggregate_percentage(20, 30), 67);
        assert_eq!(aggregate_percentage(30, 30), 100);
        assert_eq!(aggregate_percentage(0, 30), 0);
    }

    async fn three_question_exam(
        db: &sea_orm::DatabaseConnection,
    ) -> (db::models::user::Model, db::models::exam::Model, Vec<db::models::question::Model>) {
        let user = fixtures::candidate(db, "alice").await;
        let exam = fixtures::exam(db, user.id, 60).await;
        let mut questions = Vec::new();
        for category in ["ownership", "traits", "ownership"] {
            questions.push(
                fixtures::question(
                    db,
                    exam.id,
                    QuestionType::TrueFalse,
                    "true",
                    10,
                    Some(category),
                )
                .await,
            );
        }
        (user, exam, questions)
    }

    #[tokio::test]
    async fn test_two_of_three_correct_passes_without_makeup() {
        let db = setup_test_db().await;
        let (user, exam, questions) = three_question_exam(&db).await;
        let assignment = fixtures::assignment(
            &db,
            exam.id,
            user.id,
            AssignmentStatus::Submitted,
            None,
            false,
        )
        .await;

        fixtures::answer(&db, assignment.id, questions[0].id, "true").await;
        fixtures::answer(&db, assignment.id, questions[1].id, "TRUE ").await;
        fixtures::answer(&db, assignment.id, questions[2].id, "false").await;

        let evaluator = StubEvaluator { score: 0 };
        let outcome = grade_assignment(&db, &evaluator, assignment.id)
            .await
            .unwrap();

        assert_eq!(outcome.total_score, 20);
        assert_eq!(outcome.max_score, 30);
        assert_eq!(outcome.percentage, 67);
        assert!(outcome.passed);

        let graded = Assignment::find_by_id(&db, assignment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(graded.status, AssignmentStatus::Graded);

        // Passing grades never open a makeup record.
        assert!(MakeupExamEntity::find().all(&db).await.unwrap().is_empty());

        // The single miss still lands in the ledger.
        let wrong = WrongQuestion::find_by_user(&db, user.id).await.unwrap();
        assert_eq!(wrong.len(), 1);
        assert_eq!(wrong[0].question_id, questions[2].id);
    }

    #[tokio::test]
    async fn test_all_wrong_fails_and_opens_makeup() {
        let db = setup_test_db().await;
        let (user, exam, questions) = three_question_exam(&db).await;
        let _staff = fixtures::staff(&db, "root", db::models::user::Role::Admin).await;
        let assignment = fixtures::assignment(
            &db,
            exam.id,
            user.id,
            AssignmentStatus::Submitted,
            None,
            false,
        )
        .await;
        for question in &questions {
            fixtures::answer(&db, assignment.id, question.id, "false").await;
        }

        let evaluator = StubEvaluator { score: 0 };
        let outcome = grade_assignment(&db, &evaluator, assignment.id)
            .await
            .unwrap();

        assert_eq!(outcome.percentage, 0);
        assert!(!outcome.passed);

        let makeups = MakeupExamEntity::find().all(&db).await.unwrap();
        assert_eq!(makeups.len(), 1);
        assert_eq!(makeups[0].assignment_id, assignment.id);
        assert_eq!(makeups[0].makeup_count, 1);
        assert_eq!(makeups[0].status, MakeupStatus::Pending);
        assert_eq!(makeups[0].original_score, 0);

        let wrong = WrongQuestion::find_by_user(&db, user.id).await.unwrap();
        assert_eq!(wrong.len(), 3);
    }

    #[tokio::test]
    async fn test_regrade_is_idempotent() {
        let db = setup_test_db().await;
        let (user, exam, questions) = three_question_exam(&db).await;
        let assignment = fixtures::assignment(
            &db,
            exam.id,
            user.id,
            AssignmentStatus::Submitted,
            None,
            false,
        )
        .await;
        for question in &questions {
            fixtures::answer(&db, assignment.id, question.id, "false").await;
        }

        let evaluator = StubEvaluator { score: 0 };
        let first = grade_assignment(&db, &evaluator, assignment.id)
            .await
            .unwrap();
        let second = grade_assignment(&db, &evaluator, assignment.id)
            .await
            .unwrap();

        assert_eq!(first.total_score, second.total_score);
        assert_eq!(first.percentage, second.percentage);
        assert_eq!(first.passed, second.passed);

        // Exactly one score row, overwritten in place.
        let scores = ScoreEntity::find().all(&db).await.unwrap();
        assert_eq!(scores.len(), 1);

        // Side effects must not double-apply on the re-grade.
        let makeups = MakeupExamEntity::find().all(&db).await.unwrap();
        assert_eq!(makeups.len(), 1);
        let wrong = WrongQuestion::find_by_user(&db, user.id).await.unwrap();
        assert_eq!(wrong.len(), 3);
        assert!(wrong.iter().all(|entry| entry.wrong_count == 1));
    }

    #[tokio::test]
    async fn test_unanswered_questions_grade_as_blank() {
        let db = setup_test_db().await;
        let (user, exam, questions) = three_question_exam(&db).await;
        let assignment = fixtures::assignment(
            &db,
            exam.id,
            user.id,
            AssignmentStatus::Submitted,
            None,
            false,
        )
        .await;
        // Answer only the first question.
        fixtures::answer(&db, assignment.id, questions[0].id, "true").await;

        let evaluator = StubEvaluator { score: 0 };
        let outcome = grade_assignment(&db, &evaluator, assignment.id)
            .await
            .unwrap();

        assert_eq!(outcome.total_score, 10);
        assert_eq!(outcome.max_score, 30);
        assert_eq!(outcome.detail.len(), 3);
        assert_eq!(outcome.detail.iter().filter(|g| !g.is_correct).count(), 2);
    }

    #[tokio::test]
    async fn test_subjective_scoring_converts_quality_to_points() {
        let db = setup_test_db().await;
        let user = fixtures::candidate(&db, "alice").await;
        let exam = fixtures::exam(&db, user.id, 60).await;
        let question = fixtures::question(
            &db,
            exam.id,
            QuestionType::ShortAnswer,
            "Ownership means a single owner per value.",
            10,
            Some("ownership"),
        )
        .await;
        let assignment = fixtures::assignment(
            &db,
            exam.id,
            user.id,
            AssignmentStatus::Submitted,
            None,
            false,
        )
        .await;
        fixtures::answer(&db, assignment.id, question.id, "Each value has one owner.").await;

        let evaluator = StubEvaluator { score: 85 };
        let outcome = grade_assignment(&db, &evaluator, assignment.id)
            .await
            .unwrap();

        // round(85/100 * 10) = 9
        assert_eq!(outcome.total_score, 9);
        assert_eq!(outcome.percentage, 90);
        assert!(outcome.passed);

        let stored = Submission::find_by_assignment(&db, assignment.id)
            .await
            .unwrap();
        assert_eq!(stored[0].score, Some(9));
        assert_eq!(stored[0].is_correct, Some(true));
        assert!(stored[0].ai_evaluation.is_some());
    }

    #[tokio::test]
    async fn test_failed_evaluator_degrades_but_still_grades() {
        let db = setup_test_db().await;
        let user = fixtures::candidate(&db, "alice").await;
        let exam = fixtures::exam(&db, user.id, 60).await;
        let question = fixtures::question(
            &db,
            exam.id,
            QuestionType::ShortAnswer,
            "reference",
            10,
            None,
        )
        .await;
        let assignment = fixtures::assignment(
            &db,
            exam.id,
            user.id,
            AssignmentStatus::Submitted,
            None,
            false,
        )
        .await;
        fixtures::answer(&db, assignment.id, question.id, "an attempt").await;

        let outcome = grade_assignment(&db, &FailingEvaluator, assignment.id)
            .await
            .unwrap();

        assert_eq!(outcome.total_score, 0);
        assert!(outcome.detail[0].degraded);

        let graded = Assignment::find_by_id(&db, assignment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(graded.status, AssignmentStatus::Graded);

        let stored = Submission::find_by_assignment(&db, assignment.id)
            .await
            .unwrap();
        assert_eq!(stored[0].score, Some(0));
        assert_eq!(stored[0].is_correct, Some(false));
        let payload = stored[0].ai_evaluation.as_ref().unwrap();
        assert!(payload.to_string().contains("Automatic grading failed"));

        let score_row = Score::find_by_assignment(&db, assignment.id)
            .await
            .unwrap()
            .unwrap();
        assert!(score_row.feedback.unwrap().contains("human review"));
    }

    #[tokio::test]
    async fn test_grading_requires_submission() {
        let db = setup_test_db().await;
        let user = fixtures::candidate(&db, "alice").await;
        let exam = fixtures::exam(&db, user.id, 60).await;
        let assignment = fixtures::assignment(
            &db,
            exam.id,
            user.id,
            AssignmentStatus::InProgress,
            None,
            false,
        )
        .await;

        let evaluator = StubEvaluator { score: 0 };
        let err = grade_assignment(&db, &evaluator, assignment.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_exam_without_questions_grades_to_zero() {
        let db = setup_test_db().await;
        let user = fixtures::candidate(&db, "alice").await;
        let exam = fixtures::exam(&db, user.id, 60).await;
        let assignment = fixtures::assignment(
            &db,
            exam.id,
            user.id,
            AssignmentStatus::Submitted,
            None,
            false,
        )
        .await;

        let evaluator = StubEvaluator { score: 0 };
        let outcome = grade_assignment(&db, &evaluator, assignment.id)
            .await
            .unwrap();
        assert_eq!(outcome.max_score, 0);
        assert_eq!(outcome.percentage, 0);
        assert!(!outcome.passed);
    }

    #[tokio::test]
    async fn test_practice_assignments_skip_side_effects() {
        let db = setup_test_db().await;
        let (user, exam, questions) = three_question_exam(&db).await;
        let assignment = fixtures::assignment(
            &db,
            exam.id,
            user.id,
            AssignmentStatus::Submitted,
            None,
            true,
        )
        .await;
        for question in &questions {
            fixtures::answer(&db, assignment.id, question.id, "false").await;
        }

        let evaluator = StubEvaluator { score: 0 };
        let outcome = grade_assignment(&db, &evaluator, assignment.id)
            .await
            .unwrap();
        assert!(!outcome.passed);

        assert!(MakeupExamEntity::find().all(&db).await.unwrap().is_empty());
        assert!(WrongQuestion::find_by_user(&db, user.id)
            .await
            .unwrap()
            .is_empty());
    }
}
