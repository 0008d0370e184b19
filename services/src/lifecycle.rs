//! Assignment state machine.
//!
//! Owns the `pending -> in_progress -> submitted -> graded` lifecycle. The
//! legality of a transition is defined on
//! [`AssignmentStatus::can_transition`]; this module enforces it against
//! the stored row and records the transition timestamps.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, IntoActiveModel, Set};

use crate::error::{ServiceError, ServiceResult};
use db::models::assignment::{AssignmentStatus, Model as Assignment};

/// Open an assignment: `pending -> in_progress`, recording the start
/// timestamp.
///
/// Opening past the deadline is rejected so the caller surfaces the overdue
/// condition instead of silently starting a doomed attempt.
pub async fn start_assignment(
    db: &DatabaseConnection,
    assignment_id: i64,
) -> ServiceResult<Assignment> {
    let assignment = Assignment::find_by_id(db, assignment_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("assignment", assignment_id))?;

    let now = Utc::now();
    if assignment.is_overdue(now) {
        return Err(ServiceError::invalid_transition(
            assignment.status,
            AssignmentStatus::InProgress,
            "deadline has passed; the assignment is overdue",
        ));
    }
    if !assignment.status.can_transition(AssignmentStatus::InProgress) {
        return Err(ServiceError::invalid_transition(
            assignment.status,
            AssignmentStatus::InProgress,
            "only a pending assignment can be started",
        ));
    }

    let mut active = assignment.into_active_model();
    active.status = Set(AssignmentStatus::InProgress);
    active.started_at = Set(Some(now));
    active.updated_at = Set(now);
    let updated = active.update(db).await?;

    log::info!("assignment {} started", updated.id);
    Ok(updated)
}

/// Hand in an assignment: `in_progress -> submitted`, recording the submit
/// timestamp.
///
/// This is also the auto-submit entry point: when the time limit elapses
/// the scheduler calls it on the candidate's behalf, and any question
/// without a saved answer grades as blank.
pub async fn submit_assignment(
    db: &DatabaseConnection,
    assignment_id: i64,
) -> ServiceResult<Assignment> {
    let assignment = Assignment::find_by_id(db, assignment_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("assignment", assignment_id))?;

    if !assignment.status.can_transition(AssignmentStatus::Submitted) {
        return Err(ServiceError::invalid_transition(
            assignment.status,
            AssignmentStatus::Submitted,
            "only an in-progress assignment can be submitted",
        ));
    }

    let now = Utc::now();
    if assignment.is_overdue(now) {
        log::warn!("assignment {} submitted after its deadline", assignment.id);
    }

    let mut active = assignment.into_active_model();
    active.status = Set(AssignmentStatus::Submitted);
    active.submitted_at = Set(Some(now));
    active.updated_at = Set(now);
    let updated = active.update(db).await?;

    log::info!("assignment {} submitted", updated.id);
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use chrono::Duration;
    use db::test_utils::setup_test_db;

    #[tokio::test]
    async fn test_start_records_timestamp_and_status() {
        let db = setup_test_db().await;
        let user = fixtures::candidate(&db, "alice").await;
        let exam = fixtures::exam(&db, user.id, 60).await;
        let assignment = fixtures::assignment(
            &db,
            exam.id,
            user.id,
            AssignmentStatus::Pending,
            Some(Utc::now() + Duration::days(2)),
            false,
        )
        .await;

        let started = start_assignment(&db, assignment.id).await.unwrap();
        assert_eq!(started.status, AssignmentStatus::InProgress);
        assert!(started.started_at.is_some());
    }

    #[tokio::test]
    async fn test_start_past_deadline_is_rejected() {
        let db = setup_test_db().await;
        let user = fixtures::candidate(&db, "alice").await;
        let exam = fixtures::exam(&db, user.id, 60).await;
        let assignment = fixtures::assignment(
            &db,
            exam.id,
            user.id,
            AssignmentStatus::Pending,
            Some(Utc::now() - Duration::hours(1)),
            false,
        )
        .await;

        let err = start_assignment(&db, assignment.id).await.unwrap_err();
        match err {
            ServiceError::InvalidTransition { reason, .. } => {
                assert!(reason.contains("overdue"));
            }
            other => panic!("expected InvalidTransition, got {other:?}"),
        }

        // Status must be untouched.
        let unchanged = db::models::assignment::Model::find_by_id(&db, assignment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unchanged.status, AssignmentStatus::Pending);
    }

    #[tokio::test]
    async fn test_double_start_is_rejected() {
        let db = setup_test_db().await;
        let user = fixtures::candidate(&db, "alice").await;
        let exam = fixtures::exam(&db, user.id, 60).await;
        let assignment = fixtures::assignment(
            &db,
            exam.id,
            user.id,
            AssignmentStatus::Pending,
            None,
            false,
        )
        .await;

        start_assignment(&db, assignment.id).await.unwrap();
        let err = start_assignment(&db, assignment.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_submit_requires_in_progress() {
        let db = setup_test_db().await;
        let user = fixtures::candidate(&db, "alice").await;
        let exam = fixtures::exam(&db, user.id, 60).await;
        let pending = fixtures::assignment(
            &db,
            exam.id,
            user.id,
            AssignmentStatus::Pending,
            None,
            false,
        )
        .await;

        let err = submit_assignment(&db, pending.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_submit_records_timestamp() {
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

        let submitted = submit_assignment(&db, assignment.id).await.unwrap();
        assert_eq!(submitted.status, AssignmentStatus::Submitted);
        assert!(submitted.submitted_at.is_some());
    }

    #[tokio::test]
    async fn test_late_submit_still_succeeds() {
        // Auto-submit after the time limit elapses goes through the same
        // path; a deadline in the past must not block it.
        let db = setup_test_db().await;
        let user = fixtures::candidate(&db, "alice").await;
        let exam = fixtures::exam(&db, user.id, 60).await;
        let assignment = fixtures::assignment(
            &db,
            exam.id,
            user.id,
            AssignmentStatus::InProgress,
            Some(Utc::now() - Duration::minutes(5)),
            false,
        )
        .await;

        let submitted = submit_assignment(&db, assignment.id).await.unwrap();
        assert_eq!(submitted.status, AssignmentStatus::Submitted);
    }

    #[tokio::test]
    async fn test_missing_assignment_is_not_found() {
        let db = setup_test_db().await;
        let err = start_assignment(&db, 9999).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }
}
