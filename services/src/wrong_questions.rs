//! Wrong-question ledger.
//!
//! A per-candidate, per-question error counter fed by grading. Entries are
//! upserted on every recorded miss, marked reviewed by an explicit action,
//! and removed only when the candidate later answers correctly outside the
//! grading flow. The grading path never deletes.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    QueryFilter, Set};

use crate::error::{ServiceError, ServiceResult};
use db::models::assignment::Model as Assignment;
use db::models::submission::Model as Submission;
use db::models::wrong_question::{Column as WrongQuestionColumn, Entity as WrongQuestionEntity,
    Model as WrongQuestion};

/// Record one miss for (candidate, question) at the given instant.
pub async fn record_miss(
    db: &DatabaseConnection,
    user_id: i64,
    question_id: i64,
    at: DateTime<Utc>,
) -> ServiceResult<WrongQuestion> {
    Ok(WrongQuestion::record_miss(db, user_id, question_id, at).await?)
}

/// Record a miss for every incorrect submission of an assignment.
///
/// Practice assignments never feed the ledger. Returns how many entries
/// were touched.
pub async fn collect_wrong_questions(
    db: &DatabaseConnection,
    assignment_id: i64,
    user_id: i64,
) -> ServiceResult<usize> {
    let assignment = Assignment::find_by_id(db, assignment_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("assignment", assignment_id))?;
    if assignment.is_practice {
        return Ok(0);
    }

    let now = Utc::now();
    let submissions = Submission::find_by_assignment(db, assignment_id).await?;
    let mut collected = 0;
    for submission in submissions {
        if submission.is_correct == Some(false) {
            WrongQuestion::record_miss(db, user_id, submission.question_id, now).await?;
            collected += 1;
        }
    }

    log::debug!(
        "collected {} wrong questions from assignment {} for user {}",
        collected,
        assignment_id,
        user_id
    );
    Ok(collected)
}

/// Mark entries reviewed, singly or in batch. Never touches `wrong_count`.
/// Returns how many entries were updated.
pub async fn mark_reviewed(
    db: &DatabaseConnection,
    user_id: i64,
    question_ids: &[i64],
) -> ServiceResult<u64> {
    let now = Utc::now();
    let entries = WrongQuestionEntity::find()
        .filter(WrongQuestionColumn::UserId.eq(user_id))
        .filter(WrongQuestionColumn::QuestionId.is_in(question_ids.to_vec()))
        .all(db)
        .await?;

    let mut updated = 0;
    for entry in entries {
        let mut active = entry.into_active_model();
        active.is_reviewed = Set(true);
        active.reviewed_at = Set(Some(now));
        active.update(db).await?;
        updated += 1;
    }
    Ok(updated)
}

/// Remove an entry because the candidate answered correctly outside
/// grading. Returns whether an entry existed.
pub async fn remove_on_correct(
    db: &DatabaseConnection,
    user_id: i64,
    question_id: i64,
) -> ServiceResult<bool> {
    let entry = WrongQuestion::find_by_user_and_question(db, user_id, question_id).await?;
    match entry {
        Some(model) => {
            WrongQuestionEntity::delete_by_id(model.id).exec(db).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use db::models::assignment::AssignmentStatus;
    use db::models::question::QuestionType;
    use db::test_utils::setup_test_db;
    use sea_orm::Set;

    async fn graded_submission(
        db: &DatabaseConnection,
        assignment_id: i64,
        question_id: i64,
        correct: bool,
    ) {
        let saved = fixtures::answer(db, assignment_id, question_id, "whatever").await;
        let mut active = saved.into_active_model();
        active.is_correct = Set(Some(correct));
        active.score = Set(Some(if correct { 10 } else { 0 }));
        active.update(db).await.unwrap();
    }

    #[tokio::test]
    async fn test_collect_records_only_incorrect_submissions() {
        let db = setup_test_db().await;
        let user = fixtures::candidate(&db, "alice").await;
        let exam = fixtures::exam(&db, user.id, 60).await;
        let q1 = fixtures::question(&db, exam.id, QuestionType::TrueFalse, "true", 10, None).await;
        let q2 = fixtures::question(&db, exam.id, QuestionType::TrueFalse, "true", 10, None).await;
        let assignment = fixtures::assignment(
            &db,
            exam.id,
            user.id,
            AssignmentStatus::Graded,
            None,
            false,
        )
        .await;

        graded_submission(&db, assignment.id, q1.id, false).await;
        graded_submission(&db, assignment.id, q2.id, true).await;

        let collected = collect_wrong_questions(&db, assignment.id, user.id)
            .await
            .unwrap();
        assert_eq!(collected, 1);

        let entries = WrongQuestion::find_by_user(&db, user.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].question_id, q1.id);
        assert_eq!(entries[0].wrong_count, 1);
    }

    #[tokio::test]
    async fn test_practice_assignments_do_not_feed_the_ledger() {
        let db = setup_test_db().await;
        let user = fixtures::candidate(&db, "alice").await;
        let exam = fixtures::exam(&db, user.id, 60).await;
        let q1 = fixtures::question(&db, exam.id, QuestionType::TrueFalse, "true", 10, None).await;
        let assignment = fixtures::assignment(
            &db,
            exam.id,
            user.id,
            AssignmentStatus::Graded,
            None,
            true,
        )
        .await;
        graded_submission(&db, assignment.id, q1.id, false).await;

        let collected = collect_wrong_questions(&db, assignment.id, user.id)
            .await
            .unwrap();
        assert_eq!(collected, 0);
        assert!(WrongQuestion::find_by_user(&db, user.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_mark_reviewed_leaves_count_alone() {
        let db = setup_test_db().await;
        let now = Utc::now();
        record_miss(&db, 7, 100, now).await.unwrap();
        record_miss(&db, 7, 100, now).await.unwrap();
        record_miss(&db, 7, 101, now).await.unwrap();

        let updated = mark_reviewed(&db, 7, &[100, 101]).await.unwrap();
        assert_eq!(updated, 2);

        let entries = WrongQuestion::find_by_user(&db, 7).await.unwrap();
        for entry in &entries {
            assert!(entry.is_reviewed);
            assert!(entry.reviewed_at.is_some());
        }
        let counted = entries.iter().find(|e| e.question_id == 100).unwrap();
        assert_eq!(counted.wrong_count, 2);
    }

    #[tokio::test]
    async fn test_remove_on_correct_deletes_the_entry() {
        let db = setup_test_db().await;
        record_miss(&db, 7, 100, Utc::now()).await.unwrap();

        assert!(remove_on_correct(&db, 7, 100).await.unwrap());
        assert!(!remove_on_correct(&db, 7, 100).await.unwrap());
        assert!(WrongQuestion::find_by_user(&db, 7).await.unwrap().is_empty());
    }
}
