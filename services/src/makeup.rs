//! # Makeup-Exam Workflow
//!
//! Observes grading outcomes: a failed non-practice assignment opens one
//! makeup record (idempotent under retries thanks to the unique
//! originating-assignment column), notifies the candidate and staff, and
//! derives learning recommendations from the wrong answers. Staff later
//! schedule the record, which creates a fresh assignment for the same
//! exam/candidate pair; grading that assignment completes the record. A
//! batch sweep expires scheduled records whose deadline passed unexercised.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, IntoActiveModel, Set};
use validator::Validate;

use crate::error::{ServiceError, ServiceResult};
use crate::notifications;
use db::models::assignment::Model as Assignment;
use db::models::learning_recommendation::{
    ActiveModel as RecommendationActiveModel, Priority, RecommendationType,
};
use db::models::makeup_exam::{ActiveModel as MakeupActiveModel, MakeupStatus, Model as MakeupExam};
use db::models::notification::{NoticeRefs, NotificationType};
use db::models::question::Model as Question;
use db::models::submission::Model as Submission;

/// Attempts allowed per makeup record unless configured otherwise.
pub const DEFAULT_MAX_ATTEMPTS: i32 = 2;

/// How many weak topics a recommendation lists.
const WEAK_TOPIC_LIMIT: usize = 3;

/// Tunables of the workflow.
#[derive(Debug, Clone)]
pub struct MakeupPolicy {
    pub max_attempts: i32,
}

impl Default for MakeupPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl MakeupPolicy {
    /// Policy from process configuration, falling back to the default when
    /// the process runs unconfigured (tests, embedded use).
    pub fn current() -> Self {
        match common::Config::try_get() {
            Some(config) => Self {
                max_attempts: config.makeup_max_attempts,
            },
            None => Self::default(),
        }
    }
}

/// Open a makeup record for a failed assignment.
///
/// Idempotent: an existing record for the originating assignment (or an
/// assignment that is itself a makeup attempt) makes this a no-op, so
/// retried grading never duplicates records, notifications or
/// recommendations. Returns the created record, or `None` when nothing was
/// done.
pub async fn trigger_makeup(
    db: &DatabaseConnection,
    assignment: &Assignment,
    original_score: i32,
    reason: &str,
    policy: &MakeupPolicy,
) -> ServiceResult<Option<MakeupExam>> {
    if assignment.is_practice {
        return Ok(None);
    }
    if MakeupExam::find_by_assignment(db, assignment.id)
        .await?
        .is_some()
    {
        log::debug!(
            "makeup record for assignment {} already exists, skipping",
            assignment.id
        );
        return Ok(None);
    }
    if MakeupExam::find_by_makeup_assignment(db, assignment.id)
        .await?
        .is_some()
    {
        // A failed makeup attempt does not spawn a second-level record;
        // staff reschedule the original record instead.
        return Ok(None);
    }

    let now = Utc::now();
    let makeup = MakeupActiveModel {
        assignment_id: Set(assignment.id),
        user_id: Set(assignment.user_id),
        exam_id: Set(assignment.exam_id),
        makeup_assignment_id: Set(None),
        makeup_count: Set(1),
        max_attempts: Set(policy.max_attempts),
        deadline: Set(None),
        status: Set(MakeupStatus::Pending),
        original_score: Set(original_score),
        makeup_score: Set(None),
        reason: Set(reason.to_string()),
        notes: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::info!(
        "makeup record {} opened for assignment {} (score {}%)",
        makeup.id,
        assignment.id,
        original_score
    );

    let refs = NoticeRefs {
        exam_id: Some(assignment.exam_id),
        assignment_id: Some(assignment.id),
        makeup_exam_id: Some(makeup.id),
    };
    notifications::notify(
        db,
        assignment.user_id,
        NotificationType::MakeupCreated,
        "You did not pass",
        &format!("{} A makeup exam will be scheduled for you.", reason),
        refs,
    )
    .await?;

    generate_recommendations(db, assignment, makeup.id).await?;

    notifications::notify_staff(
        db,
        NotificationType::MakeupStaffAlert,
        "New makeup candidate",
        &format!(
            "Candidate {} failed assignment {} and needs a makeup exam.",
            assignment.user_id, assignment.id
        ),
        refs,
    )
    .await?;

    Ok(Some(makeup))
}

/// Derive recommendations from the assignment's incorrect submissions:
/// the top missed categories as weak topics, plus the full wrong-question
/// list to practice. Skipped silently when nothing was answered wrong.
async fn generate_recommendations(
    db: &DatabaseConnection,
    assignment: &Assignment,
    makeup_exam_id: i64,
) -> ServiceResult<()> {
    let questions = Question::find_by_exam(db, assignment.exam_id).await?;
    let submissions = Submission::find_by_assignment(db, assignment.id).await?;

    let wrong_question_ids: Vec<i64> = submissions
        .iter()
        .filter(|submission| submission.is_correct == Some(false))
        .map(|submission| submission.question_id)
        .collect();
    if wrong_question_ids.is_empty() {
        return Ok(());
    }

    let mut category_counts: Vec<(String, usize)> = Vec::new();
    for question in &questions {
        if !wrong_question_ids.contains(&question.id) {
            continue;
        }
        let category = question
            .category
            .clone()
            .unwrap_or_else(|| "uncategorized".to_string());
        match category_counts.iter_mut().find(|(name, _)| *name == category) {
            Some((_, count)) => *count += 1,
            None => category_counts.push((category, 1)),
        }
    }
    // Rank by miss frequency; ties break alphabetically for stable output.
    category_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let now = Utc::now();
    let weak_topics: Vec<String> = category_counts
        .iter()
        .take(WEAK_TOPIC_LIMIT)
        .map(|(name, _)| name.clone())
        .collect();
    RecommendationActiveModel {
        user_id: Set(assignment.user_id),
        assignment_id: Set(assignment.id),
        makeup_exam_id: Set(Some(makeup_exam_id)),
        rec_type: Set(RecommendationType::WeakTopics),
        priority: Set(Priority::High),
        title: Set("Topics to revise".to_string()),
        content: Set(format!(
            "You missed the most questions in: {}.",
            weak_topics.join(", ")
        )),
        is_read: Set(false),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    RecommendationActiveModel {
        user_id: Set(assignment.user_id),
        assignment_id: Set(assignment.id),
        makeup_exam_id: Set(Some(makeup_exam_id)),
        rec_type: Set(RecommendationType::PracticeQuestions),
        priority: Set(Priority::Medium),
        title: Set("Questions to practice".to_string()),
        content: Set(format!(
            "Practice these questions before the makeup: {}.",
            wrong_question_ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )),
        is_read: Set(false),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(())
}

/// Parameters of the staff scheduling action.
#[derive(Debug, Clone, Validate)]
pub struct ScheduleMakeup {
    pub makeup_id: i64,
    pub deadline: DateTime<Utc>,
    #[validate(length(max = 1000, message = "notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

/// Schedule a makeup attempt: create the new pending assignment, link it,
/// and notify the candidate.
///
/// Rescheduling a completed (failed) attempt consumes another attempt;
/// exceeding `max_attempts` is rejected. The record itself is never
/// auto-expired by this guard — only the deadline sweep expires records.
pub async fn schedule_makeup(
    db: &DatabaseConnection,
    params: ScheduleMakeup,
) -> ServiceResult<Assignment> {
    params
        .validate()
        .map_err(|e| ServiceError::Validation(e.to_string()))?;
    let now = Utc::now();
    if params.deadline <= now {
        return Err(ServiceError::Validation(
            "makeup deadline must be in the future".to_string(),
        ));
    }

    let makeup = MakeupExam::find_by_id(db, params.makeup_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("makeup exam", params.makeup_id))?;

    let attempt = match makeup.status {
        MakeupStatus::Pending => makeup.makeup_count,
        // A completed (failed) attempt consumes another one.
        MakeupStatus::Completed => makeup.makeup_count + 1,
        MakeupStatus::Scheduled => {
            return Err(ServiceError::invalid_transition(
                makeup.status,
                MakeupStatus::Scheduled,
                "makeup is already scheduled",
            ));
        }
        MakeupStatus::Expired => {
            return Err(ServiceError::invalid_transition(
                makeup.status,
                MakeupStatus::Scheduled,
                "makeup record has expired",
            ));
        }
    };
    if attempt > makeup.max_attempts {
        return Err(ServiceError::invalid_transition(
            makeup.status,
            MakeupStatus::Scheduled,
            format!(
                "attempt {} exceeds the maximum of {}",
                attempt, makeup.max_attempts
            ),
        ));
    }

    let assignment = Assignment::create(
        db,
        makeup.exam_id,
        makeup.user_id,
        Some(params.deadline),
        false,
    )
    .await?;

    let makeup_id = makeup.id;
    let user_id = makeup.user_id;
    let exam_id = makeup.exam_id;
    let mut active = makeup.into_active_model();
    active.makeup_assignment_id = Set(Some(assignment.id));
    active.makeup_count = Set(attempt);
    active.deadline = Set(Some(params.deadline));
    active.status = Set(MakeupStatus::Scheduled);
    active.notes = Set(params.notes);
    active.updated_at = Set(now);
    active.update(db).await?;

    notifications::notify(
        db,
        user_id,
        NotificationType::MakeupScheduled,
        "Makeup exam scheduled",
        &format!(
            "Your makeup exam is scheduled; complete it by {}.",
            params.deadline.format("%Y-%m-%d %H:%M UTC")
        ),
        NoticeRefs {
            exam_id: Some(exam_id),
            assignment_id: Some(assignment.id),
            makeup_exam_id: Some(makeup_id),
        },
    )
    .await?;

    log::info!(
        "makeup {} scheduled as assignment {} (attempt {})",
        makeup_id,
        assignment.id,
        attempt
    );
    Ok(assignment)
}

/// Record the graded makeup attempt on its originating record.
pub async fn complete_makeup(
    db: &DatabaseConnection,
    makeup_id: i64,
    makeup_score: i32,
) -> ServiceResult<MakeupExam> {
    let makeup = MakeupExam::find_by_id(db, makeup_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("makeup exam", makeup_id))?;

    if makeup.status == MakeupStatus::Expired {
        return Err(ServiceError::invalid_transition(
            makeup.status,
            MakeupStatus::Completed,
            "makeup record has expired",
        ));
    }

    let mut active = makeup.into_active_model();
    active.makeup_score = Set(Some(makeup_score));
    active.status = Set(MakeupStatus::Completed);
    active.updated_at = Set(Utc::now());
    let updated = active.update(db).await?;

    log::info!(
        "makeup {} completed with score {}%",
        updated.id,
        makeup_score
    );
    Ok(updated)
}

/// Expire scheduled records whose deadline passed without the linked
/// assignment reaching `graded`. One-way; each record is persisted
/// independently so a crashed sweep can simply be re-run. Returns how many
/// records were expired.
pub async fn run_expiry_sweep(db: &DatabaseConnection, now: DateTime<Utc>) -> ServiceResult<u64> {
    let scheduled = MakeupExam::find_scheduled(db).await?;
    let mut expired = 0;

    for makeup in scheduled {
        let Some(deadline) = makeup.deadline else {
            continue;
        };
        if deadline >= now {
            continue;
        }

        let attempt_graded = match makeup.makeup_assignment_id {
            Some(assignment_id) => Assignment::find_by_id(db, assignment_id)
                .await?
                .map(|assignment| assignment.status.is_terminal())
                .unwrap_or(false),
            None => false,
        };
        if attempt_graded {
            continue;
        }

        let makeup_id = makeup.id;
        let mut active = makeup.into_active_model();
        active.status = Set(MakeupStatus::Expired);
        active.updated_at = Set(now);
        active.update(db).await?;
        expired += 1;
        log::info!("makeup {} expired", makeup_id);
    }

    Ok(expired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use chrono::Duration;
    use db::models::assignment::AssignmentStatus;
    use db::models::learning_recommendation::Entity as RecommendationEntity;
    use db::models::makeup_exam::Entity as MakeupExamEntity;
    use db::models::notification::Entity as NotificationEntity;
    use db::models::question::QuestionType;
    use db::test_utils::setup_test_db;
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

    async fn failed_assignment(
        db: &DatabaseConnection,
    ) -> (db::models::user::Model, Assignment) {
        let user = fixtures::candidate(db, "alice").await;
        let exam = fixtures::exam(db, user.id, 60).await;
        let assignment = fixtures::assignment(
            db,
            exam.id,
            user.id,
            AssignmentStatus::Graded,
            None,
            false,
        )
        .await;

        // Three graded-wrong answers across two categories.
        for category in ["ownership", "traits", "ownership"] {
            let question = fixtures::question(
                db,
                exam.id,
                QuestionType::TrueFalse,
                "true",
                10,
                Some(category),
            )
            .await;
            let saved = fixtures::answer(db, assignment.id, question.id, "false").await;
            let mut active = saved.into_active_model();
            active.is_correct = Set(Some(false));
            active.score = Set(Some(0));
            active.update(db).await.unwrap();
        }

        (user, assignment)
    }

    #[tokio::test]
    async fn test_trigger_is_idempotent() {
        let db = setup_test_db().await;
        let (_user, assignment) = failed_assignment(&db).await;
        let policy = MakeupPolicy::default();

        let first = trigger_makeup(&db, &assignment, 0, "failed", &policy)
            .await
            .unwrap();
        assert!(first.is_some());

        let second = trigger_makeup(&db, &assignment, 0, "failed", &policy)
            .await
            .unwrap();
        assert!(second.is_none());

        let all = MakeupExamEntity::find().all(&db).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].makeup_count, 1);
        assert_eq!(all[0].max_attempts, DEFAULT_MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_trigger_generates_ranked_recommendations() {
        let db = setup_test_db().await;
        let (user, assignment) = failed_assignment(&db).await;

        trigger_makeup(&db, &assignment, 0, "failed", &MakeupPolicy::default())
            .await
            .unwrap();

        let recommendations = RecommendationEntity::find().all(&db).await.unwrap();
        assert_eq!(recommendations.len(), 2);

        let weak = recommendations
            .iter()
            .find(|r| r.rec_type == RecommendationType::WeakTopics)
            .unwrap();
        assert_eq!(weak.user_id, user.id);
        // ownership was missed twice, traits once.
        assert!(weak.content.contains("ownership, traits"));

        let practice = recommendations
            .iter()
            .find(|r| r.rec_type == RecommendationType::PracticeQuestions)
            .unwrap();
        assert!(!practice.content.is_empty());
    }

    #[tokio::test]
    async fn test_trigger_without_wrong_answers_skips_recommendations() {
        let db = setup_test_db().await;
        let user = fixtures::candidate(&db, "alice").await;
        let exam = fixtures::exam(&db, user.id, 60).await;
        let assignment = fixtures::assignment(
            &db,
            exam.id,
            user.id,
            AssignmentStatus::Graded,
            None,
            false,
        )
        .await;

        let created = trigger_makeup(
            &db,
            &assignment,
            0,
            "missed the deadline",
            &MakeupPolicy::default(),
        )
        .await
        .unwrap();
        assert!(created.is_some());
        assert!(RecommendationEntity::find().all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_schedule_links_assignment_and_notifies() {
        let db = setup_test_db().await;
        let (user, assignment) = failed_assignment(&db).await;
        let makeup = trigger_makeup(&db, &assignment, 0, "failed", &MakeupPolicy::default())
            .await
            .unwrap()
            .unwrap();

        let deadline = Utc::now() + Duration::days(7);
        let attempt = schedule_makeup(
            &db,
            ScheduleMakeup {
                makeup_id: makeup.id,
                deadline,
                notes: Some("second chance".to_string()),
            },
        )
        .await
        .unwrap();

        assert_eq!(attempt.status, AssignmentStatus::Pending);
        assert_eq!(attempt.user_id, user.id);
        assert_eq!(attempt.deadline, Some(deadline));

        let updated = MakeupExam::find_by_id(&db, makeup.id).await.unwrap().unwrap();
        assert_eq!(updated.status, MakeupStatus::Scheduled);
        assert_eq!(updated.makeup_assignment_id, Some(attempt.id));
        assert_eq!(updated.notes.as_deref(), Some("second chance"));

        let scheduled_notices = NotificationEntity::find()
            .filter(
                db::models::notification::Column::NotificationType
                    .eq(NotificationType::MakeupScheduled),
            )
            .all(&db)
            .await
            .unwrap();
        assert_eq!(scheduled_notices.len(), 1);
        assert_eq!(scheduled_notices[0].user_id, user.id);
    }

    #[tokio::test]
    async fn test_schedule_rejects_when_already_scheduled() {
        let db = setup_test_db().await;
        let (_user, assignment) = failed_assignment(&db).await;
        let makeup = trigger_makeup(&db, &assignment, 0, "failed", &MakeupPolicy::default())
            .await
            .unwrap()
            .unwrap();

        let deadline = Utc::now() + Duration::days(7);
        schedule_makeup(
            &db,
            ScheduleMakeup {
                makeup_id: makeup.id,
                deadline,
                notes: None,
            },
        )
        .await
        .unwrap();

        let err = schedule_makeup(
            &db,
            ScheduleMakeup {
                makeup_id: makeup.id,
                deadline,
                notes: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_rescheduling_consumes_attempts_until_exhausted() {
        let db = setup_test_db().await;
        let (_user, assignment) = failed_assignment(&db).await;
        let makeup = trigger_makeup(&db, &assignment, 0, "failed", &MakeupPolicy::default())
            .await
            .unwrap()
            .unwrap();
        let deadline = Utc::now() + Duration::days(7);

        // Attempt 1: schedule, fail, complete.
        schedule_makeup(
            &db,
            ScheduleMakeup {
                makeup_id: makeup.id,
                deadline,
                notes: None,
            },
        )
        .await
        .unwrap();
        complete_makeup(&db, makeup.id, 40).await.unwrap();

        // Attempt 2: allowed, consumes the second and final attempt.
        schedule_makeup(
            &db,
            ScheduleMakeup {
                makeup_id: makeup.id,
                deadline,
                notes: None,
            },
        )
        .await
        .unwrap();
        let after = MakeupExam::find_by_id(&db, makeup.id).await.unwrap().unwrap();
        assert_eq!(after.makeup_count, 2);
        complete_makeup(&db, makeup.id, 50).await.unwrap();

        // Attempt 3: rejected, record untouched.
        let err = schedule_makeup(
            &db,
            ScheduleMakeup {
                makeup_id: makeup.id,
                deadline,
                notes: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition { .. }));
        let still = MakeupExam::find_by_id(&db, makeup.id).await.unwrap().unwrap();
        assert_eq!(still.status, MakeupStatus::Completed);
        assert_eq!(still.makeup_count, 2);
    }

    #[tokio::test]
    async fn test_schedule_rejects_past_deadline() {
        let db = setup_test_db().await;
        let (_user, assignment) = failed_assignment(&db).await;
        let makeup = trigger_makeup(&db, &assignment, 0, "failed", &MakeupPolicy::default())
            .await
            .unwrap()
            .unwrap();

        let err = schedule_makeup(
            &db,
            ScheduleMakeup {
                makeup_id: makeup.id,
                deadline: Utc::now() - Duration::hours(1),
                notes: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_expiry_sweep_is_one_way_and_idempotent() {
        let db = setup_test_db().await;
        let (_user, assignment) = failed_assignment(&db).await;
        let makeup = trigger_makeup(&db, &assignment, 0, "failed", &MakeupPolicy::default())
            .await
            .unwrap()
            .unwrap();
        let deadline = Utc::now() + Duration::days(1);
        schedule_makeup(
            &db,
            ScheduleMakeup {
                makeup_id: makeup.id,
                deadline,
                notes: None,
            },
        )
        .await
        .unwrap();

        // Before the deadline nothing expires.
        assert_eq!(run_expiry_sweep(&db, Utc::now()).await.unwrap(), 0);

        // After the deadline the unexercised record expires exactly once.
        let later = deadline + Duration::days(1);
        assert_eq!(run_expiry_sweep(&db, later).await.unwrap(), 1);
        assert_eq!(run_expiry_sweep(&db, later).await.unwrap(), 0);

        let expired = MakeupExam::find_by_id(&db, makeup.id).await.unwrap().unwrap();
        assert_eq!(expired.status, MakeupStatus::Expired);

        // Expired records cannot be rescheduled or completed.
        let err = schedule_makeup(
            &db,
            ScheduleMakeup {
                makeup_id: makeup.id,
                deadline: later + Duration::days(7),
                notes: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition { .. }));
        let err = complete_makeup(&db, makeup.id, 80).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_expiry_sweep_spares_graded_attempts() {
        let db = setup_test_db().await;
        let (_user, assignment) = failed_assignment(&db).await;
        let makeup = trigger_makeup(&db, &assignment, 0, "failed", &MakeupPolicy::default())
            .await
            .unwrap()
            .unwrap();
        let deadline = Utc::now() + Duration::days(1);
        let attempt = schedule_makeup(
            &db,
            ScheduleMakeup {
                makeup_id: makeup.id,
                deadline,
                notes: None,
            },
        )
        .await
        .unwrap();

        // The attempt reached graded before the deadline passed.
        let mut active = attempt.into_active_model();
        active.status = Set(AssignmentStatus::Graded);
        active.update(&db).await.unwrap();

        let later = deadline + Duration::days(1);
        assert_eq!(run_expiry_sweep(&db, later).await.unwrap(), 0);
        let untouched = MakeupExam::find_by_id(&db, makeup.id).await.unwrap().unwrap();
        assert_eq!(untouched.status, MakeupStatus::Scheduled);
    }
}
