//! # Overdue / Reminder Scheduler
//!
//! Periodic sweeps over non-submitted assignments with deadlines. The
//! reminder sweep notifies candidates at exactly 3, 1 and 0 days before
//! the deadline; the overdue sweep marks assignments whose deadline passed
//! and feeds them into the makeup pipeline. Both record a persistent
//! (assignment, kind) row *before* notifying, which is the at-most-once
//! guarantee per threshold per assignment — re-running a sweep the same
//! day sends nothing new, and a crash mid-sweep only requires re-running
//! it.

use chrono::{DateTime, Utc};

use crate::error::ServiceResult;
use crate::{makeup, notifications};
use db::models::assignment::Model as Assignment;
use db::models::notification::{NoticeRefs, NotificationType};
use db::models::reminder_log::{Model as ReminderLog, ReminderKind};

const SECONDS_PER_DAY: i64 = 86_400;

/// Thresholds, in whole days before the deadline, at which a reminder
/// fires.
const REMINDER_THRESHOLDS: [(i64, ReminderKind); 3] = [
    (3, ReminderKind::ThreeDays),
    (1, ReminderKind::OneDay),
    (0, ReminderKind::DueToday),
];

/// Whole days from `now` until `deadline`, by ceiling division: any part
/// of a day counts as a full day. Zero or negative means the deadline is
/// today or already behind.
pub fn days_until(now: DateTime<Utc>, deadline: DateTime<Utc>) -> i64 {
    let seconds = (deadline - now).num_seconds();
    -((-seconds).div_euclid(SECONDS_PER_DAY))
}

/// Send due reminders for every open assignment. Returns how many were
/// sent.
pub async fn run_reminder_sweep(
    db: &sea_orm::DatabaseConnection,
    now: DateTime<Utc>,
) -> ServiceResult<u64> {
    let open = Assignment::find_open_with_deadline(db).await?;
    let mut sent = 0;

    for assignment in open {
        let Some(deadline) = assignment.deadline else {
            continue;
        };

        // Ceiling division makes 0 mean "deadline earlier today": that is
        // the due-today reminder. Anything a full day behind belongs to
        // the overdue sweep alone.
        let days_left = days_until(now, deadline);
        let Some((_, kind)) = REMINDER_THRESHOLDS
            .iter()
            .find(|(threshold, _)| *threshold == days_left)
        else {
            continue;
        };
        if ReminderLog::exists(db, assignment.id, *kind).await? {
            continue;
        }

        // Record first: a duplicate send is worse than a lost one, and the
        // unique (assignment, kind) index backstops races between sweeps.
        ReminderLog::record(db, assignment.id, *kind, None, Some(deadline), now).await?;

        let content = match days_left {
            0 => "Your exam is due today.".to_string(),
            1 => "Your exam is due within a day.".to_string(),
            n => format!("Your exam is due in {} days.", n),
        };
        notifications::notify(
            db,
            assignment.user_id,
            NotificationType::DeadlineReminder,
            "Exam deadline approaching",
            &content,
            NoticeRefs {
                exam_id: Some(assignment.exam_id),
                assignment_id: Some(assignment.id),
                makeup_exam_id: None,
            },
        )
        .await?;
        sent += 1;
    }

    log::info!("reminder sweep sent {} notices", sent);
    Ok(sent)
}

/// Mark assignments whose deadline passed without submission as overdue,
/// once per assignment, recording the overdue-day count and the original
/// deadline for audit, and feed them into the makeup pipeline. Returns how
/// many assignments were marked.
pub async fn run_overdue_sweep(
    db: &sea_orm::DatabaseConnection,
    now: DateTime<Utc>,
) -> ServiceResult<u64> {
    let open = Assignment::find_open_with_deadline(db).await?;
    let policy = makeup::MakeupPolicy::current();
    let mut marked = 0;

    for assignment in open {
        let Some(deadline) = assignment.deadline else {
            continue;
        };
        if !assignment.is_overdue(now) {
            continue;
        }
        if ReminderLog::exists(db, assignment.id, ReminderKind::Overdue).await? {
            continue;
        }

        let overdue_days = -days_until(now, deadline);
        ReminderLog::record(
            db,
            assignment.id,
            ReminderKind::Overdue,
            Some(overdue_days as i32),
            Some(deadline),
            now,
        )
        .await?;

        notifications::notify(
            db,
            assignment.user_id,
            NotificationType::Overdue,
            "Exam overdue",
            &format!(
                "Your exam was due on {} and was never submitted.",
                deadline.format("%Y-%m-%d %H:%M UTC")
            ),
            NoticeRefs {
                exam_id: Some(assignment.exam_id),
                assignment_id: Some(assignment.id),
                makeup_exam_id: None,
            },
        )
        .await?;

        // A never-submitted assignment counts as a failed attempt with no
        // score; the trigger's own guard keeps this idempotent.
        makeup::trigger_makeup(
            db,
            &assignment,
            0,
            "The exam deadline passed without a submission.",
            &policy,
        )
        .await?;

        marked += 1;
    }

    log::info!("overdue sweep marked {} assignments", marked);
    Ok(marked)
}
