//! Notification producers.
//!
//! The engine only writes notification rows; persistence doubles as the
//! handoff to the external dispatcher, which delivers them out of band.

use sea_orm::DatabaseConnection;

use crate::error::ServiceResult;
use db::models::notification::{Model as Notification, NotificationType};
use db::models::user::Model as User;

pub use db::models::notification::NoticeRefs;

/// Persist a notice for one recipient.
pub async fn notify(
    db: &DatabaseConnection,
    user_id: i64,
    notification_type: NotificationType,
    title: &str,
    content: &str,
    refs: NoticeRefs,
) -> ServiceResult<Notification> {
    let notice = Notification::create(db, user_id, notification_type, title, content, refs).await?;
    log::debug!(
        "notification {} ({}) queued for user {}",
        notice.id,
        notification_type,
        user_id
    );
    Ok(notice)
}

/// Fan a notice out to every admin and editor account. Returns how many
/// notices were written.
pub async fn notify_staff(
    db: &DatabaseConnection,
    notification_type: NotificationType,
    title: &str,
    content: &str,
    refs: NoticeRefs,
) -> ServiceResult<u64> {
    let staff = User::find_staff(db).await?;
    let mut sent = 0;
    for account in staff {
        Notification::create(db, account.id, notification_type, title, content, refs).await?;
        sent += 1;
    }
    Ok(sent)
}
