use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DatabaseConnection, DbErr, Set};
use serde::{Deserialize, Serialize};

/// What a notification is about. Delivery happens out of band; the engine
/// only writes rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "notification_type_enum"
)]
pub enum NotificationType {
    /// An exam was assigned to the candidate.
    #[sea_orm(string_value = "exam_assigned")]
    ExamAssigned,
    /// Grading finished and a score is available.
    #[sea_orm(string_value = "grade_released")]
    GradeReleased,
    /// The candidate failed and a makeup record was opened.
    #[sea_orm(string_value = "makeup_created")]
    MakeupCreated,
    /// Staff scheduled the makeup attempt.
    #[sea_orm(string_value = "makeup_scheduled")]
    MakeupScheduled,
    /// Staff alert: a candidate needs a makeup.
    #[sea_orm(string_value = "makeup_staff_alert")]
    MakeupStaffAlert,
    /// Deadline approaching.
    #[sea_orm(string_value = "deadline_reminder")]
    DeadlineReminder,
    /// Deadline passed without submission.
    #[sea_orm(string_value = "overdue")]
    Overdue,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let type_str = match self {
            NotificationType::ExamAssigned => "exam_assigned",
            NotificationType::GradeReleased => "grade_released",
            NotificationType::MakeupCreated => "makeup_created",
            NotificationType::MakeupScheduled => "makeup_scheduled",
            NotificationType::MakeupStaffAlert => "makeup_staff_alert",
            NotificationType::DeadlineReminder => "deadline_reminder",
            NotificationType::Overdue => "overdue",
        };
        write!(f, "{}", type_str)
    }
}

/// Represents a notice in the `notifications` table, produced by the engine
/// and delivered by an external dispatcher.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    /// Primary key of the notification.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Recipient account.
    pub user_id: i64,
    /// What the notice is about.
    pub notification_type: NotificationType,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Related exam, if any.
    pub exam_id: Option<i64>,
    /// Related assignment, if any.
    pub assignment_id: Option<i64>,
    /// Related makeup record, if any.
    pub makeup_exam_id: Option<i64>,
    /// Whether the recipient has opened it.
    pub is_read: bool,
    /// Timestamp when the notification was created.
    pub created_at: DateTime<Utc>,
}

/// Defines relationships between `notifications` and other tables.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Link to the recipient.
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Optional entity references attached to a notice.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoticeRefs {
    pub exam_id: Option<i64>,
    pub assignment_id: Option<i64>,
    pub makeup_exam_id: Option<i64>,
}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        user_id: i64,
        notification_type: NotificationType,
        title: &str,
        content: &str,
        refs: NoticeRefs,
    ) -> Result<Model, DbErr> {
        ActiveModel {
            user_id: Set(user_id),
            notification_type: Set(notification_type),
            title: Set(title.to_string()),
            content: Set(content.to_string()),
            exam_id: Set(refs.exam_id),
            assignment_id: Set(refs.assignment_id),
            makeup_exam_id: Set(refs.makeup_exam_id),
            is_read: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
    }
}
