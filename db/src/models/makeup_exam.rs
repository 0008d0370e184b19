use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};

/// Represents the status of a makeup record throughout its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "makeup_status_enum")]
pub enum MakeupStatus {
    /// Created after a failed grade, waiting for staff to schedule.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// A makeup assignment exists with a deadline.
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    /// The makeup assignment was graded.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// The deadline passed without the makeup being graded. One-way.
    #[sea_orm(string_value = "expired")]
    Expired,
}

impl std::fmt::Display for MakeupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status_str = match self {
            MakeupStatus::Pending => "pending",
            MakeupStatus::Scheduled => "scheduled",
            MakeupStatus::Completed => "completed",
            MakeupStatus::Expired => "expired",
        };
        write!(f, "{}", status_str)
    }
}

/// Represents a remediation record in the `makeup_exams` table.
///
/// Unique per originating assignment, which is what makes the failure
/// trigger idempotent under retries.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "makeup_exams")]
pub struct Model {
    /// Primary key of the makeup record.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The failed assignment this record remediates (unique).
    pub assignment_id: i64,
    /// Candidate being remediated.
    pub user_id: i64,
    /// Exam to be retaken.
    pub exam_id: i64,
    /// The new assignment created when staff schedule the makeup.
    pub makeup_assignment_id: Option<i64>,
    /// Which attempt this record is on.
    pub makeup_count: i32,
    /// Scheduling beyond this many attempts is rejected.
    pub max_attempts: i32,
    /// Deadline of the scheduled makeup attempt.
    pub deadline: Option<DateTime<Utc>>,
    /// Current status.
    pub status: MakeupStatus,
    /// Percentage scored on the original attempt.
    pub original_score: i32,
    /// Percentage scored on the makeup attempt, once graded.
    pub makeup_score: Option<i32>,
    /// Machine-generated reason the record exists.
    pub reason: String,
    /// Free-text staff notes.
    pub notes: Option<String>,
    /// Timestamp when the record was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp when the record was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Defines relationships between `makeup_exams` and other tables.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Link to the originating assignment.
    #[sea_orm(
        belongs_to = "super::assignment::Entity",
        from = "Column::AssignmentId",
        to = "super::assignment::Column::Id"
    )]
    Assignment,

    /// Link to the candidate.
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,

    /// Link to the exam.
    #[sea_orm(
        belongs_to = "super::exam::Entity",
        from = "Column::ExamId",
        to = "super::exam::Column::Id"
    )]
    Exam,
}

impl Related<super::assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::exam::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Exam.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn find_by_id(
        db: &DatabaseConnection,
        id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    /// The makeup record opened for an originating assignment, if any.
    pub async fn find_by_assignment(
        db: &DatabaseConnection,
        assignment_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .one(db)
            .await
    }

    /// The makeup record whose scheduled attempt is the given assignment.
    pub async fn find_by_makeup_assignment(
        db: &DatabaseConnection,
        assignment_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::MakeupAssignmentId.eq(assignment_id))
            .one(db)
            .await
    }

    /// All scheduled records, the working set of the expiry sweep.
    pub async fn find_scheduled(db: &DatabaseConnection) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::Status.eq(MakeupStatus::Scheduled))
            .all(db)
            .await
    }
}
