use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};

/// Represents the status of an assignment throughout its lifecycle.
///
/// The legal order is `pending -> in_progress -> submitted -> graded`.
/// `graded` is terminal; an administrative reopen (external override) is the
/// only way back and is not modelled here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "assignment_status_enum"
)]
pub enum AssignmentStatus {
    /// Issued but not yet opened by the candidate.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Candidate has opened the exam.
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    /// Answers handed in, waiting for grading.
    #[sea_orm(string_value = "submitted")]
    Submitted,
    /// Grading complete.
    #[sea_orm(string_value = "graded")]
    Graded,
}

impl Default for AssignmentStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status_str = match self {
            AssignmentStatus::Pending => "pending",
            AssignmentStatus::InProgress => "in_progress",
            AssignmentStatus::Submitted => "submitted",
            AssignmentStatus::Graded => "graded",
        };
        write!(f, "{}", status_str)
    }
}

impl AssignmentStatus {
    /// Whether a transition to `next` is legal.
    ///
    /// `Submitted -> Graded` and `Graded -> Graded` are both allowed: a
    /// re-grade overwrites the score row rather than erroring.
    pub fn can_transition(&self, next: AssignmentStatus) -> bool {
        use AssignmentStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress) | (InProgress, Submitted) | (Submitted, Graded) | (Graded, Graded)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AssignmentStatus::Graded)
    }
}

/// Represents one candidate's instance of taking one exam.
///
/// Assignments are never hard-deleted; exam-level deletion cascades
/// logically through the exam's lifecycle status.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "assignments")]
pub struct Model {
    /// Primary key of the assignment.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Exam being taken.
    pub exam_id: i64,
    /// Candidate taking it.
    pub user_id: i64,
    /// Current lifecycle status.
    pub status: AssignmentStatus,
    /// When staff issued the assignment (or the candidate self-started).
    pub assigned_at: DateTime<Utc>,
    /// When the candidate opened the exam.
    pub started_at: Option<DateTime<Utc>>,
    /// When answers were handed in.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Submission deadline; `None` means open-ended.
    pub deadline: Option<DateTime<Utc>>,
    /// Practice runs never feed the makeup or wrong-question pipelines.
    pub is_practice: bool,
    /// Timestamp when the assignment was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp when the assignment was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Defines relationships between `assignments` and other tables.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Link to the exam being taken.
    #[sea_orm(
        belongs_to = "super::exam::Entity",
        from = "Column::ExamId",
        to = "super::exam::Column::Id"
    )]
    Exam,

    /// Link to the candidate.
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::exam::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Exam.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        exam_id: i64,
        user_id: i64,
        deadline: Option<DateTime<Utc>>,
        is_practice: bool,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();
        ActiveModel {
            exam_id: Set(exam_id),
            user_id: Set(user_id),
            status: Set(AssignmentStatus::Pending),
            assigned_at: Set(now),
            deadline: Set(deadline),
            is_practice: Set(is_practice),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn find_by_id(
        db: &DatabaseConnection,
        id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    /// Non-submitted assignments that carry a deadline, the working set of
    /// the reminder and overdue sweeps.
    pub async fn find_open_with_deadline(
        db: &DatabaseConnection,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(
                Column::Status
                    .is_in([AssignmentStatus::Pending, AssignmentStatus::InProgress]),
            )
            .filter(Column::Deadline.is_not_null())
            .all(db)
            .await
    }

    /// Whether the deadline has passed at `now`. Open-ended assignments are
    /// never overdue.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.deadline {
            Some(deadline) => now > deadline,
            None => false,
        }
    }
}
