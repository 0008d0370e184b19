use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};

/// Which deadline threshold a log row records.
///
/// The (assignment, kind) pair is unique: a row is the persistent
/// idempotency key that makes sweeps at-most-once per threshold, surviving
/// process restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "reminder_kind_enum")]
pub enum ReminderKind {
    #[sea_orm(string_value = "three_days")]
    ThreeDays,
    #[sea_orm(string_value = "one_day")]
    OneDay,
    #[sea_orm(string_value = "due_today")]
    DueToday,
    /// The mark-overdue action; doubles as its audit record.
    #[sea_orm(string_value = "overdue")]
    Overdue,
}

impl std::fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind_str = match self {
            ReminderKind::ThreeDays => "three_days",
            ReminderKind::OneDay => "one_day",
            ReminderKind::DueToday => "due_today",
            ReminderKind::Overdue => "overdue",
        };
        write!(f, "{}", kind_str)
    }
}

/// Represents one applied reminder/overdue action in the `reminder_logs`
/// table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "reminder_logs")]
pub struct Model {
    /// Primary key of the log row.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Assignment the action applied to.
    pub assignment_id: i64,
    /// Which threshold fired.
    pub kind: ReminderKind,
    /// Days past the deadline when marked overdue, audit only.
    pub overdue_days: Option<i32>,
    /// The deadline in force when the action fired, audit only.
    pub deadline_was: Option<DateTime<Utc>>,
    /// When the action fired.
    pub sent_at: DateTime<Utc>,
}

/// Defines relationships between `reminder_logs` and other tables.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Link to the assignment.
    #[sea_orm(
        belongs_to = "super::assignment::Entity",
        from = "Column::AssignmentId",
        to = "super::assignment::Column::Id"
    )]
    Assignment,
}

impl Related<super::assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this (assignment, kind) action already fired.
    pub async fn exists(
        db: &DatabaseConnection,
        assignment_id: i64,
        kind: ReminderKind,
    ) -> Result<bool, DbErr> {
        let found = Entity::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .filter(Column::Kind.eq(kind))
            .one(db)
            .await?;
        Ok(found.is_some())
    }

    pub async fn record(
        db: &DatabaseConnection,
        assignment_id: i64,
        kind: ReminderKind,
        overdue_days: Option<i32>,
        deadline_was: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    ) -> Result<Model, DbErr> {
        ActiveModel {
            assignment_id: Set(assignment_id),
            kind: Set(kind),
            overdue_days: Set(overdue_days),
            deadline_was: Set(deadline_was),
            sent_at: Set(at),
            ..Default::default()
        }
        .insert(db)
        .await
    }
}
