use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};

/// Represents the aggregate grading result of one assignment.
///
/// Unique per assignment: re-grading overwrites the existing row instead of
/// appending a second one.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "scores")]
pub struct Model {
    /// Primary key of the score row.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Assignment this score belongs to (unique).
    pub assignment_id: i64,
    /// Points earned across all questions.
    pub total_score: i32,
    /// Maximum points available.
    pub max_score: i32,
    /// Rounded percentage in [0, 100].
    pub percentage: i32,
    /// Whether the percentage met the exam's passing threshold.
    pub passed: bool,
    /// Staff account that graded, `None` for automatic grading.
    pub graded_by: Option<i64>,
    /// When grading completed.
    pub graded_at: DateTime<Utc>,
    /// Free-text feedback for the candidate.
    pub feedback: Option<String>,
}

/// Defines relationships between `scores` and other tables.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Link to the graded assignment.
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
    pub async fn find_by_assignment<C: ConnectionTrait>(
        db: &C,
        assignment_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .one(db)
            .await
    }

    /// Create or overwrite the single score row of an assignment.
    ///
    /// Generic over the connection so the grading orchestrator can run it
    /// inside a transaction together with the status flip.
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert<C: ConnectionTrait>(
        db: &C,
        assignment_id: i64,
        total_score: i32,
        max_score: i32,
        percentage: i32,
        passed: bool,
        graded_by: Option<i64>,
        feedback: Option<String>,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();
        let existing = Self::find_by_assignment(db, assignment_id).await?;

        match existing {
            Some(model) => {
                let mut active: ActiveModel = model.into();
                active.total_score = Set(total_score);
                active.max_score = Set(max_score);
                active.percentage = Set(percentage);
                active.passed = Set(passed);
                active.graded_by = Set(graded_by);
                active.graded_at = Set(now);
                active.feedback = Set(feedback);
                active.update(db).await
            }
            None => {
                ActiveModel {
                    assignment_id: Set(assignment_id),
                    total_score: Set(total_score),
                    max_score: Set(max_score),
                    percentage: Set(percentage),
                    passed: Set(passed),
                    graded_by: Set(graded_by),
                    graded_at: Set(now),
                    feedback: Set(feedback),
                    ..Default::default()
                }
                .insert(db)
                .await
            }
        }
    }
}
