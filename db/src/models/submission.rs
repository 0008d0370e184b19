use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};
use serde::Serialize;

/// Represents one candidate answer in the `submissions` table.
///
/// One row per (assignment, question); the pair is immutable once created.
/// Correctness and score stay `None` until grading runs.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    /// Primary key of the submission.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Assignment this answer belongs to.
    pub assignment_id: i64,
    /// Question being answered.
    pub question_id: i64,
    /// The candidate's raw answer text.
    pub answer: String,
    /// Correctness flag, set by grading.
    pub is_correct: Option<bool>,
    /// Awarded points, set by grading.
    pub score: Option<i32>,
    /// Structured evaluation payload from the subjective grader.
    pub ai_evaluation: Option<Json>,
    /// Optional human grader comment.
    pub comment: Option<String>,
    /// Timestamp when the submission was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp when the submission was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Defines relationships between `submissions` and other tables.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Link to the owning assignment.
    #[sea_orm(
        belongs_to = "super::assignment::Entity",
        from = "Column::AssignmentId",
        to = "super::assignment::Column::Id"
    )]
    Assignment,

    /// Link to the question answered.
    #[sea_orm(
        belongs_to = "super::question::Entity",
        from = "Column::QuestionId",
        to = "super::question::Column::Id"
    )]
    Question,
}

impl Related<super::assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl Related<super::question::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Question.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Save a candidate answer, creating the row or replacing the answer
    /// text of an existing one. Grading fields are reset on replacement so a
    /// changed answer can never carry a stale verdict.
    pub async fn save_answer(
        db: &DatabaseConnection,
        assignment_id: i64,
        question_id: i64,
        answer: &str,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();
        let existing = Entity::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .filter(Column::QuestionId.eq(question_id))
            .one(db)
            .await?;

        match existing {
            Some(model) => {
                let mut active: ActiveModel = model.into();
                active.answer = Set(answer.to_string());
                active.is_correct = Set(None);
                active.score = Set(None);
                active.ai_evaluation = Set(None);
                active.updated_at = Set(now);
                active.update(db).await
            }
            None => {
                ActiveModel {
                    assignment_id: Set(assignment_id),
                    question_id: Set(question_id),
                    answer: Set(answer.to_string()),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(db)
                .await
            }
        }
    }

    /// All submissions of an assignment.
    pub async fn find_by_assignment(
        db: &DatabaseConnection,
        assignment_id: i64,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .all(db)
            .await
    }
}
