use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};

/// Represents a per-candidate error counter in the `wrong_questions` table.
///
/// Unique per (user, question). Repeated misses increment `wrong_count` and
/// reset the reviewed flag; the row is only removed by an explicit
/// answered-correctly action outside grading.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wrong_questions")]
pub struct Model {
    /// Primary key of the entry.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Candidate who missed the question.
    pub user_id: i64,
    /// Question that was missed.
    pub question_id: i64,
    /// How many times the candidate has missed it.
    pub wrong_count: i32,
    /// When the most recent miss happened.
    pub last_wrong_at: DateTime<Utc>,
    /// Whether the candidate has reviewed this entry since the last miss.
    pub is_reviewed: bool,
    /// When it was marked reviewed.
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Defines relationships between `wrong_questions` and other tables.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Link to the candidate.
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,

    /// Link to the missed question.
    #[sea_orm(
        belongs_to = "super::question::Entity",
        from = "Column::QuestionId",
        to = "super::question::Column::Id"
    )]
    Question,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::question::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Question.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn find_by_user_and_question(
        db: &DatabaseConnection,
        user_id: i64,
        question_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::QuestionId.eq(question_id))
            .one(db)
            .await
    }

    /// Upsert a miss: increment the counter and un-review an existing entry,
    /// or insert a fresh one with `wrong_count = 1`.
    pub async fn record_miss(
        db: &DatabaseConnection,
        user_id: i64,
        question_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Model, DbErr> {
        let existing = Self::find_by_user_and_question(db, user_id, question_id).await?;

        match existing {
            Some(model) => {
                let count = model.wrong_count;
                let mut active: ActiveModel = model.into();
                active.wrong_count = Set(count + 1);
                active.last_wrong_at = Set(at);
                // A fresh miss invalidates any earlier review.
                active.is_reviewed = Set(false);
                active.reviewed_at = Set(None);
                active.update(db).await
            }
            None => {
                ActiveModel {
                    user_id: Set(user_id),
                    question_id: Set(question_id),
                    wrong_count: Set(1),
                    last_wrong_at: Set(at),
                    is_reviewed: Set(false),
                    reviewed_at: Set(None),
                    ..Default::default()
                }
                .insert(db)
                .await
            }
        }
    }

    pub async fn find_by_user(
        db: &DatabaseConnection,
        user_id: i64,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .all(db)
            .await
    }
}
