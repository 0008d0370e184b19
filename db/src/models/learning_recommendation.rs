use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What kind of remediation a recommendation carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "recommendation_type_enum"
)]
pub enum RecommendationType {
    /// Categories the candidate missed most, ranked by frequency.
    #[sea_orm(string_value = "weak_topics")]
    WeakTopics,
    /// Concrete question ids to practice again.
    #[sea_orm(string_value = "practice_questions")]
    PracticeQuestions,
    /// Curated study material references.
    #[sea_orm(string_value = "study_materials")]
    StudyMaterials,
    /// Free-form advice produced by the evaluation service.
    #[sea_orm(string_value = "ai_generated")]
    AiGenerated,
}

impl std::fmt::Display for RecommendationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let type_str = match self {
            RecommendationType::WeakTopics => "weak_topics",
            RecommendationType::PracticeQuestions => "practice_questions",
            RecommendationType::StudyMaterials => "study_materials",
            RecommendationType::AiGenerated => "ai_generated",
        };
        write!(f, "{}", type_str)
    }
}

/// Urgency of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "priority_enum")]
pub enum Priority {
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "low")]
    Low,
}

/// Represents a study recommendation in the `learning_recommendations`
/// table, generated from wrong-answer analysis of a failed assignment.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "learning_recommendations")]
pub struct Model {
    /// Primary key of the recommendation.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Candidate the recommendation is for.
    pub user_id: i64,
    /// Assignment whose wrong answers produced it.
    pub assignment_id: i64,
    /// Makeup record it supports, when one exists.
    pub makeup_exam_id: Option<i64>,
    /// Kind of remediation.
    pub rec_type: RecommendationType,
    /// Urgency.
    pub priority: Priority,
    /// Short headline.
    pub title: String,
    /// Body text shown to the candidate.
    pub content: String,
    /// Whether the candidate has opened it.
    pub is_read: bool,
    /// Timestamp when the recommendation was created.
    pub created_at: DateTime<Utc>,
}

/// Defines relationships between `learning_recommendations` and other tables.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Link to the candidate.
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,

    /// Link to the assignment analysed.
    #[sea_orm(
        belongs_to = "super::assignment::Entity",
        from = "Column::AssignmentId",
        to = "super::assignment::Column::Id"
    )]
    Assignment,

    /// Link to the supported makeup record.
    #[sea_orm(
        belongs_to = "super::makeup_exam::Entity",
        from = "Column::MakeupExamId",
        to = "super::makeup_exam::Column::Id"
    )]
    MakeupExam,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
