use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};

/// The type of a question, which selects the grading path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "question_type_enum")]
pub enum QuestionType {
    #[sea_orm(string_value = "true_false")]
    TrueFalse,
    /// Single-choice with one canonical option.
    #[sea_orm(string_value = "multiple_choice")]
    MultipleChoice,
    /// Multi-select; the canonical answer is a delimited set of options.
    #[sea_orm(string_value = "multiple_answer")]
    MultipleAnswer,
    /// Free text, evaluated semantically.
    #[sea_orm(string_value = "short_answer")]
    ShortAnswer,
}

impl QuestionType {
    /// Objective questions have an exact canonical answer and are graded
    /// without external help.
    pub fn is_objective(&self) -> bool {
        !matches!(self, QuestionType::ShortAnswer)
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let type_str = match self {
            QuestionType::TrueFalse => "true_false",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::MultipleAnswer => "multiple_answer",
            QuestionType::ShortAnswer => "short_answer",
        };
        write!(f, "{}", type_str)
    }
}

/// Represents a question in the `questions` table.
///
/// The engine consumes questions read-only; authoring lives in the
/// question-bank layer.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "questions")]
pub struct Model {
    /// Primary key of the question.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Exam this question belongs to.
    pub exam_id: i64,
    /// Question type, selects the grading path.
    pub question_type: QuestionType,
    /// The question text shown to candidates.
    pub content: String,
    /// Choice labels for choice questions, stored as a JSON string array.
    pub options: Option<Json>,
    /// Canonical answer. For multi-answer questions this is a
    /// comma-delimited set of options.
    pub answer: String,
    /// Point value of this question.
    pub points: i32,
    /// Topic/category tag used for weak-topic analysis.
    pub category: Option<String>,
    /// Timestamp when the question was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp when the question was last updated.
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Link to the exam this question belongs to.
    #[sea_orm(
        belongs_to = "super::exam::Entity",
        from = "Column::ExamId",
        to = "super::exam::Column::Id"
    )]
    Exam,
}

impl Related<super::exam::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Exam.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Parse the JSON-stored option list into a typed vector.
    ///
    /// The column is validated here once; downstream code never touches the
    /// raw JSON value.
    pub fn option_labels(&self) -> Result<Vec<String>, serde_json::Error> {
        match &self.options {
            Some(value) => serde_json::from_value(value.clone()),
            None => Ok(Vec::new()),
        }
    }

    /// All questions of an exam in insertion order.
    pub async fn find_by_exam(
        db: &DatabaseConnection,
        exam_id: i64,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::ExamId.eq(exam_id))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }
}
