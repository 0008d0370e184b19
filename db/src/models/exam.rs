use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an exam.
///
/// A single status column covers both the editorial lifecycle and deletion:
/// `Archived` and `Deleted` exams are excluded from active listings but kept
/// on disk so historical assignments stay resolvable.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "exam_status_enum")]
pub enum ExamStatus {
    /// Being authored, not yet assignable.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Assignable to candidates.
    #[sea_orm(string_value = "published")]
    Published,
    /// Retired from active listings, retained for history.
    #[sea_orm(string_value = "archived")]
    Archived,
    /// Logically removed; never listed, never assignable.
    #[sea_orm(string_value = "deleted")]
    Deleted,
}

impl Default for ExamStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl std::fmt::Display for ExamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status_str = match self {
            ExamStatus::Draft => "draft",
            ExamStatus::Published => "published",
            ExamStatus::Archived => "archived",
            ExamStatus::Deleted => "deleted",
        };
        write!(f, "{}", status_str)
    }
}

/// How submissions against this exam are graded.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "grading_method_enum")]
pub enum GradingMethod {
    /// Every question is graded by the engine.
    #[sea_orm(string_value = "auto")]
    Auto,
    /// Grading is performed by staff; the engine only aggregates.
    #[sea_orm(string_value = "manual")]
    Manual,
    /// Objective questions auto-graded, subjective ones reviewed by staff.
    #[sea_orm(string_value = "mixed")]
    Mixed,
}

impl std::fmt::Display for GradingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let method_str = match self {
            GradingMethod::Auto => "auto",
            GradingMethod::Manual => "manual",
            GradingMethod::Mixed => "mixed",
        };
        write!(f, "{}", method_str)
    }
}

/// Represents an exam definition in the `exams` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "exams")]
pub struct Model {
    /// Primary key of the exam.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display title.
    pub title: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Optional time limit in minutes; `None` means untimed.
    pub time_limit_minutes: Option<i32>,
    /// Passing threshold as a percentage in [0, 100].
    pub passing_score: i32,
    /// Sum of question point values, denormalized for listings.
    pub total_score: i32,
    /// How submissions are graded.
    pub grading_method: GradingMethod,
    /// Lifecycle status.
    pub status: ExamStatus,
    /// Staff account that created the exam.
    pub created_by: i64,
    /// Timestamp when the exam was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp when the exam was last updated.
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Staff account that created the exam.
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id"
    )]
    CreatedBy,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreatedBy.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this exam should appear in active listings.
    pub fn is_active(&self) -> bool {
        matches!(self.status, ExamStatus::Draft | ExamStatus::Published)
    }

    /// All exams still in active listings (draft or published).
    pub async fn find_active(db: &DatabaseConnection) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::Status.is_in([ExamStatus::Draft, ExamStatus::Published]))
            .all(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;
    use sea_orm::{ActiveModelTrait, Set};

    async fn insert_exam(db: &DatabaseConnection, title: &str, status: ExamStatus) -> Model {
        let now = Utc::now();
        ActiveModel {
            title: Set(title.to_string()),
            description: Set(None),
            time_limit_minutes: Set(None),
            passing_score: Set(60),
            total_score: Set(100),
            grading_method: Set(GradingMethod::Mixed),
            status: Set(status),
            created_by: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_archived_and_deleted_exams_leave_active_listings() {
        let db = setup_test_db().await;
        insert_exam(&db, "drafted", ExamStatus::Draft).await;
        insert_exam(&db, "live", ExamStatus::Published).await;
        let archived = insert_exam(&db, "old", ExamStatus::Archived).await;
        let deleted = insert_exam(&db, "gone", ExamStatus::Deleted).await;

        let active = Model::find_active(&db).await.unwrap();
        assert_eq!(active.len(), 2);
        assert!(active.iter().all(|exam| exam.is_active()));

        // Retained for history, just not listed.
        assert!(!archived.is_active());
        assert!(!deleted.is_active());
        let by_id = Entity::find_by_id(archived.id).one(&db).await.unwrap();
        assert!(by_id.is_some());
    }
}
