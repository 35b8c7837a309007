use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// The kind of activity a task asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum TaskType {
    #[sea_orm(string_value = "video")]
    Video,
    #[sea_orm(string_value = "quiz")]
    Quiz,
    #[sea_orm(string_value = "survey")]
    Survey,
    #[sea_orm(string_value = "social")]
    Social,
    #[sea_orm(string_value = "other")]
    Other,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Video => "video",
            TaskType::Quiz => "quiz",
            TaskType::Survey => "survey",
            TaskType::Social => "social",
            TaskType::Other => "other",
        }
    }

    /// Looks up a task type by name, ignoring case and surrounding spaces.
    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "video" => Some(TaskType::Video),
            "quiz" => Some(TaskType::Quiz),
            "survey" => Some(TaskType::Survey),
            "social" => Some(TaskType::Social),
            "other" => Some(TaskType::Other),
            _ => None,
        }
    }
}

/// A paid micro-task users can complete once.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub reward_amount: Decimal,
    pub task_type: TaskType,
    pub task_url: String,
    #[sea_orm(default_value = "true")]
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::completed_task::Entity")]
    CompletedTask,
}

impl Related<super::completed_task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CompletedTask.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
