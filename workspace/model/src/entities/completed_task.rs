use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::{profile, task};

/// Marks a task as done by a user. Unique per (user_id, task_id).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "user_tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub task_id: i32,
    /// Reward credited at completion time.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub earnings: Decimal,
    pub completed_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "profile::Entity",
        from = "Column::UserId",
        to = "profile::Column::Id",
        on_delete = "Cascade"
    )]
    Profile,
    #[sea_orm(
        belongs_to = "task::Entity",
        from = "Column::TaskId",
        to = "task::Column::Id",
        on_delete = "Cascade"
    )]
    Task,
}

impl Related<profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl Related<task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Task.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
