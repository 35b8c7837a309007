use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::account;

/// Public profile and running balances of a user.
///
/// The primary key is the owning account's id. Balance columns are only ever
/// written together with an increment of `version`, which lets writers detect
/// that somebody else updated the row since they read it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub username: String,
    pub email: String,
    /// Code other users sign up with, e.g. "K7Q2M9XA".
    #[sea_orm(unique)]
    pub referral_code: String,
    /// Profile id of the user who referred this one.
    pub referred_by: Option<i32>,
    /// Money available for withdrawal. Never negative.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub total_balance: Decimal,
    /// Everything ever credited. Withdrawals do not reduce it.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub total_earned: Decimal,
    pub referral_count: i32,
    pub version: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "account::Entity",
        from = "Column::Id",
        to = "account::Column::Id",
        on_delete = "Cascade"
    )]
    Account,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ReferredBy",
        to = "Column::Id",
        on_delete = "SetNull"
    )]
    Referrer,
    #[sea_orm(has_many = "super::completed_task::Entity")]
    CompletedTask,
    #[sea_orm(has_many = "super::withdrawal::Entity")]
    Withdrawal,
}

impl Related<account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::completed_task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CompletedTask.def()
    }
}

impl Related<super::withdrawal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Withdrawal.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
