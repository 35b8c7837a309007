use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::profile;

/// Records that `referrer_id` brought `referred_id` to the platform.
/// A profile can be referred at most once.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "referrals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub referrer_id: i32,
    #[sea_orm(unique)]
    pub referred_id: i32,
    /// Amount credited to the referrer for this referral.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub bonus: Decimal,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "profile::Entity",
        from = "Column::ReferrerId",
        to = "profile::Column::Id",
        on_delete = "Cascade"
    )]
    Referrer,
    #[sea_orm(
        belongs_to = "profile::Entity",
        from = "Column::ReferredId",
        to = "profile::Column::Id",
        on_delete = "Cascade"
    )]
    Referred,
}

impl ActiveModelBehavior for ActiveModel {}
