use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250101_000001_create_accounts::Profiles;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create referrals table; referred_id is unique so a profile is credited once
        manager
            .create_table(
                Table::create()
                    .table(Referrals::Table)
                    .if_not_exists()
                    .col(pk_auto(Referrals::Id))
                    .col(integer(Referrals::ReferrerId))
                    .col(integer(Referrals::ReferredId).unique_key())
                    .col(decimal(Referrals::Bonus).decimal_len(16, 4))
                    .col(timestamp_with_time_zone(Referrals::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_referrals_referrer")
                            .from(Referrals::Table, Referrals::ReferrerId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_referrals_referred")
                            .from(Referrals::Table, Referrals::ReferredId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create tasks table
        manager
            .create_table(
                Table::create()
                    .table(Tasks::Table)
                    .if_not_exists()
                    .col(pk_auto(Tasks::Id))
                    .col(string(Tasks::Title))
                    .col(text(Tasks::Description))
                    .col(decimal(Tasks::RewardAmount).decimal_len(16, 4))
                    .col(string_len(Tasks::TaskType, 20).default("other"))
                    .col(string(Tasks::TaskUrl))
                    .col(boolean(Tasks::IsActive).default(true))
                    .col(timestamp_with_time_zone(Tasks::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // Create user_tasks table
        manager
            .create_table(
                Table::create()
                    .table(UserTasks::Table)
                    .if_not_exists()
                    .col(pk_auto(UserTasks::Id))
                    .col(integer(UserTasks::UserId))
                    .col(integer(UserTasks::TaskId))
                    .col(decimal(UserTasks::Earnings).decimal_len(16, 4))
                    .col(timestamp_with_time_zone(UserTasks::CompletedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_tasks_profile")
                            .from(UserTasks::Table, UserTasks::UserId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_tasks_task")
                            .from(UserTasks::Table, UserTasks::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_tasks_user_task")
                    .table(UserTasks::Table)
                    .col(UserTasks::UserId)
                    .col(UserTasks::TaskId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create withdrawals table
        manager
            .create_table(
                Table::create()
                    .table(Withdrawals::Table)
                    .if_not_exists()
                    .col(pk_auto(Withdrawals::Id))
                    .col(integer(Withdrawals::UserId))
                    .col(decimal(Withdrawals::Amount).decimal_len(16, 4))
                    .col(string(Withdrawals::PaypalEmail))
                    .col(string_len(Withdrawals::Status, 20).default("pending"))
                    .col(timestamp_with_time_zone(Withdrawals::CreatedAt))
                    .col(timestamp_with_time_zone_null(Withdrawals::ProcessedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_withdrawals_profile")
                            .from(Withdrawals::Table, Withdrawals::UserId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_withdrawals_user_created")
                    .table(Withdrawals::Table)
                    .col(Withdrawals::UserId)
                    .col(Withdrawals::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order to avoid foreign key constraints
        manager
            .drop_table(Table::drop().table(Withdrawals::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(UserTasks::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Referrals::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Referrals {
    Table,
    Id,
    ReferrerId,
    ReferredId,
    Bonus,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Tasks {
    Table,
    Id,
    Title,
    Description,
    RewardAmount,
    TaskType,
    TaskUrl,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserTasks {
    Table,
    Id,
    UserId,
    TaskId,
    Earnings,
    CompletedAt,
}

#[derive(DeriveIden)]
enum Withdrawals {
    Table,
    Id,
    UserId,
    Amount,
    PaypalEmail,
    Status,
    CreatedAt,
    ProcessedAt,
}
