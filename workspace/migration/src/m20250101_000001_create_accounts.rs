use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create accounts table
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(pk_auto(Accounts::Id))
                    .col(string(Accounts::Email).unique_key())
                    .col(string(Accounts::PasswordHash))
                    .col(timestamp_with_time_zone(Accounts::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // Create sessions table
        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(string(Sessions::Token).primary_key())
                    .col(integer(Sessions::AccountId))
                    .col(timestamp_with_time_zone(Sessions::CreatedAt))
                    .col(timestamp_with_time_zone(Sessions::ExpiresAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sessions_account")
                            .from(Sessions::Table, Sessions::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create profiles table; id is shared with the owning account
        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(integer(Profiles::Id).primary_key())
                    .col(string(Profiles::Username))
                    .col(string(Profiles::Email))
                    .col(string_len(Profiles::ReferralCode, 16).unique_key())
                    .col(integer_null(Profiles::ReferredBy))
                    .col(decimal(Profiles::TotalBalance).decimal_len(16, 4).default(0))
                    .col(decimal(Profiles::TotalEarned).decimal_len(16, 4).default(0))
                    .col(integer(Profiles::ReferralCount).default(0))
                    .col(integer(Profiles::Version).default(0))
                    .col(timestamp_with_time_zone(Profiles::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_profiles_account")
                            .from(Profiles::Table, Profiles::Id)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_profiles_referred_by")
                            .from(Profiles::Table, Profiles::ReferredBy)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order to avoid foreign key constraints
        manager
            .drop_table(Table::drop().table(Profiles::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Sessions::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Accounts {
    Table,
    Id,
    Email,
    PasswordHash,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Sessions {
    Table,
    Token,
    AccountId,
    CreatedAt,
    ExpiresAt,
}

#[derive(DeriveIden)]
pub(crate) enum Profiles {
    Table,
    Id,
    Username,
    Email,
    ReferralCode,
    ReferredBy,
    TotalBalance,
    TotalEarned,
    ReferralCount,
    Version,
    CreatedAt,
}
