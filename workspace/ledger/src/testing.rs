//! Database fixtures shared by the ledger tests.

use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use model::entities::{account, profile, task};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};

/// In-memory SQLite database with all migrations applied.
pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");
    db.execute_unprepared("PRAGMA foreign_keys = ON;")
        .await
        .expect("Failed to enable foreign keys");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// Creates an account and its profile. Earnings start equal to the balance.
pub async fn seed_profile(
    db: &DatabaseConnection,
    email: &str,
    referral_code: &str,
    balance: Decimal,
) -> profile::Model {
    seed_profile_with_stats(db, email, referral_code, balance, balance, 0).await
}

pub async fn seed_profile_with_stats(
    db: &DatabaseConnection,
    email: &str,
    referral_code: &str,
    balance: Decimal,
    earned: Decimal,
    referral_count: i32,
) -> profile::Model {
    let account = account::ActiveModel {
        email: Set(email.to_string()),
        password_hash: Set("$argon2id$fixture".to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create account");

    profile::ActiveModel {
        id: Set(account.id),
        username: Set(email.split('@').next().unwrap_or(email).to_string()),
        email: Set(email.to_string()),
        referral_code: Set(referral_code.to_string()),
        referred_by: Set(None),
        total_balance: Set(balance),
        total_earned: Set(earned),
        referral_count: Set(referral_count),
        version: Set(0),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to create profile")
}

pub async fn seed_task(
    db: &DatabaseConnection,
    title: &str,
    reward: Decimal,
    is_active: bool,
) -> task::Model {
    task::ActiveModel {
        title: Set(title.to_string()),
        description: Set(format!("Complete: {}", title)),
        reward_amount: Set(reward),
        task_type: Set(task::TaskType::Survey),
        task_url: Set(format!("https://tasks.example.com/{}", title.to_lowercase().replace(' ', "-"))),
        is_active: Set(is_active),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create task")
}
