use anyhow::{Context, Result};
use chrono::Utc;
use model::entities::task::{self, TaskType};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use serde::Deserialize;
use tracing::{debug, error, info, trace, warn};

/// One entry of the tasks file.
///
/// ```yaml
/// - title: Watch the intro video
///   description: Two minutes about how rewards work
///   reward_amount: "0.05"
///   task_type: video
///   task_url: https://example.com/intro
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TaskSeed {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub reward_amount: Decimal,
    #[serde(default = "default_task_type")]
    pub task_type: String,
    #[serde(default)]
    pub task_url: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_task_type() -> String {
    TaskType::Other.as_str().to_string()
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub skipped: usize,
}

pub fn parse_tasks(yaml: &str) -> Result<Vec<TaskSeed>> {
    let seeds: Vec<TaskSeed> = serde_yaml::from_str(yaml).context("Invalid tasks file")?;
    Ok(seeds)
}

/// Inserts the seeds. Titles already present, unknown task types and negative
/// rewards are skipped.
pub async fn insert_tasks(db: &DatabaseConnection, seeds: Vec<TaskSeed>) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for seed in seeds {
        if seed.reward_amount < Decimal::ZERO {
            warn!("Skipping task '{}' with negative reward {}", seed.title, seed.reward_amount);
            summary.skipped += 1;
            continue;
        }

        let Some(task_type) = TaskType::from_name(&seed.task_type) else {
            warn!("Skipping task '{}' with unknown type '{}'", seed.title, seed.task_type);
            summary.skipped += 1;
            continue;
        };

        let existing = task::Entity::find()
            .filter(task::Column::Title.eq(seed.title.clone()))
            .count(db)
            .await?;
        if existing > 0 {
            debug!("Task '{}' already exists", seed.title);
            summary.skipped += 1;
            continue;
        }

        let inserted = task::ActiveModel {
            title: Set(seed.title),
            description: Set(seed.description),
            reward_amount: Set(seed.reward_amount),
            task_type: Set(task_type),
            task_url: Set(seed.task_url),
            is_active: Set(seed.is_active),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;
        trace!("Inserted task {} '{}'", inserted.id, inserted.title);
        summary.inserted += 1;
    }

    Ok(summary)
}

pub async fn import_tasks(path: &str, database_url: &str) -> Result<()> {
    trace!("Entering import_tasks function");
    info!("Importing tasks from {}", path);

    let yaml = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
    let seeds = parse_tasks(&yaml)?;
    debug!("Parsed {} tasks", seeds.len());

    let db = match Database::connect(database_url).await {
        Ok(connection) => connection,
        Err(e) => {
            error!("Failed to connect to database '{}': {}", database_url, e);
            return Err(e.into());
        }
    };

    let summary = insert_tasks(&db, seeds).await?;
    info!(
        "Task import finished: {} inserted, {} skipped",
        summary.inserted, summary.skipped
    );
    Ok(())
}
