//! Task listing and the task completion flow.

use std::collections::HashSet;

use chrono::Utc;
use model::entities::{completed_task, profile, task};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{LedgerError, Result, is_unique_violation};
use crate::profile::{BalanceChange, apply_balance_change, find_profile};
use crate::retry_on_conflict;

/// Result of a successful completion.
#[derive(Debug, Clone)]
pub struct TaskCompletion {
    pub task: task::Model,
    pub record: completed_task::Model,
    /// The user's profile after the credit.
    pub profile: profile::Model,
}

/// Active tasks, best paid first.
#[instrument(skip(conn))]
pub async fn list_active_tasks<C: ConnectionTrait>(conn: &C) -> Result<Vec<task::Model>> {
    let tasks = task::Entity::find()
        .filter(task::Column::IsActive.eq(true))
        .order_by_desc(task::Column::RewardAmount)
        .order_by_asc(task::Column::Id)
        .all(conn)
        .await?;
    debug!("Found {} active tasks", tasks.len());
    Ok(tasks)
}

/// Ids of the tasks `user_id` has completed.
pub async fn completed_task_ids<C: ConnectionTrait>(conn: &C, user_id: i32) -> Result<HashSet<i32>> {
    let ids: Vec<i32> = completed_task::Entity::find()
        .select_only()
        .column(completed_task::Column::TaskId)
        .filter(completed_task::Column::UserId.eq(user_id))
        .into_tuple()
        .all(conn)
        .await?;
    Ok(ids.into_iter().collect())
}

pub async fn count_completed<C: ConnectionTrait>(conn: &C, user_id: i32) -> Result<u64> {
    Ok(completed_task::Entity::find()
        .filter(completed_task::Column::UserId.eq(user_id))
        .count(conn)
        .await?)
}

/// Marks `task_id` as done by `user_id` and credits the task's reward.
///
/// The reward always comes from the stored task. A task can be completed once
/// per user; repeating the call fails with
/// [`LedgerError::TaskAlreadyCompleted`] and credits nothing.
#[instrument(skip(db))]
pub async fn complete_task(db: &DatabaseConnection, user_id: i32, task_id: i32) -> Result<TaskCompletion> {
    trace!("Entering complete_task");
    retry_on_conflict("complete_task", || complete_task_once(db, user_id, task_id)).await
}

async fn complete_task_once(db: &DatabaseConnection, user_id: i32, task_id: i32) -> Result<TaskCompletion> {
    let txn = db.begin().await?;

    let task = task::Entity::find_by_id(task_id)
        .filter(task::Column::IsActive.eq(true))
        .one(&txn)
        .await?
        .ok_or(LedgerError::TaskNotFound(task_id))?;

    let already_done = completed_task::Entity::find()
        .filter(completed_task::Column::UserId.eq(user_id))
        .filter(completed_task::Column::TaskId.eq(task_id))
        .count(&txn)
        .await?;
    if already_done > 0 {
        warn!("Task already completed");
        return Err(LedgerError::TaskAlreadyCompleted { user_id, task_id });
    }

    let profile = find_profile(&txn, user_id).await?;

    let record = completed_task::ActiveModel {
        user_id: Set(user_id),
        task_id: Set(task_id),
        earnings: Set(task.reward_amount),
        completed_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            LedgerError::TaskAlreadyCompleted { user_id, task_id }
        } else {
            err.into()
        }
    })?;

    let profile = apply_balance_change(&txn, &profile, BalanceChange::credit(task.reward_amount)).await?;
    txn.commit().await?;

    info!(reward = %task.reward_amount, balance = %profile.total_balance, "Task completed");
    Ok(TaskCompletion {
        task,
        record,
        profile,
    })
}
