//! Payout requests and their resolution by an operator.

use chrono::Utc;
use model::entities::{
    profile,
    withdrawal::{self, WithdrawalStatus},
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, sea_query::Expr,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{LedgerError, Result};
use crate::profile::{BalanceChange, apply_balance_change, find_profile};
use crate::{RewardPolicy, retry_on_conflict};

#[derive(Debug, Clone)]
pub struct WithdrawalRequest {
    pub amount: Decimal,
    pub paypal_email: String,
}

#[derive(Debug, Clone)]
pub struct WithdrawalReceipt {
    pub withdrawal: withdrawal::Model,
    /// The user's profile after the debit.
    pub profile: profile::Model,
}

/// Decimal places a withdrawal amount may carry.
pub const MONEY_SCALE: u32 = 2;

/// Checks that do not need the database.
pub fn validate_request(request: &WithdrawalRequest, policy: &RewardPolicy) -> Result<()> {
    if request.paypal_email.trim().is_empty() {
        return Err(LedgerError::MissingPaymentEmail);
    }
    // Whole cents only; money columns hold four places.
    if request.amount <= Decimal::ZERO || request.amount.normalize().scale() > MONEY_SCALE {
        return Err(LedgerError::InvalidAmount(request.amount));
    }
    if request.amount < policy.minimum_withdrawal {
        return Err(LedgerError::BelowMinimum {
            amount: request.amount,
            minimum: policy.minimum_withdrawal,
        });
    }
    Ok(())
}

/// Records a pending withdrawal and takes the amount off the balance.
///
/// The balance is checked against a read made inside the same transaction
/// that debits it, so two simultaneous requests cannot both spend it.
#[instrument(skip(db, request, policy), fields(amount = %request.amount))]
pub async fn request_withdrawal(
    db: &DatabaseConnection,
    user_id: i32,
    request: WithdrawalRequest,
    policy: &RewardPolicy,
) -> Result<WithdrawalReceipt> {
    trace!("Entering request_withdrawal");
    if let Err(err) = validate_request(&request, policy) {
        warn!(%err, "Withdrawal request rejected");
        return Err(err);
    }
    retry_on_conflict("request_withdrawal", || request_once(db, user_id, &request)).await
}

async fn request_once(
    db: &DatabaseConnection,
    user_id: i32,
    request: &WithdrawalRequest,
) -> Result<WithdrawalReceipt> {
    let txn = db.begin().await?;

    let profile = find_profile(&txn, user_id).await?;
    if request.amount > profile.total_balance {
        warn!(balance = %profile.total_balance, "Insufficient balance for withdrawal");
        return Err(LedgerError::InsufficientBalance {
            requested: request.amount,
            available: profile.total_balance,
        });
    }

    let withdrawal = withdrawal::ActiveModel {
        user_id: Set(user_id),
        amount: Set(request.amount),
        paypal_email: Set(request.paypal_email.trim().to_string()),
        status: Set(WithdrawalStatus::Pending),
        created_at: Set(Utc::now()),
        processed_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    debug!(withdrawal_id = withdrawal.id, "Withdrawal recorded");

    let profile = apply_balance_change(&txn, &profile, BalanceChange::debit(request.amount)).await?;
    txn.commit().await?;

    info!(
        withdrawal_id = withdrawal.id,
        balance = %profile.total_balance,
        "Withdrawal requested"
    );
    Ok(WithdrawalReceipt {
        withdrawal,
        profile,
    })
}

/// The user's withdrawals, newest first.
pub async fn list_withdrawals<C: ConnectionTrait>(conn: &C, user_id: i32) -> Result<Vec<withdrawal::Model>> {
    Ok(withdrawal::Entity::find()
        .filter(withdrawal::Column::UserId.eq(user_id))
        .order_by_desc(withdrawal::Column::CreatedAt)
        .order_by_desc(withdrawal::Column::Id)
        .all(conn)
        .await?)
}

/// Moves a pending withdrawal to `Completed` or `Rejected`.
///
/// Rejected payouts go back to the user's balance; they were never paid, so
/// lifetime earnings stay as they are.
#[instrument(skip(db))]
pub async fn resolve_withdrawal(
    db: &DatabaseConnection,
    withdrawal_id: i32,
    status: WithdrawalStatus,
) -> Result<withdrawal::Model> {
    trace!("Entering resolve_withdrawal");
    retry_on_conflict("resolve_withdrawal", || resolve_once(db, withdrawal_id, status)).await
}

async fn resolve_once(
    db: &DatabaseConnection,
    withdrawal_id: i32,
    status: WithdrawalStatus,
) -> Result<withdrawal::Model> {
    let txn = db.begin().await?;

    let current = withdrawal::Entity::find_by_id(withdrawal_id)
        .one(&txn)
        .await?
        .ok_or(LedgerError::WithdrawalNotFound(withdrawal_id))?;

    if current.status.is_final() || !status.is_final() {
        return Err(LedgerError::InvalidWithdrawalTransition {
            id: withdrawal_id,
            from: current.status.as_str(),
            to: status.as_str(),
        });
    }

    let processed_at = Utc::now();
    let result = withdrawal::Entity::update_many()
        .col_expr(withdrawal::Column::Status, Expr::value(status))
        .col_expr(withdrawal::Column::ProcessedAt, Expr::value(processed_at))
        .filter(withdrawal::Column::Id.eq(withdrawal_id))
        .filter(withdrawal::Column::Status.eq(WithdrawalStatus::Pending))
        .exec(&txn)
        .await?;
    if result.rows_affected == 0 {
        return Err(LedgerError::Conflict {
            entity: "withdrawal",
            id: withdrawal_id,
        });
    }

    if status == WithdrawalStatus::Rejected {
        let profile = find_profile(&txn, current.user_id).await?;
        let profile = apply_balance_change(&txn, &profile, BalanceChange::refund(current.amount)).await?;
        debug!(balance = %profile.total_balance, "Rejected withdrawal refunded");
    }
    txn.commit().await?;

    info!(from = current.status.as_str(), to = status.as_str(), "Withdrawal resolved");
    Ok(withdrawal::Model {
        status,
        processed_at: Some(processed_at),
        ..current
    })
}
