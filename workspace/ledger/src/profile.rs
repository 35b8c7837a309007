//! Profile lookups and the guarded balance write every flow goes through.

use model::entities::profile;
use rand::{Rng, distributions::Alphanumeric};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, sea_query::Expr,
};
use tracing::{debug, instrument, trace};

use crate::error::{LedgerError, Result};

/// Length of generated referral codes.
pub const REFERRAL_CODE_LEN: usize = 8;

/// A change to the money columns of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BalanceChange {
    pub balance: Decimal,
    pub earned: Decimal,
    pub referrals: i32,
}

impl BalanceChange {
    /// Money earned: raises both the balance and the lifetime earnings.
    pub fn credit(amount: Decimal) -> Self {
        Self {
            balance: amount,
            earned: amount,
            referrals: 0,
        }
    }

    /// Money paid out.
    pub fn debit(amount: Decimal) -> Self {
        Self {
            balance: -amount,
            ..Default::default()
        }
    }

    /// Money returned to the balance without counting as new earnings.
    pub fn refund(amount: Decimal) -> Self {
        Self {
            balance: amount,
            ..Default::default()
        }
    }

    pub fn with_referral(mut self) -> Self {
        self.referrals += 1;
        self
    }
}

/// Load a profile or fail with [`LedgerError::ProfileNotFound`].
pub async fn find_profile<C: ConnectionTrait>(conn: &C, profile_id: i32) -> Result<profile::Model> {
    profile::Entity::find_by_id(profile_id)
        .one(conn)
        .await?
        .ok_or(LedgerError::ProfileNotFound(profile_id))
}

/// Codes are stored uppercase; user input is matched case-insensitively.
pub fn normalize_referral_code(code: &str) -> String {
    code.trim().to_uppercase()
}

pub async fn find_by_referral_code<C: ConnectionTrait>(
    conn: &C,
    code: &str,
) -> Result<Option<profile::Model>> {
    let code = normalize_referral_code(code);
    if code.is_empty() {
        return Ok(None);
    }
    Ok(profile::Entity::find()
        .filter(profile::Column::ReferralCode.eq(code))
        .one(conn)
        .await?)
}

/// A random uppercase alphanumeric code.
pub fn random_referral_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFERRAL_CODE_LEN)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect()
}

/// Applies `change` to `current`, provided nobody has written the row since
/// `current` was read.
///
/// Fails with [`LedgerError::InsufficientBalance`] if the balance would go
/// negative and with [`LedgerError::Conflict`] if the version moved.
#[instrument(skip(conn, current), fields(profile_id = current.id, version = current.version))]
pub async fn apply_balance_change<C: ConnectionTrait>(
    conn: &C,
    current: &profile::Model,
    change: BalanceChange,
) -> Result<profile::Model> {
    trace!("Applying balance change");

    let total_balance = current.total_balance + change.balance;
    if total_balance < Decimal::ZERO {
        return Err(LedgerError::InsufficientBalance {
            requested: -change.balance,
            available: current.total_balance,
        });
    }
    let total_earned = current.total_earned + change.earned;
    let referral_count = current.referral_count + change.referrals;
    let version = current.version + 1;

    let result = profile::Entity::update_many()
        .col_expr(profile::Column::TotalBalance, Expr::value(total_balance))
        .col_expr(profile::Column::TotalEarned, Expr::value(total_earned))
        .col_expr(profile::Column::ReferralCount, Expr::value(referral_count))
        .col_expr(profile::Column::Version, Expr::value(version))
        .filter(profile::Column::Id.eq(current.id))
        .filter(profile::Column::Version.eq(current.version))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        debug!("Profile version moved underneath us");
        return Err(LedgerError::Conflict {
            entity: "profile",
            id: current.id,
        });
    }

    debug!(%total_balance, %total_earned, referral_count, "Balance updated");
    Ok(profile::Model {
        total_balance,
        total_earned,
        referral_count,
        version,
        ..current.clone()
    })
}
