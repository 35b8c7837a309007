//! Crediting referrers when somebody signs up with their code.

use chrono::Utc;
use model::entities::{profile, referral};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::Expr,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::RewardPolicy;
use crate::error::{LedgerError, Result, is_unique_violation};
use crate::profile::{BalanceChange, apply_balance_change, find_by_referral_code, find_profile};

/// What happened to a pending referral code.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferralOutcome {
    /// The referrer was found and credited.
    Credited { referrer_id: i32, bonus: Decimal },
    /// No profile owns the code. Nothing was recorded.
    UnknownCode,
    /// The code belongs to the referred profile itself.
    SelfReferral,
}

/// A referral made by a user, with the referred user's name.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferralEntry {
    pub referral: referral::Model,
    pub referred_username: Option<String>,
}

/// Links `referred` to the owner of `code` and credits the owner.
///
/// Must run inside the caller's transaction: the profile link, the referral
/// record and the referrer credit only make sense together. An unknown code is
/// not an error.
#[instrument(skip(conn, referred, policy), fields(referred_id = referred.id))]
pub async fn apply_referral<C: ConnectionTrait>(
    conn: &C,
    referred: &profile::Model,
    code: &str,
    policy: &RewardPolicy,
) -> Result<ReferralOutcome> {
    trace!("Entering apply_referral");

    let Some(referrer) = find_by_referral_code(conn, code).await? else {
        warn!(code, "Referral code does not match any profile, ignoring");
        return Ok(ReferralOutcome::UnknownCode);
    };
    if referrer.id == referred.id {
        warn!(code, "Profile tried to refer itself, ignoring");
        return Ok(ReferralOutcome::SelfReferral);
    }
    if referred.referred_by.is_some() {
        return Err(LedgerError::AlreadyReferred(referred.id));
    }
    debug!(referrer_id = referrer.id, "Referral code resolved");

    profile::Entity::update_many()
        .col_expr(profile::Column::ReferredBy, Expr::value(referrer.id))
        .filter(profile::Column::Id.eq(referred.id))
        .exec(conn)
        .await?;

    let record = referral::ActiveModel {
        referrer_id: Set(referrer.id),
        referred_id: Set(referred.id),
        bonus: Set(policy.referral_bonus),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    if let Err(err) = record.insert(conn).await {
        if is_unique_violation(&err) {
            return Err(LedgerError::AlreadyReferred(referred.id));
        }
        return Err(err.into());
    }

    // Re-read inside the transaction; the lookup above may predate other credits.
    let referrer = find_profile(conn, referrer.id).await?;
    let referrer = apply_balance_change(
        conn,
        &referrer,
        BalanceChange::credit(policy.referral_bonus).with_referral(),
    )
    .await?;

    info!(
        referrer_id = referrer.id,
        referral_count = referrer.referral_count,
        bonus = %policy.referral_bonus,
        "Referral credited"
    );
    Ok(ReferralOutcome::Credited {
        referrer_id: referrer.id,
        bonus: policy.referral_bonus,
    })
}

/// Referrals made by `referrer_id`, newest first.
#[instrument(skip(conn))]
pub async fn list_referrals<C: ConnectionTrait>(
    conn: &C,
    referrer_id: i32,
) -> Result<Vec<ReferralEntry>> {
    let referrals = referral::Entity::find()
        .filter(referral::Column::ReferrerId.eq(referrer_id))
        .order_by_desc(referral::Column::CreatedAt)
        .order_by_desc(referral::Column::Id)
        .all(conn)
        .await?;

    let referred_ids: Vec<i32> = referrals.iter().map(|r| r.referred_id).collect();
    let profiles = profile::Entity::find()
        .filter(profile::Column::Id.is_in(referred_ids))
        .all(conn)
        .await?;

    debug!("Found {} referrals", referrals.len());
    Ok(referrals
        .into_iter()
        .map(|referral| {
            let referred_username = profiles
                .iter()
                .find(|p| p.id == referral.referred_id)
                .map(|p| p.username.clone());
            ReferralEntry {
                referral,
                referred_username,
            }
        })
        .collect())
}
