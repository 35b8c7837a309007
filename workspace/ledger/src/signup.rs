//! Account registration, including the referral that came with it.

use chrono::Utc;
use model::entities::{account, profile};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set, TransactionTrait,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{LedgerError, Result, is_unique_violation};
use crate::profile::{find_profile, random_referral_code};
use crate::referral::{ReferralOutcome, apply_referral};
use crate::{RewardPolicy, retry_on_conflict};

/// Attempts at drawing a referral code nobody owns yet.
const CODE_ATTEMPTS: usize = 5;

/// Input for [`register`]. The password is already hashed by the caller.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    /// Code the user arrived with, if any.
    pub referral_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub account: account::Model,
    pub profile: profile::Model,
    /// `None` when the signup carried no referral code.
    pub referral: Option<ReferralOutcome>,
}

/// Creates the account, its profile and, when a code is given, credits the
/// referrer. Either all of it is stored or none of it is.
#[instrument(skip(db, new_account, policy), fields(email = %new_account.email))]
pub async fn register(
    db: &DatabaseConnection,
    new_account: NewAccount,
    policy: &RewardPolicy,
) -> Result<Registration> {
    trace!("Entering register");
    retry_on_conflict("register", || register_once(db, &new_account, policy)).await
}

async fn register_once(
    db: &DatabaseConnection,
    new_account: &NewAccount,
    policy: &RewardPolicy,
) -> Result<Registration> {
    let txn = db.begin().await?;
    let registration = register_in(&txn, new_account, policy).await?;
    txn.commit().await?;

    info!(
        account_id = registration.account.id,
        referral = ?registration.referral,
        "Account registered"
    );
    Ok(registration)
}

/// Writes the registration through `conn` without committing, so callers
/// can store more rows in the same transaction. Nothing is persisted unless
/// the caller commits.
pub async fn register_in<C: ConnectionTrait>(
    conn: &C,
    new_account: &NewAccount,
    policy: &RewardPolicy,
) -> Result<Registration> {
    let email = new_account.email.trim().to_lowercase();

    let existing = account::Entity::find()
        .filter(account::Column::Email.eq(email.clone()))
        .count(conn)
        .await?;
    if existing > 0 {
        warn!("Email already registered");
        return Err(LedgerError::EmailTaken(email));
    }

    let now = Utc::now();
    let account = account::ActiveModel {
        email: Set(email.clone()),
        password_hash: Set(new_account.password_hash.clone()),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            LedgerError::EmailTaken(email.clone())
        } else {
            err.into()
        }
    })?;
    debug!(account_id = account.id, "Account created");

    let referral_code = unused_referral_code(conn).await?;
    let profile = profile::ActiveModel {
        id: Set(account.id),
        username: Set(new_account.username.clone()),
        email: Set(email),
        referral_code: Set(referral_code),
        referred_by: Set(None),
        total_balance: Set(Decimal::ZERO),
        total_earned: Set(Decimal::ZERO),
        referral_count: Set(0),
        version: Set(0),
        created_at: Set(now),
    }
    .insert(conn)
    .await?;
    debug!(referral_code = %profile.referral_code, "Profile created");

    let referral = match new_account.referral_code.as_deref() {
        Some(code) if !code.trim().is_empty() => {
            Some(apply_referral(conn, &profile, code, policy).await?)
        }
        _ => None,
    };

    let profile = find_profile(conn, profile.id).await?;
    Ok(Registration {
        account,
        profile,
        referral,
    })
}

async fn unused_referral_code<C: ConnectionTrait>(conn: &C) -> Result<String> {
    let mut code = random_referral_code();
    for _ in 1..CODE_ATTEMPTS {
        let taken = profile::Entity::find()
            .filter(profile::Column::ReferralCode.eq(code.clone()))
            .count(conn)
            .await?;
        if taken == 0 {
            break;
        }
        debug!(code, "Referral code collision");
        code = random_referral_code();
    }
    // A collision past this point surfaces as a unique violation on insert.
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::find_profile;
    use crate::testing::{seed_profile_with_stats, setup_db};
    use model::entities::referral;

    fn new_account(email: &str, code: Option<&str>) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            username: email.split('@').next().unwrap().to_string(),
            password_hash: "$argon2id$fixture".to_string(),
            referral_code: code.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_register_without_referral() {
        let db = setup_db().await;
        let referrer = seed_profile_with_stats(&db, "ref@example.com", "ABC123", Decimal::ONE, Decimal::ONE, 2).await;

        let registration = register(&db, new_account("New@Example.com", None), &RewardPolicy::default())
            .await
            .unwrap();

        assert!(registration.referral.is_none());
        assert_eq!(registration.account.email, "new@example.com");
        assert_eq!(registration.profile.id, registration.account.id);
        assert_eq!(registration.profile.total_balance, Decimal::ZERO);
        assert_eq!(registration.profile.referred_by, None);
        assert_eq!(registration.profile.referral_code.len(), 8);

        assert_eq!(referral::Entity::find().count(&db).await.unwrap(), 0);
        let referrer = find_profile(&db, referrer.id).await.unwrap();
        assert_eq!(referrer.referral_count, 2);
        assert_eq!(referrer.total_balance, Decimal::ONE);
    }

    #[tokio::test]
    async fn test_register_with_referral_credits_referrer() {
        let db = setup_db().await;
        let referrer = seed_profile_with_stats(
            &db,
            "ref@example.com",
            "ABC123",
            Decimal::new(100, 2),
            Decimal::new(300, 2),
            2,
        )
        .await;

        let registration = register(
            &db,
            new_account("new@example.com", Some("ABC123")),
            &RewardPolicy::default(),
        )
        .await
        .unwrap();

        assert_eq!(
            registration.referral,
            Some(ReferralOutcome::Credited {
                referrer_id: referrer.id,
                bonus: Decimal::new(20, 2)
            })
        );
        assert_eq!(registration.profile.referred_by, Some(referrer.id));

        let referrer = find_profile(&db, referrer.id).await.unwrap();
        assert_eq!(referrer.referral_count, 3);
        assert_eq!(referrer.total_balance, Decimal::new(120, 2));
        assert_eq!(referrer.total_earned, Decimal::new(320, 2));
        assert_eq!(referral::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_register_with_unknown_code_still_succeeds() {
        let db = setup_db().await;

        let registration = register(
            &db,
            new_account("new@example.com", Some("NOSUCH")),
            &RewardPolicy::default(),
        )
        .await
        .unwrap();

        assert_eq!(registration.referral, Some(ReferralOutcome::UnknownCode));
        assert_eq!(registration.profile.referred_by, None);
        assert_eq!(referral::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_register_blank_code_is_no_code() {
        let db = setup_db().await;

        let registration = register(
            &db,
            new_account("new@example.com", Some("   ")),
            &RewardPolicy::default(),
        )
        .await
        .unwrap();
        assert!(registration.referral.is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate_email_leaves_no_trace() {
        let db = setup_db().await;
        let policy = RewardPolicy::default();
        let referrer = seed_profile_with_stats(&db, "ref@example.com", "ABC123", Decimal::ZERO, Decimal::ZERO, 0).await;

        register(&db, new_account("dup@example.com", None), &policy).await.unwrap();
        let result = register(&db, new_account("DUP@example.com", Some("ABC123")), &policy).await;
        assert!(matches!(result, Err(LedgerError::EmailTaken(email)) if email == "dup@example.com"));

        let referrer = find_profile(&db, referrer.id).await.unwrap();
        assert_eq!(referrer.referral_count, 0);
        assert_eq!(account::Entity::find().count(&db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_referred_signups_both_credit() {
        let db = setup_db().await;
        let policy = RewardPolicy::default();
        let referrer = seed_profile_with_stats(&db, "ref@example.com", "ABC123", Decimal::ZERO, Decimal::ZERO, 0).await;

        let (first, second) = tokio::join!(
            register(&db, new_account("one@example.com", Some("ABC123")), &policy),
            register(&db, new_account("two@example.com", Some("ABC123")), &policy),
        );
        first.unwrap();
        second.unwrap();

        let referrer = find_profile(&db, referrer.id).await.unwrap();
        assert_eq!(referrer.referral_count, 2);
        assert_eq!(referrer.total_balance, Decimal::new(40, 2));
        assert_eq!(referrer.total_earned, Decimal::new(40, 2));
    }
}
