//! Identity service: accounts, password checks and login sessions.
//!
//! Sessions are opaque random tokens stored in the `sessions` table. Every
//! change of a user's session state is published on a broadcast channel.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use ledger::{
    LedgerError, RewardPolicy, retry_on_conflict,
    signup::{NewAccount, Registration, register_in},
};
use model::entities::{account, session};
use rand::{Rng, distributions::Alphanumeric};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    ModelTrait, QueryFilter, Set, TransactionTrait,
};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, trace, warn};

pub const SESSION_TOKEN_LEN: usize = 48;
pub const MIN_PASSWORD_LEN: usize = 6;
const EVENT_CAPACITY: usize = 64;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least {0} characters")]
    WeakPassword(usize),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email {0} is already registered")]
    EmailTaken(String),

    #[error("Failed to hash password: {0}")]
    Hashing(String),

    #[error(transparent)]
    Ledger(LedgerError),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<LedgerError> for IdentityError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::EmailTaken(email) => IdentityError::EmailTaken(email),
            other => IdentityError::Ledger(other),
        }
    }
}

/// A change of session state, published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedUp { account_id: i32 },
    SignedIn { account_id: i32 },
    SignedOut { account_id: i32 },
    Expired { account_id: i32 },
}

/// A valid session together with the account it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSession {
    pub token: String,
    pub account_id: i32,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// Input of [`SessionStore::sign_up`].
#[derive(Debug, Clone)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub username: Option<String>,
    pub referral_code: Option<String>,
}

#[derive(Debug)]
pub struct SignedUp {
    pub session: ActiveSession,
    pub registration: Registration,
}

#[derive(Clone, Debug)]
pub struct SessionStore {
    db: DatabaseConnection,
    events: broadcast::Sender<SessionEvent>,
    ttl: chrono::Duration,
    policy: RewardPolicy,
}

impl SessionStore {
    pub fn new(db: DatabaseConnection, ttl: chrono::Duration, policy: RewardPolicy) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            db,
            events,
            ttl,
            policy,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Creates the account and profile, applies a pending referral code and
    /// opens a session for the new user.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn sign_up(&self, request: SignUp) -> Result<SignedUp, IdentityError> {
        trace!("Entering sign_up");
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(IdentityError::WeakPassword(MIN_PASSWORD_LEN));
        }
        if request.password != request.confirm_password {
            return Err(IdentityError::PasswordMismatch);
        }

        let email = request.email.trim().to_lowercase();
        let username = request
            .username
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| default_username(&email));
        let password_hash = hash_password(&request.password)?;

        let new_account = NewAccount {
            email,
            username,
            password_hash,
            referral_code: request.referral_code,
        };
        let (registration, session) =
            retry_on_conflict("sign_up", || self.sign_up_once(&new_account)).await?;
        self.publish(SessionEvent::SignedUp {
            account_id: registration.account.id,
        });
        info!("Account {} signed up", registration.account.id);

        Ok(SignedUp {
            session,
            registration,
        })
    }

    /// The account only becomes visible together with its first session.
    async fn sign_up_once(
        &self,
        new_account: &NewAccount,
    ) -> Result<(Registration, ActiveSession), LedgerError> {
        let txn = self.db.begin().await?;
        let registration = register_in(&txn, new_account, &self.policy).await?;
        debug!("Registered account {}", registration.account.id);
        let session = insert_session(&txn, &registration.account, self.ttl).await?;
        txn.commit().await?;
        Ok((registration, session))
    }

    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<ActiveSession, IdentityError> {
        trace!("Entering sign_in");
        let email = email.trim().to_lowercase();
        let account = account::Entity::find()
            .filter(account::Column::Email.eq(email.clone()))
            .one(&self.db)
            .await?;

        let Some(account) = account else {
            warn!("Sign in for unknown email {}", email);
            return Err(IdentityError::InvalidCredentials);
        };
        if !verify_password(&account.password_hash, password) {
            warn!("Wrong password for account {}", account.id);
            return Err(IdentityError::InvalidCredentials);
        }

        let session = insert_session(&self.db, &account, self.ttl).await?;
        self.publish(SessionEvent::SignedIn {
            account_id: account.id,
        });
        info!("Account {} signed in", account.id);
        Ok(session)
    }

    #[instrument(skip(self, token))]
    pub async fn sign_out(&self, token: &str) -> Result<(), IdentityError> {
        trace!("Entering sign_out");
        if let Some(existing) = session::Entity::find_by_id(token.to_string()).one(&self.db).await? {
            let account_id = existing.account_id;
            existing.delete(&self.db).await?;
            self.publish(SessionEvent::SignedOut { account_id });
            info!("Account {} signed out", account_id);
        } else {
            debug!("Sign out for a token that is not active");
        }
        Ok(())
    }

    /// Resolves a token to its session. Expired sessions are removed and
    /// reported as absent.
    #[instrument(skip(self, token))]
    pub async fn current(&self, token: &str) -> Result<Option<ActiveSession>, IdentityError> {
        let found = session::Entity::find_by_id(token.to_string())
            .find_also_related(account::Entity)
            .one(&self.db)
            .await?;

        let Some((stored, Some(account))) = found else {
            trace!("No session for token");
            return Ok(None);
        };

        if stored.is_expired_at(Utc::now()) {
            let account_id = stored.account_id;
            stored.delete(&self.db).await?;
            self.publish(SessionEvent::Expired { account_id });
            debug!("Session of account {} expired", account_id);
            return Ok(None);
        }

        Ok(Some(ActiveSession {
            token: stored.token,
            account_id: account.id,
            email: account.email,
            expires_at: stored.expires_at,
        }))
    }

    fn publish(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            trace!("No session event subscribers");
        }
    }
}

async fn insert_session<C: ConnectionTrait>(
    conn: &C,
    account: &account::Model,
    ttl: chrono::Duration,
) -> Result<ActiveSession, DbErr> {
    let now = Utc::now();
    let stored = session::ActiveModel {
        token: Set(new_token()),
        account_id: Set(account.id),
        created_at: Set(now),
        expires_at: Set(now + ttl),
    }
    .insert(conn)
    .await?;

    Ok(ActiveSession {
        token: stored.token,
        account_id: account.id,
        email: account.email.clone(),
        expires_at: stored.expires_at,
    })
}

/// Logs every session event until the channel closes.
pub async fn log_session_events(mut receiver: broadcast::Receiver<SessionEvent>) {
    loop {
        match receiver.recv().await {
            Ok(event) => info!(?event, "Session event"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Session event logger lagged, {} events dropped", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("Session event channel closed");
                break;
            }
        }
    }
}

fn default_username(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

fn new_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_TOKEN_LEN)
        .map(char::from)
        .collect()
}

pub fn hash_password(password: &str) -> Result<String, IdentityError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| IdentityError::Hashing(e.to_string()))
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
