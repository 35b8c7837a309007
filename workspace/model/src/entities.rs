//! SeaORM entity modules for the rewards platform.
//!
//! Accounts hold credentials, profiles hold balances, and the remaining
//! tables record the events that move those balances: referrals, completed
//! tasks and withdrawals.

pub mod account;
pub mod completed_task;
pub mod profile;
pub mod referral;
pub mod session;
pub mod task;
pub mod withdrawal;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::account::Entity as Account;
    pub use super::completed_task::Entity as CompletedTask;
    pub use super::profile::Entity as Profile;
    pub use super::referral::Entity as Referral;
    pub use super::session::Entity as Session;
    pub use super::task::Entity as Task;
    pub use super::withdrawal::Entity as Withdrawal;
}
