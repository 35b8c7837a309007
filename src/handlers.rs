pub mod auth;
pub mod dashboard;
pub mod health;
pub mod profile;
pub mod tasks;
pub mod withdrawals;
