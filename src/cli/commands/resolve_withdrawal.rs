use anyhow::Result;
use common::format_usd;
use ledger::withdrawal;
use model::entities::withdrawal::WithdrawalStatus;
use sea_orm::Database;
use tracing::{debug, error, info, trace};

pub async fn resolve_withdrawal(database_url: &str, id: i32, status: WithdrawalStatus) -> Result<()> {
    trace!("Entering resolve_withdrawal function");
    debug!("Database URL: {}", database_url);
    let db = Database::connect(database_url).await?;

    match withdrawal::resolve_withdrawal(&db, id, status).await {
        Ok(resolved) => {
            info!(
                "Withdrawal {} of {} to {} is now {}",
                resolved.id,
                format_usd(resolved.amount),
                resolved.paypal_email,
                resolved.status.as_str()
            );
            Ok(())
        }
        Err(e) => {
            error!("Failed to resolve withdrawal {}: {}", id, e);
            Err(e.into())
        }
    }
}
