use rust_decimal::Decimal;
use rusty_money::{Money, iso};

/// Formats an amount the way users see it, e.g. `$3.00`.
pub fn format_usd(amount: Decimal) -> String {
    let mut cents = amount.round_dp(2);
    cents.rescale(2);
    Money::from_decimal(cents, iso::USD).to_string()
}
