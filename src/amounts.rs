//! Amounts
//!
//! Decimal helpers shared by pricing, receipts and the service layer. Amounts keep full precision
//! everywhere; rounding to cents only happens in [`round_money`] and the functions built on it.

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

/// Number of decimal places shown for monetary amounts.
pub const MONEY_DP: u32 = 2;

/// Errors converting amounts for display.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    /// The rounded amount does not fit in minor units.
    #[error("amount {0} is out of range for display")]
    OutOfRange(Decimal),
}

/// Apply a percentage to an amount, keeping full precision.
///
/// Returns `None` on overflow.
pub fn percent_of(percent: Percentage, amount: Decimal) -> Option<Decimal> {
    // decimal_percentage doesn't expose the underlying Decimal, multiplying by one unwraps it.
    (percent * Decimal::ONE).checked_mul(amount)
}

/// Fractional rate behind a percentage (e.g. `0.05` for 5%).
pub fn rate(percent: Percentage) -> Decimal {
    percent * Decimal::ONE
}

/// Converts a fractional percentage to percent points for display (0.05 -> 5).
pub fn percent_points(percent: Percentage) -> Decimal {
    (rate(percent) * Decimal::ONE_HUNDRED).round_dp(2).normalize()
}

/// Round an amount to cents, midpoint away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount as a plain two-decimal string (e.g. `"88.56"`).
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", round_money(amount))
}

/// Convert a full-precision amount into [`Money`] for currency-aware display.
///
/// # Errors
///
/// Returns [`AmountError::OutOfRange`] if the rounded amount cannot be represented in minor units.
pub fn to_money(
    amount: Decimal,
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, AmountError> {
    let minor = round_money(amount)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|value| value.to_i64())
        .ok_or(AmountError::OutOfRange(amount))?;

    Ok(Money::from_minor(minor, currency))
}

/// Format a points figure with thousands separators (e.g. `"12,345"`).
pub fn format_points(points: u64) -> String {
    let digits = points.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }

        out.push(ch);
    }

    out
}
