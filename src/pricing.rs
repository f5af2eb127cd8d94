//! Pricing Engine
//!
//! Turns a [`Cart`] and a loyalty points balance into an [`OrderSummary`].
//!
//! The tier discount and the bulk discount are both taken off the original subtotal and then
//! summed; they never compound. Tax is charged on the discounted subtotal. Points are earned on the
//! pre-discount subtotal, and a tier upgrade is reported against the next tier identified *before*
//! the purchase.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    amounts::percent_of,
    bulk::BulkDiscountPolicy,
    cart::Cart,
    loyalty::{LoyaltyPolicy, LoyaltyTier, TierStatus},
    validation::{InvalidInput, validate_cart},
};

/// Errors that can occur while pricing a cart.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// The cart or points balance was rejected.
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),

    /// Decimal arithmetic overflowed.
    #[error("arithmetic overflow while pricing the cart")]
    Overflow,

    /// Discounts exceeded the subtotal.
    #[error("discounted subtotal {0} is negative")]
    NegativeDiscountedSubtotal(Decimal),
}

impl PricingError {
    /// Whether the error was caused by the caller's input.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, PricingError::InvalidInput(_))
    }
}

/// Everything computed for one checkout. Amounts are unrounded.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSummary {
    /// Sum of `quantity × unit price`.
    pub subtotal: Decimal,

    /// Sum of quantities.
    pub total_item_count: u64,

    /// Tier the customer was in before the purchase.
    pub tier: LoyaltyTier,

    /// Tier discount rate.
    pub tier_discount_rate: Percentage,

    /// `subtotal × tier_discount_rate`.
    pub tier_discount_amount: Decimal,

    /// Bulk discount rate.
    pub bulk_discount_rate: Percentage,

    /// `subtotal × bulk_discount_rate`.
    pub bulk_discount_amount: Decimal,

    /// Subtotal less both discounts.
    pub discounted_subtotal: Decimal,

    /// Tax rate.
    pub tax_rate: Percentage,

    /// `discounted_subtotal × tax_rate`.
    pub tax_amount: Decimal,

    /// Amount payable.
    pub final_total: Decimal,

    /// Points credited for this purchase.
    pub points_earned: u64,

    /// Balance after crediting `points_earned`.
    pub new_points_balance: u64,

    /// Whether the new balance reached the next tier identified before the purchase.
    pub tier_upgrade_occurred: bool,

    /// The tier reached, when `tier_upgrade_occurred` is set.
    pub upgraded_to: Option<LoyaltyTier>,
}

impl OrderSummary {
    /// Combined tier and bulk discount, i.e. what the customer saved.
    #[must_use]
    pub fn total_discount(&self) -> Decimal {
        self.subtotal - self.discounted_subtotal
    }
}

/// Prices carts against a loyalty policy, a bulk discount policy and a flat tax rate.
#[derive(Debug, Clone)]
pub struct PricingEngine {
    loyalty: LoyaltyPolicy,
    bulk: BulkDiscountPolicy,
    tax_rate: Percentage,
}

impl PricingEngine {
    /// Create a pricing engine.
    pub fn new(loyalty: LoyaltyPolicy, bulk: BulkDiscountPolicy, tax_rate: Percentage) -> Self {
        Self {
            loyalty,
            bulk,
            tax_rate,
        }
    }

    /// Standard loyalty and bulk policies with 8% GST.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(
            LoyaltyPolicy::standard(),
            BulkDiscountPolicy::standard(),
            Percentage::from(Decimal::new(8, 2)),
        )
    }

    /// The loyalty policy in use.
    #[must_use]
    pub fn loyalty(&self) -> &LoyaltyPolicy {
        &self.loyalty
    }

    /// The bulk discount policy in use.
    #[must_use]
    pub fn bulk(&self) -> &BulkDiscountPolicy {
        &self.bulk
    }

    /// The flat tax rate.
    #[must_use]
    pub fn tax_rate(&self) -> Percentage {
        self.tax_rate
    }

    /// Price a cart for a customer holding `loyalty_points`.
    ///
    /// # Errors
    ///
    /// - [`PricingError::InvalidInput`]: a line has a non-positive quantity or negative price, two
    ///   lines share a category and name, or `loyalty_points` is negative.
    /// - [`PricingError::Overflow`]: decimal arithmetic overflowed.
    /// - [`PricingError::NegativeDiscountedSubtotal`]: the configured discount rates add up to more
    ///   than the subtotal.
    #[tracing::instrument(level = "debug", skip_all, fields(lines = cart.len(), points = loyalty_points))]
    pub fn price(&self, cart: &Cart, loyalty_points: i64) -> Result<OrderSummary, PricingError> {
        validate_cart(cart).inspect_err(|err| warn!(%err, "rejected cart"))?;

        let status = self
            .loyalty
            .classify(loyalty_points)
            .inspect_err(|err| warn!(%err, "rejected points balance"))?;

        let (subtotal, total_item_count) = cart_totals(cart)?;

        let tier_discount_rate = status.discount_rate();
        let bulk_discount_rate = self.bulk.rate(total_item_count);

        let tier_discount_amount =
            percent_of(tier_discount_rate, subtotal).ok_or(PricingError::Overflow)?;
        let bulk_discount_amount =
            percent_of(bulk_discount_rate, subtotal).ok_or(PricingError::Overflow)?;

        let discounted_subtotal = subtotal
            .checked_sub(tier_discount_amount)
            .and_then(|amount| amount.checked_sub(bulk_discount_amount))
            .ok_or(PricingError::Overflow)?;

        if discounted_subtotal < Decimal::ZERO {
            return Err(PricingError::NegativeDiscountedSubtotal(discounted_subtotal));
        }

        let tax_amount =
            percent_of(self.tax_rate, discounted_subtotal).ok_or(PricingError::Overflow)?;

        let final_total = discounted_subtotal
            .checked_add(tax_amount)
            .ok_or(PricingError::Overflow)?;

        let points_earned = self
            .loyalty
            .points_earned(subtotal, status.points_multiplier())
            .ok_or(PricingError::Overflow)?;

        let new_points_balance = status
            .points()
            .checked_add(points_earned)
            .ok_or(PricingError::Overflow)?;

        let upgraded_to = upgrade_target(&status, new_points_balance);

        debug!(
            %subtotal,
            total_item_count,
            tier = %status.tier(),
            %tier_discount_amount,
            %bulk_discount_amount,
            %tax_amount,
            %final_total,
            points_earned,
            "priced cart"
        );

        Ok(OrderSummary {
            subtotal,
            total_item_count,
            tier: status.tier(),
            tier_discount_rate,
            tier_discount_amount,
            bulk_discount_rate,
            bulk_discount_amount,
            discounted_subtotal,
            tax_rate: self.tax_rate,
            tax_amount,
            final_total,
            points_earned,
            new_points_balance,
            tier_upgrade_occurred: upgraded_to.is_some(),
            upgraded_to,
        })
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::standard()
    }
}

/// Subtotal and unit count of an already validated cart.
fn cart_totals(cart: &Cart) -> Result<(Decimal, u64), PricingError> {
    cart.iter()
        .try_fold((Decimal::ZERO, 0u64), |(subtotal, count), item| {
            let line_total = item.checked_total()?;
            let quantity = u64::try_from(item.quantity()).ok()?;

            Some((
                subtotal.checked_add(line_total)?,
                count.checked_add(quantity)?,
            ))
        })
        .ok_or(PricingError::Overflow)
}

/// The tier reached by `new_balance`, judged only against the next tier known before the purchase.
fn upgrade_target(status: &TierStatus, new_balance: u64) -> Option<LoyaltyTier> {
    status
        .next_tier()
        .filter(|next| next.reached_by(new_balance))
        .map(|next| next.tier)
}
