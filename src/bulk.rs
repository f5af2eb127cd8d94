//! Bulk Discount Policy

use decimal_percentage::Percentage;
use rust_decimal::Decimal;

use crate::thresholds::{BandRange, ThresholdTable};

/// Extra discount keyed on the total number of units in the cart.
#[derive(Debug, Clone)]
pub struct BulkDiscountPolicy {
    rates: ThresholdTable<Percentage>,
}

impl BulkDiscountPolicy {
    /// Create a policy from a rate table.
    pub fn new(rates: ThresholdTable<Percentage>) -> Self {
        Self { rates }
    }

    /// 5% from 10 units, 7% from 15, 10% from 20.
    #[must_use]
    pub fn standard() -> Self {
        let pct = |points| Percentage::from(Decimal::new(points, 2));

        Self::new(
            ThresholdTable::starting_with(pct(0))
                .extended(10, pct(5))
                .extended(15, pct(7))
                .extended(20, pct(10)),
        )
    }

    /// Discount rate for a cart holding `total_item_count` units.
    pub fn rate(&self, total_item_count: u64) -> Percentage {
        *self.rates.lookup(total_item_count).value()
    }

    /// Bands of the policy, for listing.
    pub fn bands(&self) -> impl Iterator<Item = BandRange<'_, Percentage>> {
        self.rates.ranges()
    }
}

impl Default for BulkDiscountPolicy {
    fn default() -> Self {
        Self::standard()
    }
}
