//! Loyalty Policy
//!
//! Maps a points balance onto a [`LoyaltyTier`], the discount that tier earns at checkout and the
//! multiplier applied to points accrued on a purchase. Tiers are never stored: they are derived
//! from the current balance every time through a [`ThresholdTable`].

use std::fmt;

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::{
    thresholds::ThresholdTable,
    validation::{InvalidInput, validate_points},
};

/// Loyalty programme brackets, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoyaltyTier {
    /// Entry tier.
    Bronze,

    /// 1,000 points and up.
    Silver,

    /// 3,000 points and up.
    Gold,

    /// 8,000 points and up. The maximum tier.
    Platinum,
}

impl LoyaltyTier {
    /// Display name of the tier.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            LoyaltyTier::Bronze => "Bronze",
            LoyaltyTier::Silver => "Silver",
            LoyaltyTier::Gold => "Gold",
            LoyaltyTier::Platinum => "Platinum",
        }
    }

    /// Badge shown next to the tier name on the storefront.
    #[must_use]
    pub const fn badge(self) -> &'static str {
        match self {
            LoyaltyTier::Bronze => "🥉",
            LoyaltyTier::Silver => "🥈",
            LoyaltyTier::Gold => "🥇",
            LoyaltyTier::Platinum => "💎",
        }
    }

    /// Badge and name together, e.g. `"🥈 Silver"`.
    #[must_use]
    pub fn label(self) -> String {
        format!("{} {}", self.badge(), self.name())
    }
}

impl fmt::Display for LoyaltyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a tier is worth at checkout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierTerms {
    /// The tier these terms belong to.
    pub tier: LoyaltyTier,

    /// Discount taken off the subtotal.
    pub discount_rate: Percentage,

    /// Multiplier applied to base points.
    pub points_multiplier: Decimal,
}

impl TierTerms {
    /// Create tier terms.
    pub fn new(tier: LoyaltyTier, discount_rate: Percentage, points_multiplier: Decimal) -> Self {
        Self {
            tier,
            discount_rate,
            points_multiplier,
        }
    }
}

/// The tier above the customer's current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NextTier {
    /// Tier that will be reached.
    pub tier: LoyaltyTier,

    /// Points balance at which it is reached.
    pub threshold: u64,

    /// Points still needed from the current balance. Always positive.
    pub points_needed: u64,
}

impl NextTier {
    /// Whether `balance` has reached this tier's threshold.
    #[must_use]
    pub fn reached_by(&self, balance: u64) -> bool {
        balance >= self.threshold
    }
}

/// Result of classifying a points balance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierStatus {
    points: u64,
    band_floor: u64,
    terms: TierTerms,
    next: Option<NextTier>,
}

impl TierStatus {
    /// Points balance that was classified.
    #[must_use]
    pub fn points(&self) -> u64 {
        self.points
    }

    /// Current tier.
    #[must_use]
    pub fn tier(&self) -> LoyaltyTier {
        self.terms.tier
    }

    /// Full terms of the current tier.
    #[must_use]
    pub fn terms(&self) -> &TierTerms {
        &self.terms
    }

    /// Discount rate of the current tier.
    #[must_use]
    pub fn discount_rate(&self) -> Percentage {
        self.terms.discount_rate
    }

    /// Points multiplier of the current tier.
    #[must_use]
    pub fn points_multiplier(&self) -> Decimal {
        self.terms.points_multiplier
    }

    /// The next tier, or `None` at the maximum tier.
    #[must_use]
    pub fn next_tier(&self) -> Option<&NextTier> {
        self.next.as_ref()
    }

    /// How far through the current band the balance is, from 0 to 1.
    ///
    /// Always 1 at the maximum tier.
    #[must_use]
    pub fn progress(&self) -> Percentage {
        let Some(next) = self.next else {
            return Percentage::from(Decimal::ONE);
        };

        let covered = Decimal::from(self.points.saturating_sub(self.band_floor));
        let width = Decimal::from(next.threshold.saturating_sub(self.band_floor));

        Percentage::from(covered.checked_div(width).unwrap_or(Decimal::ZERO))
    }
}

/// A row of the tier benefits listing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierBenefit {
    /// Tier terms.
    pub terms: TierTerms,

    /// Lowest balance in the tier.
    pub lower: u64,

    /// Highest balance in the tier, or `None` if open-ended.
    pub upper: Option<u64>,
}

/// Loyalty policy: tier table plus the base earning rate.
#[derive(Debug, Clone)]
pub struct LoyaltyPolicy {
    tiers: ThresholdTable<TierTerms>,
    points_per_unit: Decimal,
}

impl LoyaltyPolicy {
    /// Create a policy from a tier table and a base earning rate (points per currency unit).
    pub fn new(tiers: ThresholdTable<TierTerms>, points_per_unit: Decimal) -> Self {
        Self {
            tiers,
            points_per_unit,
        }
    }

    /// The supermarket's programme: Bronze 2% / 1.0×, Silver 5% / 1.2× from 1,000 points,
    /// Gold 8% / 1.5× from 3,000, Platinum 12% / 2.0× from 8,000; 2 base points per dollar.
    #[must_use]
    pub fn standard() -> Self {
        let terms = |tier, rate, multiplier| {
            TierTerms::new(
                tier,
                Percentage::from(Decimal::new(rate, 2)),
                Decimal::new(multiplier, 1),
            )
        };

        let tiers = ThresholdTable::starting_with(terms(LoyaltyTier::Bronze, 2, 10))
            .extended(1_000, terms(LoyaltyTier::Silver, 5, 12))
            .extended(3_000, terms(LoyaltyTier::Gold, 8, 15))
            .extended(8_000, terms(LoyaltyTier::Platinum, 12, 20));

        Self::new(tiers, Decimal::TWO)
    }

    /// Classify a points balance.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput::NegativePoints`] if `points` is negative.
    pub fn classify(&self, points: i64) -> Result<TierStatus, InvalidInput> {
        let points = validate_points(points)?;
        let band = self.tiers.lookup(points);

        let next = self.tiers.next_above(points).map(|next| NextTier {
            tier: next.value().tier,
            threshold: next.lower(),
            points_needed: next.lower() - points,
        });

        Ok(TierStatus {
            points,
            band_floor: band.lower(),
            terms: *band.value(),
            next,
        })
    }

    /// Points earned on a pre-discount subtotal.
    ///
    /// Base points (`subtotal × points_per_unit`) are truncated to a whole number before the
    /// multiplier is applied, and the product is truncated again.
    ///
    /// Returns `None` on overflow or a negative subtotal.
    pub fn points_earned(&self, subtotal: Decimal, multiplier: Decimal) -> Option<u64> {
        let base = subtotal.checked_mul(self.points_per_unit)?.floor();

        base.checked_mul(multiplier)?.floor().to_u64()
    }

    /// Base earning rate in points per currency unit.
    #[must_use]
    pub fn points_per_unit(&self) -> Decimal {
        self.points_per_unit
    }

    /// Every tier with its balance range.
    pub fn benefits(&self) -> Vec<TierBenefit> {
        self.tiers
            .ranges()
            .map(|range| TierBenefit {
                terms: *range.band.value(),
                lower: range.band.lower(),
                upper: range.upper.map(|upper| upper.saturating_sub(1)),
            })
            .collect()
    }
}

impl Default for LoyaltyPolicy {
    fn default() -> Self {
        Self::standard()
    }
}
