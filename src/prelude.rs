//! Checkout prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    amounts::{AmountError, format_amount, format_points, percent_points, round_money, to_money},
    bulk::BulkDiscountPolicy,
    cart::{Cart, LineItem},
    catalog::{Catalog, CatalogError, CatalogItem},
    loyalty::{LoyaltyPolicy, LoyaltyTier, NextTier, TierBenefit, TierStatus, TierTerms},
    pricing::{OrderSummary, PricingEngine, PricingError},
    receipt::{Receipt, ReceiptError, ReceiptFormatter, StoreDetails, TotalsLine},
    service::{
        CheckoutError, CheckoutRequest, CheckoutResponse, CheckoutService, ErrorResponse,
        MAX_LINE_QUANTITY, MAX_LOYALTY_POINTS, PricedCheckout, Selection,
    },
    thresholds::{ThresholdError, ThresholdTable},
    validation::{InvalidInput, validate_cart, validate_points},
};
