//! Checkout Service
//!
//! Request/response boundary around the [`PricingEngine`]. Selections name catalog items by
//! category and name; the service resolves them against the injected [`Catalog`], applies the
//! storefront's input limits and hands the resulting [`Cart`] to the engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    amounts::{format_amount, percent_points},
    cart::Cart,
    catalog::Catalog,
    pricing::{OrderSummary, PricingEngine, PricingError},
    receipt::{Receipt, ReceiptFormatter},
};

/// Most units of a single item accepted in one checkout.
pub const MAX_LINE_QUANTITY: i64 = 50;

/// Largest points balance accepted in one checkout.
pub const MAX_LOYALTY_POINTS: i64 = 50_000;

/// Errors returned by the checkout service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// The selection names an item the catalog does not list.
    #[error("{category} / {name} is not in the catalog")]
    UnknownItem {
        /// Requested category.
        category: String,
        /// Requested item name.
        name: String,
    },

    /// The selection asks for more units than a single line allows.
    #[error("{category} / {name}: quantity {quantity} exceeds the limit of {limit}")]
    QuantityAboveLimit {
        /// Item category.
        category: String,
        /// Item name.
        name: String,
        /// Requested quantity.
        quantity: i64,
        /// Allowed maximum.
        limit: i64,
    },

    /// The points balance is above the accepted maximum.
    #[error("loyalty points {points} exceed the limit of {limit}")]
    PointsAboveLimit {
        /// Requested balance.
        points: i64,
        /// Allowed maximum.
        limit: i64,
    },

    /// The engine rejected or failed to price the cart.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

impl CheckoutError {
    /// HTTP-style status code: 400 for caller errors, 500 for internal invariant failures.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            CheckoutError::Pricing(
                PricingError::Overflow | PricingError::NegativeDiscountedSubtotal(_),
            ) => 500,
            CheckoutError::UnknownItem { .. }
            | CheckoutError::QuantityAboveLimit { .. }
            | CheckoutError::PointsAboveLimit { .. }
            | CheckoutError::Pricing(PricingError::InvalidInput(_)) => 400,
        }
    }

    /// Stable machine-readable error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            CheckoutError::UnknownItem { .. } => "unknown_item",
            CheckoutError::QuantityAboveLimit { .. } => "quantity_above_limit",
            CheckoutError::PointsAboveLimit { .. } => "points_above_limit",
            CheckoutError::Pricing(PricingError::InvalidInput(_)) => "invalid_input",
            CheckoutError::Pricing(PricingError::Overflow) => "overflow",
            CheckoutError::Pricing(PricingError::NegativeDiscountedSubtotal(_)) => {
                "negative_discounted_subtotal"
            }
        }
    }
}

/// Serialised error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error kind, see [`CheckoutError::kind`].
    pub error: String,

    /// Human-readable message.
    pub message: String,
}

impl From<&CheckoutError> for ErrorResponse {
    fn from(error: &CheckoutError) -> Self {
        ErrorResponse {
            error: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// A request for some units of one catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Catalog category.
    pub category: String,

    /// Item name within the category.
    pub name: String,

    /// Units requested. Zero selections are ignored.
    pub quantity: i64,
}

/// Checkout Request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Selections in cart order.
    #[serde(default)]
    pub cart: Vec<Selection>,

    /// Customer's points balance before the purchase.
    #[serde(default)]
    pub loyalty_points: i64,
}

/// Checkout Response
///
/// Amounts are rounded to cents and rendered as strings; rates are percent points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutResponse {
    /// Pre-discount subtotal.
    pub subtotal: String,

    /// Units in the cart.
    pub total_item_count: u64,

    /// Tier before the purchase.
    pub tier: String,

    /// Tier discount rate, in percent.
    pub tier_discount_rate: String,

    /// Tier discount amount.
    pub tier_discount_amount: String,

    /// Bulk discount rate, in percent.
    pub bulk_discount_rate: String,

    /// Bulk discount amount.
    pub bulk_discount_amount: String,

    /// Subtotal after both discounts.
    pub discounted_subtotal: String,

    /// Tax rate, in percent.
    pub tax_rate: String,

    /// Tax charged.
    pub tax_amount: String,

    /// Amount payable.
    pub final_total: String,

    /// Combined discounts.
    pub total_discount: String,

    /// Points earned by this purchase.
    pub points_earned: u64,

    /// Points held after the purchase.
    pub new_points_balance: u64,

    /// Whether the purchase reached the next tier.
    pub tier_upgrade_occurred: bool,

    /// Tier reached, if any.
    pub upgraded_to: Option<String>,
}

impl From<&OrderSummary> for CheckoutResponse {
    fn from(summary: &OrderSummary) -> Self {
        CheckoutResponse {
            subtotal: format_amount(summary.subtotal),
            total_item_count: summary.total_item_count,
            tier: summary.tier.name().to_string(),
            tier_discount_rate: percent_points(summary.tier_discount_rate).to_string(),
            tier_discount_amount: format_amount(summary.tier_discount_amount),
            bulk_discount_rate: percent_points(summary.bulk_discount_rate).to_string(),
            bulk_discount_amount: format_amount(summary.bulk_discount_amount),
            discounted_subtotal: format_amount(summary.discounted_subtotal),
            tax_rate: percent_points(summary.tax_rate).to_string(),
            tax_amount: format_amount(summary.tax_amount),
            final_total: format_amount(summary.final_total),
            total_discount: format_amount(summary.total_discount()),
            points_earned: summary.points_earned,
            new_points_balance: summary.new_points_balance,
            tier_upgrade_occurred: summary.tier_upgrade_occurred,
            upgraded_to: summary.upgraded_to.map(|tier| tier.name().to_string()),
        }
    }
}

/// A priced checkout, kept around so a receipt can be printed from it.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedCheckout {
    /// Cart built from the request.
    pub cart: Cart,

    /// Engine output.
    pub summary: OrderSummary,

    /// Points balance the cart was priced with.
    pub loyalty_points: u64,
}

/// Checkout Service
#[derive(Debug, Clone)]
pub struct CheckoutService {
    catalog: Catalog,
    engine: PricingEngine,
    formatter: ReceiptFormatter,
}

impl CheckoutService {
    /// Create a service pricing against `catalog` with `engine`.
    pub fn new(catalog: Catalog, engine: PricingEngine) -> Self {
        let formatter = ReceiptFormatter::new(catalog.store().clone(), catalog.currency());

        Self {
            catalog,
            engine,
            formatter,
        }
    }

    /// The catalog items are resolved against.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The pricing engine.
    #[must_use]
    pub fn engine(&self) -> &PricingEngine {
        &self.engine
    }

    /// Resolve selections into a cart.
    ///
    /// Zero-quantity selections are skipped. Negative quantities are passed through for the engine
    /// to reject.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::UnknownItem`]: a selection is not in the catalog.
    /// - [`CheckoutError::QuantityAboveLimit`]: a selection exceeds [`MAX_LINE_QUANTITY`].
    pub fn cart(&self, selections: &[Selection]) -> Result<Cart, CheckoutError> {
        selections
            .iter()
            .filter(|selection| selection.quantity != 0)
            .map(|selection| {
                if selection.quantity > MAX_LINE_QUANTITY {
                    return Err(CheckoutError::QuantityAboveLimit {
                        category: selection.category.clone(),
                        name: selection.name.clone(),
                        quantity: selection.quantity,
                        limit: MAX_LINE_QUANTITY,
                    });
                }

                self.catalog
                    .get(&selection.category, &selection.name)
                    .map(|item| item.line_item(selection.quantity))
                    .ok_or_else(|| CheckoutError::UnknownItem {
                        category: selection.category.clone(),
                        name: selection.name.clone(),
                    })
            })
            .collect()
    }

    /// Price a request, keeping the cart for receipts.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the request is outside the service limits, names unknown
    /// items, or the engine rejects it.
    #[tracing::instrument(level = "debug", skip_all, fields(selections = request.cart.len(), points = request.loyalty_points))]
    pub fn price(&self, request: &CheckoutRequest) -> Result<PricedCheckout, CheckoutError> {
        if request.loyalty_points > MAX_LOYALTY_POINTS {
            warn!(
                points = request.loyalty_points,
                "rejected points balance above limit"
            );

            return Err(CheckoutError::PointsAboveLimit {
                points: request.loyalty_points,
                limit: MAX_LOYALTY_POINTS,
            });
        }

        let cart = self
            .cart(&request.cart)
            .inspect_err(|err| warn!(%err, "rejected selections"))?;

        let summary = self.engine.price(&cart, request.loyalty_points)?;

        // The engine has already rejected negative balances.
        let loyalty_points = summary
            .new_points_balance
            .saturating_sub(summary.points_earned);

        debug!(lines = cart.len(), "checkout priced");

        Ok(PricedCheckout {
            cart,
            summary,
            loyalty_points,
        })
    }

    /// Price a request and project the result into a response.
    ///
    /// # Errors
    ///
    /// See [`CheckoutService::price`].
    pub fn checkout(&self, request: &CheckoutRequest) -> Result<CheckoutResponse, CheckoutError> {
        self.price(request)
            .map(|priced| CheckoutResponse::from(&priced.summary))
    }

    /// Format a receipt for a priced checkout.
    #[must_use]
    pub fn receipt(&self, priced: &PricedCheckout) -> Receipt {
        self.formatter.format(
            &priced.cart,
            &priced.summary,
            priced.summary.tier.name(),
            priced.loyalty_points,
        )
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{catalog::CatalogError, validation::InvalidInput};

    use super::*;

    fn service() -> Result<CheckoutService, CatalogError> {
        Ok(CheckoutService::new(
            Catalog::supermarket()?,
            PricingEngine::standard(),
        ))
    }

    fn select(category: &str, name: &str, quantity: i64) -> Selection {
        Selection {
            category: category.to_string(),
            name: name.to_string(),
            quantity,
        }
    }

    #[test]
    fn checkout_returns_rounded_amounts() -> TestResult {
        // 10 × 2.50 + 10 × 2.00 = 45.00, Gold, 20 units: 8% + 10% off, then 8% GST.
        let request = CheckoutRequest {
            cart: vec![
                select("Fresh Produce", "Bananas (1kg)", 10),
                select("Fresh Produce", "Carrots (500g)", 10),
            ],
            loyalty_points: 3_000,
        };

        let response = service()?.checkout(&request)?;

        assert_eq!(response.subtotal, "45.00");
        assert_eq!(response.total_item_count, 20);
        assert_eq!(response.tier, "Gold");
        assert_eq!(response.tier_discount_rate, "8");
        assert_eq!(response.tier_discount_amount, "3.60");
        assert_eq!(response.bulk_discount_rate, "10");
        assert_eq!(response.bulk_discount_amount, "4.50");
        assert_eq!(response.discounted_subtotal, "36.90");
        assert_eq!(response.tax_rate, "8");
        assert_eq!(response.tax_amount, "2.95");
        assert_eq!(response.final_total, "39.85");
        assert_eq!(response.total_discount, "8.10");
        assert_eq!(response.points_earned, 135);
        assert_eq!(response.new_points_balance, 3_135);
        assert!(!response.tier_upgrade_occurred);
        assert_eq!(response.upgraded_to, None);

        Ok(())
    }

    #[test]
    fn zero_quantity_selections_are_skipped() -> TestResult {
        let service = service()?;

        let cart = service.cart(&[
            select("Fresh Produce", "Bananas (1kg)", 0),
            select("Beverages", "Coffee (200g)", 1),
        ])?;

        assert_eq!(cart.len(), 1);

        Ok(())
    }

    #[test]
    fn unknown_items_are_rejected() -> TestResult {
        let result = service()?.cart(&[select("Beverages", "Champagne", 1)]);

        assert!(matches!(
            result,
            Err(CheckoutError::UnknownItem { ref name, .. }) if name == "Champagne"
        ));

        Ok(())
    }

    #[test]
    fn quantities_above_limit_are_rejected() -> TestResult {
        let service = service()?;

        let at_limit = service.cart(&[select("Fresh Produce", "Bananas (1kg)", 50)]);
        let above = service.cart(&[select("Fresh Produce", "Bananas (1kg)", 51)]);

        assert!(at_limit.is_ok());
        assert!(matches!(
            above,
            Err(CheckoutError::QuantityAboveLimit { quantity: 51, limit: 50, .. })
        ));

        Ok(())
    }

    #[test]
    fn points_above_limit_are_rejected() -> TestResult {
        let service = service()?;

        let request = CheckoutRequest {
            cart: vec![select("Beverages", "Coffee (200g)", 1)],
            loyalty_points: 50_001,
        };

        let err = service.checkout(&request).err().ok_or("expected an error")?;

        assert_eq!(
            err,
            CheckoutError::PointsAboveLimit {
                points: 50_001,
                limit: 50_000
            }
        );
        assert_eq!(err.status_code(), 400);

        Ok(())
    }

    #[test]
    fn negative_input_reaches_the_engine() -> TestResult {
        let service = service()?;

        let request = CheckoutRequest {
            cart: vec![select("Beverages", "Coffee (200g)", -1)],
            loyalty_points: 0,
        };

        let err = service.checkout(&request).err().ok_or("expected an error")?;

        assert!(matches!(
            err,
            CheckoutError::Pricing(PricingError::InvalidInput(
                InvalidInput::NonPositiveQuantity { quantity: -1, .. }
            ))
        ));
        assert_eq!(err.status_code(), 400);
        assert_eq!(ErrorResponse::from(&err).error, "invalid_input");

        Ok(())
    }

    #[test]
    fn internal_errors_map_to_500() {
        let err = CheckoutError::from(PricingError::Overflow);

        assert_eq!(err.status_code(), 500);
        assert_eq!(err.kind(), "overflow");
    }

    #[test]
    fn upgrade_is_reported_in_response() -> TestResult {
        // 999 points, one 2.00 item earns 4 points.
        let request = CheckoutRequest {
            cart: vec![select("Fresh Produce", "Carrots (500g)", 1)],
            loyalty_points: 999,
        };

        let response = service()?.checkout(&request)?;

        assert_eq!(response.new_points_balance, 1_003);
        assert!(response.tier_upgrade_occurred);
        assert_eq!(response.upgraded_to.as_deref(), Some("Silver"));

        Ok(())
    }

    #[test]
    fn receipt_uses_request_points() -> TestResult {
        let service = service()?;

        let priced = service.price(&CheckoutRequest {
            cart: vec![select("Beverages", "Coffee (200g)", 2)],
            loyalty_points: 1_200,
        })?;

        let receipt = service.receipt(&priced);

        assert_eq!(priced.loyalty_points, 1_200);
        assert_eq!(receipt.header().existing_points, 1_200);
        assert_eq!(receipt.header().tier_name, "Silver");

        Ok(())
    }

    #[test]
    fn request_parses_from_yaml_and_json() -> TestResult {
        let yaml = "
loyalty_points: 120
cart:
  - category: Beverages
    name: Coffee (200g)
    quantity: 2
";
        let json = r#"{"loyalty_points":120,"cart":[{"category":"Beverages","name":"Coffee (200g)","quantity":2}]}"#;

        let from_yaml: CheckoutRequest = serde_norway::from_str(yaml)?;
        let from_json: CheckoutRequest = serde_json::from_str(json)?;

        assert_eq!(from_yaml, from_json);

        Ok(())
    }
}
