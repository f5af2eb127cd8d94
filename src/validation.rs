//! Validation
//!
//! Checks the pricing engine applies to every cart and points balance before doing any arithmetic.
//! Callers are expected to build valid carts, but nothing here trusts them to.

use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::cart::Cart;

/// Deterministic input errors. Retrying with the same input always fails the same way.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidInput {
    /// A line item has a zero or negative quantity.
    #[error("{category} / {name}: quantity must be positive, got {quantity}")]
    NonPositiveQuantity {
        /// Item category.
        category: String,
        /// Item name.
        name: String,
        /// Offending quantity.
        quantity: i64,
    },

    /// A line item has a negative unit price.
    #[error("{category} / {name}: unit price must not be negative, got {unit_price}")]
    NegativeUnitPrice {
        /// Item category.
        category: String,
        /// Item name.
        name: String,
        /// Offending price.
        unit_price: Decimal,
    },

    /// Two line items share the same category and name.
    #[error("{category} / {name} appears more than once in the cart")]
    DuplicateLineItem {
        /// Item category.
        category: String,
        /// Item name.
        name: String,
    },

    /// A loyalty points balance is negative.
    #[error("loyalty points must not be negative, got {0}")]
    NegativePoints(i64),
}

/// Validate every line of a cart.
///
/// # Errors
///
/// Returns the first [`InvalidInput`] found, scanning in cart order.
pub fn validate_cart(cart: &Cart) -> Result<(), InvalidInput> {
    let mut seen = FxHashSet::default();

    for item in cart {
        if item.quantity() <= 0 {
            return Err(InvalidInput::NonPositiveQuantity {
                category: item.category().to_string(),
                name: item.name().to_string(),
                quantity: item.quantity(),
            });
        }

        if item.unit_price() < Decimal::ZERO {
            return Err(InvalidInput::NegativeUnitPrice {
                category: item.category().to_string(),
                name: item.name().to_string(),
                unit_price: item.unit_price(),
            });
        }

        if !seen.insert((item.category(), item.name())) {
            return Err(InvalidInput::DuplicateLineItem {
                category: item.category().to_string(),
                name: item.name().to_string(),
            });
        }
    }

    Ok(())
}

/// Validate a loyalty points balance, returning it unsigned.
///
/// # Errors
///
/// Returns [`InvalidInput::NegativePoints`] if `points` is below zero.
pub fn validate_points(points: i64) -> Result<u64, InvalidInput> {
    u64::try_from(points).map_err(|_err| InvalidInput::NegativePoints(points))
}
