//! Checkout
//!
//! Checkout is a loyalty-aware retail pricing engine: it prices a cart against a customer's loyalty
//! tier and the cart's size, charges GST on the discounted subtotal, accrues loyalty points and
//! formats a receipt.

pub mod amounts;
pub mod bulk;
pub mod cart;
pub mod catalog;
pub mod cli;
pub mod loyalty;
pub mod observability;
pub mod prelude;
pub mod pricing;
pub mod receipt;
pub mod service;
pub mod thresholds;
pub mod validation;
