//! Catalog
//!
//! Read-only reference data: store details, categories, item names and unit prices. A catalog is
//! built once at startup, either from the embedded supermarket fixture or from a YAML file, and
//! then shared by reference.

use std::{fs, path::Path};

use rust_decimal::Decimal;
use rustc_hash::{FxHashMap, FxHashSet};
use rusty_money::iso::{Currency, EUR, GBP, SGD, USD};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::{cart::LineItem, receipt::StoreDetails};

const SUPERMARKET: &str = include_str!("../fixtures/catalog/supermarket.yml");

/// Catalog loading errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading a catalog file.
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format.
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code.
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Items priced in different currencies.
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// A price below zero.
    #[error("{category} / {name} has a negative price")]
    NegativePrice {
        /// Item category.
        category: String,
        /// Item name.
        name: String,
    },

    /// The same item listed twice.
    #[error("{category} / {name} is listed more than once")]
    DuplicateItem {
        /// Item category.
        category: String,
        /// Item name.
        name: String,
    },

    /// The same category listed in two separate blocks.
    #[error("Category {0} is listed more than once")]
    DuplicateCategory(String),

    /// No items at all, so no currency.
    #[error("Catalog has no items")]
    Empty,
}

/// Catalog file layout.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    store: StoreDetails,
    categories: Vec<CategoryFile>,
}

#[derive(Debug, Deserialize)]
struct CategoryFile {
    name: String,
    items: Vec<ItemFile>,
}

#[derive(Debug, Deserialize)]
struct ItemFile {
    name: String,

    /// e.g. "2.50 SGD"
    price: String,
}

/// A purchasable item.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    category: String,
    name: String,
    unit_price: Decimal,
}

impl CatalogItem {
    /// Category the item is listed under.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Item name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit price.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// A cart line for `quantity` units of this item.
    #[must_use]
    pub fn line_item(&self, quantity: i64) -> LineItem {
        LineItem::new(&*self.category, &*self.name, self.unit_price, quantity)
    }
}

/// Store catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    store: StoreDetails,
    currency: &'static Currency,
    items: Vec<CatalogItem>,
    index: FxHashMap<(String, String), usize>,
}

impl Catalog {
    /// The built-in Siong Sheng Supermarket catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded fixture fails to parse.
    pub fn supermarket() -> Result<Self, CatalogError> {
        Self::from_yaml_str(SUPERMARKET)
    }

    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if its contents are invalid.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path.as_ref())?;

        debug!(path = %path.as_ref().display(), "loading catalog");

        Self::from_yaml_str(&contents)
    }

    /// Parse a catalog from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed, a price cannot be parsed, currencies differ,
    /// a price is negative, an item or category repeats, or there are no items.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_norway::from_str(yaml)?;

        let mut currency: Option<&'static Currency> = None;
        let mut items = Vec::new();
        let mut index = FxHashMap::default();
        let mut categories = FxHashSet::default();

        for category in file.categories {
            if !categories.insert(category.name.clone()) {
                return Err(CatalogError::DuplicateCategory(category.name));
            }

            for item in category.items {
                let (unit_price, item_currency) = parse_price(&item.price)?;

                match currency {
                    Some(existing) if existing != item_currency => {
                        return Err(CatalogError::CurrencyMismatch(
                            existing.iso_alpha_code.to_string(),
                            item_currency.iso_alpha_code.to_string(),
                        ));
                    }
                    Some(_) => {}
                    None => currency = Some(item_currency),
                }

                if unit_price < Decimal::ZERO {
                    return Err(CatalogError::NegativePrice {
                        category: category.name.clone(),
                        name: item.name,
                    });
                }

                let key = (category.name.clone(), item.name.clone());

                if index.insert(key, items.len()).is_some() {
                    return Err(CatalogError::DuplicateItem {
                        category: category.name.clone(),
                        name: item.name,
                    });
                }

                items.push(CatalogItem {
                    category: category.name.clone(),
                    name: item.name,
                    unit_price,
                });
            }
        }

        let currency = currency.ok_or(CatalogError::Empty)?;

        debug!(
            items = items.len(),
            categories = categories.len(),
            currency = currency.iso_alpha_code,
            "catalog loaded"
        );

        Ok(Self {
            store: file.store,
            currency,
            items,
            index,
        })
    }

    /// Store details used on receipts.
    #[must_use]
    pub fn store(&self) -> &StoreDetails {
        &self.store
    }

    /// Currency every price is listed in.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Look up an item by category and name.
    pub fn get(&self, category: &str, name: &str) -> Option<&CatalogItem> {
        self.index
            .get(&(category.to_string(), name.to_string()))
            .and_then(|&idx| self.items.get(idx))
    }

    /// All items in listing order.
    #[must_use]
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Categories in listing order, each with its items.
    pub fn categories(&self) -> impl Iterator<Item = (&str, &[CatalogItem])> {
        self.items
            .chunk_by(|a, b| a.category == b.category)
            .filter_map(|items| items.first().map(|first| (first.category(), items)))
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Catalogs always hold at least one item once loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Parse a price string (e.g., "2.50 SGD") into an amount and currency.
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY", if the amount is not a
/// decimal number, or if the currency code is not recognised.
pub fn parse_price(s: &str) -> Result<(Decimal, &'static Currency), CatalogError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(CatalogError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| CatalogError::InvalidPrice(s.to_string()))?;

    let currency = match code {
        "SGD" => SGD,
        "GBP" => GBP,
        "USD" => USD,
        "EUR" => EUR,
        other => return Err(CatalogError::UnknownCurrency(other.to_string())),
    };

    Ok((amount, currency))
}
