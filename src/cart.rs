//! Cart

use rust_decimal::Decimal;

/// A selected catalog item and the quantity being bought.
#[derive(Clone, Debug, PartialEq)]
pub struct LineItem {
    category: String,
    name: String,
    unit_price: Decimal,
    quantity: i64,
}

impl LineItem {
    /// Creates a new line item.
    ///
    /// No validation happens here; the pricing engine rejects non-positive quantities and
    /// negative prices.
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        unit_price: Decimal,
        quantity: i64,
    ) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            unit_price,
            quantity,
        }
    }

    /// Category the item belongs to.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Item name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Price of a single unit.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// Number of units.
    #[must_use]
    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// Line total, or `None` if it overflows.
    #[must_use]
    pub fn checked_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }

    /// Line total, saturating at the decimal range.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.unit_price.saturating_mul(Decimal::from(self.quantity))
    }
}

/// An ordered sequence of line items.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cart holding the given line items, in order.
    pub fn with_items(items: impl Into<Vec<LineItem>>) -> Self {
        Self {
            items: items.into(),
        }
    }

    /// Append a line item.
    pub fn push(&mut self, item: LineItem) {
        self.items.push(item);
    }

    /// Iterate over the line items in cart order.
    pub fn iter(&self) -> std::slice::Iter<'_, LineItem> {
        self.items.iter()
    }

    /// Line items as a slice.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Number of line items (not units).
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<LineItem> for Cart {
    fn from_iter<I: IntoIterator<Item = LineItem>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bananas(quantity: i64) -> LineItem {
        LineItem::new("Fresh Produce", "Bananas (1kg)", Decimal::new(250, 2), quantity)
    }

    #[test]
    fn line_total_multiplies_price_by_quantity() {
        assert_eq!(bananas(3).total(), Decimal::new(750, 2));
        assert_eq!(bananas(3).checked_total(), Some(Decimal::new(750, 2)));
    }

    #[test]
    fn checked_total_reports_overflow() {
        let item = LineItem::new("Bulk", "Everything", Decimal::MAX, 2);

        assert_eq!(item.checked_total(), None);
        assert_eq!(item.total(), Decimal::MAX);
    }

    #[test]
    fn cart_preserves_insertion_order() {
        let mut cart = Cart::new();

        cart.push(bananas(1));
        cart.push(LineItem::new(
            "Beverages",
            "Coffee (200g)",
            Decimal::new(1280, 2),
            1,
        ));

        let names: Vec<&str> = cart.iter().map(LineItem::name).collect();

        assert_eq!(names, ["Bananas (1kg)", "Coffee (200g)"]);
        assert_eq!(cart.len(), 2);
        assert!(!cart.is_empty());
    }

    #[test]
    fn cart_collects_from_iterator() {
        let cart: Cart = (1..=3).map(bananas).collect();

        assert_eq!(cart.len(), 3);
        assert!(Cart::new().is_empty());
    }
}
