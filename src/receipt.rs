//! Receipt

use std::io;

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::iso::Currency;
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    amounts::{AmountError, format_points, percent_points, to_money},
    cart::Cart,
    pricing::OrderSummary,
};

const RULE_WIDTH: usize = 50;

/// Errors that can occur when writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// An amount could not be converted for display.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// Store details printed on receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDetails {
    /// Store name.
    pub name: String,

    /// Line printed under the store name.
    pub tagline: String,

    /// Name the tax goes by on the receipt.
    #[serde(default = "default_tax_label")]
    pub tax_label: String,

    /// Closing line.
    #[serde(default = "default_farewell")]
    pub farewell: String,
}

fn default_tax_label() -> String {
    "GST".to_string()
}

fn default_farewell() -> String {
    "Thank you for shopping with us!".to_string()
}

/// Receipt header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptHeader {
    /// Store name.
    pub store_name: String,

    /// Store tagline.
    pub tagline: String,

    /// Customer tier before the purchase.
    pub tier_name: String,

    /// Points held before the purchase.
    pub existing_points: u64,
}

/// One purchased line.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptLine {
    /// Item name.
    pub name: String,

    /// Units purchased.
    pub quantity: i64,

    /// `quantity × unit price`.
    pub total: Decimal,
}

/// A run of consecutive cart lines sharing a category.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptSection {
    /// Category heading.
    pub category: String,

    /// Lines in cart order.
    pub lines: SmallVec<[ReceiptLine; 5]>,
}

/// A line of the totals block. Variants are listed in printing order.
#[derive(Debug, Clone, PartialEq)]
pub enum TotalsLine {
    /// Pre-discount subtotal.
    Subtotal(Decimal),

    /// Tier discount, present only when non-zero.
    TierDiscount {
        /// Tier name shown in the label.
        tier_name: String,
        /// Discount rate.
        rate: Percentage,
        /// Amount taken off.
        amount: Decimal,
    },

    /// Bulk discount, present only when non-zero.
    BulkDiscount {
        /// Discount rate.
        rate: Percentage,
        /// Amount taken off.
        amount: Decimal,
    },

    /// Tax on the discounted subtotal.
    Tax {
        /// Tax name, e.g. "GST".
        label: String,
        /// Tax rate.
        rate: Percentage,
        /// Tax charged.
        amount: Decimal,
    },

    /// Amount payable.
    Total(Decimal),

    /// Points earned by this purchase.
    PointsEarned(u64),

    /// Points held after the purchase.
    NewPointsBalance(u64),
}

impl TotalsLine {
    /// Label printed to the left of the value.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            TotalsLine::Subtotal(_) => "Subtotal:".to_string(),
            TotalsLine::TierDiscount {
                tier_name, rate, ..
            } => format!("{tier_name} Discount ({}%):", percent_points(*rate)),
            TotalsLine::BulkDiscount { rate, .. } => {
                format!("Bulk Discount ({}%):", percent_points(*rate))
            }
            TotalsLine::Tax { label, rate, .. } => {
                format!("{label} ({}%):", percent_points(*rate))
            }
            TotalsLine::Total(_) => "TOTAL:".to_string(),
            TotalsLine::PointsEarned(_) => "Points Earned:".to_string(),
            TotalsLine::NewPointsBalance(_) => "New Points Balance:".to_string(),
        }
    }

    /// Value printed to the right of the label.
    ///
    /// # Errors
    ///
    /// Returns a [`ReceiptError`] if an amount cannot be converted to money.
    pub fn value(&self, currency: &'static Currency) -> Result<String, ReceiptError> {
        Ok(match self {
            TotalsLine::Subtotal(amount)
            | TotalsLine::Tax { amount, .. }
            | TotalsLine::Total(amount) => to_money(*amount, currency)?.to_string(),
            TotalsLine::TierDiscount { amount, .. } | TotalsLine::BulkDiscount { amount, .. } => {
                format!("-{}", to_money(*amount, currency)?)
            }
            TotalsLine::PointsEarned(points) => format!("+{}", format_points(*points)),
            TotalsLine::NewPointsBalance(points) => format_points(*points),
        })
    }
}

/// A formatted receipt. Holds display data only; nothing is recomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    header: ReceiptHeader,
    sections: Vec<ReceiptSection>,
    totals: SmallVec<[TotalsLine; 7]>,
    farewell: String,
    currency: &'static Currency,
}

impl Receipt {
    /// Header block.
    #[must_use]
    pub fn header(&self) -> &ReceiptHeader {
        &self.header
    }

    /// Item sections in cart order.
    #[must_use]
    pub fn sections(&self) -> &[ReceiptSection] {
        &self.sections
    }

    /// Totals block in printing order.
    #[must_use]
    pub fn totals(&self) -> &[TotalsLine] {
        &self.totals
    }

    /// Closing line.
    #[must_use]
    pub fn farewell(&self) -> &str {
        &self.farewell
    }

    /// Currency used for all monetary values
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Render the receipt as text.
    ///
    /// # Errors
    ///
    /// Returns a [`ReceiptError`] if writing fails or an amount cannot be displayed.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        self.write_header(&mut out)?;
        self.write_items(&mut out)?;
        self.write_totals(&mut out)?;

        writeln!(out, "{}", "=".repeat(RULE_WIDTH)).map_err(|_err| ReceiptError::IO)?;
        writeln!(out, "{}", self.farewell).map_err(|_err| ReceiptError::IO)
    }

    fn write_header(&self, out: &mut impl io::Write) -> Result<(), ReceiptError> {
        let rule = "=".repeat(RULE_WIDTH);

        writeln!(
            out,
            "{rule}\n{}\n{}\n{rule}\nCustomer Tier: {}\nExisting Points: {}",
            self.header.store_name.to_uppercase(),
            self.header.tagline,
            self.header.tier_name,
            format_points(self.header.existing_points),
        )
        .map_err(|_err| ReceiptError::IO)
    }

    fn write_items(&self, out: &mut impl io::Write) -> Result<(), ReceiptError> {
        let mut builder = Builder::default();
        let mut section_rows: SmallVec<[usize; 8]> = SmallVec::new();
        let mut row = 1; // header is row 0

        builder.push_record(["Item", "Qty", "Total"]);

        for section in &self.sections {
            section_rows.push(row);
            builder.push_record([
                section.category.to_uppercase(),
                String::new(),
                String::new(),
            ]);
            row += 1;

            for line in &section.lines {
                builder.push_record([
                    format!("  {}", line.name),
                    format!("x{}", line.quantity),
                    to_money(line.total, self.currency)?.to_string(),
                ]);
                row += 1;
            }
        }

        let mut table = builder.build();
        let mut theme = Theme::from(Style::modern_rounded());
        let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

        theme.remove_horizontal_lines();
        theme.insert_horizontal_line(1, separator);

        for &section_row in &section_rows {
            if section_row > 1 {
                theme.insert_horizontal_line(section_row, separator);
            }
        }

        table.with(theme);
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(1..3), Alignment::right());

        for section_row in section_rows {
            table.modify((section_row, 0), Color::BOLD);
        }

        writeln!(out, "{table}").map_err(|_err| ReceiptError::IO)
    }

    fn write_totals(&self, out: &mut impl io::Write) -> Result<(), ReceiptError> {
        let lines = self
            .totals
            .iter()
            .map(|line| Ok((line.label(), line.value(self.currency)?)))
            .collect::<Result<SmallVec<[(String, String); 7]>, ReceiptError>>()?;

        let label_width = lines
            .iter()
            .map(|(label, _)| label.chars().count())
            .max()
            .unwrap_or_default();

        let value_width = lines
            .iter()
            .map(|(_, value)| value.chars().count())
            .max()
            .unwrap_or_default();

        for (label, value) in &lines {
            write_summary_line(out, label, value, label_width, value_width)?;
        }

        Ok(())
    }
}

/// Writes a summary line with a right-aligned label and a fixed-width value column.
fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
    label_col_width: usize,
    value_col_width: usize,
) -> Result<(), ReceiptError> {
    writeln!(out, " {label:>label_col_width$}  {value:>value_col_width$}")
        .map_err(|_err| ReceiptError::IO)
}

/// Builds [`Receipt`]s for a store.
#[derive(Debug, Clone)]
pub struct ReceiptFormatter {
    store: StoreDetails,
    currency: &'static Currency,
}

impl ReceiptFormatter {
    /// Create a formatter for the given store and currency.
    pub fn new(store: StoreDetails, currency: &'static Currency) -> Self {
        Self { store, currency }
    }

    /// Store details printed on receipts.
    #[must_use]
    pub fn store(&self) -> &StoreDetails {
        &self.store
    }

    /// Project a priced cart into a receipt.
    ///
    /// Line items are grouped into a new section whenever the category differs from the previous
    /// line's. The totals block lists discounts only when they are non-zero.
    #[must_use]
    pub fn format(
        &self,
        cart: &Cart,
        summary: &OrderSummary,
        tier_name: &str,
        loyalty_points: u64,
    ) -> Receipt {
        let mut sections: Vec<ReceiptSection> = Vec::new();

        for item in cart {
            let line = ReceiptLine {
                name: item.name().to_string(),
                quantity: item.quantity(),
                total: item.total(),
            };

            match sections.last_mut() {
                Some(section) if section.category == item.category() => section.lines.push(line),
                _ => sections.push(ReceiptSection {
                    category: item.category().to_string(),
                    lines: smallvec![line],
                }),
            }
        }

        let mut totals = SmallVec::new();

        totals.push(TotalsLine::Subtotal(summary.subtotal));

        if summary.tier_discount_amount > Decimal::ZERO {
            totals.push(TotalsLine::TierDiscount {
                tier_name: tier_name.to_string(),
                rate: summary.tier_discount_rate,
                amount: summary.tier_discount_amount,
            });
        }

        if summary.bulk_discount_amount > Decimal::ZERO {
            totals.push(TotalsLine::BulkDiscount {
                rate: summary.bulk_discount_rate,
                amount: summary.bulk_discount_amount,
            });
        }

        totals.push(TotalsLine::Tax {
            label: self.store.tax_label.clone(),
            rate: summary.tax_rate,
            amount: summary.tax_amount,
        });
        totals.push(TotalsLine::Total(summary.final_total));
        totals.push(TotalsLine::PointsEarned(summary.points_earned));
        totals.push(TotalsLine::NewPointsBalance(summary.new_points_balance));

        Receipt {
            header: ReceiptHeader {
                store_name: self.store.name.clone(),
                tagline: self.store.tagline.clone(),
                tier_name: tier_name.to_string(),
                existing_points: loyalty_points,
            },
            sections,
            totals,
            farewell: self.store.farewell.clone(),
            currency: self.currency,
        }
    }
}
