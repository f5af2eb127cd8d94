//! Command line interface
//!
//! `checkout catalog` lists the items on sale, `checkout tiers` lists the loyalty tiers and bulk
//! discounts, and `checkout price` prices a cart and prints a receipt (or a JSON response).

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;
use tracing::info;

use crate::{
    amounts::{AmountError, format_points, percent_points, to_money},
    catalog::{Catalog, CatalogError},
    loyalty::TierStatus,
    observability::LoggingConfig,
    pricing::PricingEngine,
    receipt::ReceiptError,
    service::{
        CheckoutError, CheckoutRequest, CheckoutResponse, CheckoutService, ErrorResponse, Selection,
    },
    validation::InvalidInput,
};

/// Errors surfaced by the command line interface.
#[derive(Debug, Error)]
pub enum CliError {
    /// The catalog could not be loaded.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The checkout was rejected.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// The points balance was rejected.
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),

    /// The receipt could not be written.
    #[error(transparent)]
    Receipt(#[from] ReceiptError),

    /// An amount could not be displayed.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// Failed to read a request file or write output.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Malformed JSON request, or failure writing a JSON response.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed YAML request.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_norway::Error),
}

/// Siong Sheng Supermarket checkout
#[derive(Debug, Parser)]
#[command(name = "checkout", about = "Loyalty-aware supermarket checkout", long_about = None)]
pub struct Cli {
    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Catalog YAML file (defaults to the built-in supermarket catalog)
    #[arg(long, env = "CHECKOUT_CATALOG", global = true)]
    pub catalog: Option<PathBuf>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the items on sale
    Catalog,

    /// List loyalty tier benefits and bulk purchase discounts
    Tiers,

    /// Price a cart and print a receipt
    Price(PriceArgs),
}

/// Arguments for `checkout price`
#[derive(Debug, Args)]
pub struct PriceArgs {
    /// Loyalty points held before the purchase
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    pub points: i64,

    /// Item to add, as CATEGORY/NAME=QUANTITY (repeatable)
    #[arg(short, long = "item", value_parser = parse_selection)]
    pub items: Vec<Selection>,

    /// Read the request from a YAML or JSON file instead
    #[arg(short, long, conflicts_with = "items")]
    pub request: Option<PathBuf>,

    /// Print a JSON response instead of a receipt
    #[arg(long)]
    pub json: bool,
}

impl PriceArgs {
    fn checkout_request(&self) -> Result<CheckoutRequest, CliError> {
        match &self.request {
            Some(path) => read_request(path),
            None => Ok(CheckoutRequest {
                cart: self.items.clone(),
                loyalty_points: self.points,
            }),
        }
    }
}

/// Parse a `CATEGORY/NAME=QUANTITY` item argument.
///
/// # Errors
///
/// Returns a message describing the problem if the argument is malformed.
pub fn parse_selection(s: &str) -> Result<Selection, String> {
    let (item, quantity) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected CATEGORY/NAME=QUANTITY, got: {s}"))?;

    let (category, name) = item
        .split_once('/')
        .ok_or_else(|| format!("expected CATEGORY/NAME=QUANTITY, got: {s}"))?;

    let quantity = quantity
        .trim()
        .parse::<i64>()
        .map_err(|err| format!("invalid quantity {quantity:?}: {err}"))?;

    Ok(Selection {
        category: category.trim().to_string(),
        name: name.trim().to_string(),
        quantity,
    })
}

/// Read a request from a file, as JSON if the extension says so and YAML otherwise.
fn read_request(path: &Path) -> Result<CheckoutRequest, CliError> {
    let contents = fs::read_to_string(path)?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        Ok(serde_json::from_str(&contents)?)
    } else {
        Ok(serde_norway::from_str(&contents)?)
    }
}

fn load_catalog(path: Option<&Path>) -> Result<Catalog, CatalogError> {
    match path {
        Some(path) => Catalog::from_path(path),
        None => Catalog::supermarket(),
    }
}

/// Run a parsed command, writing its output to `out`.
///
/// # Errors
///
/// Returns a [`CliError`] if the catalog or request cannot be loaded, the checkout is rejected,
/// or output cannot be written.
pub fn run(cli: &Cli, out: &mut impl Write) -> Result<(), CliError> {
    let catalog = load_catalog(cli.catalog.as_deref())?;

    info!(
        store = catalog.store().name,
        items = catalog.len(),
        "catalog ready"
    );

    let service = CheckoutService::new(catalog, PricingEngine::standard());

    match &cli.command {
        Command::Catalog => write_catalog(service.catalog(), out),
        Command::Tiers => write_tiers(service.engine(), service.catalog(), out),
        Command::Price(args) => price(&service, args, out),
    }
}

fn price(
    service: &CheckoutService,
    args: &PriceArgs,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let request = args.checkout_request()?;

    let priced = match service.price(&request) {
        Ok(priced) => priced,
        Err(err) => {
            if args.json {
                serde_json::to_writer_pretty(&mut *out, &ErrorResponse::from(&err))?;
                writeln!(out)?;
            }

            return Err(err.into());
        }
    };

    if args.json {
        let response = CheckoutResponse::from(&priced.summary);

        serde_json::to_writer_pretty(&mut *out, &response)?;
        writeln!(out)?;

        return Ok(());
    }

    let status = service.engine().loyalty().classify(request.loyalty_points)?;

    write_tier_status(&status, out)?;

    service.receipt(&priced).write_to(&mut *out)?;

    let summary = &priced.summary;
    let currency = service.catalog().currency();

    if summary.total_discount() > Decimal::ZERO {
        writeln!(
            out,
            "\n💰 You saved {}!",
            to_money(summary.total_discount(), currency)?
        )?;
    }

    if let Some(tier) = summary.upgraded_to {
        writeln!(out, "🎉 Congratulations! You've reached {tier} tier!")?;
    }

    Ok(())
}

fn write_tier_status(status: &TierStatus, out: &mut impl Write) -> Result<(), CliError> {
    writeln!(
        out,
        "Current tier: {} ({} points)",
        status.tier().label(),
        format_points(status.points())
    )?;

    match status.next_tier() {
        Some(next) => writeln!(
            out,
            "{} points to {} ({}% of the way)\n",
            format_points(next.points_needed),
            next.tier.label(),
            percent_points(status.progress()).round()
        )?,
        None => writeln!(out, "Maximum tier reached\n")?,
    }

    Ok(())
}

fn write_catalog(catalog: &Catalog, out: &mut impl Write) -> Result<(), CliError> {
    let mut builder = Builder::default();

    builder.push_record(["Category", "Item", "Price"]);

    for (category, items) in catalog.categories() {
        for (idx, item) in items.iter().enumerate() {
            builder.push_record([
                (if idx == 0 { category } else { "" }).to_string(),
                item.name().to_string(),
                to_money(item.unit_price(), catalog.currency())?.to_string(),
            ]);
        }
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(2..3), Alignment::right());

    writeln!(out, "{}\n{table}", catalog.store().name)?;

    Ok(())
}

fn write_tiers(
    engine: &PricingEngine,
    catalog: &Catalog,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut tiers = Builder::default();

    tiers.push_record(["Tier", "Points", "Discount", "Points Multiplier"]);

    for benefit in engine.loyalty().benefits() {
        let range = match benefit.upper {
            Some(upper) => format!(
                "{}-{}",
                format_points(benefit.lower),
                format_points(upper)
            ),
            None => format!("{}+", format_points(benefit.lower)),
        };

        tiers.push_record([
            benefit.terms.tier.label(),
            range,
            format!("{}%", percent_points(benefit.terms.discount_rate)),
            format!("{:.1}x", benefit.terms.points_multiplier),
        ]);
    }

    let mut bulk = Builder::default();

    bulk.push_record(["Items", "Discount"]);

    for range in engine.bulk().bands() {
        let items = match range.upper {
            Some(upper) => format!("{}-{}", range.band.lower(), upper.saturating_sub(1)),
            None => format!("{}+", range.band.lower()),
        };

        bulk.push_record([items, format!("{}%", percent_points(*range.band.value()))]);
    }

    let mut tiers = tiers.build();
    let mut bulk = bulk.build();

    for table in [&mut tiers, &mut bulk] {
        table.with(Style::modern_rounded());
        table.modify(Rows::first(), Color::BOLD);
    }

    writeln!(out, "Loyalty Tier Benefits\n{tiers}\n")?;
    writeln!(out, "Bulk Purchase Discounts\n{bulk}\n")?;
    writeln!(
        out,
        "Earn {} points per {} spent, higher tiers earn bonus points.",
        engine.loyalty().points_per_unit(),
        to_money(Decimal::ONE, catalog.currency())?
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn run_to_string(args: &[&str]) -> Result<String, CliError> {
        let cli = Cli::try_parse_from(args.iter().copied())
            .map_err(|err| io::Error::other(err.to_string()))?;
        let mut out = Vec::new();

        run(&cli, &mut out)?;

        String::from_utf8(out).map_err(|err| CliError::Io(io::Error::other(err)))
    }

    #[test]
    fn parse_selection_splits_category_name_and_quantity() -> TestResult {
        let selection = parse_selection("Meat & Seafood/Prawns (250g)=3")?;

        assert_eq!(selection.category, "Meat & Seafood");
        assert_eq!(selection.name, "Prawns (250g)");
        assert_eq!(selection.quantity, 3);

        Ok(())
    }

    #[test]
    fn parse_selection_rejects_malformed_arguments() {
        assert!(parse_selection("Beverages=3").is_err());
        assert!(parse_selection("Beverages/Coffee (200g)").is_err());
        assert!(parse_selection("Beverages/Coffee (200g)=lots").is_err());
    }

    #[test]
    fn catalog_lists_every_item() -> TestResult {
        let text = run_to_string(&["checkout", "catalog"])?;

        assert!(text.contains("Siong Sheng Supermarket"));
        assert!(text.contains("Jasmine Rice (5kg)"));
        assert!(text.contains("18.90"));

        Ok(())
    }

    #[test]
    fn tiers_lists_benefits_and_bulk_bands() -> TestResult {
        let text = run_to_string(&["checkout", "tiers"])?;

        assert!(text.contains("1,000-2,999"));
        assert!(text.contains("8,000+"));
        assert!(text.contains("12%"));
        assert!(text.contains("10-14"));
        assert!(text.contains("20+"));

        Ok(())
    }

    #[test]
    fn price_prints_receipt_savings_and_upgrade() -> TestResult {
        let text = run_to_string(&[
            "checkout",
            "price",
            "--points",
            "999",
            "--item",
            "Fresh Produce/Carrots (500g)=1",
        ])?;

        assert!(text.contains("Current tier: 🥉 Bronze (999 points)"));
        assert!(text.contains("Carrots (500g)"));
        assert!(text.contains("You saved"));
        assert!(text.contains("Congratulations! You've reached Silver tier!"));

        Ok(())
    }

    #[test]
    fn price_json_prints_response() -> TestResult {
        let text = run_to_string(&[
            "checkout",
            "price",
            "--json",
            "--points",
            "3000",
            "--item",
            "Fresh Produce/Bananas (1kg)=10",
            "--item",
            "Fresh Produce/Carrots (500g)=10",
        ])?;

        let response: CheckoutResponse = serde_json::from_str(&text)?;

        assert_eq!(response.final_total, "39.85");
        assert_eq!(response.tier, "Gold");
        assert_eq!(response.points_earned, 135);

        Ok(())
    }

    #[test]
    fn price_reads_request_file() -> TestResult {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile()?;

        writeln!(
            file,
            "loyalty_points: 8000\ncart:\n  - category: Beverages\n    name: Coffee (200g)\n    quantity: 1"
        )?;

        let path = file.path().to_string_lossy().into_owned();
        let text = run_to_string(&["checkout", "price", "--json", "--request", &path])?;

        let response: CheckoutResponse = serde_json::from_str(&text)?;

        assert_eq!(response.tier, "Platinum");
        assert_eq!(response.tier_discount_rate, "12");

        Ok(())
    }

    #[test]
    fn price_rejects_unknown_items() -> TestResult {
        let result = run_to_string(&["checkout", "price", "--item", "Beverages/Champagne=1"]);

        assert!(matches!(
            result,
            Err(CliError::Checkout(CheckoutError::UnknownItem { .. }))
        ));

        Ok(())
    }
}
