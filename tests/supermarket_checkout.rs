//! Integration test for a full checkout against the built-in supermarket catalog.
//!
//! A Silver customer (1,500 points) buys 13 units across four categories:
//!
//! - Apples (1kg) x2: 9.60
//! - Salmon Fillet (200g) x3: 47.40
//! - Fresh Milk (1L) x4: 15.20
//! - Green Tea (500ml) x3: 8.40
//! - Onions (1kg) x1: 3.50
//!
//! Subtotal 84.10. Silver takes 5% (4.205) and 13 units take another 5% (4.205), both off the
//! original subtotal, leaving 75.69. GST at 8% is 6.0552, so the total is 81.7452, shown as
//! 81.75. Points: floor(84.10 x 2) = 168 base, x1.2 = 201.6, so 201 points and a balance of
//! 1,701, still short of Gold.

use std::io::Write;

use rust_decimal::Decimal;
use testresult::TestResult;

use checkout::prelude::*;

fn select(category: &str, name: &str, quantity: i64) -> Selection {
    Selection {
        category: category.to_string(),
        name: name.to_string(),
        quantity,
    }
}

fn silver_request() -> CheckoutRequest {
    CheckoutRequest {
        cart: vec![
            select("Fresh Produce", "Apples (1kg)", 2),
            select("Meat & Seafood", "Salmon Fillet (200g)", 3),
            select("Dairy & Eggs", "Fresh Milk (1L)", 4),
            select("Beverages", "Green Tea (500ml)", 3),
            select("Fresh Produce", "Onions (1kg)", 1),
        ],
        loyalty_points: 1_500,
    }
}

fn supermarket() -> Result<CheckoutService, CatalogError> {
    Ok(CheckoutService::new(
        Catalog::supermarket()?,
        PricingEngine::standard(),
    ))
}

#[test]
fn silver_customer_checkout_keeps_full_precision() -> TestResult {
    let service = supermarket()?;

    let priced = service.price(&silver_request())?;
    let summary = &priced.summary;

    assert_eq!(summary.subtotal, Decimal::new(8410, 2));
    assert_eq!(summary.total_item_count, 13);
    assert_eq!(summary.tier, LoyaltyTier::Silver);
    assert_eq!(summary.tier_discount_amount, Decimal::new(4205, 3));
    assert_eq!(summary.bulk_discount_amount, Decimal::new(4205, 3));
    assert_eq!(summary.discounted_subtotal, Decimal::new(7569, 2));
    assert_eq!(summary.tax_amount, Decimal::new(60552, 4));
    assert_eq!(summary.final_total, Decimal::new(817_452, 4));
    assert_eq!(summary.points_earned, 201);
    assert_eq!(summary.new_points_balance, 1_701);
    assert!(!summary.tier_upgrade_occurred);

    Ok(())
}

#[test]
fn silver_customer_response_is_rounded_at_the_boundary() -> TestResult {
    let response = supermarket()?.checkout(&silver_request())?;

    assert_eq!(response.subtotal, "84.10");
    assert_eq!(response.tier_discount_amount, "4.21");
    assert_eq!(response.bulk_discount_amount, "4.21");
    assert_eq!(response.discounted_subtotal, "75.69");
    assert_eq!(response.tax_amount, "6.06");
    assert_eq!(response.final_total, "81.75");
    assert_eq!(response.total_discount, "8.41");

    Ok(())
}

#[test]
fn silver_customer_receipt_groups_consecutive_categories() -> TestResult {
    let service = supermarket()?;
    let priced = service.price(&silver_request())?;

    let receipt = service.receipt(&priced);

    let sections: Vec<(&str, usize)> = receipt
        .sections()
        .iter()
        .map(|section| (section.category.as_str(), section.lines.len()))
        .collect();

    assert_eq!(
        sections,
        vec![
            ("Fresh Produce", 1),
            ("Meat & Seafood", 1),
            ("Dairy & Eggs", 1),
            ("Beverages", 1),
            ("Fresh Produce", 1),
        ]
    );

    let mut out = Vec::new();
    receipt.write_to(&mut out)?;
    let text = String::from_utf8(out)?;

    assert!(text.contains("Customer Tier: Silver"));
    assert!(text.contains("Existing Points: 1,500"));
    assert!(text.contains("Silver Discount (5%):"));
    assert!(text.contains("Bulk Discount (5%):"));
    assert!(text.contains("GST (8%):"));
    assert!(text.contains("81.75"));
    assert!(text.contains("+201"));
    assert!(text.contains("1,701"));

    Ok(())
}

#[test]
fn platinum_customer_has_no_next_tier() -> TestResult {
    // 20 × 18.90 = 378.00; 12% + 10% off leaves 294.84; GST 23.5872; total 318.4272.
    let request = CheckoutRequest {
        cart: vec![select("Pantry Essentials", "Jasmine Rice (5kg)", 20)],
        loyalty_points: 9_000,
    };

    let response = supermarket()?.checkout(&request)?;

    assert_eq!(response.tier, "Platinum");
    assert_eq!(response.discounted_subtotal, "294.84");
    assert_eq!(response.tax_amount, "23.59");
    assert_eq!(response.final_total, "318.43");
    assert_eq!(response.points_earned, 1_512);
    assert_eq!(response.new_points_balance, 10_512);
    assert!(!response.tier_upgrade_occurred);
    assert_eq!(response.upgraded_to, None);

    Ok(())
}

#[test]
fn repricing_the_same_request_is_idempotent() -> TestResult {
    let service = supermarket()?;

    let first = service.checkout(&silver_request())?;
    let second = service.checkout(&silver_request())?;

    assert_eq!(first, second);

    Ok(())
}

#[test]
fn duplicate_selections_are_rejected_by_the_engine() -> TestResult {
    let request = CheckoutRequest {
        cart: vec![
            select("Beverages", "Green Tea (500ml)", 1),
            select("Beverages", "Green Tea (500ml)", 2),
        ],
        loyalty_points: 0,
    };

    let err = supermarket()?
        .checkout(&request)
        .err()
        .ok_or("duplicate lines should be rejected")?;

    assert!(matches!(
        err,
        CheckoutError::Pricing(PricingError::InvalidInput(
            InvalidInput::DuplicateLineItem { .. }
        ))
    ));
    assert_eq!(err.status_code(), 400);

    Ok(())
}

#[test]
fn catalog_loaded_from_disk_drives_the_service() -> TestResult {
    let mut file = tempfile::NamedTempFile::new()?;

    write!(
        file,
        "store:
  name: Corner Shop
  tagline: Open late
  tax_label: VAT
categories:
  - name: Snacks
    items:
      - name: Crisps
        price: 1.25 GBP
"
    )?;

    let catalog = Catalog::from_path(file.path())?;
    let service = CheckoutService::new(catalog, PricingEngine::standard());

    let priced = service.price(&CheckoutRequest {
        cart: vec![select("Snacks", "Crisps", 4)],
        loyalty_points: 0,
    })?;

    let mut out = Vec::new();
    service.receipt(&priced).write_to(&mut out)?;
    let text = String::from_utf8(out)?;

    assert!(text.contains("CORNER SHOP"));
    assert!(text.contains("VAT (8%):"));
    assert_eq!(priced.summary.subtotal, Decimal::new(500, 2));

    Ok(())
}

#[test]
fn service_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<CheckoutService>();
    assert_send_sync::<PricingEngine>();
    assert_send_sync::<Catalog>();
    assert_send_sync::<ReceiptFormatter>();
}
