//! Pure price arithmetic shared by cart views and order creation.
//!
//! Cart totals use the product's live price; order totals use the price
//! being frozen into the order. Both go through the same functions so the
//! two sides can never disagree on rounding.

use verdant_core::Price;

/// Per-line subtotals and the grand total for a set of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Totals {
    /// One subtotal per input line, in input order.
    pub line_subtotals: Vec<Price>,
    /// Sum of the line subtotals, rounded half-up to the minor unit.
    pub grand_total: Price,
}

/// Subtotal for a single line. No rounding beyond the two-decimal unit
/// price: an integer quantity times a two-decimal amount is already exact.
#[must_use]
pub fn line_subtotal(unit_price: Price, quantity: i32) -> Price {
    unit_price.times(quantity)
}

/// Compute per-line subtotals and the grand total for `(unit_price,
/// quantity)` pairs.
#[must_use]
pub fn compute_totals(items: &[(Price, i32)]) -> Totals {
    let line_subtotals: Vec<Price> = items
        .iter()
        .map(|&(unit_price, quantity)| line_subtotal(unit_price, quantity))
        .collect();
    let grand_total = Price::new(line_subtotals.iter().copied().sum::<Price>().amount());
    Totals {
        line_subtotals,
        grand_total,
    }
}
