use std::cmp::Ordering;

use crate::models::{CostComposition, PricingLineItem, Quote, QuoteError, QuoteLine};

/// GST applied to the quote subtotal.
pub const DEFAULT_TAX_RATE: f64 = 0.18;

/// How many lines the ranked shortlist keeps.
pub const TOP_LINES_LIMIT: usize = 5;

/// Derives a full quote from a base-cost catalog and a target margin.
///
/// `sell_price = base / (1 - margin/100)` while `margin < 100`; at or above
/// 100 the markup degenerates and the sell price falls back to the base cost
/// so the quote never carries an infinity or NaN. Negative margins clamp to
/// zero. A negative base unit price is a caller bug and is rejected.
pub fn compute_quote(
    items: &[PricingLineItem],
    margin_percent: f64,
    tax_rate: f64,
) -> Result<Quote, QuoteError> {
    let margin = margin_percent.max(0.0);

    let mut lines = Vec::with_capacity(items.len());
    let mut subtotal = 0.0;
    let mut total_base_cost = 0.0;

    for item in items {
        if item.base_unit_price < 0.0 {
            return Err(QuoteError::NegativeUnitPrice {
                name: item.name.clone(),
                price: item.base_unit_price,
            });
        }

        let sell_price = if margin < 100.0 {
            item.base_unit_price / (1.0 - margin / 100.0)
        } else {
            item.base_unit_price
        };
        let quantity = f64::from(item.quantity);
        let line_total = sell_price * quantity;

        subtotal += line_total;
        total_base_cost += item.base_unit_price * quantity;

        lines.push(QuoteLine {
            name: item.name.clone(),
            base_unit_price: item.base_unit_price,
            quantity: item.quantity,
            sell_price,
            line_total,
        });
    }

    let tax = subtotal * tax_rate;
    let margin_value = subtotal - total_base_cost;

    let top_lines = rank_top_lines(&lines);

    Ok(Quote {
        subtotal,
        tax,
        grand_total: subtotal + tax,
        total_base_cost,
        margin_value,
        top_lines,
        composition: CostComposition {
            base_cost: total_base_cost,
            margin_value,
            tax,
        },
        lines,
    })
}

/// Highest-value lines first; the stable sort keeps ties in input order.
fn rank_top_lines(lines: &[QuoteLine]) -> Vec<QuoteLine> {
    let mut ranked = lines.to_vec();
    ranked.sort_by(|a, b| {
        b.line_total
            .partial_cmp(&a.line_total)
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(TOP_LINES_LIMIT);
    ranked
}
