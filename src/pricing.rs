use statrs::statistics::Statistics;

use crate::model::PricingSummary;

// StockX-style seller fees: 3% payment processing and £4.00 shipping always
// come off; below £57 a flat £4.50 fee stands in for the 8% commission.
const LOW_PRICE_CUTOFF: f64 = 57.0;
const LOW_PRICE_FLAT_FEE: f64 = 4.50;
const COMMISSION_RATE: f64 = 0.08;
const PAYMENT_RATE: f64 = 0.03;
const SHIPPING_COST: f64 = 4.00;

// The recommendation against the live highest bid targets a flat 30%.
const BID_TARGET_MARGIN: f64 = 1.30;

/// Seller payout after fees for a single sale, rounded to pence.
pub fn net_payout(price: f64) -> f64 {
    let fees = if price < LOW_PRICE_CUTOFF {
        LOW_PRICE_FLAT_FEE + price * PAYMENT_RATE
    } else {
        price * COMMISSION_RATE + price * PAYMENT_RATE
    };
    round2(price - fees - SHIPPING_COST)
}

/// Required ROI fraction, tiered by how fast the item should move.
/// Days in [5, 6) fall between the bands and resolve to 40%.
pub fn target_roi(est_days: f64) -> f64 {
    if est_days < 5.0 {
        0.30
    } else if (6.0..=25.0).contains(&est_days) {
        0.35
    } else {
        0.40
    }
}

/// Price one listing from its in-window sale prices. `prices` is never
/// empty; the parser refuses to hand over an empty window.
pub fn compute_pricing(
    prices: &[f64],
    listed_price: f64,
    highest_bid: Option<f64>,
    window_days: u32,
) -> PricingSummary {
    let sales_count = prices.len();
    let avg_sale = prices.iter().mean();
    let avg_net = prices.iter().map(|&p| net_payout(p)).mean();

    let est_days = f64::from(window_days) / sales_count as f64;
    let roi = target_roi(est_days);

    // A payout that fees have eaten through is worth nothing to us.
    let recommended = if avg_net > 0.0 {
        round2(avg_net / (1.0 + roi))
    } else {
        0.0
    };

    // Listed price of zero means not listed yet; ROI against it stays open.
    let roi_pct = if listed_price > 0.0 {
        Some(round1((avg_net - listed_price) / listed_price * 100.0))
    } else {
        None
    };

    let payout_on_bid = highest_bid.filter(|&bid| bid > 0.0).map(net_payout);
    let rec_on_bid = payout_on_bid
        .filter(|&payout| payout > 0.0)
        .map(|payout| round2(payout / BID_TARGET_MARGIN));

    PricingSummary {
        sales_count,
        avg_sale_price: round2(avg_sale),
        avg_net_payout: round2(avg_net),
        est_days_to_sell: round1(est_days),
        target_roi: roi,
        recommended_price: recommended,
        roi_pct,
        payout_on_highest_bid: payout_on_bid,
        rec_on_highest_bid: rec_on_bid,
    }
}

// Scaled ties round to even.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}
