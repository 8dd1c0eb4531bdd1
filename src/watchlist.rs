use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::debug;

use crate::errors::{Result, TrackerError};
use crate::model::{AnalyzeRequest, Entry, Listing, MarketQuote, Platform, PricingSummary, Priority};
use crate::parser;
use crate::pricing;

/// Analyze pasted sales text for one listing: parse, then price.
pub fn analyze_listing(listing: &Listing, raw_sales: &str, now: NaiveDate) -> Result<PricingSummary> {
    let prices = parser::parse_sales(raw_sales, now, listing.window_days)?;
    Ok(pricing::compute_pricing(
        &prices,
        listing.listed_price,
        listing.highest_bid,
        listing.window_days,
    ))
}

/// Same engine fed from a market-lookup record instead of pasted text.
/// A bid on the listing itself wins over the quote's.
pub fn analyze_quote(listing: &Listing, quote: &MarketQuote) -> Result<PricingSummary> {
    if quote.recent_sales.is_empty() {
        return Err(TrackerError::NoRecentSales(listing.window_days));
    }
    Ok(pricing::compute_pricing(
        &quote.recent_sales,
        listing.listed_price,
        listing.highest_bid.or(quote.highest_bid),
        listing.window_days,
    ))
}

/// Read a quote record produced by an external lookup.
pub fn load_quote(path: &Path) -> Result<MarketQuote> {
    let raw = fs::read_to_string(path).map_err(|e| TrackerError::Lookup(e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| TrackerError::Lookup(e.to_string()))
}

/// Evaluate a batch of requests in parallel. Each evaluation touches only
/// its own arguments; result order matches request order.
pub fn analyze_batch(requests: &[AnalyzeRequest], now: NaiveDate) -> Vec<Result<Entry>> {
    requests
        .par_iter()
        .map(|request| {
            analyze_listing(&request.listing, &request.raw_sales, now).map(|summary| Entry {
                listing: request.listing.clone(),
                summary,
            })
        })
        .collect()
}

pub struct Totals {
    pub items: usize,
    pub high_cost: f64,
    pub medium_cost: f64,
    pub low_cost: f64,
}

/// Per-platform tables of analyzed entries. Entries keep their insertion
/// order within a platform.
#[derive(Debug, Default)]
pub struct Watchlist {
    tables: HashMap<Platform, Vec<Entry>>,
}

impl Watchlist {
    pub fn add(&mut self, entry: Entry) {
        self.tables.entry(entry.listing.platform).or_default().push(entry);
    }

    pub fn entries(&self, platform: Platform) -> &[Entry] {
        self.tables.get(&platform).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn total_items(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    /// Dashboard figures: item count plus committed spend per priority band,
    /// summing recommended prices.
    pub fn totals(&self) -> Totals {
        let mut totals = Totals { items: 0, high_cost: 0.0, medium_cost: 0.0, low_cost: 0.0 };
        for entry in self.tables.values().flatten() {
            totals.items += 1;
            match entry.listing.priority {
                Priority::High => totals.high_cost += entry.summary.recommended_price,
                Priority::Medium => totals.medium_cost += entry.summary.recommended_price,
                Priority::Low => totals.low_cost += entry.summary.recommended_price,
            }
        }
        totals
    }

    /// Load the platform map from disk; a missing store file is an empty one.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("store {} not found, starting empty", path.display());
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        Ok(Self { tables: serde_json::from_str(&raw)? })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(&self.tables)?)?;
        Ok(())
    }

    /// Flatten every platform table into CSV text, fields in entry-form
    /// order. Figures that were never computed export as empty cells.
    pub fn export_csv(&self) -> String {
        let mut out = String::from(CSV_HEADER);
        out.push('\n');
        for platform in Platform::ALL {
            for entry in self.entries(platform) {
                out.push_str(&csv_row(entry));
                out.push('\n');
            }
        }
        out
    }
}

const CSV_HEADER: &str = "sku,brand,model,colorway,size,listed_price,platform,priority,\
sales_count,avg_sale_price,avg_net_payout,roi_pct,highest_bid,payout_on_highest_bid,\
recommended_price,target_roi,rec_on_highest_bid,est_days_to_sell";

fn csv_row(entry: &Entry) -> String {
    let listing = &entry.listing;
    let summary = &entry.summary;
    [
        csv_field(&listing.sku),
        csv_field(&listing.brand),
        csv_field(&listing.model),
        csv_field(&listing.colorway),
        csv_field(&listing.size),
        format!("{:.2}", listing.listed_price),
        listing.platform.label().to_string(),
        listing.priority.label().to_string(),
        summary.sales_count.to_string(),
        format!("{:.2}", summary.avg_sale_price),
        format!("{:.2}", summary.avg_net_payout),
        opt_cell(summary.roi_pct, 1),
        opt_cell(listing.highest_bid, 2),
        opt_cell(summary.payout_on_highest_bid, 2),
        format!("{:.2}", summary.recommended_price),
        format!("{:.2}", summary.target_roi),
        opt_cell(summary.rec_on_highest_bid, 2),
        format!("{:.1}", summary.est_days_to_sell),
    ]
    .join(",")
}

fn opt_cell(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => String::new(),
    }
}

// Quote only when the text would break the row.
fn csv_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}
