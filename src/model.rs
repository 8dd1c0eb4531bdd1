use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_WINDOW_DAYS: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaleRecord {
    pub date: NaiveDate,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Vinted,
    #[serde(rename = "eBay")]
    Ebay,
    #[serde(rename = "Other/Retail")]
    Retail,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Vinted, Platform::Ebay, Platform::Retail];

    pub fn label(&self) -> &'static str {
        match self {
            Platform::Vinted => "Vinted",
            Platform::Ebay => "eBay",
            Platform::Retail => "Other/Retail",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vinted" => Ok(Platform::Vinted),
            "ebay" => Ok(Platform::Ebay),
            "retail" | "other" | "other/retail" => Ok(Platform::Retail),
            other => Err(format!("unknown platform '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    #[default]
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

/// One item on the want-to-buy list, as entered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub sku: String,
    #[serde(default = "manual")]
    pub brand: String,
    #[serde(default = "manual")]
    pub model: String,
    #[serde(default = "manual")]
    pub colorway: String,
    pub size: String,
    pub platform: Platform,
    #[serde(default)]
    pub priority: Priority,
    pub listed_price: f64,
    #[serde(default)]
    pub highest_bid: Option<f64>,
    #[serde(default = "default_window")]
    pub window_days: u32,
}

fn manual() -> String {
    "Manual".to_string()
}

fn default_window() -> u32 {
    DEFAULT_WINDOW_DAYS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingSummary {
    pub sales_count: usize,
    pub avg_sale_price: f64,
    pub avg_net_payout: f64,
    pub est_days_to_sell: f64,  // window / count
    pub target_roi: f64,        // fraction, e.g. 0.35
    pub recommended_price: f64,
    pub roi_pct: Option<f64>,   // None when the listed price is 0
    pub payout_on_highest_bid: Option<f64>,
    pub rec_on_highest_bid: Option<f64>,
}

/// A listing together with its computed figures. Stored and exported as one
/// flat record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    #[serde(flatten)]
    pub listing: Listing,
    #[serde(flatten)]
    pub summary: PricingSummary,
}

/// Snapshot handed over by an external market lookup for one SKU + size.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketQuote {
    pub title: String,
    pub colorway: String,
    #[serde(default)]
    pub highest_bid: Option<f64>,
    #[serde(default)]
    pub lowest_ask: Option<f64>,
    pub recent_sales: Vec<f64>,
}

/// One unit of batch work: a listing plus the sales text pasted for it.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(flatten)]
    pub listing: Listing,
    pub raw_sales: String,
}
