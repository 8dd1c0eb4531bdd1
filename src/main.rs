mod config;
mod errors;
mod model;
mod parser;
mod pricing;
mod watchlist;

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;
use crate::model::{AnalyzeRequest, Entry, Listing, Platform, PricingSummary, Priority};
use crate::watchlist::Watchlist;

fn main() -> Result<()> {
    let config = Config::from_env()?;

    FmtSubscriber::builder()
        .with_max_level(match config.log_level.as_str() {
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        })
        .with_target(false)
        .compact()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        print_usage();
        return Ok(());
    };

    match command.as_str() {
        "analyze" => cmd_analyze(&args[1..], &config),
        "add" => cmd_add(&args[1..], &config),
        "batch" => cmd_batch(&args[1..], &config),
        "list" => cmd_list(&args[1..], &config),
        "totals" => cmd_totals(&config),
        "export" => cmd_export(&args[1..], &config),
        other => {
            print_usage();
            bail!("unknown command '{}'", other);
        }
    }
}

fn cmd_analyze(args: &[String], config: &Config) -> Result<()> {
    let flags = parse_flags(args)?;
    let (listing, summary) = analyze_from_flags(&flags, config)?;
    print_summary(&listing, &summary);
    Ok(())
}

fn cmd_add(args: &[String], config: &Config) -> Result<()> {
    let flags = parse_flags(args)?;
    let (listing, summary) = analyze_from_flags(&flags, config)?;

    let mut watchlist = Watchlist::load(&config.store_path)?;
    print_summary(&listing, &summary);

    let sku = listing.sku.clone();
    let size = listing.size.clone();
    let platform = listing.platform;
    watchlist.add(Entry { listing, summary });
    watchlist.save(&config.store_path)?;

    info!("Added {} {} to {}", sku, size, platform);
    Ok(())
}

fn cmd_batch(args: &[String], config: &Config) -> Result<()> {
    let path = args.first().ok_or_else(|| anyhow!("batch needs a requests file"))?;
    let raw = fs::read_to_string(path).with_context(|| format!("reading batch requests from {}", path))?;
    let requests: Vec<AnalyzeRequest> =
        serde_json::from_str(&raw).context("batch file must be a JSON array of requests")?;
    let now = Local::now().date_naive();

    let mut watchlist = Watchlist::load(&config.store_path)?;
    let mut added = 0usize;
    for (request, result) in requests.iter().zip(watchlist::analyze_batch(&requests, now)) {
        match result {
            Ok(entry) => {
                info!("Added {} {} to {}", entry.listing.sku, entry.listing.size, entry.listing.platform);
                watchlist.add(entry);
                added += 1;
            }
            Err(err) => error!("{} {}: {}", request.listing.sku, request.listing.size, err),
        }
    }
    watchlist.save(&config.store_path)?;

    info!("{} of {} batch entries added", added, requests.len());
    Ok(())
}

fn cmd_list(args: &[String], config: &Config) -> Result<()> {
    let watchlist = Watchlist::load(&config.store_path)?;
    let platforms: Vec<Platform> = match args.first() {
        Some(raw) => vec![raw.parse().map_err(|e: String| anyhow!(e))?],
        None => Platform::ALL.to_vec(),
    };
    for platform in platforms {
        print_table(platform, watchlist.entries(platform));
    }
    Ok(())
}

fn cmd_totals(config: &Config) -> Result<()> {
    let watchlist = Watchlist::load(&config.store_path)?;
    let totals = watchlist.totals();
    println!("Total items          {}", totals.items);
    println!("High priority cost   £{:.2}", totals.high_cost);
    println!("Medium priority cost £{:.2}", totals.medium_cost);
    println!("Low priority cost    £{:.2}", totals.low_cost);
    Ok(())
}

fn cmd_export(args: &[String], config: &Config) -> Result<()> {
    let out = args.first().map(String::as_str).unwrap_or("wtb_tracker.csv");
    let watchlist = Watchlist::load(&config.store_path)?;
    fs::write(out, watchlist.export_csv()).with_context(|| format!("writing {}", out))?;
    info!("Exported {} entries to {}", watchlist.total_items(), out);
    Ok(())
}

/// Build the listing from flags, pull sales from the chosen source, price it.
fn analyze_from_flags(flags: &Flags, config: &Config) -> Result<(Listing, PricingSummary)> {
    let mut listing = listing_from_flags(flags, config)?;
    let now = Local::now().date_naive();

    let summary = if let Some(path) = flags.get("quote") {
        let quote = watchlist::load_quote(Path::new(path))?;
        info!(
            "quote: {} ({}) bid {} ask {}",
            quote.title,
            quote.colorway,
            fmt_opt(quote.highest_bid, 2),
            fmt_opt(quote.lowest_ask, 2)
        );
        // Fetched details fill whatever the flags left open.
        if flags.get("colorway").is_none() {
            listing.colorway = quote.colorway.clone();
        }
        if listing.highest_bid.is_none() {
            listing.highest_bid = quote.highest_bid;
        }
        watchlist::analyze_quote(&listing, &quote)?
    } else if let Some(text) = read_sales_text(flags)? {
        watchlist::analyze_listing(&listing, &text, now)?
    } else {
        bail!("either --sales FILE|- or --quote FILE is required");
    };

    Ok((listing, summary))
}

fn listing_from_flags(flags: &Flags, config: &Config) -> Result<Listing> {
    let platform: Platform = flags.require("platform")?.parse().map_err(|e: String| anyhow!(e))?;
    let priority = match flags.get("priority") {
        Some(raw) => raw.parse().map_err(|e: String| anyhow!(e))?,
        None => Priority::High,
    };
    let listed_price = flags
        .parse_f64("listed")?
        .ok_or_else(|| anyhow!("--listed is required"))?;

    Ok(Listing {
        sku: flags.require("sku")?.to_string(),
        brand: flags.get("brand").unwrap_or("Manual").to_string(),
        model: flags.get("model").unwrap_or("Manual").to_string(),
        colorway: flags.get("colorway").unwrap_or("Manual").to_string(),
        size: flags.require("size")?.to_string(),
        platform,
        priority,
        listed_price,
        highest_bid: flags.parse_f64("bid")?,
        window_days: match flags.get("window") {
            Some(raw) => raw.parse().with_context(|| format!("invalid --window '{}'", raw))?,
            None => config.window_days,
        },
    })
}

fn read_sales_text(flags: &Flags) -> Result<Option<String>> {
    match flags.get("sales") {
        Some("-") => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("reading pasted sales from stdin")?;
            Ok(Some(text))
        }
        Some(path) => Ok(Some(
            fs::read_to_string(path).with_context(|| format!("reading sales text from {}", path))?,
        )),
        None => Ok(None),
    }
}

struct Flags {
    values: HashMap<String, String>,
}

fn parse_flags(args: &[String]) -> Result<Flags> {
    let mut values = HashMap::new();
    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        let name = flag
            .strip_prefix("--")
            .ok_or_else(|| anyhow!("expected a --flag, got '{}'", flag))?;
        let value = iter.next().ok_or_else(|| anyhow!("--{} needs a value", name))?;
        values.insert(name.to_string(), value.clone());
    }
    Ok(Flags { values })
}

impl Flags {
    fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    fn require(&self, name: &str) -> Result<&str> {
        self.get(name).ok_or_else(|| anyhow!("--{} is required", name))
    }

    fn parse_f64(&self, name: &str) -> Result<Option<f64>> {
        self.get(name)
            .map(|raw| {
                raw.parse::<f64>()
                    .with_context(|| format!("invalid --{} '{}'", name, raw))
            })
            .transpose()
    }
}

fn print_summary(listing: &Listing, summary: &PricingSummary) {
    println!("{} {} ({} on {})", listing.sku, listing.size, listing.priority, listing.platform);
    println!("  sales in window   {:>10}", summary.sales_count);
    println!("  avg sale          {:>10.2}", summary.avg_sale_price);
    println!("  avg payout        {:>10.2}", summary.avg_net_payout);
    println!("  est days to sell  {:>10.1}", summary.est_days_to_sell);
    println!("  target roi        {:>9.0}%", summary.target_roi * 100.0);
    println!("  recommended pay   {:>10.2}", summary.recommended_price);
    println!("  roi vs listed     {:>10}", fmt_opt(summary.roi_pct, 1));
    if let Some(payout) = summary.payout_on_highest_bid {
        println!("  payout on bid     {:>10.2}", payout);
        println!("  rec on bid (30%)  {:>10}", fmt_opt(summary.rec_on_highest_bid, 2));
    }
}

fn print_table(platform: Platform, entries: &[Entry]) {
    println!("{} ({} items)", platform, entries.len());
    if entries.is_empty() {
        println!("  (empty)");
        return;
    }
    println!(
        "  {:<14} {:<8} {:>5} {:>9} {:>10} {:>8} {:>9} {:>9}",
        "sku", "size", "sales", "avg sale", "avg payout", "roi %", "rec pay", "est days"
    );
    for entry in entries {
        println!(
            "  {:<14} {:<8} {:>5} {:>9.2} {:>10.2} {:>8} {:>9.2} {:>9.1}",
            entry.listing.sku,
            entry.listing.size,
            entry.summary.sales_count,
            entry.summary.avg_sale_price,
            entry.summary.avg_net_payout,
            fmt_opt(entry.summary.roi_pct, 1),
            entry.summary.recommended_price,
            entry.summary.est_days_to_sell,
        );
    }
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => "-".to_string(),
    }
}

fn print_usage() {
    println!("wtb_tracker - price want-to-buy bids from pasted sales history");
    println!();
    println!("Usage:");
    println!("  wtb_tracker analyze --sku SKU --size SIZE --platform PLATFORM --listed PRICE");
    println!("                      [--brand B] [--model M] [--colorway C]");
    println!("                      [--priority high|medium|low] [--bid PRICE] [--window DAYS]");
    println!("                      (--sales FILE|- | --quote FILE)");
    println!("  wtb_tracker add     same flags; also appends the entry to the store");
    println!("  wtb_tracker batch FILE        analyze a JSON array of requests in parallel");
    println!("  wtb_tracker list [PLATFORM]   print stored tables");
    println!("  wtb_tracker totals            item count and committed spend per priority");
    println!("  wtb_tracker export [FILE]     flatten every table to CSV");
}
