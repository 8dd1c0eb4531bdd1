use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;
use tracing::debug;

use crate::errors::{Result, TrackerError};
use crate::model::SaleRecord;

// Dates like 01/15/24, anywhere in the line. Longer tokens such as
// 01/15/2024 match on their first eight characters.
const DATE_PATTERN: &str = r"(\d{2}/\d{2}/\d{2})";

// A currency symbol, optional whitespace, then digits with optional comma
// separators. Decimal tails are not captured.
const AMOUNT_PATTERN: &str = r"[£$€]\s*(\d[\d,]*)";

enum ScanState {
    SeekingDate,
    SeekingAmount { date: NaiveDate },
}

/// Scan pasted sales text into (date, price) pairs, in order of appearance.
/// A pair is one date line followed by the next amount line; anything in
/// between is ignored. No window filtering happens here.
pub fn scan_sales(raw_text: &str, now: NaiveDate) -> Vec<SaleRecord> {
    let date_re = Regex::new(DATE_PATTERN).unwrap();
    let amount_re = Regex::new(AMOUNT_PATTERN).unwrap();

    let mut records = Vec::new();
    let mut state = ScanState::SeekingDate;

    for line in raw_text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        state = match state {
            ScanState::SeekingDate => match find_date(&date_re, line, now) {
                Some(date) => ScanState::SeekingAmount { date },
                None => ScanState::SeekingDate,
            },
            ScanState::SeekingAmount { date } => match find_amount(&amount_re, line) {
                Some(price) => {
                    records.push(SaleRecord { date, price });
                    ScanState::SeekingDate
                }
                None => ScanState::SeekingAmount { date },
            },
        };
    }

    if let ScanState::SeekingAmount { date } = state {
        debug!("sale dated {} had no amount before end of input, dropped", date);
    }

    records
}

/// Prices of sales on or after `now - window_days`, oldest-seen first.
/// An empty result is a validation failure, not an empty success.
pub fn parse_sales(raw_text: &str, now: NaiveDate, window_days: u32) -> Result<Vec<f64>> {
    // Windows reaching past the calendar include everything.
    let cutoff = now
        .checked_sub_days(Days::new(u64::from(window_days)))
        .unwrap_or(NaiveDate::MIN);

    let prices: Vec<f64> = scan_sales(raw_text, now)
        .into_iter()
        .filter(|sale| sale.date >= cutoff)
        .map(|sale| sale.price)
        .collect();

    if prices.is_empty() {
        return Err(TrackerError::NoRecentSales(window_days));
    }

    Ok(prices)
}

fn find_date(re: &Regex, line: &str, now: NaiveDate) -> Option<NaiveDate> {
    let caps = re.captures(line)?;
    let date = NaiveDate::parse_from_str(&caps[1], "%m/%d/%y").ok()?;
    if date > now {
        // Two-digit-year pivot artifact: a sale cannot postdate the scan,
        // so the date belongs a century back.
        date.with_year(date.year() - 100)
    } else {
        Some(date)
    }
}

fn find_amount(re: &Regex, line: &str) -> Option<f64> {
    let caps = re.captures(line)?;
    caps[1].replace(',', "").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_then_amount_makes_one_sale() {
        let prices = parse_sales("01/15/24\nSold for £120", day(2024, 3, 1), 120).unwrap();
        assert_eq!(prices, vec![120.0]);
    }

    #[test]
    fn amount_may_trail_by_several_lines() {
        let text = "Jordan 4 Bred\n01/15/24\nUK 9\ncondition: new\n£1,250 sold";
        let prices = parse_sales(text, day(2024, 3, 1), 120).unwrap();
        assert_eq!(prices, vec![1250.0]);
    }

    #[test]
    fn order_and_duplicates_survive() {
        let text = "01/15/24\n£120\n01/20/24\n£95\n02/01/24\n£120";
        let prices = parse_sales(text, day(2024, 3, 1), 120).unwrap();
        assert_eq!(prices, vec![120.0, 95.0, 120.0]);
    }

    #[test]
    fn old_sales_are_scanned_but_excluded() {
        // 2023-10-23 is 130 days before 2024-03-01.
        let text = "10/23/23\n£90\n02/10/24\n£100";
        let now = day(2024, 3, 1);

        let records = scan_sales(text, now);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, day(2023, 10, 23));

        let prices = parse_sales(text, now, 120).unwrap();
        assert_eq!(prices, vec![100.0]);
    }

    #[test]
    fn window_lower_edge_is_inclusive() {
        // 2023-11-02 is exactly 120 days before 2024-03-01.
        let prices = parse_sales("11/02/23\n£75", day(2024, 3, 1), 120).unwrap();
        assert_eq!(prices, vec![75.0]);
    }

    #[test]
    fn oversized_window_includes_everything() {
        let prices = parse_sales("01/15/24\n£120", day(2024, 3, 1), u32::MAX).unwrap();
        assert_eq!(prices, vec![120.0]);
    }

    #[test]
    fn future_dates_are_pushed_back_a_century() {
        let now = day(2024, 3, 1);
        let records = scan_sales("06/01/24\n£200", now);
        assert_eq!(records[0].date, day(1924, 6, 1));
        // A century back sits far outside any sane window.
        assert!(parse_sales("06/01/24\n£200", now, 120).is_err());
    }

    #[test]
    fn no_pairs_is_a_validation_failure() {
        let err = parse_sales("nothing like a sale here", day(2024, 3, 1), 120).unwrap_err();
        assert!(matches!(err, TrackerError::NoRecentSales(120)));
    }

    #[test]
    fn unparseable_dates_are_skipped() {
        // 13/45/24 matches the shape but is no calendar date.
        let prices = parse_sales("13/45/24\n01/15/24\n£60", day(2024, 3, 1), 120).unwrap();
        assert_eq!(prices, vec![60.0]);
    }

    #[test]
    fn trailing_date_without_amount_is_dropped() {
        let text = "01/15/24\n£80\n02/20/24\nno price after this";
        let prices = parse_sales(text, day(2024, 3, 1), 120).unwrap();
        assert_eq!(prices, vec![80.0]);
    }

    #[test]
    fn second_date_before_an_amount_is_ignored() {
        let text = "01/15/24\n02/20/24\n£99";
        let records = scan_sales(text, day(2024, 3, 1));
        assert_eq!(
            records,
            vec![SaleRecord { date: day(2024, 1, 15), price: 99.0 }]
        );
    }

    #[test]
    fn amount_line_with_its_own_date_is_consumed() {
        // The 02/20 date sits on the amount line; scanning resumes after
        // that line, so no second pair can start there.
        let text = "01/15/24\n02/20/24 £99\n£50";
        let records = scan_sales(text, day(2024, 3, 1));
        assert_eq!(
            records,
            vec![SaleRecord { date: day(2024, 1, 15), price: 99.0 }]
        );
    }

    #[test]
    fn dollar_and_euro_amounts_parse_too() {
        let text = "01/15/24\n$ 1,100\n01/20/24\n€85";
        let prices = parse_sales(text, day(2024, 3, 1), 120).unwrap();
        assert_eq!(prices, vec![1100.0, 85.0]);
    }

    #[test]
    fn decimal_tails_are_not_captured() {
        let prices = parse_sales("01/15/24\n£120.50", day(2024, 3, 1), 120).unwrap();
        assert_eq!(prices, vec![120.0]);
    }

    #[test]
    fn four_digit_years_match_on_their_first_two_digits() {
        let records = scan_sales("01/15/2024\n£70", day(2024, 3, 1));
        assert_eq!(records[0].date, day(2020, 1, 15));
    }
}
