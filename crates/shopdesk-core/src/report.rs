//! # Reporting Aggregator
//!
//! Pure computations over a fetched list of sales.
//!
//! ## Report Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SalesReport (window = 7 days, today = Mar 10)                          │
//! │                                                                         │
//! │  buckets (ascending, empty days included)                              │
//! │    Mar 04 │ $0.00  │ 0                                                  │
//! │    Mar 05 │ $12.50 │ 2                                                  │
//! │    ...                                                                  │
//! │    Mar 10 │ $40.00 │ 3                                                  │
//! │                                                                         │
//! │  summary (ALL sales, not just the window)                              │
//! │    total, count, average                                               │
//! │                                                                         │
//! │  recent (ALL sales, newest first, max 10)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Days are local calendar days for the store's UTC offset. Sales outside
//! the window are dropped from the buckets only.

use std::collections::BTreeMap;

use chrono::{DateTime, Days, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::Sale;
use crate::RECENT_SALES_LIMIT;

// =============================================================================
// Window
// =============================================================================

/// Supported chart windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportWindow {
    #[default]
    Week,
    Month,
    Quarter,
}

impl ReportWindow {
    pub const fn days(&self) -> u64 {
        match self {
            ReportWindow::Week => 7,
            ReportWindow::Month => 30,
            ReportWindow::Quarter => 90,
        }
    }

    /// Parses the `days` query value (`7`, `30` or `90`).
    pub fn from_days(days: u32) -> Result<Self, ValidationError> {
        match days {
            7 => Ok(ReportWindow::Week),
            30 => Ok(ReportWindow::Month),
            90 => Ok(ReportWindow::Quarter),
            _ => Err(ValidationError::NotAllowed {
                field: "days".to_string(),
                allowed: vec!["7".to_string(), "30".to_string(), "90".to_string()],
            }),
        }
    }
}

// =============================================================================
// Output Types
// =============================================================================

/// Sales for one local calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DailyBucket {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub sales_total_cents: i64,
    pub count: u32,
}

/// Unwindowed totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub total_cents: i64,
    pub count: u32,
    /// Total / count, rounded half to even. Zero with no sales.
    pub average_cents: i64,
}

/// Everything the admin reports tab renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub window_days: u32,
    pub buckets: Vec<DailyBucket>,
    pub summary: SalesSummary,
    pub recent: Vec<Sale>,
}

/// The salesperson "today" panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub count: u32,
    pub total_cents: i64,
    pub items_sold: i64,
    pub sales: Vec<Sale>,
}

/// Admin dashboard counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_items: i64,
    pub low_stock_items: i64,
    pub salespersons: i64,
    pub categories: i64,
}

// =============================================================================
// Aggregation
// =============================================================================

/// Local calendar date of a timestamp.
pub fn local_date(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}

/// UTC instant of local midnight on the day containing `now`.
pub fn local_midnight_utc(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let today = local_date(now, offset);
    let midnight = today.and_time(chrono::NaiveTime::MIN);
    // A fixed offset has no gaps, so the mapping is always single
    offset
        .from_local_datetime(&midnight)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now)
}

/// One bucket per day from `today - (days - 1)` through `today`.
pub fn daily_buckets(
    sales: &[Sale],
    window: ReportWindow,
    today: NaiveDate,
    offset: FixedOffset,
) -> Vec<DailyBucket> {
    let mut buckets: BTreeMap<NaiveDate, DailyBucket> = BTreeMap::new();

    for back in (0..window.days()).rev() {
        if let Some(date) = today.checked_sub_days(Days::new(back)) {
            buckets.insert(
                date,
                DailyBucket {
                    date,
                    sales_total_cents: 0,
                    count: 0,
                },
            );
        }
    }

    for sale in sales {
        let date = local_date(sale.created_at, offset);
        if let Some(bucket) = buckets.get_mut(&date) {
            bucket.sales_total_cents = bucket.sales_total_cents.saturating_add(sale.total_cents);
            bucket.count += 1;
        }
    }

    buckets.into_values().collect()
}

/// Total, count and average over every sale given.
pub fn summarize(sales: &[Sale]) -> SalesSummary {
    let total: Money = sales.iter().map(Sale::total).sum();
    let count = sales.len() as u32;

    SalesSummary {
        total_cents: total.cents(),
        count,
        average_cents: total.divide_half_even(count as i64).cents(),
    }
}

/// The `limit` newest sales, newest first.
pub fn recent(sales: &[Sale], limit: usize) -> Vec<Sale> {
    let mut sorted: Vec<Sale> = sales.to_vec();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted.truncate(limit);
    sorted
}

/// Builds the full admin report.
pub fn build_report(
    sales: &[Sale],
    window: ReportWindow,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> SalesReport {
    let today = local_date(now, offset);

    SalesReport {
        window_days: window.days() as u32,
        buckets: daily_buckets(sales, window, today, offset),
        summary: summarize(sales),
        recent: recent(sales, RECENT_SALES_LIMIT),
    }
}

/// Today's sales for one salesperson, newest first.
pub fn daily_summary(
    sales: &[Sale],
    salesperson_id: &str,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> DailySummary {
    let today = local_date(now, offset);

    let mut todays: Vec<Sale> = sales
        .iter()
        .filter(|s| s.salesperson_id == salesperson_id)
        .filter(|s| local_date(s.created_at, offset) == today)
        .cloned()
        .collect();
    todays.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let total: Money = todays.iter().map(Sale::total).sum();

    DailySummary {
        date: today,
        count: todays.len() as u32,
        total_cents: total.cents(),
        items_sold: todays.iter().map(Sale::items_sold).sum(),
        sales: todays,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PaymentMethod, SaleLine};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn sale(id: &str, at: &str, total_cents: i64, seller: &str) -> Sale {
        Sale {
            id: id.to_string(),
            admin_id: "admin-1".to_string(),
            salesperson_id: seller.to_string(),
            salesperson_name: "Sam".to_string(),
            payment_method: PaymentMethod::Cash,
            total_cents,
            lines: vec![SaleLine {
                item_id: "i".to_string(),
                name: "Item".to_string(),
                unit_price_cents: total_cents,
                quantity: 1,
                line_total_cents: total_cents,
            }],
            created_at: at.parse().unwrap(),
        }
    }

    #[test]
    fn test_window_from_days() {
        assert_eq!(ReportWindow::from_days(7).unwrap(), ReportWindow::Week);
        assert_eq!(ReportWindow::from_days(90).unwrap().days(), 90);
        assert!(ReportWindow::from_days(14).is_err());
    }

    #[test]
    fn test_week_with_three_active_days() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let sales = vec![
            sale("a", "2026-03-10T09:00:00Z", 1000, "sp"),
            sale("b", "2026-03-10T15:00:00Z", 500, "sp"),
            sale("c", "2026-03-07T12:00:00Z", 250, "sp"),
            sale("d", "2026-03-04T08:00:00Z", 300, "sp"),
            // Outside the window
            sale("e", "2026-03-01T08:00:00Z", 9999, "sp"),
        ];

        let buckets = daily_buckets(&sales, ReportWindow::Week, today, utc());

        assert_eq!(buckets.len(), 7);
        assert_eq!(buckets[0].date, NaiveDate::from_ymd_opt(2026, 3, 4).unwrap());
        assert_eq!(buckets[6].date, today);
        assert_eq!(buckets.iter().filter(|b| b.count == 0).count(), 4);
        assert!(buckets
            .iter()
            .filter(|b| b.count == 0)
            .all(|b| b.sales_total_cents == 0));
        assert_eq!(buckets[6].count, 2);
        assert_eq!(buckets[6].sales_total_cents, 1500);
    }

    #[test]
    fn test_local_offset_moves_day() {
        // 23:30 UTC on the 9th is the 10th in UTC+05:00
        let sales = vec![sale("a", "2026-03-09T23:30:00Z", 100, "sp")];
        let plus_five = FixedOffset::east_opt(5 * 3600).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();

        let buckets = daily_buckets(&sales, ReportWindow::Week, today, plus_five);
        assert_eq!(buckets[6].count, 1);
    }

    #[test]
    fn test_summary_includes_all_sales() {
        let sales = vec![
            sale("a", "2026-03-10T09:00:00Z", 1000, "sp"),
            sale("b", "2025-01-01T09:00:00Z", 501, "sp"),
        ];
        let summary = summarize(&sales);
        assert_eq!(summary.total_cents, 1501);
        assert_eq!(summary.count, 2);
        // 750.5 → 750 (even)
        assert_eq!(summary.average_cents, 750);

        let empty = summarize(&[]);
        assert_eq!(empty.average_cents, 0);
    }

    #[test]
    fn test_recent_is_newest_first_and_limited() {
        let sales: Vec<Sale> = (0..15)
            .map(|i| sale(&i.to_string(), &format!("2026-03-{:02}T10:00:00Z", i + 1), 100, "sp"))
            .collect();

        let recent = recent(&sales, RECENT_SALES_LIMIT);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].id, "14");
        assert_eq!(recent[9].id, "5");
    }

    #[test]
    fn test_daily_summary() {
        let now: DateTime<Utc> = "2026-03-10T18:00:00Z".parse().unwrap();
        let mut two_units = sale("b", "2026-03-10T11:00:00Z", 400, "sp-1");
        two_units.lines[0].quantity = 2;
        two_units.lines[0].unit_price_cents = 200;

        let sales = vec![
            sale("a", "2026-03-10T09:00:00Z", 1000, "sp-1"),
            two_units,
            sale("c", "2026-03-09T09:00:00Z", 700, "sp-1"),
            sale("d", "2026-03-10T09:00:00Z", 900, "sp-2"),
        ];

        let summary = daily_summary(&sales, "sp-1", now, utc());
        assert_eq!(summary.count, 2);
        assert_eq!(summary.total_cents, 1400);
        assert_eq!(summary.items_sold, 3);
        assert_eq!(summary.sales[0].id, "b");
    }

    #[test]
    fn test_local_midnight() {
        let now: DateTime<Utc> = "2026-03-10T02:00:00Z".parse().unwrap();
        let plus_five = FixedOffset::east_opt(5 * 3600).unwrap();
        let midnight = local_midnight_utc(now, plus_five);
        // Local 07:00 on the 10th → midnight local is 19:00 UTC on the 9th
        assert_eq!(midnight, "2026-03-09T19:00:00Z".parse::<DateTime<Utc>>().unwrap());
    }
}
