//! Derived stock aggregation.
//!
//! A point-in-time snapshot computed by reducing the godown collections,
//! which share no keys: totals are plain sums of bird counts, and the
//! remaining metrics derive from those. Everything here is pure and
//! recomputed per request; a full rescan is cheap at the volumes involved.

use crate::godown::records::{GodownSale, InwardEntry, MortalityRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

/// Stock held against one inward invoice.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct InvoiceStock {
    pub invoice: String,
    pub birds: i64,
}

/// The inventory overview served to dashboards.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StockOverview {
    pub total_inward: i64,
    pub total_sold: i64,
    pub total_mortality: i64,
    pub available: i64,
    pub capacity: i64,
    /// Percent of capacity in use, clamped to [0, 100].
    pub capacity_utilization: i64,
    /// Mean whole-day age of the flock; None when no entry carries a date.
    pub average_age_days: Option<i64>,
    pub invoice_stock: Vec<InvoiceStock>,
}

/// Birds on hand: inward minus sold minus died, floored at zero.
pub fn available_birds(total_inward: i64, total_sold: i64, total_mortality: i64) -> i64 {
    (total_inward - total_sold - total_mortality).max(0)
}

/// Percent of capacity in use, rounded and clamped to [0, 100].
pub fn capacity_utilization(available: i64, capacity: i64) -> i64 {
    if capacity <= 0 {
        return 0;
    }
    let percent = (100.0 * available as f64 / capacity as f64).round() as i64;
    percent.clamp(0, 100)
}

/// Mean age in whole days of the inward entries that carry a parsable date,
/// measured against `today` and rounded to the nearest day. None when no
/// entry has a date.
pub fn average_age_days(entries: &[InwardEntry], today: NaiveDate) -> Option<i64> {
    let ages: Vec<i64> = entries
        .iter()
        .filter_map(|e| NaiveDate::parse_from_str(&e.entry_date, "%Y-%m-%d").ok())
        .map(|date| (today - date).num_days())
        .collect();
    if ages.is_empty() {
        return None;
    }
    let mean = ages.iter().sum::<i64>() as f64 / ages.len() as f64;
    Some(mean.round() as i64)
}

/// Inward birds grouped by the free-text invoice field, largest lots first.
pub fn invoice_stock(entries: &[InwardEntry]) -> Vec<InvoiceStock> {
    let mut by_invoice: HashMap<&str, i64> = HashMap::new();
    for entry in entries {
        *by_invoice.entry(entry.reference_no.as_str()).or_insert(0) += entry.number_of_birds;
    }
    let mut stock: Vec<InvoiceStock> = by_invoice
        .into_iter()
        .map(|(invoice, birds)| InvoiceStock {
            invoice: invoice.to_string(),
            birds,
        })
        .collect();
    stock.sort_by(|a, b| b.birds.cmp(&a.birds).then_with(|| a.invoice.cmp(&b.invoice)));
    stock
}

/// Builds the full overview from the three collections and the configured
/// capacity.
pub fn build_overview(
    inward: &[InwardEntry],
    sales: &[GodownSale],
    mortality: &[MortalityRecord],
    capacity: i64,
    today: NaiveDate,
) -> StockOverview {
    let total_inward: i64 = inward.iter().map(|e| e.number_of_birds).sum();
    let total_sold: i64 = sales.iter().map(|s| s.number_of_birds).sum();
    let total_mortality: i64 = mortality.iter().map(|r| r.number_of_birds_died).sum();
    let available = available_birds(total_inward, total_sold, total_mortality);

    StockOverview {
        total_inward,
        total_sold,
        total_mortality,
        available,
        capacity,
        capacity_utilization: capacity_utilization(available, capacity),
        average_age_days: average_age_days(inward, today),
        invoice_stock: invoice_stock(inward),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(reference_no: &str, birds: i64, entry_date: &str) -> InwardEntry {
        InwardEntry {
            reference_no: reference_no.to_string(),
            number_of_birds: birds,
            entry_date: entry_date.to_string(),
            ..InwardEntry::default()
        }
    }

    fn sale(birds: i64) -> GodownSale {
        GodownSale {
            number_of_birds: birds,
            ..GodownSale::default()
        }
    }

    fn mortality(died: i64) -> MortalityRecord {
        MortalityRecord {
            number_of_birds_died: died,
            ..MortalityRecord::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 20).unwrap()
    }

    #[test]
    fn test_available_subtracts_sold_and_mortality() {
        let inward = [entry("A", 100, ""), entry("B", 50, "")];
        let sales = [sale(30)];
        let died = [mortality(5)];
        let overview = build_overview(&inward, &sales, &died, 1000, today());

        assert_eq!(overview.total_inward, 150);
        assert_eq!(overview.total_sold, 30);
        assert_eq!(overview.total_mortality, 5);
        assert_eq!(overview.available, 115);
    }

    #[test]
    fn test_available_never_negative() {
        assert_eq!(available_birds(10, 30, 5), 0);
        let overview = build_overview(&[entry("A", 10, "")], &[sale(30)], &[mortality(5)], 100, today());
        assert_eq!(overview.available, 0);
    }

    #[test]
    fn test_capacity_utilization_is_clamped() {
        assert_eq!(capacity_utilization(115, 100), 100);
        assert_eq!(capacity_utilization(50, 100), 50);
        assert_eq!(capacity_utilization(0, 100), 0);
        // Rounding, not truncation.
        assert_eq!(capacity_utilization(1, 3), 33);
        assert_eq!(capacity_utilization(2, 3), 67);
        // Degenerate capacity yields zero rather than dividing by it.
        assert_eq!(capacity_utilization(10, 0), 0);
    }

    #[test]
    fn test_invoice_stock_groups_and_sorts() {
        let inward = [
            entry("A", 10, ""),
            entry("B", 5, ""),
            entry("A", 20, ""),
        ];
        let stock = invoice_stock(&inward);
        assert_eq!(
            stock,
            vec![
                InvoiceStock {
                    invoice: "A".to_string(),
                    birds: 30
                },
                InvoiceStock {
                    invoice: "B".to_string(),
                    birds: 5
                },
            ]
        );
    }

    #[test]
    fn test_average_age_means_and_rounds() {
        let inward = [
            entry("A", 10, "2025-07-10"), // 10 days old
            entry("B", 10, "2025-07-15"), // 5 days old
            entry("C", 10, "not-a-date"), // ignored
        ];
        assert_eq!(average_age_days(&inward, today()), Some(8)); // 7.5 rounds to 8
    }

    #[test]
    fn test_average_age_unavailable_without_dates() {
        assert_eq!(average_age_days(&[], today()), None);
        let undated = [entry("A", 10, ""), entry("B", 5, "junk")];
        assert_eq!(average_age_days(&undated, today()), None);
    }

    #[test]
    fn test_empty_collections_overview() {
        let overview = build_overview(&[], &[], &[], 5000, today());
        assert_eq!(overview.available, 0);
        assert_eq!(overview.capacity_utilization, 0);
        assert_eq!(overview.average_age_days, None);
        assert!(overview.invoice_stock.is_empty());
    }
}
