//! Grouping engine shared by every report
//!
//! Two passes over the ledger: the first buckets amounts by a grouping key,
//! the second computes bucket totals, shares of the grand total and
//! rankings. Buckets live in a `BTreeMap` so output order is stable.

use std::collections::BTreeMap;

use crate::models::{Money, Period, Transaction};

pub const UNASSIGNED: &str = "Unassigned";
pub const UNCATEGORIZED: &str = "Uncategorized";

/// What to group transactions by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Entity,
    /// Top-level category, e.g. `motors`
    Category,
    /// Full category path, e.g. `motors/fuel`
    Label,
    Month,
    TaxYear,
}

impl GroupKey {
    /// Bucket key of a transaction; missing values get a placeholder
    pub fn key_for(&self, txn: &Transaction) -> String {
        match self {
            GroupKey::Entity => txn
                .entity
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| UNASSIGNED.to_string()),
            GroupKey::Category => txn
                .top_category()
                .map(|c| c.trim().to_lowercase())
                .unwrap_or_else(|| UNCATEGORIZED.to_string()),
            GroupKey::Label => txn
                .category
                .as_deref()
                .map(|c| c.trim().to_lowercase())
                .unwrap_or_else(|| UNCATEGORIZED.to_string()),
            GroupKey::Month => Period::month_of(txn.date).to_string(),
            GroupKey::TaxYear => Period::tax_year_of(txn.date).to_string(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            GroupKey::Entity => "Entity",
            GroupKey::Category => "Category",
            GroupKey::Label => "Category / label",
            GroupKey::Month => "Month",
            GroupKey::TaxYear => "Tax year",
        }
    }
}

/// One group's totals
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub key: String,
    pub total: Money,
    pub count: usize,
    /// Share of the grand total as a percentage; 0 when the total is 0
    pub percent_of_total: f64,
}

/// Share of `part` in `total` as a percentage, 0 for a zero total
pub fn percent_of(part: Money, total: Money) -> f64 {
    if total.is_zero() {
        0.0
    } else {
        part.cents() as f64 * 100.0 / total.cents() as f64
    }
}

/// (income - expenses) / income as a percentage; `None` without income
///
/// `expenses` is a magnitude.
pub fn savings_rate(income: Money, expenses: Money) -> Option<f64> {
    if !income.is_positive() {
        return None;
    }
    Some(percent_of(income - expenses, income))
}

/// Grouped totals for one grouping key
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub group: GroupKey,
    pub buckets: Vec<Bucket>,
    pub grand_total: Money,
    pub count: usize,
}

impl Aggregation {
    /// Group `(transaction, amount)` pairs; `amount` is the value to sum,
    /// normally the base-currency amount
    pub fn build<'t, I>(group: GroupKey, items: I) -> Self
    where
        I: IntoIterator<Item = (&'t Transaction, Money)>,
    {
        let mut sums: BTreeMap<String, (Money, usize)> = BTreeMap::new();
        for (txn, amount) in items {
            let entry = sums.entry(group.key_for(txn)).or_insert((Money::zero(), 0));
            entry.0 += amount;
            entry.1 += 1;
        }

        let grand_total: Money = sums.values().map(|(total, _)| *total).sum();
        let count: usize = sums.values().map(|(_, n)| n).sum();
        let buckets = sums
            .into_iter()
            .map(|(key, (total, count))| Bucket {
                key,
                total,
                count,
                percent_of_total: percent_of(total, grand_total),
            })
            .collect();

        Self {
            group,
            buckets,
            grand_total,
            count,
        }
    }

    /// Largest buckets by absolute total; ties keep key order
    pub fn top_n(&self, n: usize) -> Vec<&Bucket> {
        let mut ranked: Vec<&Bucket> = self.buckets.iter().collect();
        ranked.sort_by(|a, b| b.total.abs().cmp(&a.total.abs()));
        ranked.truncate(n);
        ranked
    }

    pub fn get(&self, key: &str) -> Option<&Bucket> {
        self.buckets.iter().find(|b| b.key.eq_ignore_ascii_case(key))
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn txn(month: u32, cents: i64, category: Option<&str>, entity: Option<&str>) -> Transaction {
        let mut t = Transaction::new(
            NaiveDate::from_ymd_opt(2025, month, 5).unwrap(),
            "entry",
            Money::from_cents(cents),
        );
        t.category = category.map(String::from);
        t.entity = entity.map(String::from);
        t
    }

    fn by_amount(txns: &[Transaction]) -> impl Iterator<Item = (&Transaction, Money)> {
        txns.iter().map(|t| (t, t.amount))
    }

    #[test]
    fn test_percent_of_total() {
        let txns = vec![
            txn(1, -10_000, Some("Groceries"), None),
            txn(1, -20_000, Some("groceries/supermarket"), None),
            txn(1, -30_000, Some("motors/fuel"), None),
        ];
        let agg = Aggregation::build(GroupKey::Category, by_amount(&txns));

        assert_eq!(agg.grand_total.cents(), -60_000);
        let groceries = agg.get("groceries").unwrap();
        assert_eq!(groceries.total.cents(), -30_000);
        assert_eq!(groceries.count, 2);
        assert_eq!(groceries.percent_of_total, 50.0);
    }

    #[test]
    fn test_bucket_sums_equal_grand_total() {
        let txns = vec![
            txn(1, -1_234, Some("home"), Some("Household")),
            txn(2, 50_000, Some("income/salary"), Some("Dad")),
            txn(2, -777, None, Some("Mom")),
            txn(3, -42, Some("other"), None),
        ];
        for key in [
            GroupKey::Entity,
            GroupKey::Category,
            GroupKey::Label,
            GroupKey::Month,
            GroupKey::TaxYear,
        ] {
            let agg = Aggregation::build(key, by_amount(&txns));
            let sum: Money = agg.buckets.iter().map(|b| b.total).sum();
            assert_eq!(sum, agg.grand_total);
            assert_eq!(agg.count, txns.len());
        }
    }

    #[test]
    fn test_zero_total_gives_zero_percent() {
        let txns = vec![txn(1, -500, Some("a"), None), txn(1, 500, Some("b"), None)];
        let agg = Aggregation::build(GroupKey::Category, by_amount(&txns));
        assert!(agg.grand_total.is_zero());
        assert!(agg.buckets.iter().all(|b| b.percent_of_total == 0.0));
    }

    #[test]
    fn test_placeholders_and_keys() {
        let t = txn(2, -1, None, None);
        assert_eq!(GroupKey::Entity.key_for(&t), UNASSIGNED);
        assert_eq!(GroupKey::Category.key_for(&t), UNCATEGORIZED);
        assert_eq!(GroupKey::Month.key_for(&t), "2025-02");
        assert_eq!(GroupKey::TaxYear.key_for(&t), "TY2025");
    }

    #[test]
    fn test_top_n_by_magnitude() {
        let txns = vec![
            txn(1, -100, Some("a"), None),
            txn(1, -900, Some("b"), None),
            txn(1, 500, Some("c"), None),
            txn(1, -100, Some("d"), None),
        ];
        let agg = Aggregation::build(GroupKey::Category, by_amount(&txns));
        let top: Vec<_> = agg.top_n(3).into_iter().map(|b| b.key.as_str()).collect();
        assert_eq!(top, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_savings_rate() {
        assert_eq!(
            savings_rate(Money::from_units(10_000), Money::from_units(7_500)),
            Some(25.0)
        );
        assert_eq!(savings_rate(Money::zero(), Money::from_units(10)), None);
    }
}
