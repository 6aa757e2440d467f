//! South African income tax estimates
//!
//! Progressive bracket tables, capped deductions and a per-entity tax-year
//! summary. Rates are basis points so all arithmetic stays in cents.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::settings::TaxSettings;
use crate::error::DashboardResult;
use crate::models::{category_matches, Entity, EntityKind, Money, Period};
use crate::services::currency::amount_in_base;
use crate::storage::Storage;

/// One bracket: income above `lower` is taxed at `rate_bps`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxBracket {
    pub lower: Money,
    pub rate_bps: u32,
}

impl TaxBracket {
    const fn new(lower_rands: i64, rate_bps: u32) -> Self {
        Self {
            lower: Money::from_units(lower_rands),
            rate_bps,
        }
    }
}

/// Which table applies to a taxpayer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxpayerKind {
    Individual,
    SmallBusiness,
    Company,
}

impl TaxpayerKind {
    /// Business entities are taxed as small businesses, everyone else as individuals
    pub fn for_entity(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Business => Self::SmallBusiness,
            _ => Self::Individual,
        }
    }

    /// Map of lowercase entity name to taxpayer kind
    pub fn map_entities(entities: &[Entity]) -> BTreeMap<String, TaxpayerKind> {
        entities
            .iter()
            .map(|e| (e.name.trim().to_lowercase(), Self::for_entity(e.kind)))
            .collect()
    }
}

impl fmt::Display for TaxpayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Individual => write!(f, "individual"),
            Self::SmallBusiness => write!(f, "small business"),
            Self::Company => write!(f, "company"),
        }
    }
}

const INDIVIDUAL: &[TaxBracket] = &[
    TaxBracket::new(0, 1800),
    TaxBracket::new(237_100, 2600),
    TaxBracket::new(370_500, 3100),
    TaxBracket::new(512_800, 3600),
    TaxBracket::new(673_000, 3900),
    TaxBracket::new(857_900, 4100),
    TaxBracket::new(1_817_000, 4500),
];

const SMALL_BUSINESS: &[TaxBracket] = &[
    TaxBracket::new(0, 0),
    TaxBracket::new(335_000, 1500),
    TaxBracket::new(585_000, 2100),
    TaxBracket::new(785_000, 2800),
];

const COMPANY: &[TaxBracket] = &[TaxBracket::new(0, 2800)];

/// An ordered progressive bracket table
#[derive(Debug, Clone, Copy)]
pub struct TaxTable {
    brackets: &'static [TaxBracket],
}

impl TaxTable {
    pub fn for_kind(kind: TaxpayerKind) -> Self {
        match kind {
            TaxpayerKind::Individual => Self::individual(),
            TaxpayerKind::SmallBusiness => Self::small_business(),
            TaxpayerKind::Company => Self::company(),
        }
    }

    pub fn individual() -> Self {
        Self { brackets: INDIVIDUAL }
    }

    pub fn small_business() -> Self {
        Self {
            brackets: SMALL_BUSINESS,
        }
    }

    pub fn company() -> Self {
        Self { brackets: COMPANY }
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        self.brackets
    }

    /// Bracket liability before rebates; zero for non-positive income
    pub fn liability(&self, income: Money) -> Money {
        if !income.is_positive() {
            return Money::zero();
        }
        self.brackets
            .iter()
            .enumerate()
            .take_while(|(_, bracket)| income > bracket.lower)
            .map(|(i, bracket)| {
                let upper = self
                    .brackets
                    .get(i + 1)
                    .map(|next| next.lower.min(income))
                    .unwrap_or(income);
                (upper - bracket.lower).apply_basis_points(bracket.rate_bps)
            })
            .sum()
    }

    /// Rate of the bracket the income's last rand falls in
    pub fn marginal_rate_bps(&self, income: Money) -> u32 {
        self.brackets
            .iter()
            .take_while(|bracket| income > bracket.lower)
            .last()
            .or_else(|| self.brackets.first())
            .map(|bracket| bracket.rate_bps)
            .unwrap_or(0)
    }
}

/// A deductible category with its statutory caps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionRule {
    /// Category filter, e.g. `savings/retirement`
    pub category: String,

    /// Cap as a share of gross income
    #[serde(default)]
    pub income_share_bps: Option<u32>,

    /// Absolute cap
    #[serde(default)]
    pub ceiling: Option<Money>,
}

impl DeductionRule {
    pub fn defaults() -> Vec<DeductionRule> {
        vec![
            DeductionRule {
                category: "savings/retirement".to_string(),
                income_share_bps: Some(2750),
                ceiling: Some(Money::from_units(350_000)),
            },
            DeductionRule {
                category: "donations".to_string(),
                income_share_bps: Some(1000),
                ceiling: None,
            },
        ]
    }

    /// min(spent, share x income, ceiling), never negative
    pub fn allowed(&self, spent: Money, income: Money) -> Money {
        let mut allowed = spent.max(Money::zero());
        if let Some(bps) = self.income_share_bps {
            allowed = allowed.min(income.max(Money::zero()).apply_basis_points(bps));
        }
        if let Some(ceiling) = self.ceiling {
            allowed = allowed.min(ceiling);
        }
        allowed
    }
}

/// Liability after deductions and rebate
#[derive(Debug, Clone, PartialEq)]
pub struct TaxComputation {
    pub gross_income: Money,
    pub deductions: Money,
    pub taxable_income: Money,
    pub bracket_liability: Money,
    pub rebate: Money,
    pub net_liability: Money,
    pub marginal_rate_bps: u32,
}

impl TaxComputation {
    /// Net liability as a share of gross income; `None` without income
    pub fn effective_rate(&self) -> Option<f64> {
        self.net_liability.ratio_of(self.gross_income)
    }
}

/// Apply a table to gross income less deductions, then the rebate
pub fn compute_tax(table: &TaxTable, gross_income: Money, deductions: Money, rebate: Money) -> TaxComputation {
    let taxable_income = (gross_income - deductions).max(Money::zero());
    let bracket_liability = table.liability(taxable_income);
    let net_liability = (bracket_liability - rebate).max(Money::zero());
    TaxComputation {
        gross_income,
        deductions,
        taxable_income,
        bracket_liability,
        rebate,
        net_liability,
        marginal_rate_bps: table.marginal_rate_bps(taxable_income),
    }
}

/// One deduction rule applied to a year's spending
#[derive(Debug, Clone, PartialEq)]
pub struct DeductionLine {
    pub category: String,
    pub spent: Money,
    pub allowed: Money,
}

/// Tax-year figures for one entity
#[derive(Debug, Clone)]
pub struct EntityTaxSummary {
    pub entity: String,
    pub kind: TaxpayerKind,
    pub deductions: Vec<DeductionLine>,
    pub computation: TaxComputation,
}

/// Tax-year figures for every entity with income
#[derive(Debug, Clone)]
pub struct TaxYearSummary {
    pub period: Period,
    pub entities: Vec<EntityTaxSummary>,
}

/// Service that aggregates the ledger into tax estimates
pub struct TaxService<'a> {
    storage: &'a Storage,
}

impl<'a> TaxService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Summarize a tax year per entity
    ///
    /// `kinds` maps an entity name (lowercase) to its taxpayer kind;
    /// unmapped entities are treated as individuals.
    pub fn summarize(
        &self,
        period: &Period,
        settings: &TaxSettings,
        kinds: &BTreeMap<String, TaxpayerKind>,
    ) -> DashboardResult<TaxYearSummary> {
        let config = self.storage.currencies.get()?;
        let transactions = self
            .storage
            .transactions
            .get_by_date_range(period.start_date(), period.end_date())?;

        // entity -> (income, spend per deduction rule)
        let mut buckets: BTreeMap<String, (String, Money, Vec<Money>)> = BTreeMap::new();
        for txn in &transactions {
            let Some(entity) = txn.entity.as_deref().map(str::trim).filter(|e| !e.is_empty()) else {
                continue;
            };
            let amount = amount_in_base(&config, txn);
            let entry = buckets.entry(entity.to_lowercase()).or_insert_with(|| {
                (
                    entity.to_string(),
                    Money::zero(),
                    vec![Money::zero(); settings.deductions.len()],
                )
            });

            if amount.is_positive() {
                entry.1 += amount;
            } else if let Some(category) = txn.category.as_deref() {
                if let Some(idx) = settings
                    .deductions
                    .iter()
                    .position(|rule| category_matches(&rule.category, category))
                {
                    entry.2[idx] += amount.abs();
                }
            }
        }

        let entities = buckets
            .into_iter()
            .filter(|(_, (_, income, _))| income.is_positive())
            .map(|(key, (name, income, spent))| {
                let kind = kinds.get(&key).copied().unwrap_or(TaxpayerKind::Individual);
                let deductions: Vec<DeductionLine> = settings
                    .deductions
                    .iter()
                    .zip(spent)
                    .map(|(rule, spent)| DeductionLine {
                        category: rule.category.clone(),
                        spent,
                        allowed: rule.allowed(spent, income),
                    })
                    .collect();
                let total: Money = deductions.iter().map(|d| d.allowed).sum();
                let rebate = match kind {
                    TaxpayerKind::Individual => settings.primary_rebate,
                    _ => Money::zero(),
                };
                EntityTaxSummary {
                    entity: name,
                    kind,
                    computation: compute_tax(&TaxTable::for_kind(kind), income, total, rebate),
                    deductions,
                }
            })
            .collect();

        Ok(TaxYearSummary {
            period: *period,
            entities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::WorkspacePaths;
    use crate::models::Transaction;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn test_first_bracket_boundary() {
        let table = TaxTable::individual();
        assert_eq!(
            table.liability(Money::from_units(237_100)),
            Money::from_units(42_678)
        );
        assert_eq!(table.liability(Money::zero()), Money::zero());
        assert_eq!(table.liability(Money::from_units(-5)), Money::zero());
    }

    #[test]
    fn test_progressive_liability() {
        let table = TaxTable::individual();
        // 42,678 + (370,500 - 237,100) x 26% = 42,678 + 34,684
        assert_eq!(
            table.liability(Money::from_units(370_500)),
            Money::from_units(77_362)
        );
        // 77,362 + 100,000 x 31%
        assert_eq!(
            table.liability(Money::from_units(470_500)),
            Money::from_units(108_362)
        );
        assert_eq!(table.marginal_rate_bps(Money::from_units(470_500)), 3100);
        assert_eq!(table.marginal_rate_bps(Money::from_units(100)), 1800);
    }

    #[test]
    fn test_small_business_and_company() {
        assert_eq!(
            TaxTable::small_business().liability(Money::from_units(335_000)),
            Money::zero()
        );
        assert_eq!(
            TaxTable::small_business().liability(Money::from_units(435_000)),
            Money::from_units(15_000)
        );
        assert_eq!(
            TaxTable::company().liability(Money::from_units(1_000_000)),
            Money::from_units(280_000)
        );
    }

    #[test]
    fn test_deduction_caps() {
        let rules = DeductionRule::defaults();
        let income = Money::from_units(400_000);

        // 27.5% of 400,000 = 110,000
        assert_eq!(
            rules[0].allowed(Money::from_units(150_000), income),
            Money::from_units(110_000)
        );
        assert_eq!(
            rules[0].allowed(Money::from_units(50_000), income),
            Money::from_units(50_000)
        );
        // ceiling wins at high income
        assert_eq!(
            rules[0].allowed(Money::from_units(900_000), Money::from_units(3_000_000)),
            Money::from_units(350_000)
        );
        // donations: 10% of income
        assert_eq!(
            rules[1].allowed(Money::from_units(60_000), income),
            Money::from_units(40_000)
        );
    }

    #[test]
    fn test_rebate_floors_at_zero() {
        let result = compute_tax(
            &TaxTable::individual(),
            Money::from_units(50_000),
            Money::zero(),
            Money::from_units(17_235),
        );
        assert_eq!(result.bracket_liability, Money::from_units(9_000));
        assert_eq!(result.net_liability, Money::zero());
    }

    #[test]
    fn test_summarize_tax_year() {
        let temp_dir = TempDir::new().unwrap();
        let paths = WorkspacePaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();

        let add = |y, m, cents, category: &str, entity: &str| {
            let mut txn = Transaction::new(
                NaiveDate::from_ymd_opt(y, m, 15).unwrap(),
                "entry",
                Money::from_cents(cents),
            );
            txn.apply_auto(Some(category.into()), Some(entity.into()));
            storage.transactions.insert(txn).unwrap();
        };
        add(2024, 3, 30_000_000, "income/salary", "Dad");
        add(2024, 6, -1_000_000, "savings/retirement", "Dad");
        add(2024, 7, -500_000, "donations", "Dad");
        add(2024, 2, 99_900_000, "income/salary", "Dad"); // previous tax year
        add(2024, 8, -10_000, "groceries", "Mom");

        let period = Period::tax_year(2025);
        let summary = TaxService::new(&storage)
            .summarize(&period, &TaxSettings::default(), &BTreeMap::new())
            .unwrap();

        assert_eq!(summary.entities.len(), 1);
        let dad = &summary.entities[0];
        assert_eq!(dad.entity, "Dad");
        assert_eq!(dad.computation.gross_income, Money::from_units(300_000));
        assert_eq!(dad.deductions[0].allowed, Money::from_units(10_000));
        assert_eq!(dad.deductions[1].allowed, Money::from_units(5_000));
        assert_eq!(dad.computation.taxable_income, Money::from_units(285_000));
        // 42,678 + 47,900 x 26% = 55,132; less rebate 17,235
        assert_eq!(dad.computation.bracket_liability, Money::from_units(55_132));
        assert_eq!(dad.computation.net_liability, Money::from_units(37_897));
    }
}
