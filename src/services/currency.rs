//! Currency service
//!
//! Manages the currency table: the default currency, the rate snapshot and
//! conversions through the base currency.

use chrono::Utc;
use tracing::{info, warn};

use crate::error::{DashboardError, DashboardResult};
use crate::models::{Currency, CurrencyConfig, Money, Transaction};
use crate::storage::Storage;

/// A transaction's amount in the base currency
///
/// Unknown currencies pass through unconverted and are logged.
pub fn amount_in_base(config: &CurrencyConfig, txn: &Transaction) -> Money {
    match config.to_base(txn.amount, &txn.currency) {
        Some(amount) => amount,
        None => {
            warn!(id = %txn.id, currency = %txn.currency, "unknown currency, amount left unconverted");
            txn.amount
        }
    }
}

fn validate_code(code: &str) -> DashboardResult<String> {
    let code = code.trim().to_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(DashboardError::Validation(format!(
            "Currency code must be three letters, got '{}'",
            code
        )));
    }
    Ok(code)
}

fn validate_rate(rate: f64) -> DashboardResult<()> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(DashboardError::Validation(format!(
            "Exchange rate must be a positive number, got {}",
            rate
        )));
    }
    Ok(())
}

/// Service for currency settings
pub struct CurrencyService<'a> {
    storage: &'a Storage,
}

impl<'a> CurrencyService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn config(&self) -> DashboardResult<CurrencyConfig> {
        self.storage.currencies.get()
    }

    fn commit(&self, mut config: CurrencyConfig) -> DashboardResult<CurrencyConfig> {
        config.updated_at = Utc::now();
        self.storage.currencies.set(config.clone())?;
        self.storage.currencies.save()?;
        Ok(config)
    }

    /// Make a known currency the default for imports and reports
    pub fn set_default(&self, code: &str) -> DashboardResult<Currency> {
        let mut config = self.config()?;
        let currency = config
            .get(code)
            .cloned()
            .ok_or_else(|| DashboardError::currency_not_found(code.trim().to_uppercase()))?;
        config.default_code = currency.code.clone();
        self.commit(config)?;
        info!(code = %currency.code, "default currency changed");
        Ok(currency)
    }

    /// Update one rate ("1 unit = rate base units"); the base rate is fixed at 1
    pub fn update_rate(&self, code: &str, rate: f64) -> DashboardResult<Currency> {
        validate_rate(rate)?;
        let mut config = self.config()?;
        if config.is_base(code) {
            return Err(DashboardError::Currency(format!(
                "The base currency {} always has rate 1",
                config.base
            )));
        }
        let currency = config
            .get_mut(code)
            .ok_or_else(|| DashboardError::currency_not_found(code.trim().to_uppercase()))?;
        currency.rate_to_base = rate;
        let updated = currency.clone();
        self.commit(config)?;
        info!(code = %updated.code, rate, "exchange rate updated");
        Ok(updated)
    }

    pub fn add_currency(
        &self,
        code: &str,
        symbol: &str,
        name: &str,
        rate: f64,
        decimal_places: u8,
    ) -> DashboardResult<Currency> {
        let code = validate_code(code)?;
        validate_rate(rate)?;
        if decimal_places > 2 {
            return Err(DashboardError::Validation(
                "Decimal places must be 0, 1 or 2".into(),
            ));
        }

        let mut config = self.config()?;
        if config.get(&code).is_some() {
            return Err(DashboardError::Duplicate {
                entity_type: "Currency",
                identifier: code,
            });
        }

        let currency = Currency::new(&code, symbol.trim(), name.trim(), rate, decimal_places);
        config.currencies.push(currency.clone());
        self.commit(config)?;
        Ok(currency)
    }

    /// Remove a currency; the base and the current default are protected
    pub fn remove_currency(&self, code: &str) -> DashboardResult<Currency> {
        let mut config = self.config()?;
        if config.is_base(code) || config.default_code.eq_ignore_ascii_case(code.trim()) {
            return Err(DashboardError::Currency(format!(
                "{} is the base or default currency and cannot be removed",
                code.trim().to_uppercase()
            )));
        }
        let index = config
            .currencies
            .iter()
            .position(|c| c.code.eq_ignore_ascii_case(code.trim()))
            .ok_or_else(|| DashboardError::currency_not_found(code.trim().to_uppercase()))?;
        let removed = config.currencies.remove(index);
        self.commit(config)?;
        Ok(removed)
    }

    pub fn convert(&self, amount: Money, from: &str, to: &str) -> DashboardResult<Money> {
        let config = self.config()?;
        config.convert(amount, from, to).ok_or_else(|| {
            DashboardError::Currency(format!(
                "Cannot convert {} to {}",
                from.trim().to_uppercase(),
                to.trim().to_uppercase()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::WorkspacePaths;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = WorkspacePaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_convert_through_base() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CurrencyService::new(&storage);

        // 100 USD at 18.50 = R1,850.00
        let zar = service.convert(Money::from_units(100), "USD", "ZAR").unwrap();
        assert_eq!(zar.cents(), 185_000);

        let usd = service.convert(Money::from_units(1850), "ZAR", "usd").unwrap();
        assert_eq!(usd.cents(), 10_000);

        assert!(matches!(
            service.convert(Money::from_units(1), "XXX", "ZAR"),
            Err(DashboardError::Currency(_))
        ));
    }

    #[test]
    fn test_update_rate_rules() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CurrencyService::new(&storage);

        assert_eq!(service.update_rate("usd", 19.0).unwrap().rate_to_base, 19.0);
        assert!(service.update_rate("ZAR", 2.0).is_err());
        assert!(service.update_rate("USD", 0.0).unwrap_err().is_validation());
        assert!(service.update_rate("AUD", 12.0).unwrap_err().is_not_found());
    }

    #[test]
    fn test_default_and_removal() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CurrencyService::new(&storage);

        service.add_currency("aud", "A$", "Australian Dollar", 12.1, 2).unwrap();
        assert!(service.add_currency("AUD", "A$", "dup", 12.1, 2).is_err());

        service.set_default("AUD").unwrap();
        assert!(service.remove_currency("AUD").is_err());
        assert!(service.remove_currency("ZAR").is_err());

        service.set_default("ZAR").unwrap();
        service.remove_currency("AUD").unwrap();
        assert!(service.config().unwrap().get("AUD").is_none());
    }

    #[test]
    fn test_amount_in_base() {
        let config = CurrencyConfig::default();
        let mut txn = Transaction::new(
            chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            "AMAZON",
            Money::from_units(-10),
        );
        txn.currency = "USD".into();
        assert_eq!(amount_in_base(&config, &txn).cents(), -18_500);

        txn.currency = "XYZ".into();
        assert_eq!(amount_in_base(&config, &txn).cents(), -1_000);
    }
}
