//! CSV import service
//!
//! Parses bank statement exports into transactions using a named bank
//! profile, fingerprints every row for duplicate detection, runs the
//! categorizer over new rows and appends them to the ledger. Malformed rows
//! are skipped and logged; they never abort an import.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::settings::ImportSettings;
use crate::error::{DashboardError, DashboardResult};
use crate::models::{Money, Transaction, TransactionId, BASE_CURRENCY};
use crate::services::categorizer::{Categorization, Categorizer};
use crate::storage::Storage;

/// Date formats tried after the profile's own format
const FALLBACK_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d", "%d %b %Y", "%d %B %Y", "%b %d, %Y",
    "%B %d, %Y", "%Y%m%d",
];

/// Whether the first row of a file is a header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderMode {
    /// Treat the first row as a header unless it parses as data
    #[default]
    Auto,
    Present,
    Absent,
}

/// Column layout of one bank's CSV export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankProfile {
    pub date_column: usize,
    pub description_column: usize,

    /// Single signed amount column
    #[serde(default)]
    pub amount_column: Option<usize>,

    /// Money out, used when there is no single amount column
    #[serde(default)]
    pub debit_column: Option<usize>,

    /// Money in, used when there is no single amount column
    #[serde(default)]
    pub credit_column: Option<usize>,

    #[serde(default = "default_date_format")]
    pub date_format: String,

    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    #[serde(default)]
    pub header: HeaderMode,

    /// Flip signs for banks that export spending as positive
    #[serde(default)]
    pub invert_amounts: bool,
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_delimiter() -> char {
    ','
}

impl Default for BankProfile {
    fn default() -> Self {
        Self::generic()
    }
}

impl BankProfile {
    /// Date, description, amount
    pub fn generic() -> Self {
        Self {
            date_column: 0,
            description_column: 1,
            amount_column: Some(2),
            debit_column: None,
            credit_column: None,
            date_format: default_date_format(),
            delimiter: ',',
            header: HeaderMode::Auto,
            invert_amounts: false,
        }
    }

    /// FNB: Date, Amount, Balance, Description
    pub fn fnb() -> Self {
        Self {
            date_column: 0,
            description_column: 3,
            amount_column: Some(1),
            date_format: "%Y/%m/%d".to_string(),
            ..Self::generic()
        }
    }

    /// Standard Bank: Date, Description, Debit, Credit, Balance
    pub fn standard_bank() -> Self {
        Self {
            date_column: 0,
            description_column: 1,
            amount_column: None,
            debit_column: Some(2),
            credit_column: Some(3),
            date_format: "%d/%m/%Y".to_string(),
            ..Self::generic()
        }
    }

    /// The built-in profiles keyed by name
    pub fn builtins() -> BTreeMap<String, BankProfile> {
        BTreeMap::from([
            ("generic".to_string(), Self::generic()),
            ("fnb".to_string(), Self::fnb()),
            ("standard_bank".to_string(), Self::standard_bank()),
        ])
    }

    fn parse_date(&self, s: &str) -> Option<NaiveDate> {
        let s = s.trim();
        std::iter::once(self.date_format.as_str())
            .chain(FALLBACK_DATE_FORMATS.iter().copied())
            .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
    }

    /// True when the record's date column holds a parseable date
    fn looks_like_data_row(&self, record: &StringRecord) -> bool {
        record
            .get(self.date_column)
            .and_then(|s| self.parse_date(s))
            .is_some()
    }
}

/// Derive a profile from a header row, keeping the base profile's format
///
/// Returns None when the header doesn't name a date, a description and
/// either an amount or a debit/credit pair.
pub fn detect_mapping_from_headers(headers: &StringRecord, base: &BankProfile) -> Option<BankProfile> {
    let mut date = None;
    let mut description = None;
    let mut amount = None;
    let mut debit = None;
    let mut credit = None;

    for (idx, header) in headers.iter().enumerate() {
        let h = header.trim().to_lowercase();
        if h.contains("balance") {
            continue;
        }
        if date.is_none() && (h.contains("date") || h.contains("posted")) {
            date = Some(idx);
        } else if amount.is_none() && h.contains("amount") {
            amount = Some(idx);
        } else if debit.is_none()
            && (h.contains("debit") || h.contains("withdrawal") || h.contains("money out"))
        {
            debit = Some(idx);
        } else if credit.is_none()
            && (h.contains("credit") || h.contains("deposit") || h.contains("money in"))
        {
            credit = Some(idx);
        } else if description.is_none()
            && (h.contains("description")
                || h.contains("narrative")
                || h.contains("details")
                || h.contains("payee")
                || h.contains("merchant"))
        {
            description = Some(idx);
        }
    }

    let (date_column, description_column) = (date?, description?);
    let (amount_column, debit_column, credit_column) = match (amount, debit, credit) {
        (Some(a), _, _) => (Some(a), None, None),
        (None, Some(d), Some(c)) => (None, Some(d), Some(c)),
        _ => return None,
    };

    Some(BankProfile {
        date_column,
        description_column,
        amount_column,
        debit_column,
        credit_column,
        ..base.clone()
    })
}

/// Parse an amount cell: accepts `R`, thousands separators, a leading
/// minus and accounting parentheses
pub fn parse_amount_string(s: &str) -> Result<Money, String> {
    let trimmed = s.trim();
    let (negative, inner) = match trimmed
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    Money::parse(inner)
        .map(|m| if negative { -m.abs() } else { m })
        .map_err(|e| format!("could not parse amount '{}': {}", trimmed, e))
}

/// A row that parsed cleanly
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    /// 1-based line in the source file
    pub line: u64,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
    /// Deterministic fingerprint for duplicate detection
    pub import_id: String,
}

/// A row that was skipped
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub line: u64,
    pub reason: String,
}

/// Outcome of parsing a whole file
#[derive(Debug, Clone, Default)]
pub struct ParsedStatement {
    pub rows: Vec<ParsedRow>,
    pub skipped: Vec<SkippedRow>,
}

/// Fingerprint of a row; `occurrence` separates identical rows in one file
pub fn generate_import_id(
    date: NaiveDate,
    amount: Money,
    description: &str,
    occurrence: usize,
) -> String {
    let key = format!(
        "{}|{}|{}|{}",
        date,
        amount.cents(),
        description.trim().to_lowercase(),
        occurrence
    );
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
}

/// Parse CSV text from any reader
pub fn parse_csv<R: Read>(reader: R, profile: &BankProfile) -> DashboardResult<ParsedStatement> {
    let delimiter = u8::try_from(profile.delimiter).map_err(|_| {
        DashboardError::Import(format!(
            "Delimiter '{}' must be a single-byte character",
            profile.delimiter
        ))
    })?;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .delimiter(delimiter)
        .from_reader(reader);

    let mut statement = ParsedStatement::default();
    let mut occurrences: HashMap<(NaiveDate, i64, String), usize> = HashMap::new();
    let mut profile = profile.clone();
    let mut first = true;

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                skip(&mut statement, line, format!("unreadable record: {}", e));
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        if first {
            first = false;
            let is_header = match profile.header {
                HeaderMode::Present => true,
                HeaderMode::Absent => false,
                HeaderMode::Auto => !profile.looks_like_data_row(&record),
            };
            if is_header {
                if let Some(detected) = detect_mapping_from_headers(&record, &profile) {
                    debug!(?detected, "column mapping detected from header");
                    profile = detected;
                }
                continue;
            }
        }

        match parse_record(&record, &profile) {
            Ok((date, description, amount)) => {
                let occurrence = occurrences
                    .entry((date, amount.cents(), description.to_lowercase()))
                    .or_insert(0);
                let import_id = generate_import_id(date, amount, &description, *occurrence);
                *occurrence += 1;
                statement.rows.push(ParsedRow {
                    line,
                    date,
                    description,
                    amount,
                    import_id,
                });
            }
            Err(reason) => skip(&mut statement, line, reason),
        }
    }

    Ok(statement)
}

fn skip(statement: &mut ParsedStatement, line: u64, reason: String) {
    warn!(line, reason = %reason, "skipping malformed CSV row");
    statement.skipped.push(SkippedRow { line, reason });
}

fn parse_record(
    record: &StringRecord,
    profile: &BankProfile,
) -> Result<(NaiveDate, String, Money), String> {
    let date_str = record
        .get(profile.date_column)
        .ok_or_else(|| "missing date column".to_string())?;
    let date = profile
        .parse_date(date_str)
        .ok_or_else(|| format!("could not parse date '{}'", date_str))?;

    let description = record
        .get(profile.description_column)
        .map(str::trim)
        .unwrap_or_default();
    if description.is_empty() {
        return Err("missing description".to_string());
    }

    let amount = if let Some(col) = profile.amount_column {
        let cell = record
            .get(col)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "missing amount".to_string())?;
        parse_amount_string(cell)?
    } else {
        let debit = optional_cell(record, profile.debit_column);
        let credit = optional_cell(record, profile.credit_column);
        if debit.is_none() && credit.is_none() {
            return Err("missing debit and credit amounts".to_string());
        }
        let out = debit.map(parse_amount_string).transpose()?.unwrap_or_default();
        let inn = credit.map(parse_amount_string).transpose()?.unwrap_or_default();
        inn.abs() - out.abs()
    };

    let amount = if profile.invert_amounts { -amount } else { amount };
    Ok((date, description.to_string(), amount))
}

fn optional_cell(record: &StringRecord, column: Option<usize>) -> Option<&str> {
    column
        .and_then(|c| record.get(c))
        .filter(|s| !s.is_empty())
}

/// Per-import switches
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Currency code stamped on every imported transaction
    pub currency: String,
    pub auto_categorize: bool,
    pub duplicate_detection: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            currency: BASE_CURRENCY.to_string(),
            auto_categorize: true,
            duplicate_detection: true,
        }
    }
}

impl ImportOptions {
    pub fn from_settings(settings: &ImportSettings, currency: &str) -> Self {
        Self {
            currency: currency.trim().to_uppercase(),
            auto_categorize: settings.auto_categorize,
            duplicate_detection: settings.duplicate_detection,
        }
    }
}

/// Status of a parsed row against the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportStatus {
    New,
    Duplicate,
}

/// One row of an import preview
#[derive(Debug, Clone)]
pub struct ImportPreviewEntry {
    pub row: ParsedRow,
    pub status: ImportStatus,
    pub categorization: Categorization,
}

/// Summary of a completed import
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub imported: usize,
    pub duplicates_skipped: usize,
    /// Rows imported with a rule match
    pub categorized: usize,
    pub imported_ids: Vec<TransactionId>,
    pub skipped_rows: Vec<SkippedRow>,
}

impl ImportResult {
    pub fn errors(&self) -> usize {
        self.skipped_rows.len()
    }
}

/// Service for CSV import
pub struct ImportService<'a> {
    storage: &'a Storage,
}

impl<'a> ImportService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Parse a file on disk
    pub fn parse_file(&self, path: &Path, profile: &BankProfile) -> DashboardResult<ParsedStatement> {
        let file = File::open(path).map_err(|e| {
            DashboardError::Import(format!("Cannot open '{}': {}", path.display(), e))
        })?;
        parse_csv(file, profile)
    }

    /// Classify parsed rows without touching the ledger
    pub fn preview(
        &self,
        statement: &ParsedStatement,
        options: &ImportOptions,
    ) -> DashboardResult<Vec<ImportPreviewEntry>> {
        let categorizer = Categorizer::new(&self.storage.rules.get_all()?);
        statement
            .rows
            .iter()
            .map(|row| -> DashboardResult<ImportPreviewEntry> {
                let duplicate = options.duplicate_detection
                    && self.storage.transactions.contains_import_id(&row.import_id)?;
                Ok(ImportPreviewEntry {
                    row: row.clone(),
                    status: if duplicate {
                        ImportStatus::Duplicate
                    } else {
                        ImportStatus::New
                    },
                    categorization: if options.auto_categorize {
                        categorizer.categorize(&row.description)
                    } else {
                        Categorization::Uncategorized
                    },
                })
            })
            .collect()
    }

    /// Append the new rows of a parsed statement to the ledger and save
    pub fn import_statement(
        &self,
        statement: &ParsedStatement,
        source_file: &str,
        options: &ImportOptions,
    ) -> DashboardResult<ImportResult> {
        let mut result = ImportResult {
            skipped_rows: statement.skipped.clone(),
            ..ImportResult::default()
        };

        for entry in self.preview(statement, options)? {
            if entry.status == ImportStatus::Duplicate {
                result.duplicates_skipped += 1;
                continue;
            }

            let row = entry.row;
            let mut txn = Transaction::new(row.date, row.description, row.amount);
            txn.currency = options.currency.clone();
            txn.source_file = source_file.to_string();
            txn.import_id = Some(row.import_id);

            if entry.categorization.is_matched() {
                let (category, entity) = entry.categorization.assignment();
                txn.apply_auto(category, entity);
                result.categorized += 1;
            }

            txn.validate()
                .map_err(|e| DashboardError::Validation(e.to_string()))?;

            result.imported_ids.push(txn.id);
            self.storage.transactions.insert(txn)?;
            result.imported += 1;
        }

        if result.imported > 0 {
            self.storage.transactions.save()?;
        }

        info!(
            source = source_file,
            imported = result.imported,
            duplicates = result.duplicates_skipped,
            categorized = result.categorized,
            skipped = result.errors(),
            "import finished"
        );
        Ok(result)
    }

    /// Parse and import a file in one step
    pub fn import_file(
        &self,
        path: &Path,
        profile: &BankProfile,
        options: &ImportOptions,
    ) -> DashboardResult<ImportResult> {
        let statement = self.parse_file(path, profile)?;
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.import_statement(&statement, &source, options)
    }
}
