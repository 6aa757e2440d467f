//! Storage initialization
//!
//! First-run setup: seeds the category registry, the starter rule set and
//! the currency table, then writes default settings. Existing files are
//! never overwritten.

use tracing::info;

use crate::config::paths::WorkspacePaths;
use crate::config::settings::Settings;
use crate::error::DashboardError;
use crate::models::{Category, CategoryRule, CurrencyConfig};

use super::categories::CategoryData;
use super::file_io::write_json_atomic;
use super::rules::RuleData;

/// Default categories with their labels
const DEFAULT_CATEGORIES: &[(&str, &str, &[(&str, &str)])] = &[
    (
        "home",
        "Housing and household running costs",
        &[
            ("rent_mortgage", "Bond or rent"),
            ("utilities", "Electricity, water and rates"),
            ("maintenance", "Repairs and upkeep"),
        ],
    ),
    (
        "dad",
        "Dad's personal spending",
        &[("personal_care", "Personal care"), ("work_expenses", "Work costs")],
    ),
    (
        "mom",
        "Mom's personal spending",
        &[("personal_care", "Personal care"), ("shopping", "Clothing and shopping")],
    ),
    (
        "business",
        "Business costs",
        &[("ta_realw", "TA RealW operating costs"), ("supplies", "Supplies")],
    ),
    (
        "data_communication",
        "Phone and internet",
        &[("mobile_data", "Airtime and data"), ("internet", "Fibre and ADSL")],
    ),
    (
        "motors",
        "Vehicles",
        &[
            ("fuel", "Petrol and diesel"),
            ("maintenance", "Services, tyres and repairs"),
            ("insurance_licensing", "Insurance and licence fees"),
        ],
    ),
    ("groceries", "Food and household supplies", &[("supermarket", "Supermarket")]),
    (
        "health",
        "Medical costs",
        &[("medical_aid", "Medical aid"), ("pharmacy", "Pharmacy")],
    ),
    (
        "entertainment",
        "Leisure",
        &[("streaming", "Streaming services"), ("dining", "Eating out")],
    ),
    (
        "education",
        "School and learning",
        &[("school_fees", "School fees"), ("books", "Books and stationery")],
    ),
    (
        "savings",
        "Savings and investments",
        &[
            ("retirement", "Retirement annuity and pension"),
            ("emergency", "Emergency fund"),
            ("investments", "Investments"),
        ],
    ),
    ("donations", "Charitable giving", &[]),
    (
        "income",
        "Money in",
        &[
            ("salary", "Salary"),
            ("business_income", "Business income"),
            ("interest", "Interest"),
        ],
    ),
    ("other", "Everything else", &[]),
];

/// Starter rules: (pattern, category, entity)
const DEFAULT_RULES: &[(&str, &str, Option<&str>)] = &[
    ("BOND PAYMENT", "home/rent_mortgage", Some("Household")),
    ("RENT PAYMENT", "home/rent_mortgage", Some("Household")),
    ("ESKOM", "home/utilities", Some("Household")),
    ("CITY POWER", "home/utilities", Some("Household")),
    ("MUNICIPALITY", "home/utilities", Some("Household")),
    ("BUILDERS WAREHOUSE", "home/maintenance", Some("Household")),
    ("SASOL", "motors/fuel", Some("Dad")),
    ("ENGEN", "motors/fuel", Some("Dad")),
    ("SHELL", "motors/fuel", Some("Dad")),
    ("CALTEX", "motors/fuel", Some("Dad")),
    ("TYRE PLUS", "motors/maintenance", None),
    ("CAR WASH", "motors/maintenance", None),
    ("OUTSURANCE", "motors/insurance_licensing", None),
    ("MIWAY", "motors/insurance_licensing", None),
    ("PICK N PAY", "groceries/supermarket", Some("Household")),
    ("SHOPRITE", "groceries/supermarket", Some("Household")),
    ("CHECKERS", "groceries/supermarket", Some("Household")),
    ("SPAR", "groceries/supermarket", Some("Household")),
    ("WOOLWORTHS FOOD", "groceries/supermarket", Some("Household")),
    ("VODACOM", "data_communication/mobile_data", None),
    ("MTN", "data_communication/mobile_data", None),
    ("CELL C", "data_communication/mobile_data", None),
    ("TELKOM", "data_communication/internet", Some("Household")),
    ("FIBRE", "data_communication/internet", Some("Household")),
    ("TA-REALW", "business/ta_realw", Some("Business")),
    ("CLICKS", "health/pharmacy", None),
    ("DIS-CHEM", "health/pharmacy", None),
    ("NETFLIX", "entertainment/streaming", Some("Household")),
    ("SHOWMAX", "entertainment/streaming", Some("Household")),
    ("SALARY", "income/salary", None),
];

/// The seeded category registry
pub fn default_categories() -> Vec<Category> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(name, description, labels)| {
            labels
                .iter()
                .fold(Category::new(*name, *description), |cat, (label, desc)| {
                    cat.with_label(label, desc)
                })
        })
        .collect()
}

/// The seeded rule set, in priority-tie order
pub fn default_rules() -> Vec<CategoryRule> {
    DEFAULT_RULES
        .iter()
        .map(|(pattern, category, entity)| {
            CategoryRule::new(*pattern, *category, entity.map(str::to_string))
        })
        .collect()
}

/// Initialize a workspace; returns true when this was the first run
pub fn initialize_storage(paths: &WorkspacePaths) -> Result<bool, DashboardError> {
    paths.ensure_directories()?;
    let first_run = !paths.is_initialized();

    if !paths.categories_file().exists() {
        write_json_atomic(
            paths.categories_file(),
            &CategoryData {
                categories: default_categories(),
            },
        )?;
    }

    if !paths.rules_file().exists() {
        write_json_atomic(
            paths.rules_file(),
            &RuleData {
                rules: default_rules(),
            },
        )?;
    }

    if !paths.currencies_file().exists() {
        write_json_atomic(paths.currencies_file(), &CurrencyConfig::default())?;
    }

    if first_run {
        Settings::default().save(paths)?;
        info!(workspace = %paths.base_dir().display(), "initialized new workspace");
    }

    Ok(first_run)
}
