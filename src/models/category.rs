//! Category and Label models
//!
//! Categories form a two-level registry: a category such as "motors" owns
//! labels such as "fuel". Transactions refer to them by path, either
//! `motors` or `motors/fuel`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between a category and its label in a category path
pub const PATH_SEPARATOR: char = '/';

const MAX_NAME_LEN: usize = 50;

/// A sub-category inside a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_active")]
    pub active: bool,
}

impl Label {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: normalize_name(&name.into()),
            description: description.into(),
            active: true,
        }
    }
}

/// A top-level spending or income category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub labels: Vec<Label>,

    #[serde(default = "default_active")]
    pub active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Category {
    /// Create a new category; the name is normalized to lowercase snake case
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: normalize_name(&name.into()),
            description: description.into(),
            labels: Vec::new(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder-style label addition used for seeding
    pub fn with_label(mut self, name: &str, description: &str) -> Self {
        self.labels.push(Label::new(name, description));
        self
    }

    pub fn label(&self, name: &str) -> Option<&Label> {
        let name = normalize_name(name);
        self.labels.iter().find(|l| l.name == name)
    }

    pub fn label_mut(&mut self, name: &str) -> Option<&mut Label> {
        let name = normalize_name(name);
        self.labels.iter_mut().find(|l| l.name == name)
    }

    pub fn active_label_count(&self) -> usize {
        self.labels.iter().filter(|l| l.active).count()
    }

    /// Validate the category and its labels
    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        validate_name(&self.name)?;
        for label in &self.labels {
            validate_name(&label.name)?;
        }
        Ok(())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Lowercase, trimmed, inner whitespace replaced by underscores
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// Validate a category or label name
pub fn validate_name(name: &str) -> Result<(), CategoryValidationError> {
    if name.trim().is_empty() {
        return Err(CategoryValidationError::EmptyName);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CategoryValidationError::NameTooLong(name.chars().count()));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '&')))
    {
        return Err(CategoryValidationError::InvalidCharacter(c));
    }
    Ok(())
}

/// Split a category path into its category and optional label
pub fn split_path(path: &str) -> (&str, Option<&str>) {
    match path.split_once(PATH_SEPARATOR) {
        Some((category, label)) => (category.trim(), Some(label.trim())),
        None => (path.trim(), None),
    }
}

/// Whether a category filter covers a transaction category
///
/// `motors` covers `motors` and `motors/fuel`; `motors/fuel` covers only
/// itself. Comparison is case-insensitive.
pub fn category_matches(filter: &str, category: &str) -> bool {
    let filter = filter.trim();
    let category = category.trim();
    if filter.eq_ignore_ascii_case(category) {
        return true;
    }
    let prefix_len = filter.len();
    category.len() > prefix_len
        && category.is_char_boundary(prefix_len)
        && category[..prefix_len].eq_ignore_ascii_case(filter)
        && category[prefix_len..].starts_with(PATH_SEPARATOR)
}

/// Validation errors for categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryValidationError {
    EmptyName,
    NameTooLong(usize),
    InvalidCharacter(char),
}

impl fmt::Display for CategoryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Category name cannot be empty"),
            Self::NameTooLong(len) => write!(
                f,
                "Category name too long ({} characters, max {})",
                len, MAX_NAME_LEN
            ),
            Self::InvalidCharacter(c) => {
                write!(f, "Category name contains invalid character '{}'", c)
            }
        }
    }
}

impl std::error::Error for CategoryValidationError {}
