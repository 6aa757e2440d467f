//! Categorization rule model
//!
//! A rule maps a case-insensitive description substring to a category and,
//! optionally, an entity. Rules are stored as an ordered list; their
//! position in that list is the insertion order used to break priority ties.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::RuleId;

/// Longest accepted pattern, in characters
pub const MAX_PATTERN_LEN: usize = 100;

/// A description-matching rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub id: RuleId,

    /// Text to look for in the description
    pub pattern: String,

    /// Category assigned on a match
    pub category: String,

    /// Entity assigned on a match
    #[serde(default)]
    pub entity: Option<String>,

    /// Inactive rules are kept but never match
    #[serde(default = "default_active")]
    pub active: bool,

    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl CategoryRule {
    pub fn new(
        pattern: impl Into<String>,
        category: impl Into<String>,
        entity: Option<String>,
    ) -> Self {
        Self {
            id: RuleId::new(),
            pattern: pattern.into().trim().to_string(),
            category: category.into().trim().to_string(),
            entity: entity
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
            active: true,
            created_at: Utc::now(),
        }
    }

    /// Pattern length in characters, the rule's specificity
    pub fn specificity(&self) -> usize {
        self.pattern.trim().chars().count()
    }

    /// Validate the rule
    pub fn validate(&self) -> Result<(), RuleValidationError> {
        let pattern = self.pattern.trim();
        if pattern.is_empty() {
            return Err(RuleValidationError::EmptyPattern);
        }
        if pattern.chars().count() > MAX_PATTERN_LEN {
            return Err(RuleValidationError::PatternTooLong(pattern.chars().count()));
        }
        if self.category.trim().is_empty() {
            return Err(RuleValidationError::EmptyCategory);
        }
        Ok(())
    }
}

impl fmt::Display for CategoryRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" -> {}", self.pattern, self.category)?;
        if let Some(entity) = &self.entity {
            write!(f, " ({})", entity)?;
        }
        Ok(())
    }
}

/// Validation errors for rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleValidationError {
    EmptyPattern,
    PatternTooLong(usize),
    EmptyCategory,
}

impl fmt::Display for RuleValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPattern => write!(f, "Rule pattern cannot be empty"),
            Self::PatternTooLong(len) => write!(
                f,
                "Rule pattern too long ({} characters, max {})",
                len, MAX_PATTERN_LEN
            ),
            Self::EmptyCategory => write!(f, "Rule category cannot be empty"),
        }
    }
}

impl std::error::Error for RuleValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_fields() {
        let rule = CategoryRule::new(" SASOL ", " Motors/Fuel ", Some("  ".into()));
        assert_eq!(rule.pattern, "SASOL");
        assert_eq!(rule.category, "Motors/Fuel");
        assert_eq!(rule.entity, None);
        assert!(rule.active);
    }

    #[test]
    fn test_specificity_counts_chars() {
        let rule = CategoryRule::new("café", "entertainment", None);
        assert_eq!(rule.specificity(), 4);
    }

    #[test]
    fn test_validation() {
        assert!(CategoryRule::new("spar", "groceries", None).validate().is_ok());
        assert_eq!(
            CategoryRule::new("  ", "groceries", None).validate(),
            Err(RuleValidationError::EmptyPattern)
        );
        assert_eq!(
            CategoryRule::new("spar", "", None).validate(),
            Err(RuleValidationError::EmptyCategory)
        );
        let long = "x".repeat(MAX_PATTERN_LEN + 1);
        assert!(matches!(
            CategoryRule::new(long, "other", None).validate(),
            Err(RuleValidationError::PatternTooLong(_))
        ));
    }

    #[test]
    fn test_display() {
        let rule = CategoryRule::new("SASOL", "Motors/Fuel", Some("Dad".into()));
        assert_eq!(rule.to_string(), "\"SASOL\" -> Motors/Fuel (Dad)");
    }
}
