//! Rule-based categorizer
//!
//! Matches descriptions against an ordered rule list. The most specific
//! (longest) pattern is tried first; equal lengths keep insertion order.
//! The first rule whose pattern occurs in the description wins.

use crate::models::{CategoryRule, RuleId};

/// Outcome of categorizing one description
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Categorization {
    Matched {
        category: String,
        entity: Option<String>,
        rule_id: RuleId,
    },
    Uncategorized,
}

impl Categorization {
    pub fn is_matched(&self) -> bool {
        matches!(self, Categorization::Matched { .. })
    }

    /// The (category, entity) pair this outcome assigns
    pub fn assignment(&self) -> (Option<String>, Option<String>) {
        match self {
            Categorization::Matched {
                category, entity, ..
            } => (Some(category.clone()), entity.clone()),
            Categorization::Uncategorized => (None, None),
        }
    }
}

struct CompiledRule {
    needle: String,
    category: String,
    entity: Option<String>,
    rule_id: RuleId,
}

/// A rule set prepared for matching
///
/// Built once per rule set and reused across a batch.
pub struct Categorizer {
    rules: Vec<CompiledRule>,
}

impl Categorizer {
    pub fn new(rules: &[CategoryRule]) -> Self {
        let mut active: Vec<&CategoryRule> = rules
            .iter()
            .filter(|r| r.active && !r.pattern.trim().is_empty())
            .collect();

        // sort_by_key is stable, so ties stay in insertion order
        active.sort_by_key(|r| std::cmp::Reverse(r.specificity()));

        let compiled = active
            .into_iter()
            .map(|r| CompiledRule {
                needle: r.pattern.trim().to_lowercase(),
                category: r.category.clone(),
                entity: r.entity.clone(),
                rule_id: r.id,
            })
            .collect();

        Self { rules: compiled }
    }

    pub fn categorize(&self, description: &str) -> Categorization {
        let haystack = description.to_lowercase();
        self.rules
            .iter()
            .find(|r| haystack.contains(&r.needle))
            .map(|r| Categorization::Matched {
                category: r.category.clone(),
                entity: r.entity.clone(),
                rule_id: r.rule_id,
            })
            .unwrap_or(Categorization::Uncategorized)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}
