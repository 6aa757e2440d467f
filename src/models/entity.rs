//! Entity model
//!
//! An entity is a household member or business unit used to attribute
//! spending. It carries no behavior of its own.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of party an entity represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    #[default]
    Person,
    Business,
    Household,
    Savings,
}

impl EntityKind {
    /// All kinds, in menu order
    pub fn all() -> &'static [EntityKind] {
        &[Self::Person, Self::Business, Self::Household, Self::Savings]
    }

    /// Parse a kind from user input (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "person" => Some(Self::Person),
            "business" => Some(Self::Business),
            "household" => Some(Self::Household),
            "savings" => Some(Self::Savings),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Person => write!(f, "person"),
            Self::Business => write!(f, "business"),
            Self::Household => write!(f, "household"),
            Self::Savings => write!(f, "savings"),
        }
    }
}

/// Compare two entity names, ignoring case and surrounding whitespace
///
/// Full Unicode lowercasing, so "Zoë" and "ZOË" are the same entity.
pub fn same_entity_name(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// A grouping key for transactions and budgets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(default)]
    pub kind: EntityKind,
}

impl Entity {
    pub fn new(name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Case-insensitive name comparison
    pub fn is_named(&self, name: &str) -> bool {
        same_entity_name(&self.name, name)
    }

    /// The entities a fresh workspace starts with
    pub fn defaults() -> Vec<Entity> {
        vec![
            Entity::new("Dad", EntityKind::Person),
            Entity::new("Mom", EntityKind::Person),
            Entity::new("Household", EntityKind::Household),
            Entity::new("Business", EntityKind::Business),
            Entity::new("Emergency", EntityKind::Savings),
        ]
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}
