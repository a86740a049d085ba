//! Tags and ingredients: the two kinds of owner-scoped recipe attribute.
//!
//! Both kinds share one shape (`id`, owner, `name`) and one invariant: names
//! are unique per `(owner, kind)` with exact, case-sensitive comparison.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::user::UserId;

/// Maximum attribute name length, in characters.
pub const ATTRIBUTE_NAME_MAX: usize = 255;

/// Which relation an attribute belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Tag,
    Ingredient,
}

impl AttributeKind {
    /// All kinds, in a stable order.
    pub const ALL: [Self; 2] = [Self::Tag, Self::Ingredient];

    /// Storage discriminator.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::Ingredient => "ingredient",
        }
    }

    /// Parse the storage discriminator back into a kind.
    pub fn from_storage(value: &str) -> Option<Self> {
        match value {
            "tag" => Some(Self::Tag),
            "ingredient" => Some(Self::Ingredient),
            _ => None,
        }
    }

    /// Plural field name used in recipe payloads.
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Tag => "tags",
            Self::Ingredient => "ingredients",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage-assigned attribute identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeId(i64);

impl AttributeId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation errors raised by [`AttributeName::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValidationError {
    EmptyName,
    NameTooLong { max: usize },
}

impl fmt::Display for AttributeValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be blank"),
            Self::NameTooLong { max } => write!(f, "name must be at most {max} characters"),
        }
    }
}

impl std::error::Error for AttributeValidationError {}

/// Trimmed, non-blank attribute name.
///
/// Ordering is plain code-point order so every adapter sorts the same way.
///
/// # Examples
/// ```
/// use recipe_backend::domain::AttributeName;
///
/// let name = AttributeName::new("  Thai ").expect("valid name");
/// assert_eq!(name.as_ref(), "Thai");
/// assert!(AttributeName::new("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeName(String);

impl AttributeName {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, AttributeValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(AttributeValidationError::EmptyName);
        }
        if trimmed.chars().count() > ATTRIBUTE_NAME_MAX {
            return Err(AttributeValidationError::NameTooLong {
                max: ATTRIBUTE_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for AttributeName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for AttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored tag or ingredient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeAttribute {
    pub id: AttributeId,
    pub owner: UserId,
    pub kind: AttributeKind,
    pub name: String,
}

/// Listing order for attributes: name descending (code-point order), then
/// id descending so equal names from different kinds stay deterministic.
pub fn listing_order(left: &RecipeAttribute, right: &RecipeAttribute) -> Ordering {
    right
        .name
        .cmp(&left.name)
        .then_with(|| right.id.cmp(&left.id))
}

/// Sort attributes into listing order in place.
pub fn sort_for_listing(attributes: &mut [RecipeAttribute]) {
    attributes.sort_by(listing_order);
}
