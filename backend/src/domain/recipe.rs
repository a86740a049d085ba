//! Recipe aggregate and its validated field types.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::attribute::{AttributeId, RecipeAttribute};
use super::user::UserId;

/// Maximum recipe title length, in characters.
pub const TITLE_MAX: usize = 255;
/// Maximum external link length, in characters.
pub const LINK_MAX: usize = 255;
/// Fractional digits kept for prices.
pub const PRICE_SCALE: u32 = 2;
/// Total digits allowed in a price.
pub const PRICE_DIGITS: u32 = 5;

/// Validation errors raised by recipe field constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeValidationError {
    EmptyTitle,
    TitleTooLong { max: usize },
    NegativeTime,
    TimeOutOfRange,
    InvalidPrice,
    NegativePrice,
    PriceTooPrecise { scale: u32 },
    PriceTooLarge { digits: u32 },
    LinkTooLong { max: usize },
}

impl fmt::Display for RecipeValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be blank"),
            Self::TitleTooLong { max } => write!(f, "title must be at most {max} characters"),
            Self::NegativeTime => write!(f, "time_minutes must not be negative"),
            Self::TimeOutOfRange => write!(f, "time_minutes is too large"),
            Self::InvalidPrice => write!(f, "price must be a decimal number"),
            Self::NegativePrice => write!(f, "price must not be negative"),
            Self::PriceTooPrecise { scale } => {
                write!(f, "price must have at most {scale} decimal places")
            }
            Self::PriceTooLarge { digits } => {
                write!(f, "price must have at most {digits} digits in total")
            }
            Self::LinkTooLong { max } => write!(f, "link must be at most {max} characters"),
        }
    }
}

impl std::error::Error for RecipeValidationError {}

impl RecipeValidationError {
    /// Payload field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyTitle | Self::TitleTooLong { .. } => "title",
            Self::NegativeTime | Self::TimeOutOfRange => "time_minutes",
            Self::InvalidPrice
            | Self::NegativePrice
            | Self::PriceTooPrecise { .. }
            | Self::PriceTooLarge { .. } => "price",
            Self::LinkTooLong { .. } => "link",
        }
    }
}

/// Storage-assigned recipe identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeId(i64);

impl RecipeId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trimmed, non-blank recipe title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeTitle(String);

impl RecipeTitle {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, RecipeValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(RecipeValidationError::EmptyTitle);
        }
        if trimmed.chars().count() > TITLE_MAX {
            return Err(RecipeValidationError::TitleTooLong { max: TITLE_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for RecipeTitle {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Non-negative preparation time in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeMinutes(i32);

impl TimeMinutes {
    pub fn new(value: i64) -> Result<Self, RecipeValidationError> {
        if value < 0 {
            return Err(RecipeValidationError::NegativeTime);
        }
        i32::try_from(value)
            .map(Self)
            .map_err(|_| RecipeValidationError::TimeOutOfRange)
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

/// Price with at most five digits, two of them fractional.
///
/// # Examples
/// ```
/// use recipe_backend::domain::Price;
///
/// let price: Price = "5.5".parse().expect("valid price");
/// assert_eq!(price.to_string(), "5.50");
/// assert_eq!(price.cents(), 550);
/// assert!("1000.00".parse::<Price>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Price(Decimal);

impl Price {
    /// Validate a decimal amount.
    pub fn new(amount: Decimal) -> Result<Self, RecipeValidationError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(RecipeValidationError::NegativePrice);
        }
        let normalised = amount.normalize();
        if normalised.scale() > PRICE_SCALE {
            return Err(RecipeValidationError::PriceTooPrecise { scale: PRICE_SCALE });
        }
        let mut scaled = normalised;
        scaled.rescale(PRICE_SCALE);
        let limit = Decimal::new(10_i64.pow(PRICE_DIGITS - PRICE_SCALE), 0);
        if scaled >= limit {
            return Err(RecipeValidationError::PriceTooLarge {
                digits: PRICE_DIGITS,
            });
        }
        Ok(Self(scaled))
    }

    /// Rehydrate a price persisted as whole cents.
    pub fn from_cents(cents: i32) -> Self {
        Self(Decimal::new(i64::from(cents), PRICE_SCALE))
    }

    /// Amount in whole cents.
    pub fn cents(self) -> i32 {
        let mantissa = self.0.mantissa();
        // Construction bounds the amount below 100000 cents.
        i32::try_from(mantissa).unwrap_or(i32::MAX)
    }

    pub fn amount(self) -> Decimal {
        self.0
    }
}

impl FromStr for Price {
    type Err = RecipeValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount =
            Decimal::from_str(s.trim()).map_err(|_| RecipeValidationError::InvalidPrice)?;
        Self::new(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// External link; may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecipeLink(String);

impl RecipeLink {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, RecipeValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.chars().count() > LINK_MAX {
            return Err(RecipeValidationError::LinkTooLong { max: LINK_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for RecipeLink {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Stored recipe with its resolved associations.
///
/// `tags` and `ingredients` are kept in listing order (name descending).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub id: RecipeId,
    pub owner: UserId,
    pub title: String,
    pub time_minutes: i32,
    pub price: Price,
    pub description: String,
    pub link: String,
    pub image: Option<String>,
    pub tags: Vec<RecipeAttribute>,
    pub ingredients: Vec<RecipeAttribute>,
}

impl Recipe {
    /// Whether an image is attached.
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

/// Fields for a new recipe. The owner is supplied separately by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeDraft {
    pub title: RecipeTitle,
    pub time_minutes: TimeMinutes,
    pub price: Price,
    pub description: String,
    pub link: RecipeLink,
}

/// Field updates for an existing recipe; `None` keeps the stored value.
///
/// Ownership never changes, so there is no owner field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecipeChanges {
    pub title: Option<RecipeTitle>,
    pub time_minutes: Option<TimeMinutes>,
    pub price: Option<Price>,
    pub description: Option<String>,
    pub link: Option<RecipeLink>,
}

impl RecipeChanges {
    /// True when no scalar field changes.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.time_minutes.is_none()
            && self.price.is_none()
            && self.description.is_none()
            && self.link.is_none()
    }

    /// Apply the changes to an in-memory recipe.
    pub fn apply_to(&self, recipe: &mut Recipe) {
        if let Some(title) = &self.title {
            recipe.title = title.as_ref().to_owned();
        }
        if let Some(time) = self.time_minutes {
            recipe.time_minutes = time.get();
        }
        if let Some(price) = self.price {
            recipe.price = price;
        }
        if let Some(description) = &self.description {
            recipe.description.clone_from(description);
        }
        if let Some(link) = &self.link {
            recipe.link = link.as_ref().to_owned();
        }
    }
}

/// Optional list filters. A recipe matches when it carries any listed tag
/// and (if given) any listed ingredient.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecipeFilter {
    pub tag_ids: Vec<AttributeId>,
    pub ingredient_ids: Vec<AttributeId>,
}

impl RecipeFilter {
    pub fn is_empty(&self) -> bool {
        self.tag_ids.is_empty() && self.ingredient_ids.is_empty()
    }

    /// Whether `recipe` passes the filter.
    pub fn matches(&self, recipe: &Recipe) -> bool {
        fn any_of(wanted: &[AttributeId], carried: &[RecipeAttribute]) -> bool {
            wanted.is_empty() || carried.iter().any(|attr| wanted.contains(&attr.id))
        }
        any_of(&self.tag_ids, &recipe.tags) && any_of(&self.ingredient_ids, &recipe.ingredients)
    }
}
