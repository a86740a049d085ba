//! Nested tag/ingredient reconciliation rules.
//!
//! A recipe write may carry `tags` and `ingredients` lists of `{name}`
//! items. Each list is normalised here into an [`AssociationChange`]; the
//! persistence adapters then find-or-create each name for the owner and
//! replace the recipe's association with exactly the resolved set, inside
//! the same transaction as the recipe write.
//!
//! - An absent list means "leave the association alone".
//! - An empty list clears the association.
//! - Duplicate names collapse; names are resolved in sorted order so
//!   repeated writes with the same input are idempotent.

use std::collections::BTreeSet;

use serde_json::json;

use super::attribute::{AttributeKind, AttributeName};
use super::error::Error;

/// What a recipe write does to one attribute relation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AssociationChange {
    /// Keep the current association untouched.
    #[default]
    Unchanged,
    /// Replace the association with exactly these names (sorted, unique).
    Replace(Vec<AttributeName>),
}

impl AssociationChange {
    /// Normalise an optional list of raw names.
    ///
    /// # Examples
    /// ```
    /// use recipe_backend::domain::{AssociationChange, AttributeKind};
    ///
    /// let change = AssociationChange::from_names(
    ///     AttributeKind::Tag,
    ///     Some(vec!["Thai".to_owned(), " Thai ".to_owned()]),
    /// )
    /// .expect("valid names");
    /// assert_eq!(change.names().map(<[_]>::len), Some(1));
    ///
    /// let untouched = AssociationChange::from_names(AttributeKind::Tag, None).unwrap();
    /// assert_eq!(untouched, AssociationChange::Unchanged);
    /// ```
    pub fn from_names(kind: AttributeKind, names: Option<Vec<String>>) -> Result<Self, Error> {
        let Some(names) = names else {
            return Ok(Self::Unchanged);
        };
        let mut unique = BTreeSet::new();
        for (index, raw) in names.iter().enumerate() {
            let name = AttributeName::new(raw).map_err(|error| {
                Error::invalid_request(format!("{}: {error}", kind.field_name())).with_details(
                    json!({
                        "field": kind.field_name(),
                        "index": index,
                        "code": "invalid_name",
                    }),
                )
            })?;
            unique.insert(name);
        }
        Ok(Self::Replace(unique.into_iter().collect()))
    }

    /// Names to resolve, or `None` when the relation is left untouched.
    pub fn names(&self) -> Option<&[AttributeName]> {
        match self {
            Self::Unchanged => None,
            Self::Replace(names) => Some(names.as_slice()),
        }
    }
}

/// Reconciliation plan for both attribute relations of a recipe write.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttributeChanges {
    pub tags: AssociationChange,
    pub ingredients: AssociationChange,
}

impl AttributeChanges {
    /// Plan that leaves both relations untouched.
    pub fn unchanged() -> Self {
        Self::default()
    }

    /// Build a plan from raw tag and ingredient name lists.
    pub fn from_lists(
        tags: Option<Vec<String>>,
        ingredients: Option<Vec<String>>,
    ) -> Result<Self, Error> {
        Ok(Self {
            tags: AssociationChange::from_names(AttributeKind::Tag, tags)?,
            ingredients: AssociationChange::from_names(AttributeKind::Ingredient, ingredients)?,
        })
    }

    /// Change for the relation of `kind`.
    pub fn for_kind(&self, kind: AttributeKind) -> &AssociationChange {
        match kind {
            AttributeKind::Tag => &self.tags,
            AttributeKind::Ingredient => &self.ingredients,
        }
    }

    /// Iterate `(kind, names)` for every relation that must be replaced.
    pub fn replacements(&self) -> impl Iterator<Item = (AttributeKind, &[AttributeName])> {
        AttributeKind::ALL
            .into_iter()
            .filter_map(|kind| self.for_kind(kind).names().map(|names| (kind, names)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    fn names(values: &[&str]) -> Option<Vec<String>> {
        Some(values.iter().map(|value| (*value).to_owned()).collect())
    }

    fn plain(change: &AssociationChange) -> Vec<&str> {
        change
            .names()
            .expect("replacement")
            .iter()
            .map(AsRef::as_ref)
            .collect()
    }

    #[rstest]
    fn absent_list_leaves_relation_untouched() {
        let change = AssociationChange::from_names(AttributeKind::Tag, None).expect("valid");
        assert_eq!(change, AssociationChange::Unchanged);
        assert!(change.names().is_none());
    }

    #[rstest]
    fn empty_list_clears_relation() {
        let change = AssociationChange::from_names(AttributeKind::Tag, names(&[])).expect("valid");
        assert_eq!(change, AssociationChange::Replace(Vec::new()));
    }

    #[rstest]
    fn duplicates_collapse_after_trimming() {
        let change =
            AssociationChange::from_names(AttributeKind::Tag, names(&["Thai", "Thai", " Thai"]))
                .expect("valid");
        assert_eq!(plain(&change), ["Thai"]);
    }

    #[rstest]
    fn comparison_is_case_sensitive() {
        let change = AssociationChange::from_names(AttributeKind::Tag, names(&["thai", "Thai"]))
            .expect("valid");
        assert_eq!(plain(&change), ["Thai", "thai"]);
    }

    #[rstest]
    fn resolution_order_is_independent_of_input_order() {
        let first = AssociationChange::from_names(
            AttributeKind::Ingredient,
            names(&["Prawn", "Noodles", "Lime"]),
        )
        .expect("valid");
        let second = AssociationChange::from_names(
            AttributeKind::Ingredient,
            names(&["Lime", "Prawn", "Noodles"]),
        )
        .expect("valid");
        assert_eq!(first, second);
        assert_eq!(plain(&first), ["Lime", "Noodles", "Prawn"]);
    }

    #[rstest]
    fn blank_name_rejects_whole_list_with_index() {
        let err = AssociationChange::from_names(
            AttributeKind::Ingredient,
            names(&["Salt", "  "]),
        )
        .expect_err("blank name");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        let details = err.details().expect("details");
        assert_eq!(details["field"], "ingredients");
        assert_eq!(details["index"], 1);
    }

    #[rstest]
    fn replacements_skip_untouched_relations() {
        let changes = AttributeChanges::from_lists(None, names(&["Salt"])).expect("valid");
        let kinds: Vec<_> = changes.replacements().map(|(kind, _)| kind).collect();
        assert_eq!(kinds, [AttributeKind::Ingredient]);
        assert!(AttributeChanges::unchanged().replacements().next().is_none());
    }
}
