//! In-process adapters used when no database is configured and by the HTTP
//! tests.
//!
//! [`MemoryStore`] implements all three repository ports over one mutex, so a
//! recipe write and its attribute reconciliation are applied atomically just
//! like the Diesel transactions. A poisoned lock surfaces as a query error.

mod images;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{
    DeletedRecipe, ImageReplacement, NewUser, ProfileUpdate, RecipeAttributeRepository,
    RecipeAttributeRepositoryError, RecipeRepository, RecipeRepositoryError, StoredCredentials,
    UserRepository, UserRepositoryError,
};
use crate::domain::{
    AttributeChanges, AttributeId, AttributeKind, AttributeName, AuthToken, EmailAddress,
    PasswordHash, Recipe, RecipeAttribute, RecipeChanges, RecipeDraft, RecipeFilter, RecipeId,
    User, UserId, sort_for_listing,
};

pub use images::MemoryImageStore;

const POISONED: &str = "memory store lock poisoned";

struct UserRecord {
    user: User,
    password_hash: PasswordHash,
}

#[derive(Default)]
struct State {
    users: BTreeMap<UserId, UserRecord>,
    tokens: BTreeMap<UserId, AuthToken>,
    /// Recipes without their associations; those are resolved from `links`.
    recipes: BTreeMap<i64, Recipe>,
    attributes: BTreeMap<i64, RecipeAttribute>,
    /// `(recipe id, attribute id)` pairs.
    links: BTreeSet<(i64, i64)>,
    last_recipe_id: i64,
    last_attribute_id: i64,
}

impl State {
    fn owned_recipe(&self, owner: &UserId, id: RecipeId) -> Option<&Recipe> {
        self.recipes
            .get(&id.get())
            .filter(|recipe| recipe.owner == *owner)
    }

    fn owned_attribute(
        &self,
        owner: &UserId,
        kind: AttributeKind,
        id: AttributeId,
    ) -> Option<&RecipeAttribute> {
        self.attributes
            .get(&id.get())
            .filter(|attr| attr.owner == *owner && attr.kind == kind)
    }

    fn hydrate(&self, recipe: &Recipe) -> Recipe {
        let mut hydrated = recipe.clone();
        let recipe_id = recipe.id.get();
        let linked = self
            .links
            .range((recipe_id, i64::MIN)..=(recipe_id, i64::MAX))
            .filter_map(|(_, attribute_id)| self.attributes.get(attribute_id));
        for attribute in linked {
            match attribute.kind {
                AttributeKind::Tag => hydrated.tags.push(attribute.clone()),
                AttributeKind::Ingredient => hydrated.ingredients.push(attribute.clone()),
            }
        }
        sort_for_listing(&mut hydrated.tags);
        sort_for_listing(&mut hydrated.ingredients);
        hydrated
    }

    fn find_or_create(&mut self, owner: &UserId, kind: AttributeKind, name: &AttributeName) -> i64 {
        let wanted: &str = name.as_ref();
        let existing = self
            .attributes
            .values()
            .find(|attr| attr.owner == *owner && attr.kind == kind && attr.name == wanted);
        if let Some(attribute) = existing {
            return attribute.id.get();
        }
        self.last_attribute_id += 1;
        let id = self.last_attribute_id;
        self.attributes.insert(
            id,
            RecipeAttribute {
                id: AttributeId::new(id),
                owner: *owner,
                kind,
                name: wanted.to_owned(),
            },
        );
        id
    }

    fn reconcile(&mut self, owner: &UserId, recipe_id: i64, attributes: &AttributeChanges) {
        for (kind, names) in attributes.replacements() {
            let resolved: Vec<i64> = names
                .iter()
                .map(|name| self.find_or_create(owner, kind, name))
                .collect();
            let attributes = &self.attributes;
            self.links.retain(|&(linked_recipe, attribute_id)| {
                linked_recipe != recipe_id
                    || attributes
                        .get(&attribute_id)
                        .is_none_or(|attr| attr.kind != kind)
            });
            self.links
                .extend(resolved.into_iter().map(|attribute_id| (recipe_id, attribute_id)));
        }
    }
}

/// Shared in-memory implementation of the repository ports.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, &'static str> {
        self.state.lock().map_err(|_| POISONED)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError> {
        let mut state = self.lock().map_err(UserRepositoryError::query)?;
        let email: &str = user.email.as_ref();
        let taken = state.users.values().any(|record| record.user.email == email);
        if taken {
            return Err(UserRepositoryError::duplicate_email(user.email.to_string()));
        }
        let stored = User {
            id: user.id,
            email: email.to_owned(),
            name: user.name.as_ref().to_owned(),
            is_active: true,
        };
        state.users.insert(
            user.id,
            UserRecord {
                user: stored.clone(),
                password_hash: user.password_hash.clone(),
            },
        );
        Ok(stored)
    }

    async fn find_credentials(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError> {
        let state = self.lock().map_err(UserRepositoryError::query)?;
        let email: &str = email.as_ref();
        Ok(state
            .users
            .values()
            .find(|record| record.user.email == email)
            .map(|record| StoredCredentials {
                user: record.user.clone(),
                password_hash: record.password_hash.clone(),
            }))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let state = self.lock().map_err(UserRepositoryError::query)?;
        Ok(state.users.get(id).map(|record| record.user.clone()))
    }

    async fn update_profile(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut state = self.lock().map_err(UserRepositoryError::query)?;
        let Some(record) = state.users.get_mut(id) else {
            return Ok(None);
        };
        if let Some(name) = &update.name {
            record.user.name = name.as_ref().to_owned();
        }
        if let Some(hash) = &update.password_hash {
            record.password_hash = hash.clone();
        }
        Ok(Some(record.user.clone()))
    }

    async fn token_for(
        &self,
        id: &UserId,
        candidate: &AuthToken,
    ) -> Result<AuthToken, UserRepositoryError> {
        let mut state = self.lock().map_err(UserRepositoryError::query)?;
        Ok(state
            .tokens
            .entry(*id)
            .or_insert_with(|| candidate.clone())
            .clone())
    }

    async fn find_by_token(&self, token: &AuthToken) -> Result<Option<User>, UserRepositoryError> {
        let state = self.lock().map_err(UserRepositoryError::query)?;
        Ok(state
            .tokens
            .iter()
            .find(|(_, stored)| *stored == token)
            .and_then(|(user_id, _)| state.users.get(user_id))
            .map(|record| record.user.clone()))
    }
}

#[async_trait]
impl RecipeRepository for MemoryStore {
    async fn list(
        &self,
        owner: &UserId,
        filter: &RecipeFilter,
    ) -> Result<Vec<Recipe>, RecipeRepositoryError> {
        let state = self.lock().map_err(RecipeRepositoryError::query)?;
        Ok(state
            .recipes
            .values()
            .rev()
            .filter(|recipe| recipe.owner == *owner)
            .map(|recipe| state.hydrate(recipe))
            .filter(|recipe| filter.matches(recipe))
            .collect())
    }

    async fn find(
        &self,
        owner: &UserId,
        id: RecipeId,
    ) -> Result<Option<Recipe>, RecipeRepositoryError> {
        let state = self.lock().map_err(RecipeRepositoryError::query)?;
        Ok(state
            .owned_recipe(owner, id)
            .map(|recipe| state.hydrate(recipe)))
    }

    async fn create(
        &self,
        owner: &UserId,
        draft: &RecipeDraft,
        attributes: &AttributeChanges,
    ) -> Result<Recipe, RecipeRepositoryError> {
        let mut state = self.lock().map_err(RecipeRepositoryError::query)?;
        state.last_recipe_id += 1;
        let id = state.last_recipe_id;
        let recipe = Recipe {
            id: RecipeId::new(id),
            owner: *owner,
            title: draft.title.as_ref().to_owned(),
            time_minutes: draft.time_minutes.get(),
            price: draft.price,
            description: draft.description.clone(),
            link: draft.link.as_ref().to_owned(),
            image: None,
            tags: Vec::new(),
            ingredients: Vec::new(),
        };
        state.recipes.insert(id, recipe);
        state.reconcile(owner, id, attributes);
        let stored = &state.recipes[&id];
        Ok(state.hydrate(stored))
    }

    async fn update(
        &self,
        owner: &UserId,
        id: RecipeId,
        changes: &RecipeChanges,
        attributes: &AttributeChanges,
    ) -> Result<Option<Recipe>, RecipeRepositoryError> {
        let mut state = self.lock().map_err(RecipeRepositoryError::query)?;
        if state.owned_recipe(owner, id).is_none() {
            return Ok(None);
        }
        if let Some(recipe) = state.recipes.get_mut(&id.get()) {
            changes.apply_to(recipe);
        }
        state.reconcile(owner, id.get(), attributes);
        Ok(state
            .recipes
            .get(&id.get())
            .map(|recipe| state.hydrate(recipe)))
    }

    async fn delete(
        &self,
        owner: &UserId,
        id: RecipeId,
    ) -> Result<Option<DeletedRecipe>, RecipeRepositoryError> {
        let mut state = self.lock().map_err(RecipeRepositoryError::query)?;
        if state.owned_recipe(owner, id).is_none() {
            return Ok(None);
        }
        let removed = state.recipes.remove(&id.get());
        let recipe_id = id.get();
        state.links.retain(|&(linked, _)| linked != recipe_id);
        Ok(removed.map(|recipe| DeletedRecipe {
            id,
            image: recipe.image,
        }))
    }

    async fn replace_image(
        &self,
        owner: &UserId,
        id: RecipeId,
        image: &str,
    ) -> Result<Option<ImageReplacement>, RecipeRepositoryError> {
        let mut state = self.lock().map_err(RecipeRepositoryError::query)?;
        if state.owned_recipe(owner, id).is_none() {
            return Ok(None);
        }
        let Some(recipe) = state.recipes.get_mut(&id.get()) else {
            return Ok(None);
        };
        let previous = recipe.image.replace(image.to_owned());
        let recipe = recipe.clone();
        Ok(Some(ImageReplacement {
            recipe: state.hydrate(&recipe),
            previous,
        }))
    }
}

#[async_trait]
impl RecipeAttributeRepository for MemoryStore {
    async fn list(
        &self,
        owner: &UserId,
        kind: AttributeKind,
        assigned_only: bool,
    ) -> Result<Vec<RecipeAttribute>, RecipeAttributeRepositoryError> {
        let state = self.lock().map_err(RecipeAttributeRepositoryError::query)?;
        let assigned: BTreeSet<i64> = state.links.iter().map(|&(_, attr)| attr).collect();
        let mut attributes: Vec<RecipeAttribute> = state
            .attributes
            .values()
            .filter(|attr| attr.owner == *owner && attr.kind == kind)
            .filter(|attr| !assigned_only || assigned.contains(&attr.id.get()))
            .cloned()
            .collect();
        sort_for_listing(&mut attributes);
        Ok(attributes)
    }

    async fn rename(
        &self,
        owner: &UserId,
        kind: AttributeKind,
        id: AttributeId,
        name: &AttributeName,
    ) -> Result<Option<RecipeAttribute>, RecipeAttributeRepositoryError> {
        let mut state = self.lock().map_err(RecipeAttributeRepositoryError::query)?;
        if state.owned_attribute(owner, kind, id).is_none() {
            return Ok(None);
        }
        let wanted: &str = name.as_ref();
        let clash = state.attributes.values().any(|attr| {
            attr.id != id && attr.owner == *owner && attr.kind == kind && attr.name == wanted
        });
        if clash {
            return Err(RecipeAttributeRepositoryError::duplicate_name(wanted));
        }
        Ok(state.attributes.get_mut(&id.get()).map(|attr| {
            attr.name = wanted.to_owned();
            attr.clone()
        }))
    }

    async fn delete(
        &self,
        owner: &UserId,
        kind: AttributeKind,
        id: AttributeId,
    ) -> Result<bool, RecipeAttributeRepositoryError> {
        let mut state = self.lock().map_err(RecipeAttributeRepositoryError::query)?;
        if state.owned_attribute(owner, kind, id).is_none() {
            return Ok(false);
        }
        state.attributes.remove(&id.get());
        let attribute_id = id.get();
        state.links.retain(|&(_, linked)| linked != attribute_id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests;
