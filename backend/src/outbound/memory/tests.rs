//! Behavioural coverage for the in-memory repositories.

use super::*;
use crate::domain::ports::ImageStore;
use crate::domain::{Price, RecipeLink, RecipeTitle, TimeMinutes, UserName};
use rstest::{fixture, rstest};

fn names(values: &[&str]) -> Option<Vec<String>> {
    Some(values.iter().map(|value| (*value).to_owned()).collect())
}

fn draft(title: &str) -> RecipeDraft {
    RecipeDraft {
        title: RecipeTitle::new(title).expect("title"),
        time_minutes: TimeMinutes::new(10).expect("time"),
        price: Price::from_cents(550),
        description: String::new(),
        link: RecipeLink::default(),
    }
}

fn attributes(tags: &[&str], ingredients: &[&str]) -> AttributeChanges {
    AttributeChanges::from_lists(names(tags), names(ingredients)).expect("valid names")
}

fn tag_names(recipe: &Recipe) -> Vec<&str> {
    recipe.tags.iter().map(|tag| tag.name.as_str()).collect()
}

#[fixture]
fn store() -> MemoryStore {
    MemoryStore::new()
}

#[rstest]
#[tokio::test]
async fn create_reuses_existing_attributes(store: MemoryStore) {
    let owner = UserId::random();
    let first = store
        .create(&owner, &draft("Curry"), &attributes(&["Thai"], &[]))
        .await
        .expect("create");
    let second = store
        .create(&owner, &draft("Soup"), &attributes(&["Thai", "Dinner"], &[]))
        .await
        .expect("create");

    assert_eq!(first.tags[0].id, second.tags[0].id);
    assert_eq!(tag_names(&second), vec!["Thai", "Dinner"]);
    let all = RecipeAttributeRepository::list(&store, &owner, AttributeKind::Tag, false)
        .await
        .expect("list");
    assert_eq!(all.len(), 2);
}

#[rstest]
#[tokio::test]
async fn attributes_are_scoped_per_owner(store: MemoryStore) {
    let alice = UserId::random();
    let bob = UserId::random();
    let mine = store
        .create(&alice, &draft("Curry"), &attributes(&["Thai"], &[]))
        .await
        .expect("create");
    let theirs = store
        .create(&bob, &draft("Curry"), &attributes(&["Thai"], &[]))
        .await
        .expect("create");

    assert_ne!(mine.tags[0].id, theirs.tags[0].id);
    let found = RecipeRepository::find(&store, &bob, mine.id)
        .await
        .expect("find");
    assert!(found.is_none());
}

#[rstest]
#[tokio::test]
async fn update_replaces_only_mentioned_relations(store: MemoryStore) {
    let owner = UserId::random();
    let recipe = store
        .create(&owner, &draft("Curry"), &attributes(&["Thai"], &["Rice"]))
        .await
        .expect("create");

    let changes = AttributeChanges::from_lists(names(&[]), None).expect("plan");
    let updated = store
        .update(&owner, recipe.id, &RecipeChanges::default(), &changes)
        .await
        .expect("update")
        .expect("owned recipe");

    assert!(updated.tags.is_empty());
    assert_eq!(updated.ingredients.len(), 1);
}

#[rstest]
#[tokio::test]
async fn list_is_newest_first_and_filtered(store: MemoryStore) {
    let owner = UserId::random();
    let curry = store
        .create(&owner, &draft("Curry"), &attributes(&["Thai"], &[]))
        .await
        .expect("create");
    let soup = store
        .create(&owner, &draft("Soup"), &attributes(&["Winter"], &[]))
        .await
        .expect("create");

    let all = RecipeRepository::list(&store, &owner, &RecipeFilter::default())
        .await
        .expect("list");
    assert_eq!(
        all.iter().map(|recipe| recipe.id).collect::<Vec<_>>(),
        vec![soup.id, curry.id]
    );

    let filter = RecipeFilter {
        tag_ids: vec![curry.tags[0].id],
        ingredient_ids: Vec::new(),
    };
    let filtered = RecipeRepository::list(&store, &owner, &filter)
        .await
        .expect("list");
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, curry.id);
}

#[rstest]
#[tokio::test]
async fn assigned_only_lists_each_linked_attribute_once(store: MemoryStore) {
    let owner = UserId::random();
    for title in ["Curry", "Soup"] {
        store
            .create(&owner, &draft(title), &attributes(&[], &["Rice"]))
            .await
            .expect("create");
    }
    let orphan = store
        .create(&owner, &draft("Salad"), &attributes(&[], &["Kale"]))
        .await
        .expect("create");
    RecipeRepository::delete(&store, &owner, orphan.id)
        .await
        .expect("delete");

    let assigned =
        RecipeAttributeRepository::list(&store, &owner, AttributeKind::Ingredient, true)
            .await
            .expect("list");
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].name, "Rice");

    let every = RecipeAttributeRepository::list(&store, &owner, AttributeKind::Ingredient, false)
        .await
        .expect("list");
    assert_eq!(every.len(), 2);
}

#[rstest]
#[tokio::test]
async fn rename_rejects_names_in_use(store: MemoryStore) {
    let owner = UserId::random();
    let recipe = store
        .create(&owner, &draft("Curry"), &attributes(&["Thai", "Spicy"], &[]))
        .await
        .expect("create");
    let spicy = recipe.tags[1].id;
    assert_eq!(recipe.tags[1].name, "Spicy");

    let name = AttributeName::new("Thai").expect("name");
    let error = store
        .rename(&owner, AttributeKind::Tag, spicy, &name)
        .await
        .expect_err("duplicate");
    assert!(matches!(
        error,
        RecipeAttributeRepositoryError::DuplicateName { .. }
    ));
}

#[rstest]
#[tokio::test]
async fn deleting_an_attribute_keeps_its_recipes(store: MemoryStore) {
    let owner = UserId::random();
    let recipe = store
        .create(&owner, &draft("Curry"), &attributes(&["Thai"], &[]))
        .await
        .expect("create");

    let removed =
        RecipeAttributeRepository::delete(&store, &owner, AttributeKind::Tag, recipe.tags[0].id)
            .await
            .expect("delete");
    assert!(removed);

    let reloaded = RecipeRepository::find(&store, &owner, recipe.id)
        .await
        .expect("find")
        .expect("recipe survives");
    assert!(reloaded.tags.is_empty());
}

#[rstest]
#[tokio::test]
async fn replace_image_reports_previous_reference(store: MemoryStore) {
    let owner = UserId::random();
    let recipe = store
        .create(&owner, &draft("Curry"), &AttributeChanges::unchanged())
        .await
        .expect("create");

    let first = store
        .replace_image(&owner, recipe.id, "uploads/recipe/a.png")
        .await
        .expect("replace")
        .expect("owned");
    assert_eq!(first.previous, None);

    let second = store
        .replace_image(&owner, recipe.id, "uploads/recipe/b.png")
        .await
        .expect("replace")
        .expect("owned");
    assert_eq!(second.previous.as_deref(), Some("uploads/recipe/a.png"));
    assert_eq!(second.recipe.image.as_deref(), Some("uploads/recipe/b.png"));
}

fn new_user(email: &str) -> NewUser {
    NewUser {
        id: UserId::random(),
        email: EmailAddress::new(email).expect("email"),
        name: UserName::new("Cook").expect("name"),
        password_hash: PasswordHash::from_stored("stored-hash"),
    }
}

#[rstest]
#[tokio::test]
async fn duplicate_emails_are_rejected(store: MemoryStore) {
    store
        .insert(&new_user("cook@example.com"))
        .await
        .expect("insert");
    let error = store
        .insert(&new_user("cook@example.com"))
        .await
        .expect_err("duplicate");
    assert!(matches!(error, UserRepositoryError::DuplicateEmail { .. }));
}

#[rstest]
#[tokio::test]
async fn tokens_are_issued_once_per_user(store: MemoryStore) {
    let user = store
        .insert(&new_user("cook@example.com"))
        .await
        .expect("insert");
    let first = store
        .token_for(&user.id, &AuthToken::generate())
        .await
        .expect("token");
    let second = store
        .token_for(&user.id, &AuthToken::generate())
        .await
        .expect("token");
    assert_eq!(first, second);

    let owner = store
        .find_by_token(&first)
        .await
        .expect("lookup")
        .expect("known token");
    assert_eq!(owner.id, user.id);
}

#[rstest]
#[tokio::test]
async fn image_store_tracks_saved_paths() {
    let images = MemoryImageStore::new();
    images
        .save("uploads/recipe/a.png", b"bytes")
        .await
        .expect("save");
    assert!(images.contains("uploads/recipe/a.png"));
    images.remove("uploads/recipe/a.png").await.expect("remove");
    assert!(images.paths().is_empty());
}
