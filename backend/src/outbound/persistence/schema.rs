//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts. E-mail addresses are unique.
    users (id) {
        id -> Uuid,
        email -> Varchar,
        name -> Varchar,
        /// Argon2 PHC string.
        password_hash -> Text,
        is_active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One API token per user, created on first issuance.
    auth_tokens (key) {
        key -> Varchar,
        user_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Recipes; every row belongs to exactly one user.
    recipes (id) {
        id -> Int8,
        user_id -> Uuid,
        title -> Varchar,
        time_minutes -> Int4,
        /// Price in hundredths.
        price_cents -> Int4,
        description -> Text,
        link -> Varchar,
        /// Media-root-relative image path.
        image -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Tags and ingredients, unique per `(user_id, kind, name)`.
    recipe_attributes (id) {
        id -> Int8,
        user_id -> Uuid,
        /// `tag` or `ingredient`.
        kind -> Varchar,
        /// Stored with the `C` collation so ordering is code-point order.
        name -> Varchar,
    }
}

diesel::table! {
    /// Many-to-many association between recipes and attributes.
    recipe_attribute_links (recipe_id, attribute_id) {
        recipe_id -> Int8,
        attribute_id -> Int8,
    }
}

diesel::joinable!(auth_tokens -> users (user_id));
diesel::joinable!(recipes -> users (user_id));
diesel::joinable!(recipe_attributes -> users (user_id));
diesel::joinable!(recipe_attribute_links -> recipes (recipe_id));
diesel::joinable!(recipe_attribute_links -> recipe_attributes (attribute_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    auth_tokens,
    recipes,
    recipe_attributes,
    recipe_attribute_links,
);
