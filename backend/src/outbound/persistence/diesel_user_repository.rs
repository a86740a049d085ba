//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Covers account rows and the one-per-user API token. Token issuance is a
//! get-or-create: concurrent logins for the same user converge on whichever
//! token was stored first.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{
    NewUser, ProfileUpdate, StoredCredentials, UserRepository, UserRepositoryError,
};
use crate::domain::{AuthToken, EmailAddress, PasswordHash, User, UserId};

use super::diesel_helpers::{is_unique_violation, map_basic_diesel_error, map_basic_pool_error};
use super::models::{CredentialsRow, NewAuthTokenRow, NewUserRow, UserProfileUpdate, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{auth_tokens, users};

/// Diesel-backed implementation of the user repository port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserRepositoryError {
    map_basic_pool_error(error, UserRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> UserRepositoryError {
    map_basic_diesel_error(
        error,
        UserRepositoryError::query,
        UserRepositoryError::connection,
    )
}

fn row_to_user(row: UserRow) -> User {
    User {
        id: UserId::from_uuid(row.id),
        email: row.email,
        name: row.name,
        is_active: row.is_active,
    }
}

fn parse_stored_token(key: &str) -> Result<AuthToken, UserRepositoryError> {
    AuthToken::parse(key)
        .map_err(|err| UserRepositoryError::query(format!("stored token is invalid: {err}")))
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let new_row = NewUserRow {
            id: *user.id.as_uuid(),
            email: user.email.as_ref(),
            name: user.name.as_ref(),
            password_hash: user.password_hash.as_ref(),
        };
        let row: UserRow = diesel::insert_into(users::table)
            .values(&new_row)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|error| {
                if is_unique_violation(&error) {
                    UserRepositoryError::duplicate_email(user.email.to_string())
                } else {
                    map_diesel_error(error)
                }
            })?;
        Ok(row_to_user(row))
    }

    async fn find_credentials(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let address: &str = email.as_ref();
        let row: Option<CredentialsRow> = users::table
            .filter(users::email.eq(address))
            .select(CredentialsRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(|row| StoredCredentials {
            user: row_to_user(row.user),
            password_hash: PasswordHash::from_stored(row.password_hash),
        }))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .find(*id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_user))
    }

    async fn update_profile(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, UserRepositoryError> {
        if update.name.is_none() && update.password_hash.is_none() {
            return self.find_by_id(id).await;
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changeset = UserProfileUpdate {
            name: update.name.as_ref().map(|name| name.as_ref()),
            password_hash: update.password_hash.as_ref().map(|hash| hash.as_ref()),
        };
        let row: Option<UserRow> = diesel::update(users::table.find(*id.as_uuid()))
            .set(&changeset)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_user))
    }

    async fn token_for(
        &self,
        id: &UserId,
        candidate: &AuthToken,
    ) -> Result<AuthToken, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let user_id = *id.as_uuid();
        let new_row = NewAuthTokenRow {
            key: candidate.as_ref(),
            user_id,
        };
        let key: String = conn
            .transaction(|conn| {
                async move {
                    diesel::insert_into(auth_tokens::table)
                        .values(&new_row)
                        .on_conflict(auth_tokens::user_id)
                        .do_nothing()
                        .execute(conn)
                        .await?;
                    auth_tokens::table
                        .filter(auth_tokens::user_id.eq(user_id))
                        .select(auth_tokens::key)
                        .first(conn)
                        .await
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        parse_stored_token(&key)
    }

    async fn find_by_token(&self, token: &AuthToken) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let key: &str = token.as_ref();
        let row: Option<UserRow> = auth_tokens::table
            .inner_join(users::table)
            .filter(auth_tokens::key.eq(key))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_user))
    }
}
