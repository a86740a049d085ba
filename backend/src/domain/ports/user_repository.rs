//! Port abstraction for account and API token persistence.

use async_trait::async_trait;

use crate::domain::{AuthToken, EmailAddress, PasswordHash, User, UserId, UserName};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "user repository query failed: {message}",
        /// Another account already uses the e-mail address.
        DuplicateEmail { email: String } =>
            "email already registered: {email}",
    }
}

/// Account row to insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: UserId,
    pub email: EmailAddress,
    pub name: UserName,
    pub password_hash: PasswordHash,
}

/// Account together with its stored password hash.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub user: User,
    pub password_hash: PasswordHash,
}

/// Profile fields to update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<UserName>,
    pub password_hash: Option<PasswordHash>,
}

/// Port for account storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account.
    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError>;

    /// Look up credentials by normalised e-mail address.
    async fn find_credentials(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError>;

    /// Fetch an account by id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Apply a profile update; `None` when the account does not exist.
    async fn update_profile(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, UserRepositoryError>;

    /// Return the user's token, storing `candidate` if they have none yet.
    async fn token_for(
        &self,
        id: &UserId,
        candidate: &AuthToken,
    ) -> Result<AuthToken, UserRepositoryError>;

    /// Resolve the account owning `token`.
    async fn find_by_token(&self, token: &AuthToken) -> Result<Option<User>, UserRepositoryError>;
}
