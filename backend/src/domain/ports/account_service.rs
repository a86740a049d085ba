//! Driving port for registration, token issuance and profile management.

use async_trait::async_trait;

use crate::domain::{
    AuthToken, EmailAddress, Error, LoginCredentials, Password, User, UserId, UserName,
};

/// Request to register a new account.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub email: EmailAddress,
    pub name: UserName,
    pub password: Password,
}

/// Profile changes requested by the account owner.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<UserName>,
    pub password: Option<Password>,
}

/// Port for account use-cases.
#[async_trait]
pub trait AccountService: Send + Sync {
    async fn register(&self, request: RegisterRequest) -> Result<User, Error>;

    /// Verify credentials and return the account's API token, creating it on
    /// first use.
    async fn issue_token(&self, credentials: LoginCredentials) -> Result<AuthToken, Error>;

    /// Resolve an API token to an active account or fail with `Unauthorized`.
    async fn authenticate(&self, token: &AuthToken) -> Result<User, Error>;

    async fn profile(&self, user_id: &UserId) -> Result<User, Error>;

    async fn update_profile(&self, user_id: &UserId, changes: ProfileChanges)
    -> Result<User, Error>;
}
