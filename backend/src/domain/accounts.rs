//! Account domain service: registration, token issuance and profiles.
//!
//! Password hashing and verification are CPU bound and run on the blocking
//! pool. Tokens are created lazily on first issuance and reused afterwards.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::domain::ports::{
    AccountService, NewUser, ProfileChanges, ProfileUpdate, RegisterRequest, UserRepository,
    UserRepositoryError,
};
use crate::domain::{AuthToken, Error, LoginCredentials, Password, PasswordHash, User, UserId};

const BAD_CREDENTIALS: &str = "unable to authenticate with provided credentials";

/// Account service implementing [`AccountService`].
#[derive(Clone)]
pub struct UserAccounts<U> {
    users: Arc<U>,
}

impl<U> UserAccounts<U> {
    /// Create a new service backed by `users`.
    pub fn new(users: Arc<U>) -> Self {
        Self { users }
    }
}

impl<U> UserAccounts<U>
where
    U: UserRepository,
{
    fn map_repository_error(error: UserRepositoryError) -> Error {
        match error {
            UserRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("user repository unavailable: {message}"))
            }
            UserRepositoryError::Query { message } => {
                Error::internal(format!("user repository error: {message}"))
            }
            UserRepositoryError::DuplicateEmail { email } => {
                Error::invalid_request("user with this email already exists").with_details(
                    json!({
                        "field": "email",
                        "value": email,
                        "code": "duplicate_email",
                    }),
                )
            }
        }
    }

    async fn hash_password(password: Password) -> Result<PasswordHash, Error> {
        tokio::task::spawn_blocking(move || PasswordHash::create(&password))
            .await
            .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))?
            .map_err(|err| Error::internal(err.to_string()))
    }

    async fn verify_password(
        hash: PasswordHash,
        credentials: LoginCredentials,
    ) -> Result<bool, Error> {
        tokio::task::spawn_blocking(move || hash.verify(credentials.password()))
            .await
            .map_err(|err| Error::internal(format!("password verification task failed: {err}")))
    }

    fn user_not_found() -> Error {
        Error::not_found("user not found")
    }
}

#[async_trait]
impl<U> AccountService for UserAccounts<U>
where
    U: UserRepository,
{
    async fn register(&self, request: RegisterRequest) -> Result<User, Error> {
        let RegisterRequest {
            email,
            name,
            password,
        } = request;
        let password_hash = Self::hash_password(password).await?;
        let user = self
            .users
            .insert(&NewUser {
                id: UserId::random(),
                email,
                name,
                password_hash,
            })
            .await
            .map_err(Self::map_repository_error)?;
        debug!(user_id = %user.id, "registered account");
        Ok(user)
    }

    async fn issue_token(&self, credentials: LoginCredentials) -> Result<AuthToken, Error> {
        let Some(stored) = self
            .users
            .find_credentials(credentials.email())
            .await
            .map_err(Self::map_repository_error)?
        else {
            return Err(Error::invalid_request(BAD_CREDENTIALS));
        };
        if !stored.user.is_active {
            return Err(Error::invalid_request(BAD_CREDENTIALS));
        }
        if !Self::verify_password(stored.password_hash, credentials).await? {
            return Err(Error::invalid_request(BAD_CREDENTIALS));
        }
        self.users
            .token_for(&stored.user.id, &AuthToken::generate())
            .await
            .map_err(Self::map_repository_error)
    }

    async fn authenticate(&self, token: &AuthToken) -> Result<User, Error> {
        match self
            .users
            .find_by_token(token)
            .await
            .map_err(Self::map_repository_error)?
        {
            Some(user) if user.is_active => Ok(user),
            Some(_) => Err(Error::unauthorized("user inactive or deleted")),
            None => Err(Error::unauthorized("invalid token")),
        }
    }

    async fn profile(&self, user_id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(Self::map_repository_error)?
            .ok_or_else(Self::user_not_found)
    }

    async fn update_profile(
        &self,
        user_id: &UserId,
        changes: ProfileChanges,
    ) -> Result<User, Error> {
        let password_hash = match changes.password {
            Some(password) => Some(Self::hash_password(password).await?),
            None => None,
        };
        let update = ProfileUpdate {
            name: changes.name,
            password_hash,
        };
        self.users
            .update_profile(user_id, &update)
            .await
            .map_err(Self::map_repository_error)?
            .ok_or_else(Self::user_not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockUserRepository, StoredCredentials};
    use crate::domain::{EmailAddress, ErrorCode, UserName};
    use rstest::{fixture, rstest};

    fn account(is_active: bool) -> User {
        User {
            id: UserId::random(),
            email: "cook@example.com".to_owned(),
            name: "Cook".to_owned(),
            is_active,
        }
    }

    fn stored(user: User, password: &str) -> StoredCredentials {
        let password = Password::new(password).expect("password");
        StoredCredentials {
            user,
            password_hash: PasswordHash::create(&password).expect("hash"),
        }
    }

    #[fixture]
    fn credentials() -> LoginCredentials {
        LoginCredentials::try_from_parts("cook@example.com", "secret123").expect("credentials")
    }

    fn accounts(repo: MockUserRepository) -> UserAccounts<MockUserRepository> {
        UserAccounts::new(Arc::new(repo))
    }

    #[tokio::test]
    async fn register_stores_a_hash_not_the_password() {
        let mut repo = MockUserRepository::new();
        repo.expect_insert()
            .withf(|new_user| new_user.password_hash.verify("secret123"))
            .times(1)
            .return_once(|new_user| {
                Ok(User {
                    id: new_user.id,
                    email: new_user.email.to_string(),
                    name: new_user.name.as_ref().to_owned(),
                    is_active: true,
                })
            });

        let user = accounts(repo)
            .register(RegisterRequest {
                email: EmailAddress::new("cook@example.com").expect("email"),
                name: UserName::new("Cook").expect("name"),
                password: Password::new("secret123").expect("password"),
            })
            .await
            .expect("registered");
        assert_eq!(user.email, "cook@example.com");
        assert!(user.is_active);
    }

    #[tokio::test]
    async fn register_duplicate_email_is_invalid_request() {
        let mut repo = MockUserRepository::new();
        repo.expect_insert()
            .times(1)
            .return_once(|new_user| {
                Err(UserRepositoryError::duplicate_email(new_user.email.to_string()))
            });

        let error = accounts(repo)
            .register(RegisterRequest {
                email: EmailAddress::new("cook@example.com").expect("email"),
                name: UserName::new("Cook").expect("name"),
                password: Password::new("secret123").expect("password"),
            })
            .await
            .expect_err("duplicate");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
        assert_eq!(error.details().expect("details")["field"], "email");
    }

    #[rstest]
    #[tokio::test]
    async fn issue_token_returns_existing_or_new_token(credentials: LoginCredentials) {
        let user = account(true);
        let user_id = user.id;
        let mut repo = MockUserRepository::new();
        repo.expect_find_credentials()
            .times(1)
            .return_once(move |_| Ok(Some(stored(user, "secret123"))));
        repo.expect_token_for()
            .withf(move |id, _| *id == user_id)
            .times(1)
            .return_once(|_, _| Ok(AuthToken::parse("existing-token").expect("token")));

        let token = accounts(repo)
            .issue_token(credentials)
            .await
            .expect("token issued");
        assert_eq!(token.as_ref(), "existing-token");
    }

    #[rstest]
    #[case::unknown_email(None)]
    #[case::wrong_password(Some((true, "other-password")))]
    #[case::inactive_user(Some((false, "secret123")))]
    #[tokio::test]
    async fn issue_token_rejects_bad_credentials(
        credentials: LoginCredentials,
        #[case] row: Option<(bool, &'static str)>,
    ) {
        let mut repo = MockUserRepository::new();
        repo.expect_find_credentials()
            .times(1)
            .return_once(move |_| {
                Ok(row.map(|(active, password)| stored(account(active), password)))
            });
        repo.expect_token_for().never();

        let error = accounts(repo)
            .issue_token(credentials)
            .await
            .expect_err("rejected");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
        assert_eq!(error.message(), BAD_CREDENTIALS);
    }

    #[rstest]
    #[case::unknown(None, ErrorCode::Unauthorized)]
    #[case::inactive(Some(false), ErrorCode::Unauthorized)]
    #[tokio::test]
    async fn authenticate_rejects_unusable_tokens(
        #[case] active: Option<bool>,
        #[case] expected: ErrorCode,
    ) {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_token()
            .times(1)
            .return_once(move |_| Ok(active.map(account)));

        let token = AuthToken::parse("abc").expect("token");
        let error = accounts(repo)
            .authenticate(&token)
            .await
            .expect_err("rejected");
        assert_eq!(error.code(), expected);
    }

    #[tokio::test]
    async fn authenticate_returns_active_user() {
        let user = account(true);
        let expected = user.clone();
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_token()
            .times(1)
            .return_once(move |_| Ok(Some(user)));

        let token = AuthToken::parse("abc").expect("token");
        let resolved = accounts(repo).authenticate(&token).await.expect("user");
        assert_eq!(resolved, expected);
    }

    #[tokio::test]
    async fn update_profile_hashes_new_password() {
        let user = account(true);
        let user_id = user.id;
        let mut repo = MockUserRepository::new();
        repo.expect_update_profile()
            .withf(|_, update| {
                update.name.is_none()
                    && update
                        .password_hash
                        .as_ref()
                        .is_some_and(|hash| hash.verify("new-secret"))
            })
            .times(1)
            .return_once(move |_, _| Ok(Some(user)));

        let changes = ProfileChanges {
            name: None,
            password: Some(Password::new("new-secret").expect("password")),
        };
        let updated = accounts(repo)
            .update_profile(&user_id, changes)
            .await
            .expect("updated");
        assert_eq!(updated.id, user_id);
    }

    #[tokio::test]
    async fn profile_of_missing_user_is_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().times(1).return_once(|_| Ok(None));

        let error = accounts(repo)
            .profile(&UserId::random())
            .await
            .expect_err("missing");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }
}
