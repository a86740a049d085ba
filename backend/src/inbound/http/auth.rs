//! Token authentication for HTTP handlers.
//!
//! Handlers take an [`AuthenticatedUser`] argument; the extractor reads the
//! `Authorization` header, resolves the token through
//! [`crate::domain::ports::AccountService`] and rejects the request with
//! `401` before the handler body runs.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::debug;

use crate::domain::{AuthToken, Error, User, UserId};

use super::state::HttpState;

const SCHEMES: [&str; 2] = ["Token", "Bearer"];

/// The account behind a valid API token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(User);

impl AuthenticatedUser {
    pub fn id(&self) -> &UserId {
        &self.0.id
    }

    pub fn user(&self) -> &User {
        &self.0
    }
}

/// Extract the token from an `Authorization: Token <key>` (or `Bearer`)
/// header value.
pub(crate) fn parse_authorization(value: &str) -> Result<AuthToken, Error> {
    let (scheme, key) = value
        .trim()
        .split_once(' ')
        .ok_or_else(|| Error::unauthorized("invalid authorization header"))?;
    if !SCHEMES
        .iter()
        .any(|expected| scheme.eq_ignore_ascii_case(expected))
    {
        return Err(Error::unauthorized("unsupported authorization scheme"));
    }
    AuthToken::parse(key).map_err(|_| Error::unauthorized("invalid authorization header"))
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let header = req
            .headers()
            .get(AUTHORIZATION)
            .map(|value| value.to_str().map(str::to_owned));
        Box::pin(async move {
            let state =
                state.ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            let raw = match header {
                Some(Ok(raw)) => raw,
                Some(Err(_)) => return Err(Error::unauthorized("invalid authorization header").into()),
                None => {
                    return Err(
                        Error::unauthorized("authentication credentials were not provided").into(),
                    );
                }
            };
            let token = parse_authorization(&raw)?;
            let user = state.accounts.authenticate(&token).await.inspect_err(|error| {
                debug!(code = ?error.code(), "token authentication failed");
            })?;
            Ok(Self(user))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case("Token abc123")]
    #[case("token abc123")]
    #[case("Bearer abc123")]
    #[case("  Token   abc123 ")]
    fn accepted_schemes(#[case] header: &str) {
        let token = parse_authorization(header).expect("valid header");
        assert_eq!(token.as_ref(), "abc123");
    }

    #[rstest]
    #[case("abc123")]
    #[case("Basic abc123")]
    #[case("Token ")]
    fn rejected_headers(#[case] header: &str) {
        let error = parse_authorization(header).expect_err("invalid header");
        assert_eq!(error.code(), ErrorCode::Unauthorized);
    }
}
