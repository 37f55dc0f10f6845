//! `POST /login`: check a user's password, then issue a credential.
//!
//! Password storage is owned by the [`UserDirectory`] collaborator; the
//! shipped [`StaticUserDirectory`] is configured inline and compares in
//! constant time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{error, warn};

use super::AppState;
use super::response::ErrResponse;
use crate::auth::{IssueError, Subject, SubjectId, TokenIssuer};
use crate::clock::Clock;
use crate::config::UserConfig;

/// Login failures.
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    /// No such user.
    #[error("unknown user: {0}")]
    UnknownUser(String),

    /// Password did not match.
    #[error("wrong password")]
    WrongPassword,

    /// Credential issuance failed.
    #[error(transparent)]
    Issue(#[from] IssueError),
}

/// Looks up users and checks their password.
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    /// Return the subject for `name` if `password` is correct.
    async fn authenticate(&self, name: &str, password: &str) -> Result<Subject, LoginError>;
}

struct StaticUser {
    subject: Subject,
    password: String,
}

/// User directory built from configuration.
#[derive(Default)]
pub struct StaticUserDirectory {
    users: HashMap<String, StaticUser>,
}

impl StaticUserDirectory {
    /// Build from config entries, resolving `env:VAR` passwords.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Config`] if an `env:` password cannot be resolved.
    pub fn from_config(users: &[UserConfig]) -> crate::Result<Self> {
        let users = users
            .iter()
            .map(|u| {
                let user = StaticUser {
                    subject: Subject {
                        id: SubjectId(u.id),
                        name: u.name.clone(),
                        role: u.role,
                    },
                    password: u.resolve_password()?,
                };
                Ok((u.name.clone(), user))
            })
            .collect::<crate::Result<_>>()?;
        Ok(Self { users })
    }

    /// Number of configured users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether no users are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait::async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn authenticate(&self, name: &str, password: &str) -> Result<Subject, LoginError> {
        let user = self
            .users
            .get(name)
            .ok_or_else(|| LoginError::UnknownUser(name.to_string()))?;

        if bool::from(user.password.as_bytes().ct_eq(password.as_bytes())) {
            Ok(user.subject.clone())
        } else {
            Err(LoginError::WrongPassword)
        }
    }
}

/// Password check followed by issuance.
#[derive(Clone)]
pub struct LoginService {
    directory: Arc<dyn UserDirectory>,
    issuer: TokenIssuer,
    clock: Arc<dyn Clock>,
    token_ttl: Duration,
}

impl LoginService {
    /// Create a login service issuing credentials valid for `token_ttl`.
    #[must_use]
    pub fn new(directory: Arc<dyn UserDirectory>, issuer: TokenIssuer, clock: Arc<dyn Clock>, token_ttl: Duration) -> Self {
        Self {
            directory,
            issuer,
            clock,
            token_ttl,
        }
    }

    /// Authenticate `name`/`password` and return a signed credential.
    ///
    /// # Errors
    ///
    /// [`LoginError`] if the user is unknown, the password is wrong, or
    /// issuance fails.
    pub async fn login(&self, name: &str, password: &str) -> Result<String, LoginError> {
        let subject = self.directory.authenticate(name, password).await?;
        let token = self.issuer.issue(&subject, self.clock.now(), self.token_ttl).await?;
        Ok(token)
    }
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// User name.
    #[serde(default)]
    pub user_name: String,
    /// Password.
    #[serde(default)]
    pub password: String,
}

/// Login response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Signed access credential.
    pub access_token: String,
}

/// `POST /login`
pub async fn login_handler(State(state): State<Arc<AppState>>, body: Result<Json<LoginRequest>, JsonRejection>) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return ErrResponse::new(rejection.body_text()).respond(StatusCode::BAD_REQUEST);
        }
    };

    let mut missing = Vec::new();
    if body.user_name.is_empty() {
        missing.push("user_name is required");
    }
    if body.password.is_empty() {
        missing.push("password is required");
    }
    if !missing.is_empty() {
        let mut response = ErrResponse::new("invalid login request");
        for field in missing {
            response = response.with_detail(field);
        }
        return response.respond(StatusCode::BAD_REQUEST);
    }

    match state.login.login(&body.user_name, &body.password).await {
        Ok(access_token) => (StatusCode::OK, Json(LoginResponse { access_token })).into_response(),
        Err(LoginError::Issue(e)) => {
            error!(user = %body.user_name, error = %e, "Failed to issue credential");
            ErrResponse::new("failed to generate access token")
                .with_detail(e.to_string())
                .respond(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(e) => {
            warn!(user = %body.user_name, error = %e, "Login rejected");
            ErrResponse::new("invalid user name or password").unauthorized()
        }
    }
}
