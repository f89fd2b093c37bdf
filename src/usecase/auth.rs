use std::sync::Arc;

use crate::auth::{PasswordHasher, TokenService};
use crate::domain::User;
use crate::error::{GophermartError, Result};
use crate::repository::UserRepository;

/// User lifecycle and token management.
pub struct AuthUseCase {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
    tokens: TokenService,
}

impl AuthUseCase {
    pub fn new(users: Arc<dyn UserRepository>, hasher: PasswordHasher, tokens: TokenService) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Creates a user and returns an auth token for the fresh session.
    pub async fn register(&self, login: &str, password: &str) -> Result<(User, String)> {
        let login = login.trim();
        if login.is_empty() || password.is_empty() {
            return Err(GophermartError::InvalidCredentials);
        }

        let hash = self.hasher.hash(password)?;
        let user = self.users.create(login, &hash).await?;
        let token = self.tokens.issue(user.id);
        Ok((user, token))
    }

    /// Validates credentials and returns an auth token.
    ///
    /// Unknown login and password mismatch are indistinguishable to the
    /// caller, which keeps login enumeration off the table.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<(User, String)> {
        let login = login.trim();
        if login.is_empty() || password.is_empty() {
            return Err(GophermartError::InvalidCredentials);
        }

        let user = match self.users.get_by_login(login).await {
            Ok(user) => user,
            Err(GophermartError::NotFound) => return Err(GophermartError::InvalidCredentials),
            Err(e) => return Err(e),
        };

        if !self.hasher.verify(&user.password_hash, password) {
            return Err(GophermartError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id);
        Ok((user, token))
    }

    /// Extracts the user id from a bearer token.
    pub fn parse_token(&self, token: &str) -> Result<i64> {
        if token.is_empty() {
            return Err(GophermartError::InvalidToken);
        }
        self.tokens.parse(token)
    }

    /// Fetches a user by identifier.
    pub async fn get_by_id(&self, id: i64) -> Result<User> {
        self.users.get_by_id(id).await
    }
}
