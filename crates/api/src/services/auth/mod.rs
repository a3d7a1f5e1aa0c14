//! Authentication service.
//!
//! Password accounts with argon2 hashing, plus stateless HS256 bearer
//! tokens. The order service never sees tokens: routes resolve the caller
//! through [`verify_token`] (via the auth extractors) and pass a plain
//! `UserId` down.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use protech_core::{Email, UserId, UserRole};

use crate::config::ApiConfig;
use crate::db::{RepositoryError, UserRepository};
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// JWT claims carried by a bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID, stringified.
    pub sub: String,
    /// Account role at issue time.
    pub role: String,
    /// Expiry as a unix timestamp.
    pub exp: i64,
}

/// The authenticated identity resolved from a verified token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserIdentity {
    /// The account ID.
    pub user_id: UserId,
    /// The account role.
    pub role: UserRole,
}

/// Verify a bearer token and extract the identity it asserts.
///
/// # Errors
///
/// Returns `AuthError::InvalidToken` if the token is malformed, expired, or
/// signed with a different secret.
pub fn verify_token(secret: &SecretString, token: &str) -> Result<UserIdentity, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|_| AuthError::InvalidToken)?;

    let user_id = data
        .claims
        .sub
        .parse::<i32>()
        .map_err(|_| AuthError::InvalidToken)?;
    let role = data
        .claims
        .role
        .parse::<UserRole>()
        .map_err(|_| AuthError::InvalidToken)?;

    Ok(UserIdentity {
        user_id: UserId::new(user_id),
        role,
    })
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    jwt_secret: &'a SecretString,
    jwt_expiry_hours: i64,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, config: &'a ApiConfig) -> Self {
        Self {
            users: UserRepository::new(pool),
            jwt_secret: &config.jwt_secret,
            jwt_expiry_hours: config.jwt_expiry_hours,
        }
    }

    /// Register a new customer account and issue a token.
    ///
    /// A missing display name falls back to the email's local part.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email is malformed.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::UserAlreadyExists` if the email is taken.
    pub async fn register(
        &self,
        name: Option<&str>,
        email: &str,
        password: &str,
    ) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        let name = match name {
            Some(n) if !n.trim().is_empty() => n.trim().to_owned(),
            _ => email.local_part().to_owned(),
        };

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(&name, &email, &password_hash, UserRole::Customer)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        let token = self.issue_token(&user)?;
        Ok((user, token))
    }

    /// Login with email and password, issuing a fresh token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is unknown or
    /// the password doesn't match.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_with_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        let token = self.issue_token(&user)?;
        Ok((user, token))
    }

    /// Resolve the account behind a verified identity.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the account no longer exists.
    pub async fn current_user(&self, identity: UserIdentity) -> Result<User, AuthError> {
        self.users
            .get_by_id(identity.user_id)
            .await?
            .ok_or(AuthError::InvalidToken)
    }

    /// Sign a bearer token for a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenIssue` if signing fails.
    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let exp = (Utc::now() + Duration::hours(self.jwt_expiry_hours)).timestamp();

        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role.to_string(),
            exp,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.expose_secret().as_bytes()),
        )
        .map_err(|e| AuthError::TokenIssue(e.to_string()))
    }
}

/// Validate password strength.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with argon2 and a fresh salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// Verify a password against a stored argon2 hash.
fn verify_password(password: &str, stored_hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::Hash(e.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_too_short() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[test]
    fn test_validate_password_ok() {
        assert!(validate_password("long enough password").is_ok());
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password!", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password 123").unwrap();
        let b = hash_password("same password 123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_token_roundtrip() {
        let secret = SecretString::from("a".repeat(32));
        let claims = Claims {
            sub: "7".to_owned(),
            role: "admin".to_owned(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
        )
        .unwrap();

        let identity = verify_token(&secret, &token).unwrap();
        assert_eq!(identity.user_id, UserId::new(7));
        assert_eq!(identity.role, UserRole::Admin);
    }

    #[test]
    fn test_token_rejects_wrong_secret() {
        let secret = SecretString::from("a".repeat(32));
        let other = SecretString::from("b".repeat(32));
        let claims = Claims {
            sub: "7".to_owned(),
            role: "customer".to_owned(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            verify_token(&other, &token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_token_rejects_expired() {
        let secret = SecretString::from("a".repeat(32));
        let claims = Claims {
            sub: "7".to_owned(),
            role: "customer".to_owned(),
            exp: (Utc::now() - Duration::hours(2)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            verify_token(&secret, &token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_token_rejects_garbage() {
        let secret = SecretString::from("a".repeat(32));
        assert!(matches!(
            verify_token(&secret, "not-a-token"),
            Err(AuthError::InvalidToken)
        ));
    }
}
