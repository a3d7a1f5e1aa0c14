//! Admin account management command.
//!
//! # Usage
//!
//! ```bash
//! protech-cli admin create -e admin@example.com -n "Admin Name" -p "a long password"
//! ```

use secrecy::ExposeSecret;
use sqlx::PgPool;

use protech_api::db::UserRepository;
use protech_api::services::auth::hash_password;
use protech_core::{Email, UserRole};

use super::CliError;

/// Create a new admin account.
///
/// # Errors
///
/// Returns an error if the email is malformed, the password cannot be
/// hashed, or an account with this email already exists.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<(), CliError> {
    let database_url = super::database_url()?;

    let email = Email::parse(email)
        .map_err(protech_api::services::auth::AuthError::InvalidEmail)?;
    let password_hash = hash_password(password)?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Creating admin account: {}", email);
    let user = UserRepository::new(&pool)
        .create(name, &email, &password_hash, UserRole::Admin)
        .await?;

    tracing::info!(
        "Admin account created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(())
}
