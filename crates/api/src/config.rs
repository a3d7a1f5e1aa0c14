//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PROTECH_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `PROTECH_JWT_SECRET` - Token signing secret (min 32 chars)
//!
//! ## Optional
//! - `PROTECH_HOST` - Bind address (default: 127.0.0.1)
//! - `PROTECH_PORT` - Listen port (default: 5001)
//! - `PROTECH_JWT_EXPIRY_HOURS` - Token lifetime (default: 168, i.e. 7 days)
//! - `PROTECH_FREE_SHIPPING_THRESHOLD` - Subtotal above which shipping is free (default: 100)
//! - `PROTECH_SHIPPING_FLAT_RATE` - Flat shipping cost below the threshold (default: 10)
//! - `PROTECH_TAX_RATE` - Tax rate applied to the subtotal (default: 0.08)
//! - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `EMAIL_FROM` -
//!   order-confirmation email; the notifier is disabled when `SMTP_HOST` is unset

use std::net::{IpAddr, SocketAddr};

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// JWT signing secret
    pub jwt_secret: SecretString,
    /// Token lifetime in hours
    pub jwt_expiry_hours: i64,
    /// Shipping and tax rules applied at order creation
    pub pricing: PricingConfig,
    /// SMTP configuration; `None` disables the order-confirmation notifier
    pub email: Option<EmailConfig>,
}

/// Shipping and tax rules.
///
/// These feed the server-side total computation: the client-supplied cart
/// never carries authoritative prices.
#[derive(Debug, Clone, Copy)]
pub struct PricingConfig {
    /// Subtotal at or above which shipping is free.
    pub free_shipping_threshold: Decimal,
    /// Flat shipping cost below the threshold.
    pub shipping_flat_rate: Decimal,
    /// Tax rate applied to the subtotal (e.g. 0.08 for 8%).
    pub tax_rate: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Decimal::new(100, 0),
            shipping_flat_rate: Decimal::new(10, 0),
            tax_rate: Decimal::new(8, 2),
        }
    }
}

impl PricingConfig {
    /// Shipping cost for a given subtotal.
    #[must_use]
    pub fn shipping(&self, subtotal: Decimal) -> Decimal {
        if subtotal >= self.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.shipping_flat_rate
        }
    }

    /// Tax for a given subtotal, rounded to cents.
    #[must_use]
    pub fn tax(&self, subtotal: Decimal) -> Decimal {
        (subtotal * self.tax_rate).round_dp(2)
    }
}

/// SMTP configuration for the order-confirmation notifier.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP relay hostname.
    pub smtp_host: String,
    /// SMTP port (default: 587).
    pub smtp_port: u16,
    /// SMTP username.
    pub smtp_username: String,
    /// SMTP password.
    pub smtp_password: SecretString,
    /// From address for outbound mail.
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid,
    /// or if the JWT secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("PROTECH_DATABASE_URL")?;
        let host = get_env_or_default("PROTECH_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("PROTECH_HOST".to_owned(), e.to_string()))?;
        let port = get_env_or_default("PROTECH_PORT", "5001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PROTECH_PORT".to_owned(), e.to_string()))?;

        let jwt_secret = get_required_secret("PROTECH_JWT_SECRET")?;
        validate_jwt_secret(&jwt_secret, "PROTECH_JWT_SECRET")?;
        let jwt_expiry_hours = parse_env_or("PROTECH_JWT_EXPIRY_HOURS", 168_i64)?;

        let pricing = PricingConfig {
            free_shipping_threshold: parse_env_or(
                "PROTECH_FREE_SHIPPING_THRESHOLD",
                PricingConfig::default().free_shipping_threshold,
            )?,
            shipping_flat_rate: parse_env_or(
                "PROTECH_SHIPPING_FLAT_RATE",
                PricingConfig::default().shipping_flat_rate,
            )?,
            tax_rate: parse_env_or("PROTECH_TAX_RATE", PricingConfig::default().tax_rate)?,
        };

        let email = EmailConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            jwt_expiry_hours,
            pricing,
            email,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl EmailConfig {
    /// Load SMTP configuration, or `None` when `SMTP_HOST` is unset.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(smtp_host) = get_optional_env("SMTP_HOST") else {
            return Ok(None);
        };

        Ok(Some(Self {
            smtp_host,
            smtp_port: parse_env_or("SMTP_PORT", 587_u16)?,
            smtp_username: get_required_env("SMTP_USERNAME")?,
            smtp_password: get_required_secret("SMTP_PASSWORD")?,
            from_address: get_required_env("EMAIL_FROM")?,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_owned()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse an environment variable, falling back to a default when unset.
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Validate that the JWT secret meets minimum length requirements.
fn validate_jwt_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "must be at least {MIN_JWT_SECRET_LENGTH} characters (got {})",
                value.len()
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_jwt_secret_too_short() {
        let secret = SecretString::from("short");
        assert!(validate_jwt_secret(&secret, "TEST_SECRET").is_err());
    }

    #[test]
    fn test_validate_jwt_secret_valid_length() {
        let secret = SecretString::from("x".repeat(32));
        assert!(validate_jwt_secret(&secret, "TEST_SECRET").is_ok());
    }

    #[test]
    fn test_pricing_defaults() {
        let pricing = PricingConfig::default();
        assert_eq!(pricing.free_shipping_threshold, Decimal::new(100, 0));
        assert_eq!(pricing.shipping_flat_rate, Decimal::new(10, 0));
        assert_eq!(pricing.tax_rate, Decimal::new(8, 2));
    }

    #[test]
    fn test_shipping_free_above_threshold() {
        let pricing = PricingConfig::default();
        assert_eq!(pricing.shipping(Decimal::new(100, 0)), Decimal::ZERO);
        assert_eq!(pricing.shipping(Decimal::new(250, 0)), Decimal::ZERO);
    }

    #[test]
    fn test_shipping_flat_below_threshold() {
        let pricing = PricingConfig::default();
        assert_eq!(pricing.shipping(Decimal::new(9999, 2)), Decimal::new(10, 0));
        assert_eq!(pricing.shipping(Decimal::ZERO), Decimal::new(10, 0));
    }

    #[test]
    fn test_tax_rounds_to_cents() {
        let pricing = PricingConfig::default();
        // 33.33 * 0.08 = 2.6664 -> 2.67
        assert_eq!(pricing.tax(Decimal::new(3333, 2)), Decimal::new(267, 2));
        assert_eq!(pricing.tax(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_email_config_debug_redacts_password() {
        let config = EmailConfig {
            smtp_host: "smtp.example.com".to_owned(),
            smtp_port: 587,
            smtp_username: "mailer".to_owned(),
            smtp_password: SecretString::from("super_secret_smtp_password"),
            from_address: "orders@protech-store.example".to_owned(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("smtp.example.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_smtp_password"));
    }
}
