//! Storefront configuration.
//!
//! [`StorefrontConfig`] holds the knobs the storefront needs at runtime:
//! the flat delivery fee, how admin accounts come to exist, and how long a
//! notice stays visible. Values start from defaults and can be overridden
//! with builder-style setters or read from `FRESHMART_*` environment
//! variables.

use chrono::TimeDelta;
use secrecy::{ExposeSecret as _, SecretString};

use crate::error::{Result, StorefrontError};

/// Flat delivery fee added to every order, in whole currency units.
pub const DEFAULT_DELIVERY_FEE: u64 = 100;

/// Default notice lifetime in milliseconds.
const DEFAULT_NOTICE_TTL_MS: i64 = 3_000;

/// Environment variable for the delivery fee.
const ENV_DELIVERY_FEE: &str = "FRESHMART_DELIVERY_FEE";
/// Environment variable selecting the role policy.
const ENV_ROLE_POLICY: &str = "FRESHMART_ROLE_POLICY";
/// Environment variable holding the admin PIN.
const ENV_ADMIN_PIN: &str = "FRESHMART_ADMIN_PIN";
/// Environment variable for the notice lifetime.
const ENV_NOTICE_TTL_MS: &str = "FRESHMART_NOTICE_TTL_MS";

/// How self-registration decides between admin and customer.
#[derive(Debug, Default)]
pub enum RolePolicy {
    /// The first account ever registered becomes admin; later ones are
    /// customers.
    #[default]
    FirstUserAdmin,
    /// Registrants presenting exactly this PIN become admin.
    SecretPin(SecretString),
    /// Registration always yields a customer. Admins are created by other
    /// admins or by importing a user list.
    AdminInvite,
}

impl RolePolicy {
    /// Returns `true` if `supplied` matches the configured PIN.
    ///
    /// Always `false` for policies without a PIN, and for blank input.
    #[inline]
    #[must_use]
    pub fn pin_matches(&self, supplied: Option<&str>) -> bool {
        match (self, supplied) {
            (Self::SecretPin(pin), Some(candidate)) => {
                !candidate.is_empty() && pin.expose_secret() == candidate
            }
            _ => false,
        }
    }

    /// Short name as accepted by `FRESHMART_ROLE_POLICY`.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FirstUserAdmin => "first-user",
            Self::SecretPin(_) => "pin",
            Self::AdminInvite => "invite",
        }
    }
}

/// Runtime configuration for a [`crate::storefront::Storefront`].
///
/// # Examples
///
/// ```
/// use freshmart::config::{RolePolicy, StorefrontConfig};
///
/// let config = StorefrontConfig::new()
///     .delivery_fee(150)
///     .role_policy(RolePolicy::AdminInvite);
/// assert_eq!(config.delivery_fee_amount(), 150);
/// ```
#[derive(Debug)]
pub struct StorefrontConfig {
    /// Flat fee added at checkout.
    delivery_fee: u64,
    /// Admin assignment policy.
    role_policy: RolePolicy,
    /// How long a notice stays active.
    notice_ttl: TimeDelta,
}

impl Default for StorefrontConfig {
    #[inline]
    fn default() -> Self {
        Self {
            delivery_fee: DEFAULT_DELIVERY_FEE,
            role_policy: RolePolicy::default(),
            notice_ttl: TimeDelta::milliseconds(DEFAULT_NOTICE_TTL_MS),
        }
    }
}

impl StorefrontConfig {
    /// Creates a configuration with default values.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads overrides from the process environment.
    ///
    /// Unset variables keep their defaults. Recognized variables:
    /// `FRESHMART_DELIVERY_FEE`, `FRESHMART_ROLE_POLICY`
    /// (`first-user`, `pin` or `invite`), `FRESHMART_ADMIN_PIN` (required
    /// with `pin`) and `FRESHMART_NOTICE_TTL_MS`.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Config`] if a variable is set to a value
    /// that cannot be parsed.
    #[inline]
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`Self::from_env`], reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Config`] for unparsable values.
    #[inline]
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_DELIVERY_FEE) {
            config.delivery_fee = raw.trim().parse().map_err(|_err| {
                StorefrontError::Config(format!(
                    "{ENV_DELIVERY_FEE} must be a whole number, got `{raw}`"
                ))
            })?;
        }

        if let Some(raw) = lookup(ENV_ROLE_POLICY) {
            config.role_policy = match raw.trim().to_ascii_lowercase().as_str() {
                "first-user" | "" => RolePolicy::FirstUserAdmin,
                "invite" => RolePolicy::AdminInvite,
                "pin" => {
                    let pin = lookup(ENV_ADMIN_PIN)
                        .filter(|pin| !pin.trim().is_empty())
                        .ok_or_else(|| {
                            StorefrontError::Config(format!(
                                "{ENV_ROLE_POLICY}=pin requires {ENV_ADMIN_PIN}"
                            ))
                        })?;
                    RolePolicy::SecretPin(SecretString::from(pin))
                }
                other => {
                    return Err(StorefrontError::Config(format!(
                        "unknown {ENV_ROLE_POLICY} `{other}` (expected first-user, pin or invite)"
                    )));
                }
            };
        }

        if let Some(raw) = lookup(ENV_NOTICE_TTL_MS) {
            let millis: i64 = raw
                .trim()
                .parse()
                .ok()
                .filter(|millis| *millis >= 0)
                .ok_or_else(|| {
                    StorefrontError::Config(format!(
                        "{ENV_NOTICE_TTL_MS} must be a non-negative number of milliseconds, got `{raw}`"
                    ))
                })?;
            config.notice_ttl = TimeDelta::try_milliseconds(millis).ok_or_else(|| {
                StorefrontError::Config(format!("{ENV_NOTICE_TTL_MS} is out of range"))
            })?;
        }

        tracing::debug!(
            delivery_fee = config.delivery_fee,
            role_policy = config.role_policy.name(),
            notice_ttl_ms = config.notice_ttl.num_milliseconds(),
            "loaded configuration"
        );
        Ok(config)
    }

    /// Sets the flat delivery fee.
    #[inline]
    #[must_use]
    pub const fn delivery_fee(mut self, fee: u64) -> Self {
        self.delivery_fee = fee;
        self
    }

    /// Sets the admin assignment policy.
    #[inline]
    #[must_use]
    pub fn role_policy(mut self, policy: RolePolicy) -> Self {
        self.role_policy = policy;
        self
    }

    /// Sets how long notices stay active.
    #[inline]
    #[must_use]
    pub const fn notice_ttl(mut self, ttl: TimeDelta) -> Self {
        self.notice_ttl = ttl;
        self
    }

    /// The configured delivery fee.
    #[inline]
    #[must_use]
    pub const fn delivery_fee_amount(&self) -> u64 {
        self.delivery_fee
    }

    /// The configured admin assignment policy.
    #[inline]
    #[must_use]
    pub const fn policy(&self) -> &RolePolicy {
        &self.role_policy
    }

    /// The configured notice lifetime.
    #[inline]
    #[must_use]
    pub const fn ttl(&self) -> TimeDelta {
        self.notice_ttl
    }
}
