//! Identity and role registry.
//!
//! Holds every registered account plus the session pointer (the identifier
//! of the signed-in user). Credentials are compared as plaintext; see
//! [`User`].

use chrono::{DateTime, Utc};

use crate::config::RolePolicy;
use crate::error::{Result, StorefrontError};
use crate::models::{Role, User, UserId, normalize_identifier};

/// Returns the actor if it is an admin.
///
/// # Errors
///
/// Returns [`StorefrontError::Unauthorized`] for no user or a customer.
#[inline]
pub fn require_admin(actor: Option<&User>) -> Result<&User> {
    match actor {
        Some(user) if user.is_admin() => Ok(user),
        Some(user) => {
            tracing::warn!(identifier = %user.identifier, "admin action refused");
            Err(StorefrontError::admin_required())
        }
        None => {
            tracing::warn!("admin action refused without a session");
            Err(StorefrontError::admin_required())
        }
    }
}

/// Returns the actor if anyone is signed in.
///
/// # Errors
///
/// Returns [`StorefrontError::Unauthorized`] when `actor` is `None`.
#[inline]
pub fn require_user(actor: Option<&User>) -> Result<&User> {
    actor.ok_or_else(StorefrontError::login_required)
}

/// Registered accounts and the active session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityRegistry {
    /// Accounts in registration order.
    users: Vec<User>,
    /// Identifier of the signed-in user, if any.
    session: Option<String>,
}

impl IdentityRegistry {
    /// Creates an empty registry with no session.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a registry from persisted parts.
    ///
    /// A session naming an account that no longer exists is dropped.
    #[inline]
    #[must_use]
    pub fn from_parts(users: Vec<User>, session: Option<String>) -> Self {
        let mut registry = Self {
            users,
            session: None,
        };
        if let Some(identifier) = session {
            if registry.find(&identifier).is_some() {
                registry.session = Some(identifier);
            } else {
                tracing::warn!(%identifier, "session points at a missing user, signing out");
            }
        }
        registry
    }

    /// Every registered account, in registration order.
    #[inline]
    #[must_use]
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Looks up an account by identifier (normalized before comparing).
    #[inline]
    #[must_use]
    pub fn find(&self, identifier: &str) -> Option<&User> {
        let wanted = normalize_identifier(identifier);
        self.users.iter().find(|user| user.identifier == wanted)
    }

    /// Identifier of the signed-in user.
    #[inline]
    #[must_use]
    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    /// The signed-in user, if any.
    #[inline]
    #[must_use]
    pub fn current_user(&self) -> Option<&User> {
        self.session
            .as_deref()
            .and_then(|identifier| self.find(identifier))
    }

    /// Creates an account and signs it in.
    ///
    /// The role follows `policy`: see [`RolePolicy`]. `admin_secret` only
    /// matters under [`RolePolicy::SecretPin`].
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Validation`] for a blank identifier or
    /// password and [`StorefrontError::DuplicateIdentifier`] if the
    /// normalized identifier is taken. The registry is unchanged on error.
    #[tracing::instrument(skip_all)]
    pub fn register(
        &mut self,
        identifier: &str,
        password: &str,
        admin_secret: Option<&str>,
        policy: &RolePolicy,
        now: DateTime<Utc>,
    ) -> Result<User> {
        let role = match policy {
            RolePolicy::FirstUserAdmin if self.users.is_empty() => Role::Admin,
            RolePolicy::SecretPin(_) if policy.pin_matches(admin_secret) => Role::Admin,
            RolePolicy::FirstUserAdmin | RolePolicy::SecretPin(_) | RolePolicy::AdminInvite => {
                Role::Customer
            }
        };
        let user = self.insert(identifier, password, role, now)?;
        self.session = Some(user.identifier.clone());
        tracing::info!(identifier = %user.identifier, role = %user.role, "registered");
        Ok(user)
    }

    /// Creates another admin account on behalf of an existing admin.
    ///
    /// The session is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Unauthorized`] unless `actor` is an admin,
    /// plus the same validation errors as [`Self::register`].
    #[tracing::instrument(skip_all)]
    pub fn add_admin(
        &mut self,
        actor: Option<&User>,
        identifier: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<User> {
        let admin = require_admin(actor)?;
        let user = self.insert(identifier, password, Role::Admin, now)?;
        tracing::info!(by = %admin.identifier, identifier = %user.identifier, "added admin");
        Ok(user)
    }

    /// Signs in with an exact identifier and password match.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::InvalidCredentials`] if no account
    /// matches. The session is unchanged on error.
    #[tracing::instrument(skip_all)]
    pub fn login(&mut self, identifier: &str, password: &str) -> Result<User> {
        let Some(user) = self
            .find(identifier)
            .filter(|user| user.password == password)
            .cloned()
        else {
            tracing::warn!("login rejected");
            return Err(StorefrontError::InvalidCredentials);
        };
        self.session = Some(user.identifier.clone());
        tracing::info!(identifier = %user.identifier, "signed in");
        Ok(user)
    }

    /// Clears the session.
    #[inline]
    pub fn logout(&mut self) {
        if let Some(identifier) = self.session.take() {
            tracing::info!(%identifier, "signed out");
        }
    }

    /// Replaces every account wholesale, dropping the session if its user
    /// is gone.
    #[inline]
    pub fn replace_users(&mut self, users: Vec<User>) {
        self.users = users;
        if self.current_user().is_none() && self.session.is_some() {
            tracing::warn!("session user missing after replacement, signing out");
            self.session = None;
        }
    }

    /// Validates and appends a new account.
    fn insert(
        &mut self,
        identifier: &str,
        password: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<User> {
        let identifier = normalize_identifier(identifier);
        if identifier.is_empty() {
            return Err(StorefrontError::validation("identifier", "is required"));
        }
        if password.trim().is_empty() {
            return Err(StorefrontError::validation("password", "is required"));
        }
        if self.find(&identifier).is_some() {
            tracing::warn!(%identifier, "identifier already registered");
            return Err(StorefrontError::DuplicateIdentifier { identifier });
        }
        let user = User {
            id: UserId::next(now, self.users.iter().map(|user| user.id)),
            identifier,
            password: password.to_owned(),
            role,
        };
        self.users.push(user.clone());
        Ok(user)
    }
}
