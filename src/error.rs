//! Error types for the storefront core.

use crate::models::OrderStatus;

/// All errors that can occur when operating the storefront.
///
/// Every variant is recoverable: the operation that produced it leaves the
/// storefront in the state it had before the call.
#[derive(Debug, thiserror::Error)]
pub enum StorefrontError {
    /// Registration with an identifier that is already taken.
    #[error("an account for `{identifier}` already exists")]
    DuplicateIdentifier {
        /// The normalized identifier that collided.
        identifier: String,
    },

    /// No account matches the supplied identifier and password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A user-supplied field is missing or malformed.
    #[error("invalid {field}: {reason}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable description of the problem.
        reason: String,
    },

    /// Checkout was attempted with nothing in the cart.
    #[error("cannot check out an empty cart")]
    EmptyCart,

    /// An operation referenced an entity that does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of entity (`product`, `order`, ...).
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// The current session is not allowed to perform the operation.
    #[error("unauthorized: this action requires {required}")]
    Unauthorized {
        /// What the operation requires (`an admin session`, `a signed-in user`).
        required: &'static str,
    },

    /// An order status change would move the order backwards.
    #[error("order status cannot move from {from} to {to}")]
    InvalidTransition {
        /// Current status of the order.
        from: OrderStatus,
        /// Requested status.
        to: OrderStatus,
    },

    /// An import payload could not be parsed into the expected shape.
    #[error("malformed import: {0}")]
    MalformedImport(String),

    /// Environment configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage backend failed.
    #[error("storage error: {0}")]
    Storage(Box<dyn core::error::Error + Send + Sync>),
}

impl StorefrontError {
    /// Builds a [`StorefrontError::Validation`] for the given field.
    #[inline]
    #[must_use]
    pub fn validation<T: Into<String>>(field: &'static str, reason: T) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Builds a [`StorefrontError::NotFound`] for the given entity kind.
    #[inline]
    #[must_use]
    pub fn not_found<T: ToString>(entity: &'static str, id: T) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// The error returned when an admin-only operation is attempted without
    /// an admin session.
    #[inline]
    #[must_use]
    pub const fn admin_required() -> Self {
        Self::Unauthorized {
            required: "an admin session",
        }
    }

    /// The error returned when an operation needs any signed-in user.
    #[inline]
    #[must_use]
    pub const fn login_required() -> Self {
        Self::Unauthorized {
            required: "a signed-in user",
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, StorefrontError>;
