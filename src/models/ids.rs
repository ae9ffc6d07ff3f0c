//! Newtype wrappers for entity identifiers.
//!
//! All identifiers are millisecond timestamps taken at creation time, which
//! keeps them unique and sortable by recency. The wrappers prevent mixing up
//! IDs of different entity types at compile time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Macro to define a timestamp-backed newtype ID.
macro_rules! define_timestamp_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates a new identifier from the given value.
            #[inline]
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Allocates a fresh identifier that is newer than every ID in
            /// `existing`.
            ///
            /// Uses the timestamp of `now` unless an existing ID is already at
            /// or past it, in which case the next integer is used.
            #[inline]
            #[must_use]
            pub fn next<I>(now: DateTime<Utc>, existing: I) -> Self
            where
                I: IntoIterator<Item = Self>,
            {
                Self(next_timestamp(now, existing.into_iter().map(|id| id.0)))
            }
        }

        impl core::fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $name {
            #[inline]
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl core::str::FromStr for $name {
            type Err = core::num::ParseIntError;

            #[inline]
            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                raw.trim().parse::<i64>().map(Self)
            }
        }
    };
}

/// Picks `now` in milliseconds, bumped past the largest value in `existing`.
fn next_timestamp<I: Iterator<Item = i64>>(now: DateTime<Utc>, existing: I) -> i64 {
    let millis = now.timestamp_millis();
    existing
        .max()
        .map_or(millis, |newest| millis.max(newest.saturating_add(1)))
}

define_timestamp_id! {
    /// Unique identifier for a registered user.
    UserId
}

define_timestamp_id! {
    /// Unique identifier for a catalog product.
    ProductId
}

define_timestamp_id! {
    /// Unique identifier for a placed order.
    OrderId
}
