//! Screen routing and transient notices.
//!
//! The controller decides which screen a navigation request actually lands
//! on given who is signed in, and keeps the single toast-style notice that
//! expires after a fixed lifetime. Expiry is evaluated lazily against the
//! caller's clock; nothing runs in the background.

use chrono::{DateTime, TimeDelta, Utc};

use crate::models::User;

/// Notice raised when a non-admin asks for the admin dashboard.
pub const ACCESS_DENIED: &str = "Access denied: Admins only.";

/// Screens of the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    /// Sign-in form.
    Login,
    /// Sign-up form.
    Register,
    /// Product grid.
    Shop,
    /// Cart review and checkout.
    Cart,
    /// Order history.
    Orders,
    /// Admin dashboard.
    Admin,
}

impl Screen {
    /// Returns `true` for screens reachable without a session.
    #[inline]
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }

    /// Lowercase screen name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Register => "register",
            Self::Shop => "shop",
            Self::Cart => "cart",
            Self::Orders => "orders",
            Self::Admin => "admin",
        }
    }
}

impl core::fmt::Display for Screen {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A short-lived message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Text to display.
    pub message: String,
    /// When the notice was raised.
    pub raised_at: DateTime<Utc>,
    /// How long it stays visible.
    pub ttl: TimeDelta,
}

impl Notice {
    /// Returns `true` while `now` is before the expiry instant.
    #[inline]
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.raised_at
            .checked_add_signed(self.ttl)
            .is_none_or(|expires_at| now < expires_at)
    }
}

/// Current screen plus the pending notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewController {
    /// Screen being shown.
    screen: Screen,
    /// Most recent notice, possibly expired.
    notice: Option<Notice>,
    /// Lifetime given to new notices.
    notice_ttl: TimeDelta,
}

impl ViewController {
    /// Creates a controller showing the shop for a signed-in user and the
    /// login form otherwise.
    #[inline]
    #[must_use]
    pub const fn new(signed_in: bool, notice_ttl: TimeDelta) -> Self {
        Self {
            screen: if signed_in { Screen::Shop } else { Screen::Login },
            notice: None,
            notice_ttl,
        }
    }

    /// Screen being shown.
    #[inline]
    #[must_use]
    pub const fn screen(&self) -> Screen {
        self.screen
    }

    /// Routes a navigation request and returns where it landed.
    ///
    /// Without a session only the public screens are reachable and
    /// everything else lands on [`Screen::Login`]. A signed-in user asking
    /// for a public screen lands on [`Screen::Shop`]. A customer asking for
    /// [`Screen::Admin`] lands on the shop with [`ACCESS_DENIED`] raised.
    #[tracing::instrument(skip_all, fields(target = %target))]
    pub fn navigate(&mut self, target: Screen, user: Option<&User>, now: DateTime<Utc>) -> Screen {
        let landed = match user {
            None if target.is_public() => target,
            None => Screen::Login,
            Some(_) if target.is_public() => Screen::Shop,
            Some(user) if target == Screen::Admin && !user.is_admin() => {
                tracing::warn!(identifier = %user.identifier, "admin screen refused");
                self.notify(ACCESS_DENIED, now);
                Screen::Shop
            }
            Some(_) => target,
        };
        self.screen = landed;
        tracing::debug!(landed = %landed, "navigated");
        landed
    }

    /// Raises a notice, replacing any current one and restarting the timer.
    #[inline]
    pub fn notify<T: Into<String>>(&mut self, message: T, now: DateTime<Utc>) {
        self.notice = Some(Notice {
            message: message.into(),
            raised_at: now,
            ttl: self.notice_ttl,
        });
    }

    /// The notice, if it has not yet expired at `now`.
    #[inline]
    #[must_use]
    pub fn active_notice(&self, now: DateTime<Utc>) -> Option<&Notice> {
        self.notice.as_ref().filter(|notice| notice.is_active(now))
    }
}
