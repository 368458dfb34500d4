//! Session management for authentication

use std::sync::{Arc, PoisonError, RwLock};

use super::types::User;

/// Session data
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// The bearer token issued at login or registration
    pub access_token: String,

    /// The user the token belongs to, if already known
    pub user: Option<User>,
}

impl Session {
    /// Create a new session
    pub fn new(access_token: String, user: Option<User>) -> Self {
        Self { access_token, user }
    }
}

/// Shared, cloneable handle to the current session
///
/// Every API client holds a clone, so a login or logout is visible to all of
/// them on their next request.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionHandle {
    /// Create an empty (anonymous) handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current session
    pub fn get(&self) -> Option<Session> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the current session
    pub fn set(&self, session: Session) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    /// Attach user details to the current session, if there is one
    pub fn set_user(&self, user: User) -> bool {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        match guard.as_mut() {
            Some(session) => {
                session.user = Some(user);
                true
            }
            None => false,
        }
    }

    /// Drop the current session
    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// The bearer token, if logged in
    pub fn token(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    /// The logged-in user, if known
    pub fn user(&self) -> Option<User> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|s| s.user.clone())
    }

    /// Authenticated means a token is held; the user record may still be loading
    pub fn is_authenticated(&self) -> bool {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user().map(|u| u.is_admin).unwrap_or(false)
    }
}
