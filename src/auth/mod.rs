//! Authentication: API calls, session state and route guards

pub mod guard;
mod session;
mod types;

use std::sync::{Mutex, PoisonError};

use log::{debug, info, warn};
use reqwest::Method;

use crate::error::{Error, Result};
use crate::fetch::Transport;

pub use guard::{Access, GuardDecision};
pub use session::*;
pub use types::*;

/// Client for the `/auth` endpoints
#[derive(Clone)]
pub struct AuthApi {
    transport: Transport,
}

impl AuthApi {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Create an account
    pub async fn register(&self, registration: &Registration) -> Result<AuthResponse> {
        self.transport
            .request(Method::POST, "/auth/register")
            .json(registration)?
            .execute::<AuthResponse>()
            .await
    }

    /// Exchange credentials for a token
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
        self.transport
            .request(Method::POST, "/auth/login")
            .json(credentials)?
            .execute::<AuthResponse>()
            .await
    }

    /// Get the user data for the currently authenticated user
    pub async fn me(&self) -> Result<User> {
        let response = self
            .transport
            .authed(Method::GET, "/auth/me")?
            .execute::<MeResponse>()
            .await?;
        Ok(response.user)
    }
}

/// Where the auth state machine currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Anonymous,
    Authenticating,
    Authenticated,
}

#[derive(Debug, Default)]
struct AuthState {
    pending: usize,
    error: Option<String>,
    /// Bumped by [`AuthStore::logout`]
    generation: u64,
}

/// Auth state container
///
/// The token lives in the shared [`SessionHandle`]; this type adds the
/// in-flight flag and the last error on top of it.
pub struct AuthStore {
    api: AuthApi,
    session: SessionHandle,
    state: Mutex<AuthState>,
}

impl AuthStore {
    pub fn new(api: AuthApi, session: SessionHandle) -> Self {
        Self {
            api,
            session,
            state: Mutex::new(AuthState::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, AuthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> AuthStatus {
        if self.state().pending > 0 {
            AuthStatus::Authenticating
        } else if self.session.is_authenticated() {
            AuthStatus::Authenticated
        } else {
            AuthStatus::Anonymous
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.session.is_admin()
    }

    pub fn user(&self) -> Option<User> {
        self.session.user()
    }

    pub fn token(&self) -> Option<String> {
        self.session.token()
    }

    /// Message of the last failed operation
    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn clear_error(&self) {
        self.state().error = None;
    }

    /// Check whether the current user may open `path`
    ///
    /// Paths outside the page table are treated as public.
    pub fn guard(&self, path: &str) -> GuardDecision {
        let access = guard::route_access(path).unwrap_or(Access::Public);
        guard::check(access, self.is_authenticated(), self.is_admin())
    }

    /// Sign in with email and password
    pub async fn login(&self, credentials: &Credentials) -> Result<User> {
        if let Err(e) = credentials.validate() {
            self.state().error = Some(e.user_message());
            return Err(e);
        }
        self.authenticate(self.api.login(credentials)).await
    }

    /// Create an account and sign in with it
    pub async fn register(&self, registration: &Registration) -> Result<User> {
        if let Err(e) = registration.validate() {
            self.state().error = Some(e.user_message());
            return Err(e);
        }
        self.authenticate(self.api.register(registration)).await
    }

    async fn authenticate<F>(&self, request: F) -> Result<User>
    where
        F: std::future::Future<Output = Result<AuthResponse>>,
    {
        let generation = {
            let mut state = self.state();
            state.pending += 1;
            state.error = None;
            state.generation
        };

        let result = request.await;

        let mut state = self.state();
        if state.generation != generation {
            debug!("Sign-in finished after logout, dropping its session");
            return Err(Error::auth("Signed out while signing in"));
        }
        state.pending -= 1;
        match result {
            Ok(response) => {
                info!("Signed in as user {}", response.user.id);
                self.session
                    .set(Session::new(response.access_token, Some(response.user.clone())));
                Ok(response.user)
            }
            Err(e) => {
                warn!("Sign-in failed: {}", e);
                state.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Reload the current user's record
    pub async fn refresh_user(&self) -> Result<User> {
        let generation = self.state().generation;
        let result = self.api.me().await;
        if self.state().generation != generation {
            debug!("User record arrived after logout, dropping it");
            return Err(Error::auth("Signed out while loading the user"));
        }
        match result {
            Ok(user) => {
                self.session.set_user(user.clone());
                Ok(user)
            }
            Err(e) => {
                self.state().error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Resume a session from a previously issued token
    pub fn restore(&self, access_token: &str) -> Result<()> {
        if access_token.trim().is_empty() {
            return Err(Error::auth("Empty access token"));
        }
        self.session.set(Session::new(access_token.to_string(), None));
        Ok(())
    }

    /// Forget the user and token, whatever the current state
    ///
    /// Sign-ins still in flight are abandoned.
    pub fn logout(&self) {
        let mut state = self.state();
        let generation = state.generation + 1;
        *state = AuthState {
            generation,
            ..AuthState::default()
        };
        // Cleared under the state lock so a sign-in cannot land in between.
        if self.session.is_authenticated() {
            info!("Signed out");
        }
        self.session.clear();
    }
}
