//! Session manager: owns the current user and drives the auth lifecycle.
//!
//! SYSTEM CONTEXT
//! ==============
//! Route guards and commands consult the manager; the manager calls the auth
//! API and is the single writer of the token store. It is constructed once
//! and passed to consumers explicitly, never reached through a global.
//!
//! STATE MACHINE
//! =============
//! `Bootstrapping -> Authenticated | Anonymous`, then login/register move to
//! `Authenticated` and logout (or a failed refresh) moves to `Anonymous`.
//! A user is only ever held together with its access token.
//!
//! CONCURRENCY
//! ===========
//! Every store write happens under the state write lock, together with the
//! state change it belongs to. Network calls run without the lock, so a call
//! that finishes after the session moved on re-checks the state and drops its
//! result instead of persisting it.
//!
//! ERROR HANDLING
//! ==============
//! Login, register, and refresh errors go back to the caller untouched.
//! Bootstrap failures are routine token expiry: they are logged, the store is
//! cleared, and the session ends `Anonymous`. Revoke failures on logout are
//! logged and dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::task::JoinHandle;

use crate::api::AuthApi;
use crate::error::{ApiError, SessionError};
use crate::token_store::TokenStore;
use crate::types::{AuthResponse, LoginRequest, RegisterRequest, TokenPair, User};

// =============================================================================
// STATE
// =============================================================================

/// An authenticated user together with the tokens that prove it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub tokens: TokenPair,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Startup restore from persisted tokens has not finished.
    Bootstrapping,
    Anonymous,
    Authenticated(Session),
}

impl SessionState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(s) if !s.tokens.access_token.is_empty())
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Bootstrapping)
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(s) => Some(&s.user),
            _ => None,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bootstrapping => "bootstrapping",
            Self::Anonymous => "anonymous",
            Self::Authenticated(_) => "authenticated",
        }
    }
}

// =============================================================================
// MANAGER
// =============================================================================

// Success statuses reported when a response carries no usable access token.
const LOGIN_STATUS: u16 = 200;
const REGISTER_STATUS: u16 = 201;
const REFRESH_STATUS: u16 = 200;

fn require_access_token(tokens: &TokenPair, status: u16) -> Result<(), ApiError> {
    if tokens.access_token.is_empty() {
        return Err(ApiError::UnexpectedResponse { status, detail: "response carried no access token".into() });
    }
    Ok(())
}

pub struct SessionManager<A, S> {
    api: Arc<A>,
    store: S,
    state: RwLock<SessionState>,
    bootstrapped: AtomicBool,
    submitting: AtomicBool,
}

/// Outcome of a startup restore, before anything is persisted.
struct Restored {
    session: Session,
    /// The tokens came from a refresh and are not in the store yet.
    refreshed: bool,
}

/// Clears the in-flight flag when a login/register attempt ends.
struct SubmitGuard<'a>(&'a AtomicBool);

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<A, S> SessionManager<A, S>
where
    A: AuthApi + 'static,
    S: TokenStore,
{
    /// New manager in the `Bootstrapping` state; call [`Self::bootstrap`] next.
    pub fn new(api: A, store: S) -> Self {
        Self::with_shared_api(Arc::new(api), store)
    }

    pub(crate) fn with_shared_api(api: Arc<A>, store: S) -> Self {
        Self {
            api,
            store,
            state: RwLock::new(SessionState::Bootstrapping),
            bootstrapped: AtomicBool::new(false),
            submitting: AtomicBool::new(false),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.read().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated()
    }

    /// True until bootstrap has finished.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.read().is_loading()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.read().user().cloned()
    }

    /// Bearer token for authenticated calls made outside the manager.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        match &*self.read() {
            SessionState::Authenticated(s) => Some(s.tokens.access_token.clone()),
            _ => None,
        }
    }

    // -------------------------------------------------------------------------
    // Bootstrap
    // -------------------------------------------------------------------------

    /// Restore the session from persisted tokens. Runs once; later calls
    /// return the current state without touching the network.
    ///
    /// Never fails: any error ends in `Anonymous` with an empty store.
    pub async fn bootstrap(&self) -> SessionState {
        if self.bootstrapped.swap(true, Ordering::AcqRel) {
            tracing::debug!("bootstrap already ran");
            return self.state();
        }

        let restored = self.restore().await;

        let mut state = self.write();
        if !state.is_loading() {
            // A login, register, or logout landed while we were restoring and
            // already wrote the store; the restored tokens are discarded.
            tracing::debug!(state = state.label(), "session changed during bootstrap; keeping it");
            return state.clone();
        }
        *state = match restored.map(|r| self.persist_restored(r)) {
            Some(Ok(session)) => {
                tracing::info!(user_id = %session.user.id, role = %session.user.role, "session restored");
                SessionState::Authenticated(session)
            }
            Some(Err(e)) => {
                tracing::warn!(error = %e, "failed to persist refreshed tokens; starting anonymous");
                self.clear_store();
                SessionState::Anonymous
            }
            None => {
                self.clear_store();
                tracing::info!("no session restored; anonymous");
                SessionState::Anonymous
            }
        };
        state.clone()
    }

    async fn restore(&self) -> Option<Restored> {
        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "token store unreadable; starting anonymous");
                None
            }
        }?;

        match self.api.get_profile(&stored.access_token).await {
            Ok(user) => return Some(Restored { session: Session { user, tokens: stored }, refreshed: false }),
            Err(e) => {
                tracing::debug!(kind = e.error_kind(), status = ?e.status_code(), "stored access token rejected");
            }
        }

        if !stored.has_refresh_token() {
            return None;
        }

        match self.refresh_and_fetch(&stored.refresh_token).await {
            Ok(session) => Some(Restored { session, refreshed: true }),
            Err(e) => {
                tracing::warn!(error = %e, "token refresh during bootstrap failed");
                None
            }
        }
    }

    /// Nothing is written here; the caller persists under the state lock.
    async fn refresh_and_fetch(&self, refresh_token: &str) -> Result<Session, ApiError> {
        let tokens = self.api.refresh(refresh_token).await?;
        require_access_token(&tokens, REFRESH_STATUS)?;
        let user = self.api.get_profile(&tokens.access_token).await?;
        Ok(Session { user, tokens })
    }

    /// Caller holds the state write lock.
    fn persist_restored(&self, restored: Restored) -> Result<Session, SessionError> {
        if restored.refreshed {
            self.store.save(&restored.session.tokens)?;
        }
        Ok(restored.session)
    }

    // -------------------------------------------------------------------------
    // Login / register
    // -------------------------------------------------------------------------

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns the API error unchanged on rejection, a store error if the new
    /// tokens cannot be persisted, or [`SessionError::InFlight`] if another
    /// login/register is still running. The session is left as it was.
    pub async fn login(&self, request: LoginRequest) -> Result<User, SessionError> {
        let _guard = self.begin_submit()?;
        let response = self.api.login(&request).await?;
        self.establish(response, LOGIN_STATUS)
    }

    /// Create an account and sign in to it. Same contract as [`Self::login`].
    ///
    /// # Errors
    ///
    /// See [`Self::login`].
    pub async fn register(&self, request: RegisterRequest) -> Result<User, SessionError> {
        let _guard = self.begin_submit()?;
        let response = self.api.register(&request).await?;
        self.establish(response, REGISTER_STATUS)
    }

    fn begin_submit(&self) -> Result<SubmitGuard<'_>, SessionError> {
        if self
            .submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("rejecting concurrent sign-in submission");
            return Err(SessionError::InFlight);
        }
        Ok(SubmitGuard(&self.submitting))
    }

    fn establish(&self, response: AuthResponse, status: u16) -> Result<User, SessionError> {
        require_access_token(&response.tokens, status)?;
        let mut state = self.write();
        self.store.save(&response.tokens)?;
        let user = response.user;
        tracing::info!(user_id = %user.id, role = %user.role, "signed in");
        *state = SessionState::Authenticated(Session { user: user.clone(), tokens: response.tokens });
        Ok(user)
    }

    // -------------------------------------------------------------------------
    // Refresh
    // -------------------------------------------------------------------------

    /// Exchange the refresh token for a new pair, keeping the current user.
    ///
    /// On rejection the store is cleared and the session becomes `Anonymous`.
    /// If the session was replaced or signed out while the call was pending,
    /// the outcome is dropped and the newer session is left alone.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotAuthenticated`] without a session or refresh
    /// token, or when the session changed mid-call; otherwise the API or store
    /// error.
    pub async fn refresh(&self) -> Result<(), SessionError> {
        let refresh_token = match &*self.read() {
            SessionState::Authenticated(s) if s.tokens.has_refresh_token() => s.tokens.refresh_token.clone(),
            _ => return Err(SessionError::NotAuthenticated),
        };

        let result = self
            .api
            .refresh(&refresh_token)
            .await
            .and_then(|tokens| require_access_token(&tokens, REFRESH_STATUS).map(|()| tokens));

        let mut state = self.write();
        let SessionState::Authenticated(session) = &mut *state else {
            tracing::debug!("signed out during refresh; dropping result");
            return Err(SessionError::NotAuthenticated);
        };
        if session.tokens.refresh_token != refresh_token {
            tracing::debug!(user_id = %session.user.id, "session replaced during refresh; dropping result");
            return Err(SessionError::NotAuthenticated);
        }

        match result {
            Ok(tokens) => {
                self.store.save(&tokens)?;
                session.tokens = tokens;
                tracing::debug!(user_id = %session.user.id, "access token refreshed");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(kind = e.error_kind(), "token refresh rejected; signing out");
                self.clear_store();
                *state = SessionState::Anonymous;
                Err(e.into())
            }
        }
    }

    // -------------------------------------------------------------------------
    // Logout
    // -------------------------------------------------------------------------

    /// Drop the session locally, then revoke the old access token in the
    /// background when a Tokio runtime is available.
    ///
    /// Local state is cleared before this returns. The returned handle lets a
    /// short-lived process wait for the revoke; its outcome is only logged.
    /// Calling this on an anonymous session is a no-op returning `None`.
    pub fn logout(&self) -> Option<JoinHandle<()>> {
        let previous = {
            let mut state = self.write();
            self.clear_store();
            std::mem::replace(&mut *state, SessionState::Anonymous)
        };

        let SessionState::Authenticated(session) = previous else {
            return None;
        };
        tracing::info!(user_id = %session.user.id, "signed out");

        let handle = tokio::runtime::Handle::try_current().ok()?;
        let api = Arc::clone(&self.api);
        let access_token = session.tokens.access_token;
        Some(handle.spawn(async move {
            if let Err(e) = api.revoke(&access_token).await {
                tracing::debug!(kind = e.error_kind(), "token revoke failed; ignoring");
            }
        }))
    }

    fn clear_store(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to clear token store");
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
