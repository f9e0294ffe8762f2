//! Route guard decisions for public and protected views.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every protected view applies the same rule: wait while the session is
//! bootstrapping, render when authenticated, otherwise send the user to login.

use crate::session::SessionState;

pub const LOGIN_ROUTE: &str = "/login";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Public,
    Protected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    /// Bootstrap has not finished; no decision yet.
    Wait,
    RedirectToLogin,
}

/// Decide what a view with `access` should do for the given session state.
#[must_use]
pub fn decide(access: RouteAccess, state: &SessionState) -> GuardDecision {
    match access {
        RouteAccess::Public => GuardDecision::Render,
        RouteAccess::Protected if state.is_loading() => GuardDecision::Wait,
        RouteAccess::Protected if state.is_authenticated() => GuardDecision::Render,
        RouteAccess::Protected => GuardDecision::RedirectToLogin,
    }
}

/// True once bootstrap has finished and nobody is signed in.
#[must_use]
pub fn should_redirect_unauth(state: &SessionState) -> bool {
    decide(RouteAccess::Protected, state) == GuardDecision::RedirectToLogin
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
