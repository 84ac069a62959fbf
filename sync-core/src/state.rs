//! Session state machine for the FileBrowser sync client.
//!
//! This module provides a pure, side-effect-free state machine for the
//! authentication lifecycle. The state machine takes events as input and
//! produces a new state plus a list of actions to execute.
//!
//! The actual I/O (login and renew requests) is performed by sync-client,
//! not by this module.
//!
//! ```text
//!                  LoginSucceeded
//! Unauthenticated ───────────────► Authenticated ──┐ RenewSucceeded
//!        ▲                               │   ◄──────┘
//!        └──── RenewRejected (+Login) ───┘
//! ```
//!
//! There is no terminal state: a failed login leaves the state as it was and
//! the next request simply tries again.

use fbsync_types::AuthToken;

/// Session state machine - NO I/O, just state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No token held.
    Unauthenticated,
    /// A token obtained from a successful login is held.
    Authenticated {
        /// The current token.
        token: AuthToken,
    },
}

impl SessionState {
    /// Create a new state machine in the Unauthenticated state.
    pub fn new() -> Self {
        Self::Unauthenticated
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// This is a pure function - no side effects. The caller (sync-client)
    /// is responsible for executing the returned actions.
    pub fn on_event(self, event: Event) -> (Self, Vec<Action>) {
        match (self, event) {
            // Lazy authentication: only log in when nothing is held
            (Self::Unauthenticated, Event::AuthRequired) => {
                (Self::Unauthenticated, vec![Action::Login])
            }
            (state @ Self::Authenticated { .. }, Event::AuthRequired) => (state, vec![]),

            // Renewal without a token degrades to a login
            (Self::Unauthenticated, Event::RenewRequested) => {
                (Self::Unauthenticated, vec![Action::Login])
            }
            (state @ Self::Authenticated { .. }, Event::RenewRequested) => {
                (state, vec![Action::Renew])
            }

            // Login outcome
            (_, Event::LoginSucceeded { token }) => (Self::Authenticated { token }, vec![]),
            (state, Event::LoginFailed) => (state, vec![]),

            // Renewal outcome: the token is kept on success
            (state @ Self::Authenticated { .. }, Event::RenewSucceeded) => (state, vec![]),
            (Self::Authenticated { .. }, Event::RenewRejected) => {
                (Self::Unauthenticated, vec![Action::Login])
            }

            // Invalid transitions - stay in current state
            (state, _) => (state, vec![]),
        }
    }

    /// Check if a token is held.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// The held token, if any.
    pub fn token(&self) -> Option<&AuthToken> {
        match self {
            Self::Authenticated { token } => Some(token),
            Self::Unauthenticated => None,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Events that can occur in the session lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A request is about to be made and needs a token.
    AuthRequired,
    /// Caller asked to renew the token (typically after a 401).
    RenewRequested,
    /// Login returned 200 with a non-empty token.
    LoginSucceeded {
        /// The issued token.
        token: AuthToken,
    },
    /// Login failed for any reason.
    LoginFailed,
    /// Renew returned 200.
    RenewSucceeded,
    /// Renew returned 401: the token is no longer valid.
    RenewRejected,
    /// Renew failed with another status or a transport error.
    RenewFailed,
}

/// Actions to be executed by the sync-client.
///
/// These are instructions, not side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Send a login request.
    Login,
    /// Send a renew request with the held token.
    Renew,
}
