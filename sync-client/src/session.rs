//! SessionManager - owns the authentication token.
//!
//! The manager feeds events into the pure [`SessionState`] machine from
//! sync-core and performs the login/renew requests that come back as
//! actions.
//!
//! ```text
//! ensure_authenticated() ─► AuthRequired ──► [Login]?
//! renew()                ─► RenewRequested ─► [Renew] ─► 401 ─► [Login]
//! ```

use std::collections::VecDeque;

use fbsync_core::{Action, Event, Routes, SessionState};
use fbsync_types::api::{AUTH_HEADER, AUTH_TOKEN_HEADER, CONTENT_TYPE_JSON};
use fbsync_types::{AuthToken, Credentials, LoginRequest};
use tracing::{debug, info, warn};

use crate::error::{AuthError, FailureCause};
use crate::transport::{HttpRequest, Method, Transport};

/// Guarantees outbound requests carry a token, obtained lazily.
///
/// Sequential use only: every mutation goes through `&mut self`.
pub struct SessionManager<T: Transport> {
    transport: T,
    routes: Routes,
    credentials: Credentials,
    state: SessionState,
}

impl<T: Transport> SessionManager<T> {
    /// Create an unauthenticated session for `base_url`.
    pub fn new(transport: T, base_url: &str, credentials: Credentials) -> Self {
        Self {
            transport,
            routes: Routes::new(base_url),
            credentials,
            state: SessionState::new(),
        }
    }

    /// The current token, if any.
    pub fn token(&self) -> Option<&AuthToken> {
        self.state.token()
    }

    /// Whether a token is held.
    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    /// URL builder for the service.
    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Set the `X-Auth` header when a token is held; otherwise do nothing.
    pub fn attach_auth_header(&self, request: &mut HttpRequest) {
        if let Some(token) = self.state.token() {
            request.set_header(AUTH_HEADER, token.as_str());
        }
    }

    /// Log in with the stored credentials.
    ///
    /// On success the token is replaced. On failure the previous token (or
    /// its absence) is left untouched.
    pub async fn login(&mut self) -> Result<(), AuthError> {
        match self.request_token().await {
            Ok(token) => {
                self.apply(Event::LoginSucceeded { token });
                info!("Logged in as {}", self.credentials.username());
                Ok(())
            }
            Err(e) => {
                self.apply(Event::LoginFailed);
                warn!("Login failed: {}", e);
                Err(e)
            }
        }
    }

    /// Log in if no token is held. A held token is not validated.
    pub async fn ensure_authenticated(&mut self) -> Result<(), AuthError> {
        self.dispatch(Event::AuthRequired).await
    }

    /// Renew the held token.
    ///
    /// Without a token this is a login. A 401 from the service clears the
    /// token and triggers exactly one login.
    pub async fn renew(&mut self) -> Result<(), AuthError> {
        self.dispatch(Event::RenewRequested).await
    }

    fn apply(&mut self, event: Event) -> Vec<Action> {
        let state = std::mem::take(&mut self.state);
        let (next, actions) = state.on_event(event);
        self.state = next;
        actions
    }

    async fn dispatch(&mut self, event: Event) -> Result<(), AuthError> {
        let mut queue: VecDeque<Action> = self.apply(event).into();
        while let Some(action) = queue.pop_front() {
            match action {
                Action::Login => self.login().await?,
                Action::Renew => queue.extend(self.send_renew().await?),
            }
        }
        Ok(())
    }

    async fn request_token(&self) -> Result<AuthToken, AuthError> {
        let body = LoginRequest::from_credentials(&self.credentials)
            .to_json()
            .map_err(|e| AuthError::LoginFailed(e.into()))?;
        let request = HttpRequest::new(Method::Post, self.routes.login())
            .with_header("Content-Type", CONTENT_TYPE_JSON)
            .with_body(body);

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| AuthError::LoginFailed(e.into()))?;

        match response.status {
            200 => response
                .header(AUTH_TOKEN_HEADER)
                .and_then(AuthToken::new)
                .ok_or(AuthError::LoginFailed(FailureCause::MissingToken)),
            401 => Err(AuthError::InvalidCredentials),
            status => Err(AuthError::LoginFailed(FailureCause::Status(status))),
        }
    }

    async fn send_renew(&mut self) -> Result<Vec<Action>, AuthError> {
        let mut request = HttpRequest::new(Method::Post, self.routes.renew());
        self.attach_auth_header(&mut request);

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                self.apply(Event::RenewFailed);
                warn!("Renew failed: {}", e);
                return Err(AuthError::RenewFailed(e.into()));
            }
        };

        match response.status {
            200 => {
                debug!("Token renewed");
                Ok(self.apply(Event::RenewSucceeded))
            }
            401 => {
                info!("Token rejected on renew, logging in again");
                Ok(self.apply(Event::RenewRejected))
            }
            status => {
                self.apply(Event::RenewFailed);
                warn!("Renew failed with status {}", status);
                Err(AuthError::RenewFailed(FailureCause::Status(status)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockTransport, TransportError};

    fn session(transport: &MockTransport) -> SessionManager<MockTransport> {
        SessionManager::new(transport.clone(), "http://host", Credentials::new("u", "p"))
    }

    fn token_of(session: &SessionManager<MockTransport>) -> Option<String> {
        session.token().map(|t| t.as_str().to_string())
    }

    // ===========================================
    // Login Tests
    // ===========================================

    #[tokio::test]
    async fn login_stores_token_from_header() {
        let transport = MockTransport::with_account("u", "p", "tok1");
        let mut session = session(&transport);

        session.login().await.unwrap();

        assert!(session.is_authenticated());
        assert_eq!(token_of(&session).as_deref(), Some("tok1"));

        let request = &transport.requests()[0];
        assert_eq!(request.url, "http://host/api/login");
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert_eq!(request.body, br#"{"username":"u","password":"p"}"#);
    }

    #[tokio::test]
    async fn login_without_token_header_fails_and_keeps_token() {
        let transport = MockTransport::with_account("u", "p", "tok1");
        let mut session = session(&transport);
        session.login().await.unwrap();

        transport.set_login_token(None);
        let result = session.login().await;

        assert!(matches!(
            result,
            Err(AuthError::LoginFailed(FailureCause::MissingToken))
        ));
        assert_eq!(token_of(&session).as_deref(), Some("tok1"));
    }

    #[tokio::test]
    async fn login_with_empty_token_header_fails() {
        let transport = MockTransport::with_account("u", "p", "");
        let mut session = session(&transport);

        let result = session.login().await;

        assert!(matches!(
            result,
            Err(AuthError::LoginFailed(FailureCause::MissingToken))
        ));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn login_rejected_is_invalid_credentials() {
        let transport = MockTransport::with_account("u", "other", "tok1");
        let mut session = session(&transport);

        let result = session.login().await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        assert!(session.token().is_none());
    }

    #[tokio::test]
    async fn login_other_status_is_login_failed() {
        let transport = MockTransport::with_account("u", "p", "tok1");
        transport.force_status("/api/login", 500);
        let mut session = session(&transport);

        let result = session.login().await;

        assert!(matches!(
            result,
            Err(AuthError::LoginFailed(FailureCause::Status(500)))
        ));
    }

    #[tokio::test]
    async fn login_transport_failure_is_login_failed() {
        let transport = MockTransport::with_account("u", "p", "tok1");
        transport.fail_next_send("network unreachable");
        let mut session = session(&transport);

        let result = session.login().await;

        assert!(matches!(
            result,
            Err(AuthError::LoginFailed(FailureCause::Transport(
                TransportError::SendFailed(_)
            )))
        ));
        assert!(!session.is_authenticated());
    }

    // ===========================================
    // Lazy Authentication Tests
    // ===========================================

    #[tokio::test]
    async fn ensure_authenticated_logs_in_once() {
        let transport = MockTransport::with_account("u", "p", "tok1");
        let mut session = session(&transport);

        session.ensure_authenticated().await.unwrap();
        session.ensure_authenticated().await.unwrap();
        session.ensure_authenticated().await.unwrap();

        assert_eq!(transport.login_count(), 1);
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn held_token_is_not_validated() {
        let transport = MockTransport::with_account("u", "p", "tok1");
        let mut session = session(&transport);
        session.login().await.unwrap();
        transport.expire_tokens();

        session.ensure_authenticated().await.unwrap();

        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn auth_header_attached_only_with_token() {
        let transport = MockTransport::with_account("u", "p", "tok1");
        let mut session = session(&transport);

        let mut request = HttpRequest::new(Method::Get, "http://host/api/resources/");
        session.attach_auth_header(&mut request);
        assert!(request.header("X-Auth").is_none());

        session.login().await.unwrap();
        session.attach_auth_header(&mut request);
        assert_eq!(request.header("X-Auth"), Some("tok1"));
    }

    // ===========================================
    // Renewal Tests
    // ===========================================

    #[tokio::test]
    async fn renew_is_idempotent_on_success() {
        let transport = MockTransport::with_account("u", "p", "tok1");
        let mut session = session(&transport);
        session.login().await.unwrap();

        for _ in 0..3 {
            session.renew().await.unwrap();
            assert_eq!(token_of(&session).as_deref(), Some("tok1"));
        }

        assert_eq!(transport.count(Method::Post, "/api/renew"), 3);
        assert_eq!(transport.login_count(), 1);
        let renew = &transport.requests()[1];
        assert_eq!(renew.header("X-Auth"), Some("tok1"));
    }

    #[tokio::test]
    async fn renew_without_token_logs_in() {
        let transport = MockTransport::with_account("u", "p", "tok1");
        let mut session = session(&transport);

        session.renew().await.unwrap();

        assert_eq!(transport.login_count(), 1);
        assert_eq!(transport.count(Method::Post, "/api/renew"), 0);
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn renew_rejected_triggers_exactly_one_login() {
        // base http://host, u/p, login issues tok1, renew answers 401
        let transport = MockTransport::with_account("u", "p", "tok1");
        let mut session = session(&transport);
        session.login().await.unwrap();
        transport.clear_requests();
        transport.force_status("/api/renew", 401);

        session.renew().await.unwrap();

        assert_eq!(transport.login_count(), 1);
        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].path, "/api/renew");
        assert_eq!(requests[1].path, "/api/login");
        assert_eq!(requests[1].body, br#"{"username":"u","password":"p"}"#);
        assert!(session.is_authenticated());
        assert_eq!(token_of(&session).as_deref(), Some("tok1"));
    }

    #[tokio::test]
    async fn renew_rejected_then_login_rejected_clears_token() {
        let transport = MockTransport::with_account("u", "p", "tok1");
        let mut session = session(&transport);
        session.login().await.unwrap();
        transport.force_status("/api/renew", 401);
        transport.force_status("/api/login", 401);

        let result = session.renew().await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        assert!(!session.is_authenticated());
        assert_eq!(transport.login_count(), 2);
    }

    #[tokio::test]
    async fn renew_other_status_keeps_token() {
        let transport = MockTransport::with_account("u", "p", "tok1");
        let mut session = session(&transport);
        session.login().await.unwrap();
        transport.force_status("/api/renew", 503);

        let result = session.renew().await;

        assert!(matches!(
            result,
            Err(AuthError::RenewFailed(FailureCause::Status(503)))
        ));
        assert_eq!(token_of(&session).as_deref(), Some("tok1"));
        assert_eq!(transport.login_count(), 1);
    }

    #[tokio::test]
    async fn renew_transport_failure_keeps_token() {
        let transport = MockTransport::with_account("u", "p", "tok1");
        let mut session = session(&transport);
        session.login().await.unwrap();
        transport.fail_next_send("connection reset");

        let result = session.renew().await;

        assert!(matches!(
            result,
            Err(AuthError::RenewFailed(FailureCause::Transport(_)))
        ));
        assert!(session.is_authenticated());
    }
}
