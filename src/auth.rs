//! Authenticated identity consumed by the session and history controllers
//!
//! Authentication itself lives outside this crate; the core only needs to know
//! who the user is and whether they are signed in.

use std::sync::Mutex;

/// Identity reported by an authentication provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub is_authenticated: bool,
}

impl Identity {
    /// Narrow to an authenticated user, if signed in
    pub fn authenticated(&self) -> Option<AuthenticatedUser> {
        self.is_authenticated
            .then(|| AuthenticatedUser(self.username.clone()))
    }
}

/// Proof that an identity is signed in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(String);

impl AuthenticatedUser {
    pub fn username(&self) -> &str {
        &self.0
    }
}

pub trait AuthProvider: Send + Sync {
    /// Current identity, if any user is known
    fn identity(&self) -> Option<Identity>;

    /// Sign the current user out
    fn logout(&self);
}

/// Provider backed by a configured username
pub struct StaticAuthProvider {
    identity: Mutex<Option<Identity>>,
}

impl StaticAuthProvider {
    pub fn new(username: Option<String>) -> Self {
        let identity = username.map(|username| Identity {
            username,
            is_authenticated: true,
        });
        Self {
            identity: Mutex::new(identity),
        }
    }
}

impl AuthProvider for StaticAuthProvider {
    fn identity(&self) -> Option<Identity> {
        self.identity
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn logout(&self) {
        let mut identity = self
            .identity
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(identity) = identity.as_mut() {
            tracing::info!(username = %identity.username, "Signed out");
            identity.is_authenticated = false;
        }
    }
}
