//! Placeholder user session.
//!
//! There is no real authentication: the session starts logged in as a fixed
//! sample user and `logout` simply forgets it.

use serde::{Deserialize, Serialize};

/// The current user's display record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Optional avatar image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl User {
    /// The sample user logged in at startup.
    pub fn sample() -> Self {
        Self {
            name: "Alex Doe".to_string(),
            email: "alex.doe@example.com".to_string(),
            avatar_url: None,
        }
    }
}

/// In-memory session holding at most one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    /// Creates a session already logged in as [`User::sample`].
    pub fn with_sample_user() -> Self {
        Self {
            user: Some(User::sample()),
        }
    }

    /// Returns the current user.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Replaces the current user.
    pub fn login(&mut self, user: User) {
        tracing::debug!(email = %user.email, "session login");
        self.user = Some(user);
    }

    /// Forgets the current user.
    pub fn logout(&mut self) {
        self.user = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_with_sample_user() {
        let session = Session::with_sample_user();
        let user = session.user().unwrap();
        assert_eq!(user.name, "Alex Doe");
        assert_eq!(user.email, "alex.doe@example.com");
        assert!(user.avatar_url.is_none());
    }

    #[test]
    fn test_login_logout() {
        let mut session = Session::default();
        assert!(session.user().is_none());

        session.login(User {
            name: "Sam".into(),
            email: "sam@example.com".into(),
            avatar_url: Some("https://example.com/a.png".into()),
        });
        assert_eq!(session.user().unwrap().name, "Sam");

        session.logout();
        assert!(session.user().is_none());
    }
}
