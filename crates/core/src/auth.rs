use serde::{Deserialize, Serialize};

/// Identity supplied by the external authentication service for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    subject: String,
    is_authenticated: bool,
}

impl Principal {
    /// Creates an authenticated principal for the provided subject claim.
    #[must_use]
    pub fn authenticated(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            is_authenticated: true,
        }
    }

    /// Creates a principal that has not completed authentication.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            subject: String::new(),
            is_authenticated: false,
        }
    }

    /// Returns the stable subject claim from the identity provider.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns whether the authentication service vouched for this principal.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated && !self.subject.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Principal;

    #[test]
    fn anonymous_principal_is_not_authenticated() {
        assert!(!Principal::anonymous().is_authenticated());
    }

    #[test]
    fn blank_subject_is_never_authenticated() {
        assert!(!Principal::authenticated("  ").is_authenticated());
        assert!(Principal::authenticated("uid-1").is_authenticated());
    }
}
