//! Account credentials entity

/// A GitHub account whose activity is collected.
///
/// The token is only ever handed to the GitHub client; it is never persisted
/// and is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountCredentials {
    pub username: String,
    pub token: String,
}

impl AccountCredentials {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}
