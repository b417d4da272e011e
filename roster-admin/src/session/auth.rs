//! Login checks

use async_trait::async_trait;
use roster_common::models::{LoginCredentials, Principal};

use crate::error::{AdminError, AdminResult};

pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Decides whether a set of credentials may log in
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credentials: &LoginCredentials) -> AdminResult<Principal>;
}

/// Accepts exactly the credentials from the `[console]` config section
///
/// With no configured credentials every login is refused.
pub struct ConfiguredAuthenticator {
    accepted: Option<LoginCredentials>,
}

impl ConfiguredAuthenticator {
    pub fn new(accepted: Option<LoginCredentials>) -> Self {
        Self { accepted }
    }
}

#[async_trait]
impl Authenticator for ConfiguredAuthenticator {
    async fn authenticate(&self, credentials: &LoginCredentials) -> AdminResult<Principal> {
        match &self.accepted {
            Some(accepted)
                if accepted.username == credentials.username
                    && accepted.password == credentials.password =>
            {
                Ok(Principal {
                    username: credentials.username.clone(),
                })
            }
            _ => Err(AdminError::Auth(INVALID_CREDENTIALS.to_string())),
        }
    }
}
