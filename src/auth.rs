use serde::{Deserialize, Serialize};

/// What the identity collaborator knows about the current user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatus {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub approved: bool,
}

impl AuthStatus {
    pub const APPROVED: AuthStatus = AuthStatus {
        authenticated: true,
        approved: true,
    };

    /// Reason the editor must stay closed, if any.
    pub fn denial(&self) -> Option<&'static str> {
        if !self.authenticated {
            Some("sign in to edit your dashboard")
        } else if !self.approved {
            Some("your account is waiting for approval")
        } else {
            None
        }
    }

    pub fn allows_editing(&self) -> bool {
        self.denial().is_none()
    }
}

pub trait AuthProvider {
    fn status(&self) -> AuthStatus;
}

/// Fixed answer, taken from the application settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticAuth(pub AuthStatus);

impl AuthProvider for StaticAuth {
    fn status(&self) -> AuthStatus {
        self.0
    }
}
