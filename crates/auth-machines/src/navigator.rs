//! Navigation seam between the machines and the external router.
//!
//! The machines know symbolic route names only; resolving a name to a path
//! is the router's job. The auth flow additionally navigates to a captured
//! redirect path after authentication, so a request is either a named route
//! (optionally with a query) or a raw path.

use serde::{Deserialize, Serialize};

/// String-keyed query map carried into navigation requests and through the
/// reset-password transition.
pub type Query = serde_json::Map<String, serde_json::Value>;

/// Symbolic route names, matching the external router's route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteName {
    Home,
    Login,
    Signup,
    Totp,
    TotpRecovery,
    VerifyEmail,
    ResetPassword,
}

/// A navigation request handed to the external router.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationRequest {
    Named {
        name: RouteName,
        query: Option<Query>,
    },
    Path(String),
}

impl NavigationRequest {
    pub fn named(name: RouteName) -> Self {
        Self::Named { name, query: None }
    }

    pub fn named_with_query(name: RouteName, query: Query) -> Self {
        Self::Named {
            name,
            query: Some(query),
        }
    }

    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }
}

/// Router abstraction the auth flow navigates through.
pub trait Navigator: Send + Sync {
    fn navigate(&self, request: NavigationRequest);
}
