//! Authenticated identity record and the derived session snapshot.
//!
//! DESIGN
//! ======
//! `authenticated` and `is_admin` are computed from the identity on every
//! read. Nothing else stores a "logged in" flag, so the session, the route
//! guard and the root redirect cannot disagree about who is signed in.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// User role as reported by the backend. Only `"admin"` is privileged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Other(String),
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Other(name) => name,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        if raw == "admin" { Self::Admin } else { Self::Other(raw) }
    }
}

impl From<&str> for Role {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_owned())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => "admin".to_owned(),
            Role::Other(name) => name,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The signed-in user as cached on this client.
///
/// Profile fields the client does not interpret (`email`, `name`, ...) are
/// kept in `profile` and written back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

impl Identity {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into(), role: None, profile: Map::new() }
    }

    #[must_use]
    pub fn with_role(mut self, role: impl Into<Role>) -> Self {
        self.role = Some(role.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.profile.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.profile.get(key)
    }

    /// Best human-readable label for log lines: email, then name, then `"unknown"`.
    #[must_use]
    pub fn label(&self) -> &str {
        ["email", "name", "username"]
            .iter()
            .find_map(|k| self.field(k).and_then(Value::as_str))
            .unwrap_or("unknown")
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.as_ref().is_some_and(Role::is_admin)
    }
}

/// Point-in-time view of the session, broadcast to observers on every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub identity: Option<Identity>,
    /// Bumped by every login and logout.
    pub epoch: u64,
}

impl SessionSnapshot {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.identity.as_ref().is_some_and(Identity::is_admin)
    }

    #[must_use]
    pub fn role(&self) -> Option<&Role> {
        self.identity.as_ref().and_then(|i| i.role.as_ref())
    }
}

#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;
