//! Registry records and the on-disk document that holds them

use serde::{Deserialize, Serialize};

use crate::token::Token;

/// A registry endpoint known to the hub
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    /// Unique identifier, assigned on creation and never reused
    pub id: u64,

    /// Display name
    pub name: String,

    /// Base URL of the registry, without a trailing slash
    pub url: String,

    /// Credential token sent to the registry, if it needs one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<Token>,
}

/// A registry that has not been assigned an identifier yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistry {
    /// Display name
    pub name: String,

    /// Base URL of the registry, without a trailing slash
    pub url: String,

    /// Credential token sent to the registry, if it needs one
    pub token: Option<Token>,
}

impl NewRegistry {
    /// Create an anonymous registry entry
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            token: None,
        }
    }

    /// Attach a credential token
    pub fn token(mut self, token: impl Into<Token>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn with_id(self, id: u64) -> Registry {
        Registry {
            id,
            name: self.name,
            url: self.url,
            token: self.token,
        }
    }
}

/// The persisted registry document
///
/// `last_id` is the largest identifier ever issued and `list` is kept in
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryFile {
    /// The most recently assigned identifier
    pub last_id: u64,

    /// Registries in insertion order
    pub list: Vec<Registry>,
}

impl RegistryFile {
    /// Assign the next identifier to `entry` and append it
    pub fn push(&mut self, entry: NewRegistry) -> Registry {
        self.last_id += 1;
        let registry = entry.with_id(self.last_id);
        self.list.push(registry.clone());
        registry
    }

    /// Find a registry by identifier
    pub fn get(&self, id: u64) -> Option<&Registry> {
        self.list.iter().find(|registry| registry.id == id)
    }

    /// Raise `last_id` to cover every identifier already in the list.
    ///
    /// Returns true if the document had to be corrected.
    pub(crate) fn repair_last_id(&mut self) -> bool {
        let max = self.list.iter().map(|r| r.id).max().unwrap_or(0);
        if max > self.last_id {
            self.last_id = max;
            true
        } else {
            false
        }
    }
}
