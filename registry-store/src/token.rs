use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// A registry credential token.
///
/// This wrapper keeps the token out of debug output and wipes it from memory
/// when dropped. It serializes as a plain string, since the registry file
/// stores it verbatim.
///
/// Use [Token::revealed] to get the underlying value.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Create a token from its raw value
    pub fn new(value: impl Into<String>) -> Self {
        Token(value.into())
    }

    /// Expose the underlying value of this token
    pub fn revealed(&self) -> &str {
        &self.0
    }
}

impl Drop for Token {
    fn drop(&mut self) {
        self.0.zeroize()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(****)")
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Token(value)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Token(value.to_owned())
    }
}
