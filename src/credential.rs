//! The user-supplied API credential.
//!
//! The key is pasted in by the user, resent on every call and never stored.
//! [`Credential`] keeps it in a zeroizing buffer so the bytes are wiped when
//! the invocation that owns it finishes, and its `Debug` output is redacted so
//! it cannot leak through a `tracing` field or a panic message.

use std::fmt;
use zeroize::Zeroizing;

/// An API key held for the lifetime of a single invocation.
#[derive(Clone)]
pub struct Credential(Zeroizing<String>);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(Zeroizing::new(key.into()))
    }

    /// The raw key, for placing into a request header.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// True when no key was given. Whitespace is passed through untouched.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

impl From<&str> for Credential {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for Credential {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}
