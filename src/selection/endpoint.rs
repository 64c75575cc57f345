//! Endpoint identity and list parsing.
//!
//! # Responsibilities
//! - Represent a single remote endpoint by its address string
//! - Parse the newline-separated endpoint list supplied by the host
//!
//! # Design Decisions
//! - Addresses are opaque; no URL validation happens here
//! - Whitespace is trimmed once at parse time, so registry keys never differ by padding
//! - Duplicates are kept in list order

use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// A single remote endpoint, identified by its trimmed address.
///
/// Cloning is cheap: the address is shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Endpoint(Arc<str>);

impl Endpoint {
    /// Create an endpoint from an address, trimming surrounding whitespace.
    pub fn new(addr: impl AsRef<str>) -> Self {
        Self(Arc::from(addr.as_ref().trim()))
    }

    /// The address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Endpoint {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Endpoint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Endpoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl From<&str> for Endpoint {
    fn from(addr: &str) -> Self {
        Self::new(addr)
    }
}

impl From<String> for Endpoint {
    fn from(addr: String) -> Self {
        Self::new(addr)
    }
}

/// Parse a newline-separated endpoint list.
///
/// Lines are trimmed and blank lines dropped. Order and duplicates are preserved.
pub fn parse_endpoint_list(text: &str) -> Vec<Endpoint> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Endpoint::new)
        .collect()
}
