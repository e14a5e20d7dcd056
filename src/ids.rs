//! Opaque identifiers used throughout the engine.
//!
//! Keeping these as distinct newtypes (rather than bare `String`/`u32`)
//! means a tab id can never be accidentally used to index the session map,
//! and vice versa — the compiler catches what would otherwise be a runtime
//! invariant violation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique opaque session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a new, process-unique id. Not a UUID: the host never needs
    /// global uniqueness, only uniqueness within one running engine.
    pub fn generate() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let nonce: u64 = {
            // A cheap, dependency-free mixing of the counter and the
            // pointer address of the counter itself, good enough to avoid
            // ids that are trivially guessable in sequence across restarts.
            let addr = &COUNTER as *const _ as u64;
            n.wrapping_mul(0x9E3779B97F4A7C15).wrapping_add(addr)
        };
        SessionId(format!("s-{:016x}", nonce))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        SessionId(s)
    }
}

impl<'a> From<&'a str> for SessionId {
    fn from(s: &'a str) -> Self {
        SessionId(s.to_owned())
    }
}

/// Host-assigned tab identifier. Hosts may reuse numeric tab ids across
/// restarts, which is exactly why C7's URL-based restoration exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TabId(u32);

impl TabId {
    pub fn new(id: u32) -> Self {
        TabId(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TabId {
    fn from(v: u32) -> Self {
        TabId(v)
    }
}

/// Host-assigned window identifier, used only for restoration metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(u32);

impl WindowId {
    pub fn new(id: u32) -> Self {
        WindowId(id)
    }
}

impl From<u32> for WindowId {
    fn from(v: u32) -> Self {
        WindowId(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
    }
}
