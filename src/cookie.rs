//! Partitioned cookie store (C1).
//!
//! One [`CookieJar`] per session, indexed `domain -> path -> name`, as
//! spec.md §3 requires. Grounded in the teacher's `Cookies` type
//! (`HashMap<String, CookieJar>` keyed by domain), generalized one level
//! deeper: the engine owns one such map *per session* instead of one
//! global jar, and builds its own `Cookie`/domain index instead of
//! wrapping the `cookie` crate's jar, since partitioning and serialization
//! to the persistence layer (C8) both need direct field access.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::scope_chain;
use crate::header::is_valid_cookie_domain;
use crate::ids::SessionId;
use crate::uri_ext::UriExt;

/// A cookie's `SameSite` attribute. Stored for completeness; per spec.md
/// §4.1 it is not enforced by the engine — the host browser applies
/// SameSite filtering to its own outgoing requests, the engine's job is
/// only to present the matching cookie set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
    Unspecified,
}

impl Default for SameSite {
    fn default() -> Self {
        SameSite::Unspecified
    }
}

/// A single stored cookie. `expires: None` denotes a session cookie, which
/// lives until the owning session is deleted (never swept by time).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    /// Milliseconds since the Unix epoch, or `None` for a session cookie.
    pub expires: Option<u64>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Cookie {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: "/".to_string(),
            secure: false,
            http_only: false,
            same_site: SameSite::Unspecified,
            expires: None,
        }
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires.map(|e| e < now_ms).unwrap_or(false)
    }
}

/// Per-session cookie jar: `domain -> path -> name -> Cookie`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CookieJar {
    domains: BTreeMap<String, BTreeMap<String, BTreeMap<String, Cookie>>>,
}

impl CookieJar {
    pub fn new() -> Self {
        CookieJar::default()
    }

    fn insert(&mut self, cookie: Cookie) {
        self.domains
            .entry(cookie.domain.clone())
            .or_default()
            .entry(cookie.path.clone())
            .or_default()
            .insert(cookie.name.clone(), cookie);
    }

    /// Removes expired entries in place, pruning emptied path/domain
    /// buckets. Idempotent: running it twice in a row has the same effect
    /// as running it once.
    fn sweep_expired(&mut self, now_ms: u64) {
        for paths in self.domains.values_mut() {
            for names in paths.values_mut() {
                names.retain(|_, c| !c.is_expired(now_ms));
            }
            paths.retain(|_, names| !names.is_empty());
        }
        self.domains.retain(|_, paths| !paths.is_empty());
    }

    fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.domains
            .values()
            .flat_map(|paths| paths.values())
            .flat_map(|names| names.values())
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

/// Owns every session's jar, keyed by [`SessionId`]. This is component C1.
#[derive(Debug, Default)]
pub struct CookieStore {
    jars: std::collections::HashMap<SessionId, CookieJar>,
}

impl CookieStore {
    pub fn new() -> Self {
        CookieStore::default()
    }

    /// Inserts `cookie`, overwriting any prior entry with the same
    /// `(domain, path, name)` key. Rejects (silently, logging why) a
    /// cookie that is already expired or whose domain fails §4.3
    /// validation against `url`.
    pub fn put(&mut self, session: &SessionId, url: &http::Uri, cookie: Cookie, now_ms: u64) {
        if cookie.is_expired(now_ms) {
            tracing::trace!(cookie = %cookie.name, "rejecting already-expired cookie");
            return;
        }
        if !is_valid_cookie_domain(&cookie.domain, url) {
            tracing::trace!(cookie = %cookie.name, domain = %cookie.domain, "rejecting cookie with invalid domain for url");
            return;
        }
        self.jars.entry(session.clone()).or_default().insert(cookie);
    }

    /// Returns every non-expired cookie visible to a request for `url`:
    /// the host's cookie-scope chain (C2) walked from most to least
    /// specific, path-prefix matched, and secure-flag gated. Cookies are
    /// returned sorted by name for deterministic serialization; no other
    /// ordering is guaranteed by the contract.
    pub fn get(&self, session: &SessionId, url: &http::Uri, now_ms: u64) -> Vec<Cookie> {
        let jar = match self.jars.get(session) {
            Some(j) => j,
            None => return Vec::new(),
        };
        let host = match url.cookie_host() {
            Some(h) => h,
            None => return Vec::new(),
        };
        let is_secure = url.is_secure();
        let path = url.path();

        let mut out = Vec::new();
        for scope in scope_chain(&host) {
            let paths = match jar.domains.get(&scope) {
                Some(p) => p,
                None => continue,
            };
            for names in paths.values() {
                for cookie in names.values() {
                    if cookie.is_expired(now_ms) {
                        continue;
                    }
                    if !path.starts_with(cookie.path.as_str()) {
                        continue;
                    }
                    if cookie.secure && !is_secure {
                        continue;
                    }
                    out.push(cookie.clone());
                }
            }
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Sweeps expired entries from a single session's jar.
    pub fn remove_expired(&mut self, session: &SessionId, now_ms: u64) {
        if let Some(jar) = self.jars.get_mut(session) {
            jar.sweep_expired(now_ms);
        }
    }

    /// Sweeps expired entries from every jar (the periodic C10 job).
    pub fn remove_expired_all(&mut self, now_ms: u64) {
        for jar in self.jars.values_mut() {
            jar.sweep_expired(now_ms);
        }
    }

    /// Drops an entire session's jar.
    pub fn clear(&mut self, session: &SessionId) {
        self.jars.remove(session);
    }

    /// All non-expired cookies currently stored for `session`, used by
    /// C6's bridge and C8's persistence snapshot.
    pub fn all(&self, session: &SessionId, now_ms: u64) -> Vec<Cookie> {
        match self.jars.get(session) {
            Some(jar) => jar.iter().filter(|c| !c.is_expired(now_ms)).cloned().collect(),
            None => Vec::new(),
        }
    }

    pub fn jar(&self, session: &SessionId) -> Option<&CookieJar> {
        self.jars.get(session)
    }

    pub fn replace_jar(&mut self, session: SessionId, jar: CookieJar) {
        self.jars.insert(session, jar);
    }

    pub fn sessions(&self) -> impl Iterator<Item = &SessionId> {
        self.jars.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> http::Uri {
        s.parse().unwrap()
    }

    #[test]
    fn put_then_get_roundtrip() {
        let mut store = CookieStore::new();
        let sid = SessionId::from("s1");
        let url = uri("https://example.com/");
        store.put(&sid, &url, Cookie::new("sid", "alice", "example.com"), 1_000);

        let cookies = store.get(&sid, &url, 1_000);
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].value, "alice");
    }

    #[test]
    fn expired_cookie_never_readable() {
        let mut store = CookieStore::new();
        let sid = SessionId::from("s1");
        let url = uri("https://example.com/");
        let mut c = Cookie::new("sid", "alice", "example.com");
        c.expires = Some(500);
        store.put(&sid, &url, c, 1_000);
        assert!(store.get(&sid, &url, 1_000).is_empty());
    }

    #[test]
    fn secure_cookie_withheld_from_plain_http() {
        let mut store = CookieStore::new();
        let sid = SessionId::from("s1");
        let https = uri("https://example.com/");
        let mut c = Cookie::new("sid", "alice", "example.com");
        c.secure = true;
        store.put(&sid, &https, c, 1_000);

        let http_req = uri("http://example.com/");
        assert!(store.get(&sid, &http_req, 1_000).is_empty());
        assert_eq!(store.get(&sid, &https, 1_000).len(), 1);
    }

    #[test]
    fn path_prefix_matching() {
        let mut store = CookieStore::new();
        let sid = SessionId::from("s1");
        let set_url = uri("https://example.com/account/login");
        let mut c = Cookie::new("a", "1", "example.com");
        c.path = "/account".to_string();
        store.put(&sid, &set_url, c, 1_000);

        assert_eq!(store.get(&sid, &uri("https://example.com/account/settings"), 1_000).len(), 1);
        assert!(store.get(&sid, &uri("https://example.com/other"), 1_000).is_empty());
    }

    #[test]
    fn sessions_are_partitioned() {
        let mut store = CookieStore::new();
        let s1 = SessionId::from("s1");
        let s2 = SessionId::from("s2");
        let url = uri("https://example.com/");
        store.put(&s1, &url, Cookie::new("sid", "alice", "example.com"), 0);
        store.put(&s2, &url, Cookie::new("sid", "bob", "example.com"), 0);

        assert_eq!(store.get(&s1, &url, 0)[0].value, "alice");
        assert_eq!(store.get(&s2, &url, 0)[0].value, "bob");
    }

    #[test]
    fn bare_tld_cookie_never_matches() {
        let mut store = CookieStore::new();
        let sid = SessionId::from("s1");
        let url = uri("https://evil.com/");
        // this would only be reachable if C3 failed to reject it; C1 must
        // also refuse to serve cookies scoped at a bare TLD.
        let mut jar = CookieJar::new();
        jar.insert(Cookie::new("x", "y", "com"));
        store.replace_jar(sid.clone(), jar);
        assert!(store.get(&sid, &url, 0).is_empty());
    }

    #[test]
    fn sweep_is_idempotent() {
        let mut store = CookieStore::new();
        let sid = SessionId::from("s1");
        let url = uri("https://example.com/");
        let mut c = Cookie::new("sid", "alice", "example.com");
        c.expires = Some(500);
        store.put(&sid, &url, c, 0);
        store.remove_expired(&sid, 1_000);
        let snapshot = format!("{:?}", store.jar(&sid));
        store.remove_expired(&sid, 1_000);
        assert_eq!(snapshot, format!("{:?}", store.jar(&sid)));
    }
}
