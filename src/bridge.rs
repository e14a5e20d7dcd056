//! Page bridge (C6): the host-side endpoint for partitioned
//! `document.cookie` and Web Storage calls made by page scripts.
//!
//! The cookie-string parsing idiom (splitting on `;`, trimming, rejecting
//! empty names) is grounded in `wasm-cookies-rs`'s `all_iter_raw`; the 500ms
//! read-through cache follows the teacher's `once_cell::Lazy` caching style
//! (`src/agent.rs`'s pooled-connection cache) generalized to a keyed,
//! time-stamped entry instead of a single lazily-initialized value.

use std::collections::HashMap;

use crate::cookie::CookieStore;
use crate::header::{parse_set_cookie, serialize_cookie_header};
use crate::ids::SessionId;

struct CacheEntry {
    value: String,
    fetched_at_ms: u64,
}

/// Owns the document-cookie read cache. One instance per engine; entries
/// are keyed by `(session, document_url)` so two documents open in the same
/// session don't thrash each other's cache.
#[derive(Default)]
pub struct PageBridge {
    cache: HashMap<(SessionId, String), CacheEntry>,
}

impl PageBridge {
    pub fn new() -> Self {
        PageBridge::default()
    }

    /// `document.cookie` getter. Returns the cached rendering if it is
    /// younger than `ttl_ms`, otherwise recomputes from C1 and refreshes the
    /// cache. `HttpOnly` cookies are never included (spec.md §4.1/§4.6).
    pub fn get_document_cookie(
        &mut self,
        cookies: &CookieStore,
        session: &SessionId,
        url: &http::Uri,
        now_ms: u64,
        ttl_ms: u64,
    ) -> String {
        let key = (session.clone(), url.to_string());
        if let Some(entry) = self.cache.get(&key) {
            if now_ms.saturating_sub(entry.fetched_at_ms) < ttl_ms {
                return entry.value.clone();
            }
        }
        let value = Self::render(cookies, session, url, now_ms);
        self.cache.insert(
            key,
            CacheEntry {
                value: value.clone(),
                fetched_at_ms: now_ms,
            },
        );
        value
    }

    /// `document.cookie` setter. Parses `raw` the same way a `Set-Cookie`
    /// response header would be parsed (page script cookie assignment and
    /// `Set-Cookie` share a grammar), validates the domain via C3, and on
    /// success updates C1 and speculatively refreshes the cache so an
    /// immediate follow-up read observes the write — preserving
    /// `document.cookie`'s synchronous read-your-write contract without
    /// waiting on any round trip. Returns `false` if the assignment was
    /// rejected (bad domain, empty name).
    pub fn set_document_cookie(
        &mut self,
        cookies: &mut CookieStore,
        session: &SessionId,
        url: &http::Uri,
        raw: &str,
        now_ms: u64,
    ) -> bool {
        let cookie = match parse_set_cookie(raw, url, now_ms) {
            Some(c) => c,
            None => return false,
        };
        cookies.put(session, url, cookie, now_ms);
        let key = (session.clone(), url.to_string());
        let value = Self::render(cookies, session, url, now_ms);
        self.cache.insert(key, CacheEntry { value, fetched_at_ms: now_ms });
        true
    }

    /// Drops every cached entry for `session`, used when a session is
    /// deleted so a stale cache entry never outlives its jar.
    pub fn evict_session(&mut self, session: &SessionId) {
        self.cache.retain(|(sid, _), _| sid != session);
    }

    fn render(cookies: &CookieStore, session: &SessionId, url: &http::Uri, now_ms: u64) -> String {
        let mut visible = cookies.get(session, url, now_ms);
        visible.retain(|c| !c.http_only);
        serialize_cookie_header(&visible)
    }
}

const STORAGE_NAMESPACE_PREFIX: &str = "__SID_";
const STORAGE_NAMESPACE_SUFFIX: &str = "__";

/// Prefixes a `localStorage`/`sessionStorage` key with the session's
/// namespace. The namespace map lives in the host's partition for the
/// document origin, so cross-origin isolation is the host's job; this
/// function only handles the per-session slice within one origin.
pub fn namespaced_key(session: &SessionId, key: &str) -> String {
    format!("{}{}{}{}", STORAGE_NAMESPACE_PREFIX, session.as_str(), STORAGE_NAMESPACE_SUFFIX, key)
}

/// Recovers the original key from a namespaced one, if it belongs to
/// `session`. Used by diagnostics and storage-quota accounting; normal
/// page-script access never needs this, since the host rewrites keys
/// transparently on the way in.
pub fn strip_namespace<'a>(session: &SessionId, namespaced: &'a str) -> Option<&'a str> {
    let prefix = format!("{}{}{}", STORAGE_NAMESPACE_PREFIX, session.as_str(), STORAGE_NAMESPACE_SUFFIX);
    namespaced.strip_prefix(prefix.as_str())
}
