//! Request/response interceptor (C5).
//!
//! Grounded in `Agent::do_send` (`src/agent.rs`): the teacher reads
//! matching cookies before sending and captures `Set-Cookie` after
//! receiving, in the same place. Reshaped here into the pure `(state,
//! request) -> (state, new_headers)` functions §9 calls for — this crate
//! doesn't own the connection, the host does, so these functions only
//! compute the header rewrite and mutate C1/C4 in-memory state; any
//! required I/O (the debounced persistence commit) happens outside this
//! critical path, per §5's "must not suspend" contract.

use http::header::{HeaderValue, COOKIE, SET_COOKIE};
use http::HeaderMap;

use crate::cookie::CookieStore;
use crate::header::{parse_set_cookie, serialize_cookie_header};
use crate::ids::{SessionId, TabId};
use crate::registry::SessionRegistry;
use crate::uri_ext::UriExt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// C9 was not READY; headers are untouched.
    NotReady,
    /// The tab has no session bound; headers are untouched.
    Unbound,
    /// Cookies for `session` were substituted (possibly zero of them).
    Applied { session: SessionId, cookie_count: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    NotReady,
    Unbound,
    /// `captured` cookies were parsed and stored; every `Set-Cookie` header
    /// was stripped from the response regardless.
    Captured { session: SessionId, captured: usize },
}

/// Step 1-4 of spec.md §4.5's "On request". Synchronous and total: never
/// panics, never leaves `headers` in a worse state than it found them.
pub fn on_request(
    cookies: &CookieStore,
    registry: &mut SessionRegistry,
    ready: bool,
    tab: TabId,
    url: &http::Uri,
    headers: &mut HeaderMap,
    now_ms: u64,
) -> RequestOutcome {
    if !ready {
        return RequestOutcome::NotReady;
    }
    let session = match registry.get_session_for_tab(tab) {
        Some(s) => s,
        None => return RequestOutcome::Unbound,
    };

    if let Some(host) = url.cookie_host() {
        registry.record_domain_activity(&host, &session, now_ms);
    }

    let matching = cookies.get(&session, url, now_ms);
    headers.remove(COOKIE);
    let count = matching.len();
    if !matching.is_empty() {
        let value = serialize_cookie_header(&matching);
        if let Ok(hv) = HeaderValue::from_str(&value) {
            headers.insert(COOKIE, hv);
        } else {
            tracing::warn!("failed to encode Cookie header value");
        }
    }

    RequestOutcome::Applied {
        session,
        cookie_count: count,
    }
}

/// Step 1-3 of spec.md §4.5's "On response". Every `Set-Cookie` header is
/// stripped unconditionally (so the host's native jar never observes
/// them) whenever the tab is bound to a session; unbound tabs pass
/// through untouched, same as the request side.
pub fn on_response(
    cookies: &mut CookieStore,
    registry: &SessionRegistry,
    ready: bool,
    tab: TabId,
    url: &http::Uri,
    headers: &mut HeaderMap,
    now_ms: u64,
) -> ResponseOutcome {
    if !ready {
        return ResponseOutcome::NotReady;
    }
    let session = match registry.get_session_for_tab(tab) {
        Some(s) => s,
        None => return ResponseOutcome::Unbound,
    };

    let mut captured = 0;
    for raw in headers.get_all(SET_COOKIE).iter() {
        let text = match raw.to_str() {
            Ok(t) => t,
            Err(_) => continue,
        };
        if let Some(cookie) = parse_set_cookie(text, url, now_ms) {
            cookies.put(&session, url, cookie, now_ms);
            captured += 1;
        } else {
            tracing::trace!(header = %text, "dropped unparseable or invalid Set-Cookie");
        }
    }
    headers.remove(SET_COOKIE);

    ResponseOutcome::Captured { session, captured }
}
