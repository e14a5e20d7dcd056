//! Domain/TLD classifier (C2).
//!
//! Pure, stateless decision of whether a candidate host label is legitimate
//! as a cookie scope. This is the authority consulted by C1's parent-domain
//! walk (see [`crate::cookie::CookieJar::get`]): the walk stops the moment
//! the next parent would fail [`is_valid_cookie_scope`], which is exactly
//! what stops a cookie from matching across an entire TLD.

use std::net::{Ipv4Addr, Ipv6Addr};

/// Returns `true` if `candidate` may legitimately be used as a cookie scope
/// (a `Domain` attribute, or an implicit host-only scope).
///
/// Decision order mirrors spec.md §4.2:
/// 1. `"localhost"` is always valid.
/// 2. A literal IPv4 or IPv6 address is always valid.
/// 3. A single label not on the seeded TLD table is valid (`intranet`,
///    `server01`, ...).
/// 4. A single label on the seeded TLD table is a bare TLD — rejected.
/// 5. A multi-label candidate is rejected only if it is *exactly* a known
///    multi-part public suffix (`co.uk`, `com.au`, ...); anything with a
///    registrable label in front of that suffix is valid.
pub fn is_valid_cookie_scope(candidate: &str) -> bool {
    if candidate.eq_ignore_ascii_case("localhost") {
        return true;
    }
    if is_ip_literal(candidate) {
        return true;
    }
    !tabjar_psl::is_bare_suffix(candidate)
}

fn is_ip_literal(candidate: &str) -> bool {
    let stripped = candidate.strip_prefix('[').and_then(|s| s.strip_suffix(']'));
    let host = stripped.unwrap_or(candidate);
    host.parse::<Ipv4Addr>().is_ok() || host.parse::<Ipv6Addr>().is_ok()
}

/// Walks `host` up through its parent domains (`a.b.example.co.uk` ->
/// `b.example.co.uk` -> `example.co.uk`, stopping before `co.uk`), yielding
/// every level that is itself a valid cookie scope. Used by C1 to compute
/// the set of domain buckets a request's host may read cookies from.
pub fn scope_chain(host: &str) -> Vec<String> {
    let host = host.to_ascii_lowercase();
    let mut out = Vec::new();
    let mut cur: Option<&str> = Some(host.as_str());
    while let Some(h) = cur {
        if !is_valid_cookie_scope(h) {
            break;
        }
        out.push(h.to_string());
        cur = h.split_once('.').map(|(_, rest)| rest);
    }
    out
}
