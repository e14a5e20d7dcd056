//! Header codec and domain validation (C3).
//!
//! Grounded in the teacher's `effective_domain`/`is_valid_cookie_domain`
//! pair (`src/client/cookies.rs`) and in `cookie::Cookie`'s attribute
//! parsing, rewritten against `http::Uri` directly: the engine's `Cookie`
//! model (`crate::cookie::Cookie`) needs explicit `Max-Age`/`Expires`
//! precedence and an `Option<Cookie>` return the generic `cookie` crate
//! does not expose on these terms.

use crate::cookie::{Cookie, SameSite};
use crate::uri_ext::UriExt;

/// Parses a single `Set-Cookie` header value emitted in response to a
/// request for `request_url`. `now_ms` anchors `Max-Age` (which is
/// relative) — the teacher's signature takes only `(header, request_url)`;
/// this engine threads a clock reading through explicitly instead of
/// calling a wall clock from inside a pure parser (see DESIGN.md).
///
/// Returns `None` if the header cannot be tokenized into at least a
/// `name=value` pair, or if the cookie's domain fails
/// [`is_valid_cookie_domain`] against `request_url`.
pub fn parse_set_cookie(header: &str, request_url: &http::Uri, now_ms: u64) -> Option<Cookie> {
    let mut parts = header.split(';');
    let (name, value) = {
        let first = parts.next()?.trim();
        let (n, v) = first.split_once('=')?;
        (n.trim().to_string(), v.trim().to_string())
    };
    if name.is_empty() {
        return None;
    }

    let mut cookie = Cookie::new(name, value, "");
    let mut domain_set = false;
    let mut max_age_secs: Option<i64> = None;
    let mut expires_date: Option<u64> = None;

    for attr in parts {
        let attr = attr.trim();
        if attr.is_empty() {
            continue;
        }
        match attr.split_once('=') {
            Some((k, v)) => {
                let k = k.trim().to_ascii_lowercase();
                let v = v.trim();
                match k.as_str() {
                    "domain" => {
                        let d = v.trim_start_matches('.');
                        cookie.domain = d.to_ascii_lowercase();
                        domain_set = true;
                    }
                    "path" => cookie.path = v.to_string(),
                    "max-age" => max_age_secs = v.parse::<i64>().ok(),
                    "expires" => {
                        expires_date = httpdate::parse_http_date(v)
                            .ok()
                            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                            .map(|d| d.as_millis() as u64)
                    }
                    "samesite" => {
                        cookie.same_site = match v.to_ascii_lowercase().as_str() {
                            "strict" => SameSite::Strict,
                            "lax" => SameSite::Lax,
                            "none" => SameSite::None,
                            _ => SameSite::Unspecified,
                        };
                    }
                    _ => {}
                }
            }
            None => match attr.to_ascii_lowercase().as_str() {
                "secure" => cookie.secure = true,
                "httponly" => cookie.http_only = true,
                _ => {}
            },
        }
    }

    if !domain_set {
        cookie.domain = request_url.cookie_host()?;
    }

    if !is_valid_cookie_domain(&cookie.domain, request_url) {
        tracing::trace!(domain = %cookie.domain, "rejecting Set-Cookie with invalid domain");
        return None;
    }

    // Max-Age takes precedence over Expires, per RFC 6265 §5.3.
    cookie.expires = if let Some(secs) = max_age_secs {
        if secs <= 0 {
            Some(now_ms.saturating_sub(1))
        } else {
            Some(now_ms.saturating_add(secs as u64 * 1000))
        }
    } else {
        expires_date
    };

    Some(cookie)
}

/// `name=value` pairs joined by `"; "`, for the outgoing `Cookie` request
/// header. Values are emitted verbatim; escaping is the producer's
/// responsibility, same as the teacher's `Cookie::encoded()` call site in
/// `Agent::do_send`.
pub fn serialize_cookie_header(cookies: &[Cookie]) -> String {
    cookies
        .iter()
        .map(|c| format!("{}={}", c.name, c.value))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Renders a full `Set-Cookie`-style header (including `Domain`, `Path`,
/// and `Secure`) for one cookie. Not part of the host-facing contract —
/// used only to exercise the parse/serialize round-trip in tests, since
/// [`serialize_cookie_header`] intentionally carries no attributes (it
/// targets the outgoing `Cookie` header, not `Set-Cookie`).
#[cfg(test)]
fn serialize_set_cookie_header(c: &Cookie) -> String {
    let mut s = format!("{}={}; Domain={}; Path={}", c.name, c.value, c.domain, c.path);
    if c.secure {
        s.push_str("; Secure");
    }
    if c.http_only {
        s.push_str("; HttpOnly");
    }
    s
}

/// The cookie's domain (after stripping a leading `.`) must equal the
/// request host, or the request host must be a sub-domain of it
/// (`sub.example.com` accepting a cookie for `example.com`). The converse
/// — a cookie claiming a more specific host than the request — is
/// rejected. A domain that is itself a bare public suffix (`com`, `co.uk`)
/// is rejected outright, per C2 — otherwise `Domain=.com` from
/// `https://evil.com/` would pass the suffix check below.
pub fn is_valid_cookie_domain(cookie_domain: &str, request_url: &http::Uri) -> bool {
    let host = match request_url.cookie_host() {
        Some(h) => h,
        None => return false,
    };
    let domain = cookie_domain.trim_start_matches('.').to_ascii_lowercase();
    if domain.is_empty() {
        return false;
    }
    if !crate::domain::is_valid_cookie_scope(&domain) {
        return false;
    }
    if domain == host {
        return true;
    }
    host.ends_with(&format!(".{}", domain))
}
