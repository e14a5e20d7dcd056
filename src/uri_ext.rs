//! Small `http::Uri` helpers the interceptor and codec need.
//!
//! Adapted from the host/scheme extraction idiom in a conventional
//! `UriExt` trait: this engine doesn't open connections, so the transport
//! bits (`HostPort`, ALPN hints) are dropped and only the parts relevant to
//! cookie scoping remain.

pub(crate) trait UriExt {
    /// Lower-cased host, or `None` if the URI has no authority.
    fn cookie_host(&self) -> Option<String>;
    /// Tell if this URI is using a secure scheme (`https`).
    fn is_secure(&self) -> bool;
}

impl UriExt for http::Uri {
    fn cookie_host(&self) -> Option<String> {
        self.host().map(|h| h.to_ascii_lowercase())
    }

    fn is_secure(&self) -> bool {
        self.scheme_str()
            .map(|s| s.eq_ignore_ascii_case("https"))
            .unwrap_or(false)
    }
}
