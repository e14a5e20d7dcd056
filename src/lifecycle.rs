//! Tab lifecycle and session inheritance (C7).
//!
//! Grounded in the teacher's `uri_ext.rs` host-parsing idioms (reused here
//! to decide whether an opener's URL is "real" before inheritance runs) and
//! in `crate::registry`'s domain-activity index for the noopener heuristic.

use crate::config::Tier;
use crate::cookie::CookieStore;
use crate::ids::{SessionId, TabId};
use crate::registry::SessionRegistry;

const BLANK_URL_MARKERS: &[&str] = &["about:blank", "about:newtab", "chrome://newtab/", "edge://newtab/"];

/// A "real" URL is one that isn't a blank/new-tab placeholder. Only real
/// URLs are eligible for inheritance (spec.md §4.7).
pub fn is_real_url(url: &str) -> bool {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return false;
    }
    !BLANK_URL_MARKERS.iter().any(|m| trimmed.eq_ignore_ascii_case(m))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InheritanceDecision {
    /// Opener (or navigation-target source) had a session; inherit it.
    FromOpener(SessionId),
    /// No opener, but domain activity within the window named a session.
    FromRecentActivity(SessionId),
    /// Blank tab, unbound opener, or no recent activity on this host.
    None,
}

impl InheritanceDecision {
    pub fn session(&self) -> Option<&SessionId> {
        match self {
            InheritanceDecision::FromOpener(s) | InheritanceDecision::FromRecentActivity(s) => Some(s),
            InheritanceDecision::None => None,
        }
    }
}

/// Decides what session (if any) a newly created tab should inherit.
/// `opener` covers both "child tab with a known opener" and "navigation
/// target creation" (§6 capability 5) — both carry a source tab id and are
/// treated identically by this decision.
pub fn decide_inheritance(
    registry: &SessionRegistry,
    opener: Option<TabId>,
    url: &str,
    host: Option<&str>,
    now_ms: u64,
    noopener_window_ms: u64,
) -> InheritanceDecision {
    if !is_real_url(url) {
        return InheritanceDecision::None;
    }
    if let Some(opener_tab) = opener {
        if let Some(session) = registry.get_session_for_tab(opener_tab) {
            return InheritanceDecision::FromOpener(session);
        }
    }
    let host = match host {
        Some(h) => h,
        None => return InheritanceDecision::None,
    };
    match registry.most_recent_session_for_host(host, now_ms, noopener_window_ms) {
        Some(session) => InheritanceDecision::FromRecentActivity(session),
        None => InheritanceDecision::None,
    }
}

/// Tab navigated, finished loading, or was activated: touch the session's
/// `last_accessed` (registry already skips this during `Creating`).
pub fn on_tab_activity(registry: &mut SessionRegistry, tab: TabId, now_ms: u64) {
    if let Some(session) = registry.get_session_for_tab(tab) {
        registry.touch_last_accessed(&session, now_ms);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The tab had no session bound; nothing to do.
    NotBound,
    /// The session still has other tabs open.
    StillActive(SessionId),
    /// The session's last tab closed and Enterprise auto-restore deleted it.
    Deleted(SessionId),
    /// The session's last tab closed; it is now Dormant, data retained.
    Dormant(SessionId),
}

/// Tab closed: unbind, then apply the last-tab policy (spec.md §4.7).
/// `cookies` is only touched on the `Deleted` path, to drop the jar
/// alongside the session record.
pub fn on_tab_closed(
    registry: &mut SessionRegistry,
    cookies: &mut CookieStore,
    tab: TabId,
    tier: Tier,
    auto_restore_enabled: bool,
) -> CloseOutcome {
    let session = match registry.unbind(tab) {
        Some(s) => s,
        None => return CloseOutcome::NotBound,
    };

    let still_active = registry.session(&session).map(|s| s.is_active()).unwrap_or(false);
    if still_active {
        return CloseOutcome::StillActive(session);
    }

    if tier == Tier::Enterprise && auto_restore_enabled {
        registry.delete(&session);
        cookies.clear(&session);
        CloseOutcome::Deleted(session)
    } else {
        CloseOutcome::Dormant(session)
    }
}
