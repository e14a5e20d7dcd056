//! Session registry (C4).
//!
//! Grounded in the teacher's `Agent` (`src/agent.rs`): a struct owning its
//! maps directly, with all mutation going through methods — no ad-hoc
//! mutation of a stray global, per §9's re-architecture guidance. Where
//! `Agent` holds `connections`/`cookies`/`redirects` as plain fields, this
//! registry holds `sessions`/`bindings`/`domain_activity`.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::config::{palette_for, Tier};
use crate::error::{EngineError, EngineResult};
use crate::ids::{SessionId, TabId, WindowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Active,
    Dormant,
    /// Transient: set right after `create`, before the first tab binds.
    /// Skips `last_accessed` touches so a session doesn't look "recently
    /// used" purely from being created.
    Creating,
}

/// Last-known tab placement, used to restore a dormant session's tabs by
/// URL when the host reassigns tab ids across a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabMetadata {
    pub url: String,
    pub title: String,
    pub index: u32,
    pub pinned: bool,
    pub window_id: Option<WindowId>,
}

/// A restoration target for a dormant session's reopened tabs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabSpec {
    pub url: String,
    pub pinned: bool,
    pub window_id: Option<WindowId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub color: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub custom_color: bool,
    pub created_at: u64,
    #[serde(default)]
    pub last_accessed: u64,
    pub tabs: HashSet<TabId>,
    #[serde(default)]
    pub tab_metadata: HashMap<TabId, TabMetadata>,
    pub state: SessionState,
}

impl Session {
    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active)
    }
}

/// `Host -> SessionId -> last_seen_ms`, used only by C7's inheritance
/// heuristics (§4.7) and evicted wholesale when a session is deleted.
#[derive(Debug, Default)]
struct DomainActivity {
    seen: HashMap<String, HashMap<SessionId, u64>>,
}

impl DomainActivity {
    fn record(&mut self, host: &str, session: &SessionId, now_ms: u64) {
        self.seen
            .entry(host.to_string())
            .or_default()
            .insert(session.clone(), now_ms);
    }

    fn most_recent_within(&self, host: &str, now_ms: u64, window_ms: u64) -> Option<SessionId> {
        let entries = self.seen.get(host)?;
        entries
            .iter()
            .filter(|(_, &seen)| now_ms.saturating_sub(seen) <= window_ms)
            .max_by_key(|(_, &seen)| seen)
            .map(|(sid, _)| sid.clone())
    }

    fn evict_session(&mut self, session: &SessionId) {
        for entries in self.seen.values_mut() {
            entries.remove(session);
        }
        self.seen.retain(|_, entries| !entries.is_empty());
    }
}

/// Owns sessions, tab bindings, and the domain-activity index. Component
/// C4. Every mutation is a method: invariants 1, 2, 5, and 6 of spec.md §3
/// are maintained by construction (no caller can reach into the maps
/// directly).
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
    bindings: HashMap<TabId, SessionId>,
    domain_activity: DomainActivity,
}

impl SessionRegistry {
    pub fn new() -> Self {
        SessionRegistry::default()
    }

    fn active_count(&self) -> usize {
        self.sessions.values().filter(|s| s.is_active()).count()
    }

    /// Creates a new session in the `Creating` state. The caller (C7, or a
    /// direct UI action) is expected to `bind` a tab to it immediately
    /// after, which promotes it to `Active`.
    pub fn create(
        &mut self,
        tier: Tier,
        requested_color: Option<&str>,
        now_ms: u64,
    ) -> EngineResult<SessionId> {
        if let Some(limit) = tier.active_session_limit() {
            let current = self.active_count();
            if current >= limit {
                return Err(EngineError::LimitExceeded { current, limit });
            }
        }

        let color = match requested_color {
            Some(hex) => {
                if !tier.can_set_custom_color() {
                    return Err(EngineError::TierRestriction(
                        "custom session colors require Enterprise".to_string(),
                    ));
                }
                if !is_valid_hex_color(hex) {
                    return Err(EngineError::ValidationFailure(format!(
                        "'{}' is not a valid 3- or 6-digit hex color",
                        hex
                    )));
                }
                hex.to_string()
            }
            None => String::new(),
        };

        let id = SessionId::generate();
        let custom_color = requested_color.is_some();
        let color = if custom_color {
            color
        } else {
            hashed_palette_color(&id, tier)
        };

        let session = Session {
            id: id.clone(),
            color,
            name: None,
            custom_color,
            created_at: now_ms,
            last_accessed: now_ms,
            tabs: HashSet::new(),
            tab_metadata: HashMap::new(),
            state: SessionState::Creating,
        };
        self.sessions.insert(id.clone(), session);
        Ok(id)
    }

    /// Binds `tab` to `session`. Promotes the session to `Active` (it now
    /// has at least one tab, satisfying invariant 5).
    pub fn bind(&mut self, tab: TabId, session: &SessionId) -> EngineResult<()> {
        let s = self
            .sessions
            .get_mut(session)
            .ok_or_else(|| EngineError::UnknownSession(session.clone()))?;
        s.tabs.insert(tab);
        s.state = SessionState::Active;
        self.bindings.insert(tab, session.clone());
        Ok(())
    }

    /// Removes a tab's binding. If it was the session's last tab, the
    /// session becomes `Dormant` — callers (C7) decide whether to instead
    /// delete it under an Enterprise auto-restore-on policy.
    pub fn unbind(&mut self, tab: TabId) -> Option<SessionId> {
        let session_id = self.bindings.remove(&tab)?;
        if let Some(s) = self.sessions.get_mut(&session_id) {
            s.tabs.remove(&tab);
            if s.tabs.is_empty() {
                s.state = SessionState::Dormant;
            }
        }
        Some(session_id)
    }

    pub fn get_session_for_tab(&self, tab: TabId) -> Option<SessionId> {
        self.bindings.get(&tab).cloned()
    }

    pub fn session(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn touch_last_accessed(&mut self, session: &SessionId, now_ms: u64) {
        if let Some(s) = self.sessions.get_mut(session) {
            if !matches!(s.state, SessionState::Creating) {
                s.last_accessed = now_ms;
            }
        }
    }

    pub fn update_tab_metadata(&mut self, session: &SessionId, tab: TabId, meta: TabMetadata) {
        if let Some(s) = self.sessions.get_mut(session) {
            s.tab_metadata.insert(tab, meta);
        }
    }

    pub fn record_domain_activity(&mut self, host: &str, session: &SessionId, now_ms: u64) {
        self.domain_activity.record(host, session, now_ms);
    }

    /// The session that most recently acted on `host` within
    /// `window_ms`, used by C7's noopener-inheritance heuristic.
    pub fn most_recent_session_for_host(
        &self,
        host: &str,
        now_ms: u64,
        window_ms: u64,
    ) -> Option<SessionId> {
        self.domain_activity.most_recent_within(host, now_ms, window_ms)
    }

    pub fn rename(&mut self, session: &SessionId, name: &str, tier: Tier) -> EngineResult<()> {
        if !tier.can_name_sessions() {
            return Err(EngineError::TierRestriction(
                "custom session names require Premium or Enterprise".to_string(),
            ));
        }
        let normalized = normalize_session_name(name)?;
        if self.sessions.iter().any(|(id, s)| {
            id != session
                && s.name
                    .as_deref()
                    .map(|n| n.eq_ignore_ascii_case(&normalized))
                    .unwrap_or(false)
        }) {
            return Err(EngineError::ValidationFailure(format!(
                "session name '{}' is already in use",
                normalized
            )));
        }
        let s = self
            .sessions
            .get_mut(session)
            .ok_or_else(|| EngineError::UnknownSession(session.clone()))?;
        s.name = Some(normalized);
        Ok(())
    }

    pub fn set_color(&mut self, session: &SessionId, hex: &str, tier: Tier) -> EngineResult<()> {
        if !tier.can_set_custom_color() {
            return Err(EngineError::TierRestriction(
                "custom session colors require Enterprise".to_string(),
            ));
        }
        if !is_valid_hex_color(hex) {
            return Err(EngineError::ValidationFailure(format!(
                "'{}' is not a valid 3- or 6-digit hex color",
                hex
            )));
        }
        let s = self
            .sessions
            .get_mut(session)
            .ok_or_else(|| EngineError::UnknownSession(session.clone()))?;
        s.color = hex.to_string();
        s.custom_color = true;
        Ok(())
    }

    pub fn list_active(&self) -> Vec<&Session> {
        self.sessions.values().filter(|s| s.is_active()).collect()
    }

    pub fn mark_dormant(&mut self, session: &SessionId) {
        if let Some(s) = self.sessions.get_mut(session) {
            s.state = SessionState::Dormant;
        }
    }

    /// Returns the restoration targets for a dormant session's tabs. Does
    /// not itself create tabs — that's the host's job, driven by C7.
    pub fn reopen_dormant(&self, session: &SessionId) -> Vec<TabSpec> {
        match self.sessions.get(session) {
            Some(s) => s
                .tab_metadata
                .values()
                .map(|m| TabSpec {
                    url: m.url.clone(),
                    pinned: m.pinned,
                    window_id: m.window_id,
                })
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn delete(&mut self, session: &SessionId) {
        self.sessions.remove(session);
        self.bindings.retain(|_, s| s != session);
        self.domain_activity.evict_session(session);
    }

    pub fn can_create_session(&self, tier: Tier) -> (bool, usize, Option<usize>) {
        let current = self.active_count();
        let limit = tier.active_session_limit();
        let allowed = limit.map(|l| current < l).unwrap_or(true);
        (allowed, current, limit)
    }

    pub fn all_sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn dormant_sessions(&self) -> Vec<&Session> {
        self.sessions
            .values()
            .filter(|s| matches!(s.state, SessionState::Dormant))
            .collect()
    }

    /// Replaces the entire registry contents wholesale. Used only by C8's
    /// startup rehydration — `domain_activity` is deliberately left empty,
    /// it is a runtime-only index with no persisted counterpart.
    pub fn load_sessions(&mut self, sessions: HashMap<SessionId, Session>, bindings: HashMap<TabId, SessionId>) {
        self.sessions = sessions;
        self.bindings = bindings;
    }

    pub fn bindings(&self) -> impl Iterator<Item = (&TabId, &SessionId)> {
        self.bindings.iter()
    }
}

fn is_valid_hex_color(s: &str) -> bool {
    let s = s.strip_prefix('#').unwrap_or(s);
    (s.len() == 3 || s.len() == 6) && s.chars().all(|c| c.is_ascii_hexdigit())
}

fn hashed_palette_color(id: &SessionId, tier: Tier) -> String {
    let palette = palette_for(tier);
    let hash = fnv1a(id.as_str().as_bytes());
    let idx = (hash as usize) % palette.len();
    palette[idx].to_string()
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Validates and normalizes a session name per spec.md §4.4: non-empty
/// after trim, at most 50 Unicode *graphemes* (so multi-codepoint emoji
/// still count as one "character"), no `< > " ' \``, and internal
/// whitespace runs collapsed to a single space.
fn normalize_session_name(name: &str) -> EngineResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(EngineError::ValidationFailure(
            "session name cannot be empty".to_string(),
        ));
    }
    if trimmed.chars().any(|c| "<>\"'`".contains(c)) {
        return Err(EngineError::ValidationFailure(
            "session name contains a disallowed character".to_string(),
        ));
    }
    let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    let grapheme_count = collapsed.graphemes(true).count();
    if grapheme_count > 50 {
        return Err(EngineError::ValidationFailure(
            "session name exceeds 50 characters".to_string(),
        ));
    }
    Ok(collapsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_promotes_to_active_on_bind() {
        let mut reg = SessionRegistry::new();
        let sid = reg.create(Tier::Free, None, 0).unwrap();
        assert!(!reg.session(&sid).unwrap().is_active());
        reg.bind(TabId::new(1), &sid).unwrap();
        assert!(reg.session(&sid).unwrap().is_active());
    }

    #[test]
    fn unbind_last_tab_marks_dormant() {
        let mut reg = SessionRegistry::new();
        let sid = reg.create(Tier::Free, None, 0).unwrap();
        reg.bind(TabId::new(1), &sid).unwrap();
        reg.unbind(TabId::new(1));
        assert_eq!(reg.session(&sid).unwrap().state, SessionState::Dormant);
        assert!(reg.session(&sid).unwrap().tabs.is_empty());
    }

    #[test]
    fn free_tier_limit_enforced_on_active_sessions_only() {
        let mut reg = SessionRegistry::new();
        for i in 0..3 {
            let sid = reg.create(Tier::Free, None, 0).unwrap();
            reg.bind(TabId::new(i), &sid).unwrap();
        }
        let err = reg.create(Tier::Free, None, 0).unwrap_err();
        assert!(matches!(err, EngineError::LimitExceeded { current: 3, limit: 3 }));

        let (allowed, current, limit) = reg.can_create_session(Tier::Free);
        assert!(!allowed);
        assert_eq!(current, 3);
        assert_eq!(limit, Some(3));
    }

    #[test]
    fn dormant_sessions_dont_count_against_the_limit() {
        let mut reg = SessionRegistry::new();
        for i in 0..3 {
            let sid = reg.create(Tier::Free, None, 0).unwrap();
            reg.bind(TabId::new(i), &sid).unwrap();
            reg.unbind(TabId::new(i));
        }
        // all three are now dormant; a fourth create should be allowed
        assert!(reg.create(Tier::Free, None, 0).is_ok());
    }

    #[test]
    fn custom_color_requires_enterprise() {
        let mut reg = SessionRegistry::new();
        assert!(matches!(
            reg.create(Tier::Premium, Some("#abcdef"), 0),
            Err(EngineError::TierRestriction(_))
        ));
        assert!(reg.create(Tier::Enterprise, Some("#abcdef"), 0).is_ok());
    }

    #[test]
    fn invalid_hex_color_rejected() {
        let mut reg = SessionRegistry::new();
        assert!(matches!(
            reg.create(Tier::Enterprise, Some("not-a-color"), 0),
            Err(EngineError::ValidationFailure(_))
        ));
    }

    #[test]
    fn naming_requires_premium_or_enterprise() {
        let mut reg = SessionRegistry::new();
        let sid = reg.create(Tier::Free, None, 0).unwrap();
        assert!(matches!(
            reg.rename(&sid, "Work", Tier::Free),
            Err(EngineError::TierRestriction(_))
        ));
        assert!(reg.rename(&sid, "Work", Tier::Premium).is_ok());
    }

    #[test]
    fn names_are_case_insensitively_unique() {
        let mut reg = SessionRegistry::new();
        let a = reg.create(Tier::Premium, None, 0).unwrap();
        let b = reg.create(Tier::Premium, None, 0).unwrap();
        reg.rename(&a, "Work", Tier::Premium).unwrap();
        assert!(matches!(
            reg.rename(&b, "WORK", Tier::Premium),
            Err(EngineError::ValidationFailure(_))
        ));
    }

    #[test]
    fn name_whitespace_collapsed_and_trimmed() {
        let mut reg = SessionRegistry::new();
        let sid = reg.create(Tier::Premium, None, 0).unwrap();
        reg.rename(&sid, "  Work   Stuff  ", Tier::Premium).unwrap();
        assert_eq!(reg.session(&sid).unwrap().name.as_deref(), Some("Work Stuff"));
    }

    #[test]
    fn domain_activity_respects_window() {
        let mut reg = SessionRegistry::new();
        let sid = reg.create(Tier::Free, None, 0).unwrap();
        reg.record_domain_activity("example.com", &sid, 1_000);
        assert_eq!(
            reg.most_recent_session_for_host("example.com", 1_000 + 30_000, 30_000),
            Some(sid.clone())
        );
        assert_eq!(
            reg.most_recent_session_for_host("example.com", 1_000 + 30_001, 30_000),
            None
        );
    }

    #[test]
    fn delete_evicts_domain_activity() {
        let mut reg = SessionRegistry::new();
        let sid = reg.create(Tier::Free, None, 0).unwrap();
        reg.record_domain_activity("example.com", &sid, 0);
        reg.delete(&sid);
        assert_eq!(reg.most_recent_session_for_host("example.com", 0, 30_000), None);
    }
}
