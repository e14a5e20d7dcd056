//! Top-level engine state, composing every component behind the §6
//! capability surface a host links against.
//!
//! Grounded in the teacher's `Agent` (`src/agent.rs`) as the top-level
//! owning struct pattern, generalized from "one struct per connection pool"
//! to "one struct per extension instance". `EngineState` is `!Sync` by
//! design: every mutator takes `&mut self`, matching the single-threaded
//! cooperative scheduling model of spec.md §5 — there is no locking
//! anywhere in this module.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::bridge::PageBridge;
use crate::cleanup;
use crate::config::{EngineConfig, Tier};
use crate::cookie::CookieStore;
use crate::error::{EngineError, EngineResult};
use crate::host::{CrossDeviceStore, KvStore, ObjectStore};
use crate::ids::{SessionId, TabId};
use crate::init::{InitManager, InitState};
use crate::interceptor::{self, RequestOutcome, ResponseOutcome};
use crate::lifecycle::{self, CloseOutcome, InheritanceDecision};
use crate::persistence::{self, AutoRestoreConfig, PersistedSnapshot, PersistenceManager};
use crate::registry::SessionRegistry;

#[derive(Debug, Clone)]
pub struct TabSummary {
    pub tab_id: TabId,
    pub title: String,
    pub url: String,
    pub domain: String,
}

#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub name: Option<String>,
    pub color: String,
    pub tabs: Vec<TabSummary>,
}

#[derive(Debug, Clone, Copy)]
pub struct CanCreateSession {
    pub allowed: bool,
    pub tier: Tier,
    pub current: usize,
    pub limit: Option<usize>,
}

pub struct EngineState {
    config: EngineConfig,
    registry: SessionRegistry,
    cookies: CookieStore,
    bridge: PageBridge,
    init: InitManager,
    tier: Tier,
    auto_restore: AutoRestoreConfig,
    tier_change_generation: AtomicU64,
}

impl EngineState {
    pub fn new(config: EngineConfig, tier: Tier) -> Self {
        EngineState {
            config,
            registry: SessionRegistry::new(),
            cookies: CookieStore::new(),
            bridge: PageBridge::new(),
            init: InitManager::new(),
            tier,
            auto_restore: AutoRestoreConfig::default(),
            tier_change_generation: AtomicU64::new(0),
        }
    }

    pub fn init(&self) -> &InitManager {
        &self.init
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn is_ready(&self) -> bool {
        self.init.is_ready()
    }

    /// Drives the C9 phase sequence (spec.md §4.9). License checks and the
    /// auto-restore decision belong to external collaborators (§1) this
    /// crate doesn't model; this function owns only the phases that touch
    /// C4/C8 directly. Idempotent: a call once READY or ERROR is a no-op.
    pub async fn initialize<K, O, C>(&mut self, persistence: &PersistenceManager<K, O, C>) -> InitState
    where
        K: KvStore,
        O: ObjectStore,
        C: CrossDeviceStore,
    {
        if self.init.state().is_terminal() {
            return self.init.state();
        }
        self.init.advance(InitState::Loading);
        self.init.advance(InitState::LicenseInit);
        self.init.advance(InitState::LicenseReady);
        self.init.advance(InitState::AutoRestoreCheck);

        match persistence.load_snapshot().await {
            Ok((outcome, Some(snapshot))) => {
                tracing::info!(?outcome, "rehydrating engine state from persisted snapshot");
                self.auto_restore = snapshot.auto_restore.clone();
                persistence::rehydrate(&mut self.registry, &mut self.cookies, snapshot);
            }
            Ok((outcome, None)) => {
                tracing::info!(?outcome, "starting with no persisted state");
            }
            Err(e) => {
                tracing::error!(error = %e, "startup load failed");
                self.init.fail();
                return self.init.state();
            }
        }
        self.init.advance(InitState::SessionLoad);
        cleanup::expiry_sweep(&mut self.cookies, 0);
        self.init.advance(InitState::Cleanup);
        self.init.state()
    }

    // ---- §6 capability surface ----

    pub fn create_session(&mut self, tier: Tier, requested_color: Option<&str>, now_ms: u64) -> EngineResult<SessionId> {
        self.registry.create(tier, requested_color, now_ms)
    }

    pub fn list_active_sessions(&self) -> Vec<SessionSummary> {
        self.registry
            .list_active()
            .into_iter()
            .map(|s| SessionSummary {
                session_id: s.id.clone(),
                name: s.name.clone(),
                color: s.color.clone(),
                tabs: s
                    .tabs
                    .iter()
                    .map(|tab| {
                        let meta = s.tab_metadata.get(tab);
                        TabSummary {
                            tab_id: *tab,
                            title: meta.map(|m| m.title.clone()).unwrap_or_default(),
                            url: meta.map(|m| m.url.clone()).unwrap_or_default(),
                            domain: meta
                                .and_then(|m| m.url.parse::<http::Uri>().ok())
                                .and_then(|u| u.host().map(|h| h.to_string()))
                                .unwrap_or_default(),
                        }
                    })
                    .collect(),
            })
            .collect()
    }

    pub fn bind_tab(&mut self, tab: TabId, session: &SessionId) -> EngineResult<()> {
        self.registry.bind(tab, session)
    }

    pub fn get_session_for_tab(&self, tab: TabId) -> Option<SessionId> {
        self.registry.get_session_for_tab(tab)
    }

    pub fn can_create_session(&self) -> CanCreateSession {
        let (allowed, current, limit) = self.registry.can_create_session(self.tier);
        CanCreateSession {
            allowed,
            tier: self.tier,
            current,
            limit,
        }
    }

    pub fn rename_session(&mut self, session: &SessionId, name: &str) -> EngineResult<()> {
        self.registry.rename(session, name, self.tier)
    }

    pub fn set_color(&mut self, session: &SessionId, hex: &str) -> EngineResult<()> {
        self.registry.set_color(session, hex, self.tier)
    }

    pub fn set_auto_restore(&mut self, enabled: bool, dont_show_notice: bool) -> EngineResult<()> {
        if !self.tier.can_auto_restore() {
            return Err(EngineError::TierRestriction("auto-restore requires Enterprise".to_string()));
        }
        self.auto_restore.enabled = enabled;
        self.auto_restore.dont_show_notice = dont_show_notice;
        Ok(())
    }

    /// Tier change notification (§6), debounced 5s before the new policy
    /// takes effect, using the same supersede-by-generation technique C8
    /// uses for its own write debounce (`persistence::PersistenceManager`).
    pub async fn notify_tier_changed(&mut self, old: Tier, new: Tier) {
        self.auto_restore.previous_tier = Some(old);
        self.auto_restore.new_tier = Some(new);
        let my_generation = self.tier_change_generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(Duration::from_secs(5)).await;
        if self.tier_change_generation.load(Ordering::SeqCst) != my_generation {
            return;
        }
        self.tier = new;
        if !new.can_auto_restore() {
            self.auto_restore.enabled = false;
            self.auto_restore.disabled_reason = Some("tier downgrade".to_string());
        }
    }

    // ---- C5: request/response interception ----

    pub fn on_request(&mut self, tab: TabId, url: &http::Uri, headers: &mut http::HeaderMap, now_ms: u64) -> RequestOutcome {
        interceptor::on_request(&self.cookies, &mut self.registry, self.is_ready(), tab, url, headers, now_ms)
    }

    pub fn on_response(&mut self, tab: TabId, url: &http::Uri, headers: &mut http::HeaderMap, now_ms: u64) -> ResponseOutcome {
        interceptor::on_response(&mut self.cookies, &self.registry, self.is_ready(), tab, url, headers, now_ms)
    }

    // ---- C6: page bridge ----

    pub fn document_cookie_get(&mut self, session: &SessionId, url: &http::Uri, now_ms: u64) -> String {
        let ttl_ms = self.config.page_bridge_cache_ttl.as_millis() as u64;
        self.bridge.get_document_cookie(&self.cookies, session, url, now_ms, ttl_ms)
    }

    pub fn document_cookie_set(&mut self, session: &SessionId, url: &http::Uri, raw: &str, now_ms: u64) -> bool {
        self.bridge.set_document_cookie(&mut self.cookies, session, url, raw, now_ms)
    }

    // ---- C7: tab lifecycle & inheritance ----

    pub fn on_tab_created(
        &mut self,
        tab: TabId,
        opener: Option<TabId>,
        url: &str,
        host: Option<&str>,
        now_ms: u64,
    ) -> InheritanceDecision {
        if !self.is_ready() {
            return InheritanceDecision::None;
        }
        let window_ms = self.config.noopener_inheritance_window.as_millis() as u64;
        let decision = lifecycle::decide_inheritance(&self.registry, opener, url, host, now_ms, window_ms);
        if let Some(session) = decision.session() {
            let _ = self.registry.bind(tab, session);
        }
        decision
    }

    pub fn on_tab_activity(&mut self, tab: TabId, now_ms: u64) {
        if self.is_ready() {
            lifecycle::on_tab_activity(&mut self.registry, tab, now_ms);
        }
    }

    pub fn on_tab_closed(&mut self, tab: TabId) -> CloseOutcome {
        if !self.is_ready() {
            return CloseOutcome::NotBound;
        }
        let outcome = lifecycle::on_tab_closed(&mut self.registry, &mut self.cookies, tab, self.tier, self.auto_restore.enabled);
        if let CloseOutcome::Deleted(session) = &outcome {
            self.bridge.evict_session(session);
        }
        outcome
    }

    // ---- C8: persistence glue ----

    pub fn snapshot(&self, now_ms: u64) -> PersistedSnapshot {
        persistence::snapshot(&self.registry, &self.cookies, self.auto_restore.clone(), now_ms)
    }
}
