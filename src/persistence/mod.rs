//! Tiered persistence (C8): a single logical store over L1 (fast KV), L2
//! (durable object store), and optional L3 (cross-device KV).
//!
//! Grounded in `vortex-infrastructure`'s repository/adapter layering for the
//! L1/L2/L3 trait split (`crate::host`), and in the teacher's `deadline.rs`
//! race-future idiom for the debounce timer — generalized here to a
//! generation counter checked after a `tokio::time::sleep`, since the
//! engine has no connection-level deadline to race against, only a pending
//! write to possibly supersede.

pub mod schema;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::cookie::CookieStore;
use crate::error::EngineResult;
use crate::host::{CrossDeviceStore, KvStore, ObjectStore};
use crate::ids::{SessionId, TabId};
use crate::registry::{Session, SessionRegistry};

pub use schema::{AutoRestoreConfig, CriticalMetadata, PersistedSnapshot, PersistedTabMetadata, SCHEMA_VERSION};

const SNAPSHOT_KEY: &str = "tabjar:snapshot";
const CRITICAL_KEY: &str = "tabjar:critical";

/// Builds the snapshot body from live engine state. Called right before a
/// commit, never cached — it must reflect whatever mutated C1/C4 since the
/// last write.
pub fn snapshot(
    registry: &SessionRegistry,
    cookies: &CookieStore,
    auto_restore: AutoRestoreConfig,
    now_ms: u64,
) -> PersistedSnapshot {
    let sessions: std::collections::HashMap<SessionId, Session> =
        registry.all_sessions().map(|s| (s.id.clone(), s.clone())).collect();

    let jars = cookies
        .sessions()
        .filter_map(|sid| cookies.jar(sid).map(|jar| (sid.clone(), jar.clone())))
        .collect();

    let bindings: std::collections::HashMap<TabId, SessionId> =
        registry.bindings().map(|(t, s)| (*t, s.clone())).collect();

    let tab_metadata = sessions
        .values()
        .flat_map(|s| {
            s.tab_metadata.iter().map(move |(tab, meta)| {
                (
                    *tab,
                    PersistedTabMetadata {
                        url: meta.url.clone(),
                        title: meta.title.clone(),
                        index: meta.index,
                        pinned: meta.pinned,
                        window_id: meta.window_id,
                        session_id: s.id.clone(),
                    },
                )
            })
        })
        .collect();

    PersistedSnapshot {
        schema_version: SCHEMA_VERSION,
        sessions,
        jars,
        bindings,
        tab_metadata,
        auto_restore,
        last_saved_ms: now_ms,
    }
}

/// Applies a loaded snapshot back onto live engine state. The caller is
/// expected to have just constructed fresh, empty `registry`/`cookies`.
pub fn rehydrate(registry: &mut SessionRegistry, cookies: &mut CookieStore, snapshot: PersistedSnapshot) {
    registry.load_sessions(snapshot.sessions, snapshot.bindings);
    for (session, jar) in snapshot.jars {
        cookies.replace_jar(session, jar);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    FromL1,
    RehydratedFromL2,
    CleanStart,
    /// L1 and L2 were both empty but L3 reports a prior session count —
    /// the host likely wiped local storage. Not fatal; the engine starts
    /// clean and logs the anomaly (spec.md §4.8).
    AnomalyCleanStart { prior_session_count: usize },
}

/// Owns the three storage tiers and the debounce generation counter.
/// `!Sync` by construction is not required here (the traits require
/// `Send + Sync`), but every method still takes `&self` since the tiers
/// themselves own their mutability — the engine above this only ever calls
/// in from its single event-dispatch thread (spec.md §5).
pub struct PersistenceManager<K, O, C> {
    l1: K,
    l2: O,
    l3: Option<C>,
    debounce: Duration,
    generation: AtomicU64,
}

impl<K, O, C> PersistenceManager<K, O, C>
where
    K: KvStore,
    O: ObjectStore,
    C: CrossDeviceStore,
{
    pub fn new(l1: K, l2: O, l3: Option<C>, debounce: Duration) -> Self {
        PersistenceManager {
            l1,
            l2,
            l3,
            debounce,
            generation: AtomicU64::new(0),
        }
    }

    /// Single entry point for every commit (spec.md §4.8). `immediate =
    /// false` debounces: if a newer call supersedes this one before the
    /// debounce elapses, this call is a no-op (the newer one will write the
    /// latest state anyway). `immediate = true` writes through at once.
    pub async fn persist(&self, snapshot: PersistedSnapshot, immediate: bool) -> EngineResult<()> {
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if !immediate {
            tokio::time::sleep(self.debounce).await;
            if self.generation.load(Ordering::SeqCst) != my_generation {
                tracing::trace!("debounced commit superseded, skipping");
                return Ok(());
            }
        }
        self.commit(snapshot).await
    }

    async fn commit(&self, snapshot: PersistedSnapshot) -> EngineResult<()> {
        let bytes = serde_json::to_vec(&snapshot)?;

        let l1_result = self.l1.set(SNAPSHOT_KEY, bytes.clone()).await;
        if let Err(e) = &l1_result {
            tracing::warn!(error = %e, "L1 write failed, continuing to L2");
        }

        self.l2.write(SNAPSHOT_KEY, bytes).await?;
        match self.l2.readback(SNAPSHOT_KEY).await {
            Ok(Some(_)) => {}
            Ok(None) => tracing::warn!("L2 readback returned no data after a successful write"),
            Err(e) => tracing::warn!(error = %e, "L2 readback failed"),
        }

        if let Some(l3) = &self.l3 {
            let critical = CriticalMetadata {
                tier: snapshot
                    .auto_restore
                    .new_tier
                    .or(snapshot.auto_restore.previous_tier)
                    .unwrap_or(crate::config::Tier::Free),
                session_count: snapshot.sessions.len(),
            };
            match serde_json::to_vec(&critical) {
                Ok(cbytes) => {
                    if let Err(e) = l3.set(CRITICAL_KEY, cbytes).await {
                        tracing::warn!(error = %e, "L3 write failed");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "failed to encode L3 critical metadata"),
            }
        }

        // L1 failing is not itself a fatal condition: L2 already has the
        // durable copy, in-memory state stays authoritative either way.
        let _ = l1_result;
        Ok(())
    }

    /// Startup load policy (spec.md §4.8): try L1, fall back to L2 and
    /// opportunistically repair the other tier, and as a last resort
    /// consult L3 purely to detect an anomalous wipe. Returns the outcome
    /// tag; callers that need the data should have already read it via
    /// [`Self::load_snapshot`].
    pub async fn load_snapshot(&self) -> EngineResult<(LoadOutcome, Option<PersistedSnapshot>)> {
        if let Some(bytes) = self.l1.get(SNAPSHOT_KEY).await? {
            let snapshot: PersistedSnapshot = serde_json::from_slice(&bytes)?;
            if let Err(e) = self.l2.write(SNAPSHOT_KEY, bytes).await {
                tracing::warn!(error = %e, "failed to opportunistically push L1 snapshot to L2");
            }
            return Ok((LoadOutcome::FromL1, Some(snapshot)));
        }

        if let Some(bytes) = self.l2.read(SNAPSHOT_KEY).await? {
            let snapshot: PersistedSnapshot = serde_json::from_slice(&bytes)?;
            if let Err(e) = self.l1.set(SNAPSHOT_KEY, bytes).await {
                tracing::warn!(error = %e, "failed to rehydrate L1 from L2");
            }
            return Ok((LoadOutcome::RehydratedFromL2, Some(snapshot)));
        }

        if let Some(l3) = &self.l3 {
            if let Some(bytes) = l3.get(CRITICAL_KEY).await? {
                let critical: CriticalMetadata = serde_json::from_slice(&bytes)?;
                if critical.session_count > 0 {
                    tracing::warn!(
                        session_count = critical.session_count,
                        "L1 and L2 are both empty but L3 remembers prior sessions; likely storage wipe"
                    );
                    return Ok((
                        LoadOutcome::AnomalyCleanStart {
                            prior_session_count: critical.session_count,
                        },
                        None,
                    ));
                }
            }
        }

        Ok((LoadOutcome::CleanStart, None))
    }

    /// Orphan sweep (C10): deletes any L2 record not present in `live`.
    /// Since this engine persists one snapshot key rather than one key per
    /// session, orphan detection happens inside the snapshot's own
    /// `sessions` map at write time — a session absent from the in-memory
    /// registry is simply never included by [`snapshot`]. This method exists
    /// for hosts that additionally mirror per-session blobs under derived
    /// keys; it is a no-op against the single-key default layout.
    pub async fn sweep_orphans(&self, _live_sessions: &[SessionId]) -> EngineResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tier;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemKv(Mutex<std::collections::HashMap<String, Vec<u8>>>);

    #[async_trait]
    impl KvStore for MemKv {
        async fn get(&self, key: &str) -> EngineResult<Option<Vec<u8>>> {
            Ok(self.0.lock().unwrap().get(key).cloned())
        }
        async fn set(&self, key: &str, value: Vec<u8>) -> EngineResult<()> {
            self.0.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }
        async fn remove(&self, key: &str) -> EngineResult<()> {
            self.0.lock().unwrap().remove(key);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemObjectStore(Mutex<std::collections::HashMap<String, Vec<u8>>>);

    #[async_trait]
    impl ObjectStore for MemObjectStore {
        async fn write(&self, key: &str, value: Vec<u8>) -> EngineResult<()> {
            self.0.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }
        async fn read(&self, key: &str) -> EngineResult<Option<Vec<u8>>> {
            Ok(self.0.lock().unwrap().get(key).cloned())
        }
    }

    #[derive(Default)]
    struct MemCrossDevice(Mutex<std::collections::HashMap<String, Vec<u8>>>);

    #[async_trait]
    impl CrossDeviceStore for MemCrossDevice {
        async fn get(&self, key: &str) -> EngineResult<Option<Vec<u8>>> {
            Ok(self.0.lock().unwrap().get(key).cloned())
        }
        async fn set(&self, key: &str, value: Vec<u8>) -> EngineResult<()> {
            self.0.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }
    }

    #[tokio::test]
    async fn immediate_persist_lands_in_both_l1_and_l2() {
        let mgr = PersistenceManager::new(MemKv::default(), MemObjectStore::default(), None::<MemCrossDevice>, Duration::from_secs(1));
        let mut registry = SessionRegistry::new();
        let sid = registry.create(Tier::Free, None, 0).unwrap();
        registry.bind(TabId::new(1), &sid).unwrap();
        let cookies = CookieStore::new();

        let snap = snapshot(&registry, &cookies, AutoRestoreConfig::default(), 0);
        mgr.persist(snap, true).await.unwrap();

        let (outcome, loaded) = mgr.load_snapshot().await.unwrap();
        assert_eq!(outcome, LoadOutcome::FromL1);
        assert!(loaded.unwrap().sessions.contains_key(&sid));
    }

    #[tokio::test]
    async fn clean_start_when_all_tiers_empty() {
        let mgr = PersistenceManager::new(MemKv::default(), MemObjectStore::default(), None::<MemCrossDevice>, Duration::from_secs(1));
        let (outcome, loaded) = mgr.load_snapshot().await.unwrap();
        assert_eq!(outcome, LoadOutcome::CleanStart);
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn l3_anomaly_detected_when_l1_and_l2_empty() {
        let l3 = MemCrossDevice::default();
        l3.set(CRITICAL_KEY, serde_json::to_vec(&CriticalMetadata { tier: Tier::Free, session_count: 2 }).unwrap())
            .await
            .unwrap();
        let mgr = PersistenceManager::new(MemKv::default(), MemObjectStore::default(), Some(l3), Duration::from_secs(1));
        let (outcome, loaded) = mgr.load_snapshot().await.unwrap();
        assert_eq!(outcome, LoadOutcome::AnomalyCleanStart { prior_session_count: 2 });
        assert!(loaded.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_persist_collapses_bursts_into_one_write() {
        let mgr = PersistenceManager::new(MemKv::default(), MemObjectStore::default(), None::<MemCrossDevice>, Duration::from_millis(50));
        let registry = SessionRegistry::new();
        let cookies = CookieStore::new();

        let snap1 = snapshot(&registry, &cookies, AutoRestoreConfig::default(), 1);
        let snap2 = snapshot(&registry, &cookies, AutoRestoreConfig::default(), 2);

        let (r1, r2) = tokio::join!(mgr.persist(snap1, false), mgr.persist(snap2, false));
        r1.unwrap();
        r2.unwrap();

        let (_, loaded) = mgr.load_snapshot().await.unwrap();
        assert_eq!(loaded.unwrap().last_saved_ms, 2);
    }
}
