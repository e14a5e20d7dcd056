//! Cleanup and quota jobs (C10).
//!
//! Grounded in §9's guidance ("a single scheduler that registers jobs with
//! (interval, handler)") and implemented with `tokio::time::interval`,
//! following the teacher's runtime-abstraction idiom of keeping the actual
//! tick loop thin and delegating all behavior to plain functions that take
//! `&mut` state — the functions here are unit-testable without any timer at
//! all, only the scheduler in [`run_forever`] touches `tokio::time`.

use crate::config::{EngineConfig, Tier};
use crate::cookie::CookieStore;
use crate::host::{HostCookie, HostCookieJar, NotificationHost};
use crate::registry::SessionRegistry;

/// Leakage sweep (every 2s): for every bound tab, list the host's native
/// jar for that tab's host and recapture anything found there into the
/// owning session's jar before deleting it from the host jar. This is the
/// periodic backstop for the async cookie-change capture path (§4.5).
pub fn leakage_sweep<J: HostCookieJar>(
    host_jar: &mut J,
    cookies: &mut CookieStore,
    registry: &SessionRegistry,
    tab_hosts: &[(crate::ids::TabId, String)],
    now_ms: u64,
) -> usize {
    let mut recaptured = 0;
    for (tab, host) in tab_hosts {
        let session = match registry.get_session_for_tab(*tab) {
            Some(s) => s,
            None => continue,
        };
        for leaked in host_jar.list_for_host(host) {
            let url: http::Uri = match format!("https://{}{}", leaked.domain, leaked.path).parse() {
                Ok(u) => u,
                Err(_) => continue,
            };
            let mut cookie =
                crate::cookie::Cookie::new(leaked.name.clone(), leaked.value.clone(), leaked.domain.clone());
            cookie.path = leaked.path.clone();
            cookies.put(&session, &url, cookie, now_ms);
            host_jar.delete(&leaked);
            recaptured += 1;
        }
    }
    recaptured
}

/// Expiry sweep (every 60s): prunes every session's jar.
pub fn expiry_sweep(cookies: &mut CookieStore, now_ms: u64) {
    cookies.remove_expired_all(now_ms);
}

/// Retention sweep (every 6h): free-tier sessions untouched for longer than
/// `config.free_tier_retention` are deleted, and the host is asked to
/// notify the user. Premium/Enterprise sessions are never swept here.
pub fn retention_sweep<N: NotificationHost>(
    registry: &mut SessionRegistry,
    cookies: &mut CookieStore,
    notifier: &N,
    tier: Tier,
    config: &EngineConfig,
    now_ms: u64,
) -> Vec<crate::ids::SessionId> {
    if tier.retains_indefinitely() {
        return Vec::new();
    }
    let cutoff_ms = config.free_tier_retention.as_millis() as u64;
    let stale: Vec<_> = registry
        .dormant_sessions()
        .into_iter()
        .filter(|s| now_ms.saturating_sub(s.last_accessed) > cutoff_ms)
        .map(|s| s.id.clone())
        .collect();

    for id in &stale {
        registry.delete(id);
        cookies.clear(id);
    }
    if !stale.is_empty() {
        notifier.notify(
            &format!("{} inactive session(s) were removed after 7 days", stale.len()),
            &[],
        );
    }
    stale
}

/// Orphan sweep: any session id present in `persisted` but absent from the
/// live registry is stale L2 state left behind by a crash between delete
/// and the next debounced commit; the persistence layer's next write
/// naturally drops it (see [`crate::persistence::PersistenceManager::sweep_orphans`]),
/// this function only identifies which ids qualify.
pub fn orphaned_sessions(
    registry: &SessionRegistry,
    persisted: &[crate::ids::SessionId],
) -> Vec<crate::ids::SessionId> {
    persisted.iter().filter(|id| registry.session(id).is_none()).cloned().collect()
}

/// Job identifiers, used so the scheduler (and its tests) can refer to a
/// tick by name instead of by interval value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Job {
    Leakage,
    Expiry,
    Retention,
}

/// Runs the three periodic jobs forever on their own intervals, gated on
/// `ready()`. Callers provide a `tick` closure per job rather than handing
/// this function direct access to engine state, since the jobs above take
/// differently-shaped borrows (mutable registry+cookies, a host jar, a
/// notifier) that don't unify behind one trait object.
pub async fn run_forever<F>(config: &EngineConfig, ready: impl Fn() -> bool, mut tick: F)
where
    F: FnMut(Job),
{
    let mut leakage = tokio::time::interval(config.cookie_leakage_sweep_interval);
    let mut expiry = tokio::time::interval(config.expiry_sweep_interval);
    let mut retention = tokio::time::interval(config.retention_sweep_interval);

    loop {
        tokio::select! {
            _ = leakage.tick() => if ready() { tick(Job::Leakage) },
            _ = expiry.tick() => if ready() { tick(Job::Expiry) },
            _ = retention.tick() => if ready() { tick(Job::Retention) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookie::Cookie;
    use crate::ids::TabId;

    struct FakeNotifier {
        calls: std::cell::RefCell<Vec<String>>,
    }
    impl NotificationHost for FakeNotifier {
        fn notify(&self, text: &str, _buttons: &[&str]) {
            self.calls.borrow_mut().push(text.to_string());
        }
    }

    struct FakeHostJar {
        entries: Vec<HostCookie>,
    }
    impl HostCookieJar for FakeHostJar {
        fn list_for_host(&self, host: &str) -> Vec<HostCookie> {
            self.entries.iter().filter(|c| c.domain == host).cloned().collect()
        }
        fn delete(&mut self, cookie: &HostCookie) {
            self.entries.retain(|c| c != cookie);
        }
    }

    #[test]
    fn expiry_sweep_removes_stale_cookies_everywhere() {
        let mut cookies = CookieStore::new();
        let sid = crate::ids::SessionId::from("s1");
        let url: http::Uri = "https://example.com/".parse().unwrap();
        let mut c = Cookie::new("a", "1", "example.com");
        c.expires = Some(100);
        cookies.put(&sid, &url, c, 0);
        expiry_sweep(&mut cookies, 1_000);
        assert!(cookies.get(&sid, &url, 1_000).is_empty());
    }

    #[test]
    fn retention_sweep_deletes_stale_free_tier_sessions_only() {
        let mut registry = SessionRegistry::new();
        let mut cookies = CookieStore::new();
        let config = EngineConfig::default();

        let sid = registry.create(Tier::Free, None, 0).unwrap();
        registry.bind(TabId::new(1), &sid).unwrap();
        registry.unbind(TabId::new(1));

        let far_future = config.free_tier_retention.as_millis() as u64 + 1;
        let notifier = FakeNotifier { calls: std::cell::RefCell::new(Vec::new()) };
        let deleted = retention_sweep(&mut registry, &mut cookies, &notifier, Tier::Free, &config, far_future);

        assert_eq!(deleted, vec![sid.clone()]);
        assert!(registry.session(&sid).is_none());
        assert_eq!(notifier.calls.borrow().len(), 1);
    }

    #[test]
    fn retention_sweep_never_touches_enterprise() {
        let mut registry = SessionRegistry::new();
        let mut cookies = CookieStore::new();
        let config = EngineConfig::default();
        let sid = registry.create(Tier::Enterprise, None, 0).unwrap();
        registry.bind(TabId::new(1), &sid).unwrap();
        registry.unbind(TabId::new(1));

        let notifier = FakeNotifier { calls: std::cell::RefCell::new(Vec::new()) };
        let deleted = retention_sweep(&mut registry, &mut cookies, &notifier, Tier::Enterprise, &config, u64::MAX);
        assert!(deleted.is_empty());
        assert!(registry.session(&sid).is_some());
    }

    #[test]
    fn leakage_sweep_recaptures_and_deletes_from_host_jar() {
        let mut registry = SessionRegistry::new();
        let sid = registry.create(Tier::Free, None, 0).unwrap();
        registry.bind(TabId::new(1), &sid).unwrap();
        let mut cookies = CookieStore::new();
        let mut host_jar = FakeHostJar {
            entries: vec![HostCookie {
                name: "leaked".to_string(),
                value: "v".to_string(),
                domain: "example.com".to_string(),
                path: "/".to_string(),
                store_id: None,
            }],
        };

        let recaptured = leakage_sweep(
            &mut host_jar,
            &mut cookies,
            &registry,
            &[(TabId::new(1), "example.com".to_string())],
            0,
        );
        assert_eq!(recaptured, 1);
        assert!(host_jar.entries.is_empty());
    }

    #[test]
    fn orphaned_sessions_lists_persisted_ids_missing_from_registry() {
        let registry = SessionRegistry::new();
        let persisted = vec![crate::ids::SessionId::from("gone")];
        assert_eq!(orphaned_sessions(&registry, &persisted), persisted);
    }
}
