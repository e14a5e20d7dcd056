//! In-memory host double, feature-gated behind `test-support`.
//!
//! Grounded in the teacher's `tide`-backed `run_agent` test harness
//! (`src/test/mod.rs`): a small, fully in-process stand-in for the real
//! collaborator so integration-style tests can drive the whole engine
//! without a browser. Every store is a `Mutex`-guarded `HashMap` rather
//! than anything resembling a real KV/object store, since the point is to
//! exercise the engine's contract with its host traits, not to model
//! storage performance.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::EngineResult;
use crate::host::{
    AlarmHost, CookieChangeEvent, CrossDeviceStore, HostCookie, HostCookieJar, KvStore, NotificationHost, ObjectStore,
};

/// A single in-memory store used to back all three persistence tiers. Real
/// hosts back L1/L2/L3 with genuinely different storage engines; tests
/// only need them to behave like independent namespaces.
#[derive(Default)]
pub struct FakeKvStore {
    data: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl KvStore for FakeKvStore {
    async fn get(&self, key: &str) -> EngineResult<Option<Vec<u8>>> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }
    async fn set(&self, key: &str, value: Vec<u8>) -> EngineResult<()> {
        self.data.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
    async fn remove(&self, key: &str) -> EngineResult<()> {
        self.data.lock().unwrap().remove(key);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeObjectStore {
    data: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn write(&self, key: &str, value: Vec<u8>) -> EngineResult<()> {
        self.data.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
    async fn read(&self, key: &str) -> EngineResult<Option<Vec<u8>>> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }
}

#[derive(Default)]
pub struct FakeCrossDeviceStore {
    data: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl CrossDeviceStore for FakeCrossDeviceStore {
    async fn get(&self, key: &str) -> EngineResult<Option<Vec<u8>>> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }
    async fn set(&self, key: &str, value: Vec<u8>) -> EngineResult<()> {
        self.data.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}

/// A host-native cookie jar plus a log of pending change events, for
/// exercising the leakage sweep and the cookie-change capture path without
/// a real browser.
#[derive(Default)]
pub struct FakeHostCookieJar {
    pub cookies: Vec<HostCookie>,
    pub change_log: Vec<CookieChangeEvent>,
}

impl HostCookieJar for FakeHostCookieJar {
    fn list_for_host(&self, host: &str) -> Vec<HostCookie> {
        self.cookies.iter().filter(|c| c.domain == host).cloned().collect()
    }

    fn delete(&mut self, cookie: &HostCookie) {
        self.cookies.retain(|c| c != cookie);
        self.change_log.push(CookieChangeEvent {
            cookie: cookie.clone(),
            removed: true,
        });
    }
}

#[derive(Default)]
pub struct FakeAlarmHost {
    pub armed: Mutex<Vec<(String, u64)>>,
}

impl AlarmHost for FakeAlarmHost {
    fn arm(&self, name: &str, interval_ms: u64) {
        self.armed.lock().unwrap().push((name.to_string(), interval_ms));
    }
}

#[derive(Default)]
pub struct FakeNotificationHost {
    pub sent: Mutex<Vec<(String, Vec<String>)>>,
}

impl NotificationHost for FakeNotificationHost {
    fn notify(&self, text: &str, buttons: &[&str]) {
        self.sent
            .lock()
            .unwrap()
            .push((text.to_string(), buttons.iter().map(|s| s.to_string()).collect()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_kv_store_round_trips() {
        let store = FakeKvStore::default();
        store.set("k", b"v".to_vec()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[test]
    fn fake_alarm_host_records_arm_calls() {
        let host = FakeAlarmHost::default();
        host.arm("leakage-sweep", 2_000);
        assert_eq!(host.armed.lock().unwrap().as_slice(), &[("leakage-sweep".to_string(), 2_000)]);
    }
}
