//! External collaborator interfaces (§6).
//!
//! The browser host itself is out of scope (spec.md §1): it drives
//! interception and lifecycle by calling straight into this crate's pure
//! functions (see [`crate::interceptor`], [`crate::lifecycle`]). The
//! handful of capabilities the *engine* needs to call back out to —
//! key-value stores, the host's native cookie jar (for the leakage sweep),
//! alarms, and notifications — are modeled here as traits so the crate is
//! portable across hosts and unit-testable without a real browser.
//!
//! `async_trait` is used the same way the teacher uses it for
//! `RequestBuilderExt`/`ResponseExt` in `src/req_ext.rs`.

use async_trait::async_trait;

use crate::error::EngineResult;

/// A cookie as seen in the *host's* native jar — distinct from
/// [`crate::cookie::Cookie`], since this is what the leakage sweep (C10)
/// reads back out of the browser, not what the engine stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub store_id: Option<String>,
}

/// Capability 3 (§6): list/delete access to the host's native cookie jar,
/// used by the leakage sweep and the cookie-change capture path.
pub trait HostCookieJar {
    fn list_for_host(&self, host: &str) -> Vec<HostCookie>;
    fn delete(&mut self, cookie: &HostCookie);
}

/// Capability 2 (§6): an asynchronous cookie-change notification from the
/// host's native jar.
#[derive(Debug, Clone)]
pub struct CookieChangeEvent {
    pub cookie: HostCookie,
    pub removed: bool,
}

/// Capability 6 (§6): the fast, low-latency key-value layer (L1).
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> EngineResult<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: Vec<u8>) -> EngineResult<()>;
    async fn remove(&self, key: &str) -> EngineResult<()>;
}

/// Capability 7 (§6): the durable, transactional object store (L2). A
/// `write` call is expected to open a transaction, write every record,
/// await `oncomplete`, per spec.md §4.8.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn write(&self, key: &str, value: Vec<u8>) -> EngineResult<()>;
    async fn read(&self, key: &str) -> EngineResult<Option<Vec<u8>>>;
    /// A post-commit readback, used to verify a critical write landed.
    /// A failure here is logged but must not fail the overall commit —
    /// the data already landed in L1.
    async fn readback(&self, key: &str) -> EngineResult<Option<Vec<u8>>> {
        self.read(key).await
    }
}

/// Capability 8 (§6): the small-quota, cross-device key-value layer (L3).
/// Optional — hosts without one simply never implement it, and C8 treats
/// its absence as "no anomaly signal available" rather than an error.
#[async_trait]
pub trait CrossDeviceStore: Send + Sync {
    async fn get(&self, key: &str) -> EngineResult<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: Vec<u8>) -> EngineResult<()>;
}

/// Capability 9 (§6): host wake-up alarms, armed at install and on every
/// invocation to work around hosts that lazily unload extension code.
pub trait AlarmHost {
    fn arm(&self, name: &str, interval_ms: u64);
}

/// Capability 10 (§6): an optional notification channel with button
/// callbacks (used by the retention sweep, C10).
pub trait NotificationHost {
    fn notify(&self, text: &str, buttons: &[&str]);
}
