//! `tabjar` — a per-tab session isolation engine for a browser extension.
//!
//! A single browser window can host many independent authenticated
//! identities against the same origin: each tab is bound to a *session*, a
//! partitioned cookie jar plus a storage namespace. For every outbound
//! request from a bound tab the engine substitutes the browser's native
//! cookie jar with the session's; for every response it intercepts
//! `Set-Cookie` so the browser never learns those cookies. The crate also
//! partitions `document.cookie` and Web Storage accesses made by page
//! scripts.
//!
//! This crate implements the interceptor, the partitioned cookie store, the
//! session/tab lifecycle, session inheritance for child tabs, and the
//! persistence layer. The licensing/tier service, popup UI, and the browser
//! host itself are external collaborators — their interfaces are the
//! traits in [`host`]. `EngineState` (in [`engine`]) is the composition
//! root a host links against.
//!
//! `EngineState` is `!Sync` by design: every component runs on a single
//! event-dispatch thread (see the module docs on [`engine`] and the
//! concurrency notes repeated across [`interceptor`] and [`persistence`]).

pub mod bridge;
pub mod cleanup;
pub mod config;
pub mod cookie;
pub mod domain;
pub mod engine;
pub mod error;
pub mod header;
pub mod host;
pub mod ids;
pub mod init;
pub mod interceptor;
pub mod lifecycle;
pub mod persistence;
pub mod registry;
mod uri_ext;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::{EngineConfig, Tier};
pub use engine::{CanCreateSession, EngineState, SessionSummary, TabSummary};
pub use error::{EngineError, EngineResult};
pub use ids::{SessionId, TabId, WindowId};
