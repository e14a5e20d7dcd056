//! Persisted-snapshot schema (C8), schema version 3 per spec.md §6.
//!
//! Every type here derives `serde::{Serialize, Deserialize}` so C8 can
//! round-trip it through the host's key-value stores, the same way
//! `vortex-domain::cookie::Cookie` is made persistence-ready. `#[serde(default)]`
//! is used wherever spec.md calls out a field that must be backfilled from
//! an older or partial record rather than fail the load.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::Tier;
use crate::cookie::CookieJar;
use crate::ids::{SessionId, TabId, WindowId};
use crate::registry::Session;

pub const SCHEMA_VERSION: u32 = 3;

/// Per-tab placement metadata, duplicated (with an explicit `session_id`)
/// at the top level of the snapshot per spec.md §6's literal schema, even
/// though each `Session` also carries its own `tab_metadata` map — the two
/// serve different readers: the session's own copy drives §4.9 restoration,
/// this flat one lets diagnostics and migration tooling scan by tab without
/// walking every session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedTabMetadata {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub window_id: Option<WindowId>,
    pub session_id: SessionId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoRestoreConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub dont_show_notice: bool,
    #[serde(default)]
    pub disabled_reason: Option<String>,
    #[serde(default)]
    pub disabled_at: Option<u64>,
    #[serde(default)]
    pub previous_tier: Option<Tier>,
    #[serde(default)]
    pub new_tier: Option<Tier>,
}

impl Default for AutoRestoreConfig {
    fn default() -> Self {
        AutoRestoreConfig {
            enabled: false,
            dont_show_notice: false,
            disabled_reason: None,
            disabled_at: None,
            previous_tier: None,
            new_tier: None,
        }
    }
}

/// The full L1/L2 snapshot body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedSnapshot {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub sessions: HashMap<SessionId, Session>,
    pub jars: HashMap<SessionId, CookieJar>,
    pub bindings: HashMap<TabId, SessionId>,
    #[serde(default)]
    pub tab_metadata: HashMap<TabId, PersistedTabMetadata>,
    #[serde(default)]
    pub auto_restore: AutoRestoreConfig,
    #[serde(default)]
    pub last_saved_ms: u64,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// The small subset of state mirrored to L3 (spec.md §4.8): enough to
/// detect an L1/L2 wipe without storing anything sensitive in a
/// cross-device quota that may be as small as a few KB.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalMetadata {
    pub tier: Tier,
    pub session_count: usize,
}
