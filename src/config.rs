//! Tier parameters and engine-wide tunables (C13).
//!
//! A builder-style config, following the `Agent::redirects()`/`retries()`/
//! `pooling()` pattern: every knob has a sane compiled-in default and can
//! be overridden before the engine starts, never read from process
//! environment (there is none in a browser extension host).

use std::time::Duration;

/// External product classification. Supplied by the licensing service
/// (out of scope, §1); the engine only consumes it to parameterize limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Tier {
    Free,
    Premium,
    Enterprise,
}

impl Tier {
    pub fn active_session_limit(&self) -> Option<usize> {
        match self {
            Tier::Free => Some(3),
            Tier::Premium | Tier::Enterprise => None,
        }
    }

    pub fn palette_size(&self) -> usize {
        match self {
            Tier::Free => 6,
            Tier::Premium => 13,
            Tier::Enterprise => 35,
        }
    }

    pub fn can_name_sessions(&self) -> bool {
        matches!(self, Tier::Premium | Tier::Enterprise)
    }

    pub fn can_set_custom_color(&self) -> bool {
        matches!(self, Tier::Enterprise)
    }

    pub fn can_auto_restore(&self) -> bool {
        matches!(self, Tier::Enterprise)
    }

    pub fn retains_indefinitely(&self) -> bool {
        matches!(self, Tier::Premium | Tier::Enterprise)
    }
}

/// Engine-wide tunables. Defaults match spec.md's literal values; override
/// only for tests that need tighter windows.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub noopener_inheritance_window: Duration,
    pub cookie_leakage_sweep_interval: Duration,
    pub expiry_sweep_interval: Duration,
    pub retention_sweep_interval: Duration,
    pub free_tier_retention: Duration,
    pub persist_debounce: Duration,
    pub startup_timeout: Duration,
    pub page_bridge_cache_ttl: Duration,
    pub page_bridge_timeout: Duration,
    pub session_name_max_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            noopener_inheritance_window: Duration::from_secs(30),
            cookie_leakage_sweep_interval: Duration::from_secs(2),
            expiry_sweep_interval: Duration::from_secs(60),
            retention_sweep_interval: Duration::from_secs(6 * 60 * 60),
            free_tier_retention: Duration::from_secs(7 * 24 * 60 * 60),
            persist_debounce: Duration::from_secs(1),
            startup_timeout: Duration::from_secs(30),
            page_bridge_cache_ttl: Duration::from_millis(500),
            page_bridge_timeout: Duration::from_secs(5),
            session_name_max_chars: 50,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        EngineConfig::default()
    }

    pub fn with_noopener_inheritance_window(mut self, d: Duration) -> Self {
        self.noopener_inheritance_window = d;
        self
    }

    pub fn with_persist_debounce(mut self, d: Duration) -> Self {
        self.persist_debounce = d;
        self
    }
}

/// Fixed color palettes, one per tier, largest tier's palette is a
/// superset-flavored but independently curated list (enterprise is not
/// simply "premium + more" in hue spacing, matching how design systems
/// usually hand-pick tier palettes rather than algorithmically extend
/// them).
pub fn palette_for(tier: Tier) -> &'static [&'static str] {
    const FREE: &[&str] = &["#e53935", "#1e88e5", "#43a047", "#fdd835", "#8e24aa", "#fb8c00"];
    const PREMIUM: &[&str] = &[
        "#e53935", "#d81b60", "#8e24aa", "#5e35b1", "#3949ab", "#1e88e5", "#039be5", "#00acc1",
        "#00897b", "#43a047", "#7cb342", "#fdd835", "#fb8c00",
    ];
    const ENTERPRISE: &[&str] = &[
        "#e53935", "#d81b60", "#8e24aa", "#5e35b1", "#3949ab", "#1e88e5", "#039be5", "#00acc1",
        "#00897b", "#43a047", "#7cb342", "#c0ca33", "#fdd835", "#ffb300", "#fb8c00", "#f4511e",
        "#6d4c41", "#757575", "#546e7a", "#ad1457", "#6a1b9a", "#4527a0", "#283593", "#1565c0",
        "#0277bd", "#00838f", "#00695c", "#2e7d32", "#558b2f", "#9e9d24", "#f9a825", "#ff8f00",
        "#ef6c00", "#d84315", "#4e342e",
    ];
    match tier {
        Tier::Free => FREE,
        Tier::Premium => PREMIUM,
        Tier::Enterprise => ENTERPRISE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_sizes_match_tier_table() {
        assert_eq!(palette_for(Tier::Free).len(), Tier::Free.palette_size());
        assert_eq!(palette_for(Tier::Premium).len(), Tier::Premium.palette_size());
        assert_eq!(palette_for(Tier::Enterprise).len(), Tier::Enterprise.palette_size());
    }

    #[test]
    fn free_tier_limit_is_three() {
        assert_eq!(Tier::Free.active_session_limit(), Some(3));
        assert_eq!(Tier::Premium.active_session_limit(), None);
    }
}
