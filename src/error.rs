//! Engine-wide error type.
//!
//! All interception paths (C5, C6) must be total: they never propagate an
//! `EngineError` into the host, they fall back to the original headers and
//! log. `EngineError` exists for the user-initiated and internal-job paths
//! (C4, C8, C9, C10) where structured results are expected (see spec §7).

use thiserror::Error;

use crate::ids::{SessionId, TabId};

/// Result alias used across the crate.
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Bad cookie domain, malformed session name, invalid hex color, etc.
    /// Recovered locally by rejecting the input.
    #[error("validation failed: {0}")]
    ValidationFailure(String),

    /// Feature or action not permitted at the caller's tier.
    #[error("restricted to a higher tier: {0}")]
    TierRestriction(String),

    /// Active-session count for the tier has been reached.
    #[error("active session limit reached ({current}/{limit})")]
    LimitExceeded { current: usize, limit: usize },

    /// A write to L1 or L2 was rejected or timed out.
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    /// The initialization state machine did not reach READY.
    #[error("startup failed: {0}")]
    StartupFailure(String),

    /// The licensing service could not be reached; non-fatal, grace period
    /// applies and the engine continues at the last-known tier.
    #[error("license check temporarily unavailable: {0}")]
    LicenseTransientFailure(String),

    /// The license is invalid; engine demotes to the lowest tier.
    #[error("license invalid: {0}")]
    LicenseInvalid(String),

    #[error("unknown session: {0}")]
    UnknownSession(SessionId),

    #[error("unknown tab: {0}")]
    UnknownTab(TabId),

    #[error("not ready: engine is still initializing")]
    NotReady,
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::PersistenceFailure(e.to_string())
    }
}

impl EngineError {
    /// A compact machine-readable kind tag, matching the identifiers in
    /// spec.md §7, for the `{ok, error_kind, message}` structured results
    /// user-initiated operations return.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::ValidationFailure(_) => "ValidationFailure",
            EngineError::TierRestriction(_) => "TierRestriction",
            EngineError::LimitExceeded { .. } => "TierRestriction",
            EngineError::PersistenceFailure(_) => "PersistenceFailure",
            EngineError::StartupFailure(_) => "StartupFailure",
            EngineError::LicenseTransientFailure(_) => "LicenseTransientFailure",
            EngineError::LicenseInvalid(_) => "LicenseInvalid",
            EngineError::UnknownSession(_) => "ValidationFailure",
            EngineError::UnknownTab(_) => "ValidationFailure",
            EngineError::NotReady => "StartupFailure",
        }
    }
}
