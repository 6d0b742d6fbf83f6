//! Error types for the tbr operator

use thiserror::Error;

/// Main error type for tbr operations
///
/// Every variant is non-fatal to the process: a failed cycle is logged,
/// surfaced on the workload where appropriate, and retried at the next tick.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Policy window with endTime at or before startTime
    #[error("invalid window: {0}")]
    InvalidWindow(String),

    /// Policy timezone is not a recognized IANA identifier
    #[error("invalid timezone: {0}")]
    InvalidTimeZone(String),

    /// Policy startTime or endTime is not an HH:MM clock time
    #[error("invalid time format: {0}")]
    InvalidTimeFormat(String),

    /// Workload references a TimeWindowPolicy that does not exist
    #[error("policy not found: {0}")]
    PolicyNotFound(String),

    /// TimeWindowPolicy lookup failed for a reason other than absence
    #[error("policy fetch failed: {0}")]
    PolicyFetch(String),

    /// Suspended workload has no recorded replica count to restore
    #[error("snapshot missing: {0}")]
    SnapshotMissing(String),

    /// Recorded replica count is present but not a non-negative integer
    #[error("snapshot invalid: {0}")]
    SnapshotInvalid(String),

    /// Targeted patch to a workload failed
    #[error("patch failed: {0}")]
    Patch(String),
}

impl Error {
    /// Create an invalid window error with the given message
    pub fn invalid_window(msg: impl Into<String>) -> Self {
        Self::InvalidWindow(msg.into())
    }

    /// Create an invalid timezone error with the given message
    pub fn invalid_time_zone(msg: impl Into<String>) -> Self {
        Self::InvalidTimeZone(msg.into())
    }

    /// Create an invalid time format error with the given message
    pub fn invalid_time_format(msg: impl Into<String>) -> Self {
        Self::InvalidTimeFormat(msg.into())
    }

    /// Create a policy not found error with the given message
    pub fn policy_not_found(msg: impl Into<String>) -> Self {
        Self::PolicyNotFound(msg.into())
    }

    /// Create a policy fetch error with the given message
    pub fn policy_fetch(msg: impl Into<String>) -> Self {
        Self::PolicyFetch(msg.into())
    }

    /// Create a snapshot missing error with the given message
    pub fn snapshot_missing(msg: impl Into<String>) -> Self {
        Self::SnapshotMissing(msg.into())
    }

    /// Create a snapshot invalid error with the given message
    pub fn snapshot_invalid(msg: impl Into<String>) -> Self {
        Self::SnapshotInvalid(msg.into())
    }

    /// Create a patch error with the given message
    pub fn patch(msg: impl Into<String>) -> Self {
        Self::Patch(msg.into())
    }

    /// Returns true for errors caused by user configuration
    ///
    /// Config errors (a broken window, a dangling policy reference, a missing
    /// snapshot) persist until someone edits an object, so they are logged as
    /// warnings and published as Events rather than treated as API failures.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::InvalidWindow(_)
                | Self::InvalidTimeZone(_)
                | Self::InvalidTimeFormat(_)
                | Self::PolicyNotFound(_)
                | Self::SnapshotMissing(_)
                | Self::SnapshotInvalid(_)
        )
    }
}
