//! Replica snapshot persistence
//!
//! The snapshot is the replica count a workload had before suspension,
//! string-encoded in the `tbr.abriment.dev/replicas` annotation on the
//! workload itself. It is written while the workload is still active, before
//! the zero-patch, and read back when the window opens again. The reconciler
//! never invents a count: no snapshot means no restore.

use std::collections::BTreeMap;

use crate::patcher::WorkloadPatcher;
use crate::workload::WorkloadRef;
use crate::Error;

/// Encode a replica count for annotation storage
pub fn encode(replicas: u32) -> String {
    replicas.to_string()
}

/// Decode a stored replica count
///
/// Anything that is not a non-negative integer is [`Error::SnapshotInvalid`].
pub fn decode(value: &str) -> Result<u32, Error> {
    value.trim().parse::<u32>().map_err(|_| {
        Error::snapshot_invalid(format!("'{value}' is not a non-negative integer"))
    })
}

/// Read the recorded replica count from a workload's annotations
///
/// `None` means no snapshot exists (the workload was zeroed by other means
/// or never suspended); the caller must not guess a default.
pub fn read(annotations: &BTreeMap<String, String>) -> Result<Option<u32>, Error> {
    match annotations.get(crate::REPLICAS_ANNOTATION) {
        Some(raw) => decode(raw).map(Some),
        None => Ok(None),
    }
}

/// Record the current replica count on the workload
///
/// Runs before the zero-patch; callers only capture active counts, so the
/// stored value is never zero. A failure here must abort the suspension,
/// otherwise the count is lost.
pub async fn capture(
    patcher: &dyn WorkloadPatcher,
    workload: &WorkloadRef,
    replicas: u32,
) -> Result<(), Error> {
    patcher
        .patch_annotation(workload, crate::REPLICAS_ANNOTATION, &encode(replicas))
        .await
}
