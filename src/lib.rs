//! Tbr - time-window-driven scaling operator for Kubernetes
//!
//! Tbr suspends and resumes Deployments and StatefulSets based on a daily
//! time window declared in a TimeWindowPolicy custom resource. A workload
//! opts in by carrying an annotation naming a policy in its own namespace;
//! outside the policy's window the workload is scaled to zero, and its
//! previous replica count is recorded in an annotation so it can be restored
//! exactly when the window opens again.
//!
//! # Architecture
//!
//! The controller is level-triggered and stateless between cycles:
//! - every evaluation re-reads the policy and the workload, so there is no
//!   in-process cache to drift
//! - the only durable state is the replica snapshot annotation on the
//!   workload itself, written before the workload is zeroed
//! - transitions are idempotent, so re-running a cycle (or running two
//!   operator instances) never loses state
//!
//! # Modules
//!
//! - [`crd`] - The TimeWindowPolicy Custom Resource Definition
//! - [`window`] - Pure daily-window evaluation in a policy's timezone
//! - [`workload`] - Scalable workload abstraction over Deployment/StatefulSet
//! - [`snapshot`] - Replica snapshot capture and readback
//! - [`patcher`] - Targeted merge patches to workloads
//! - [`resolver`] - TimeWindowPolicy lookup
//! - [`controller`] - Reconciliation logic and controller context
//! - [`events`] - Kubernetes Event publishing
//! - [`error`] - Error types for the operator

#![deny(missing_docs)]

pub mod controller;
pub mod crd;
pub mod error;
pub mod events;
pub mod patcher;
pub mod resolver;
pub mod snapshot;
pub mod window;
pub mod workload;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Wire Constants
// =============================================================================
// The API group and annotation keys are a durable contract with existing
// clusters. Changing them orphans suspended workloads mid-cycle.

/// API group of the TimeWindowPolicy custom resource
pub const API_GROUP: &str = "abriment.dev";

/// Annotation naming the TimeWindowPolicy a workload is governed by
///
/// The policy is resolved in the workload's own namespace. Presence of this
/// annotation is what opts a workload into reconciliation.
pub const POLICY_ANNOTATION: &str = "tbr.abriment.dev/policy";

/// Annotation recording the replica count to restore on resume
///
/// Written before the workload is scaled to zero, so the value is always the
/// last known active count and never zero.
pub const REPLICAS_ANNOTATION: &str = "tbr.abriment.dev/replicas";

/// Field manager name used for all patches and events
pub const CONTROLLER_NAME: &str = "tbr-controller";

/// Default seconds between periodic evaluations of each workload
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;

/// Default seconds allowed for a single Kubernetes API operation
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;
