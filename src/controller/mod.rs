//! Controller reconciliation logic for scalable workloads
//!
//! One reconciler, generic over the workload kind, drives both the
//! Deployment and StatefulSet controllers through the same observe-decide-act
//! loop.

mod scaler;

pub use scaler::{
    decide, error_policy, reconcile, reconcile_at, Context, ContextBuilder, ScalingDecision,
};
