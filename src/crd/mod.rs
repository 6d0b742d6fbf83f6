//! Custom Resource Definitions for tbr
//!
//! This module contains the TimeWindowPolicy CRD consumed by the operator.

mod policy;

pub use policy::{TimeWindowPolicy, TimeWindowPolicySpec};
