//! TimeWindowPolicy Custom Resource Definition
//!
//! A TimeWindowPolicy declares the daily window during which opted-in
//! workloads in its namespace run at capacity. Workloads reference a policy
//! by name through the `tbr.abriment.dev/policy` annotation and are scaled
//! to zero whenever the local time in the policy's timezone falls outside
//! the window.

use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::window::{self, WindowPosition};

/// Specification for a TimeWindowPolicy
///
/// The window is a same-day interval: `startTime` must be strictly before
/// `endTime`, both in the 24-hour `HH:MM` form, evaluated in `timeZone`.
/// Bounds are inclusive. Policies are fetched fresh on every evaluation, so
/// edits take effect at the next cycle without restarting anything.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "abriment.dev",
    version = "v1",
    kind = "TimeWindowPolicy",
    plural = "timewindowpolicies",
    shortname = "tbr",
    namespaced,
    printcolumn = r#"{"name":"Start","type":"string","jsonPath":".spec.startTime"}"#,
    printcolumn = r#"{"name":"End","type":"string","jsonPath":".spec.endTime"}"#,
    printcolumn = r#"{"name":"TimeZone","type":"string","jsonPath":".spec.timeZone"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindowPolicySpec {
    /// Start of the daily window, 24-hour `HH:MM` (e.g. "09:00")
    pub start_time: String,

    /// End of the daily window, 24-hour `HH:MM`, strictly after startTime
    pub end_time: String,

    /// IANA timezone the window is evaluated in (e.g. "Europe/Berlin")
    pub time_zone: String,
}

impl TimeWindowPolicySpec {
    /// Evaluate an instant against this policy's window
    ///
    /// Returns where `now` falls in the policy's local clock, or the
    /// validation error if the policy itself is unusable.
    pub fn evaluate(&self, now: DateTime<Utc>) -> Result<WindowPosition, crate::Error> {
        window::evaluate(now, &self.time_zone, &self.start_time, &self.end_time)
    }
}
