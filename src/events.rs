//! Kubernetes Event recording for the scaling controllers.
//!
//! Provides a trait-based abstraction over `kube::runtime::events::Recorder`
//! so the reconciler can emit standard Kubernetes Events visible via
//! `kubectl describe` and `kubectl get events`.
//!
//! Events are **fire-and-forget**: failures are logged as warnings and never
//! propagate errors. A failed event must never break a scaling cycle.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::{EventType, Recorder, Reporter};
use kube::Client;
use tracing::warn;

/// Trait for publishing Kubernetes Events.
///
/// Implementations are expected to be fire-and-forget: `publish()` logs a
/// warning on failure but never returns an error.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a Kubernetes Event on the given resource.
    ///
    /// # Arguments
    ///
    /// * `resource_ref` - The workload this event is about
    /// * `type_` - Normal or Warning
    /// * `reason` - Machine-readable reason string (e.g. "Suspended")
    /// * `action` - What action was taken (e.g. "Suspend")
    /// * `note` - Optional human-readable message
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    );
}

/// Production implementation wrapping `kube::runtime::events::Recorder`.
pub struct KubeEventPublisher {
    recorder: Recorder,
}

impl KubeEventPublisher {
    /// Create a new publisher for the given controller name.
    ///
    /// The controller name appears as the "reportingComponent" on Events.
    pub fn new(client: Client, controller_name: &str) -> Self {
        let reporter = Reporter {
            controller: controller_name.to_string(),
            instance: None,
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait]
impl EventPublisher for KubeEventPublisher {
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    ) {
        let event = kube::runtime::events::Event {
            type_,
            reason: reason.to_string(),
            note,
            action: action.to_string(),
            secondary: None,
        };
        if let Err(e) = self.recorder.publish(&event, resource_ref).await {
            warn!(
                reason,
                action,
                error = %e,
                "Failed to publish Kubernetes event"
            );
        }
    }
}

/// No-op implementation for tests.
///
/// All calls are silently ignored, no Kubernetes API interaction.
pub struct NoopEventPublisher;

#[async_trait]
impl EventPublisher for NoopEventPublisher {
    async fn publish(
        &self,
        _resource_ref: &ObjectReference,
        _type_: EventType,
        _reason: &str,
        _action: &str,
        _note: Option<String>,
    ) {
        // intentionally empty
    }
}

/// Well-known event reason strings.
///
/// These appear in `kubectl get events` under the REASON column.
pub mod reasons {
    /// Workload scaled to zero outside its window
    pub const SUSPENDED: &str = "Suspended";
    /// Workload restored to its recorded replica count
    pub const RESUMED: &str = "Resumed";
    /// Policy window or timezone failed validation
    pub const INVALID_POLICY: &str = "InvalidPolicy";
    /// Referenced policy does not exist
    pub const POLICY_NOT_FOUND: &str = "PolicyNotFound";
    /// Suspended workload has no recorded replica count
    pub const SNAPSHOT_MISSING: &str = "SnapshotMissing";
    /// Recorded replica count is unreadable
    pub const SNAPSHOT_INVALID: &str = "SnapshotInvalid";
}

/// Well-known event action strings.
///
/// These appear in `kubectl get events` under the ACTION column.
pub mod actions {
    /// Scaling a workload down to zero
    pub const SUSPEND: &str = "Suspend";
    /// Restoring a workload to its recorded count
    pub const RESUME: &str = "Resume";
    /// Evaluating the window and deciding a transition
    pub const SCALE: &str = "Scale";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_publisher_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NoopEventPublisher>();
    }

    #[test]
    fn reason_constants_are_pascal_case() {
        assert_eq!(reasons::SUSPENDED, "Suspended");
        assert_eq!(reasons::INVALID_POLICY, "InvalidPolicy");
        assert_eq!(reasons::SNAPSHOT_MISSING, "SnapshotMissing");
    }

    #[test]
    fn action_constants_are_defined() {
        assert_eq!(actions::SUSPEND, "Suspend");
        assert_eq!(actions::RESUME, "Resume");
        assert_eq!(actions::SCALE, "Scale");
    }

    #[tokio::test]
    async fn noop_publisher_does_not_panic() {
        let publisher = NoopEventPublisher;
        let obj_ref = ObjectReference::default();
        publisher
            .publish(
                &obj_ref,
                EventType::Normal,
                reasons::RESUMED,
                actions::RESUME,
                Some("test".to_string()),
            )
            .await;
    }
}
