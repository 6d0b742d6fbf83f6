//! Targeted workload patching
//!
//! All writes to workloads go through [`WorkloadPatcher`]: a merge patch
//! setting the replica count, or a merge patch writing one annotation.
//! Nothing here replaces whole objects, so concurrent edits to unrelated
//! fields survive. The production implementation routes to the right typed
//! API by workload kind and bounds every call with a timeout.

use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use kube::api::{Api, Patch, PatchParams};
use kube::Client;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::workload::{WorkloadKind, WorkloadRef};
use crate::Error;

/// Trait abstracting workload writes
///
/// This trait allows mocking the Kubernetes client in tests while using
/// the real client in production.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WorkloadPatcher: Send + Sync {
    /// Set the replica count of a workload via merge patch
    ///
    /// # Arguments
    ///
    /// * `workload` - The workload to patch
    /// * `replicas` - Desired replica count
    async fn patch_replicas(&self, workload: &WorkloadRef, replicas: u32) -> Result<(), Error>;

    /// Write a single annotation on a workload via merge patch
    ///
    /// # Arguments
    ///
    /// * `workload` - The workload to patch
    /// * `key` - Annotation key
    /// * `value` - Annotation value
    async fn patch_annotation(
        &self,
        workload: &WorkloadRef,
        key: &str,
        value: &str,
    ) -> Result<(), Error>;
}

/// Merge patch body setting `spec.replicas`
fn replicas_patch(replicas: u32) -> serde_json::Value {
    serde_json::json!({
        "spec": {
            "replicas": replicas
        }
    })
}

/// Merge patch body writing one metadata annotation
fn annotation_patch(key: &str, value: &str) -> serde_json::Value {
    let mut annotations = serde_json::Map::new();
    annotations.insert(
        key.to_string(),
        serde_json::Value::String(value.to_string()),
    );
    serde_json::json!({
        "metadata": {
            "annotations": annotations
        }
    })
}

/// Production patcher over the Kubernetes API
pub struct KubeWorkloadPatcher {
    client: Client,
    timeout: Duration,
}

impl KubeWorkloadPatcher {
    /// Create a new patcher with the given per-operation timeout
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Apply a merge patch to the workload, routed by kind
    ///
    /// `field` names what is being written, for error context only.
    async fn apply(
        &self,
        workload: &WorkloadRef,
        field: &str,
        body: serde_json::Value,
    ) -> Result<(), Error> {
        let params = PatchParams::apply(crate::CONTROLLER_NAME);
        let patch = Patch::Merge(&body);

        let outcome = match workload.kind {
            WorkloadKind::Deployment => {
                let api: Api<Deployment> =
                    Api::namespaced(self.client.clone(), &workload.namespace);
                tokio::time::timeout(self.timeout, api.patch(&workload.name, &params, &patch))
                    .await
                    .map(|r| r.map(|_| ()))
            }
            WorkloadKind::StatefulSet => {
                let api: Api<StatefulSet> =
                    Api::namespaced(self.client.clone(), &workload.namespace);
                tokio::time::timeout(self.timeout, api.patch(&workload.name, &params, &patch))
                    .await
                    .map(|r| r.map(|_| ()))
            }
        };

        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(Error::patch(format!("{workload} {field}: {e}"))),
            Err(_) => Err(Error::patch(format!(
                "{workload} {field}: timed out after {:?}",
                self.timeout
            ))),
        }
    }
}

#[async_trait]
impl WorkloadPatcher for KubeWorkloadPatcher {
    async fn patch_replicas(&self, workload: &WorkloadRef, replicas: u32) -> Result<(), Error> {
        debug!(workload = %workload, replicas, "patching replica count");
        self.apply(workload, "spec.replicas", replicas_patch(replicas))
            .await
    }

    async fn patch_annotation(
        &self,
        workload: &WorkloadRef,
        key: &str,
        value: &str,
    ) -> Result<(), Error> {
        debug!(workload = %workload, key, "patching annotation");
        self.apply(workload, key, annotation_patch(key, value)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // The patch bodies are a wire contract: the replica patch touches only
    // spec.replicas and the annotation patch touches only one metadata key.

    #[test]
    fn test_replica_patch_touches_only_the_replica_field() {
        assert_eq!(replicas_patch(0), json!({"spec": {"replicas": 0}}));
        assert_eq!(replicas_patch(5), json!({"spec": {"replicas": 5}}));
    }

    #[test]
    fn test_annotation_patch_nests_one_key_under_metadata() {
        let body = annotation_patch(crate::REPLICAS_ANNOTATION, "5");
        assert_eq!(
            body,
            json!({
                "metadata": {
                    "annotations": {
                        "tbr.abriment.dev/replicas": "5"
                    }
                }
            })
        );
    }

    /// Annotation keys contain dots and slashes; they must stay one literal
    /// map key, not become nested objects.
    #[test]
    fn test_dotted_annotation_keys_stay_literal() {
        let body = annotation_patch("tbr.abriment.dev/policy", "office-hours");
        let annotations = &body["metadata"]["annotations"];

        assert_eq!(annotations["tbr.abriment.dev/policy"], "office-hours");
        assert_eq!(annotations.as_object().unwrap().len(), 1);
    }
}
