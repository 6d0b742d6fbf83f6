//! TimeWindowPolicy resolution
//!
//! Policies are fetched fresh on every reconciliation cycle so edits take
//! effect at the next tick. A missing policy is a different condition from a
//! failed lookup: absence means the workload's annotation is dangling and a
//! human must fix it, while a fetch failure clears on its own and just
//! retries.

use std::time::Duration;

use async_trait::async_trait;
use kube::api::Api;
use kube::Client;

#[cfg(test)]
use mockall::automock;

use crate::crd::TimeWindowPolicy;
use crate::Error;

/// Trait abstracting policy lookup
///
/// This trait allows mocking the Kubernetes client in tests while using
/// the real client in production.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PolicyResolver: Send + Sync {
    /// Fetch the named policy from the given namespace
    ///
    /// # Arguments
    ///
    /// * `namespace` - Namespace of the referencing workload
    /// * `name` - Policy name from the workload's annotation
    async fn resolve(&self, namespace: &str, name: &str) -> Result<TimeWindowPolicy, Error>;
}

/// Production resolver backed by the Kubernetes API
pub struct KubePolicyResolver {
    client: Client,
    timeout: Duration,
}

impl KubePolicyResolver {
    /// Create a new resolver with the given per-operation timeout
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl PolicyResolver for KubePolicyResolver {
    async fn resolve(&self, namespace: &str, name: &str) -> Result<TimeWindowPolicy, Error> {
        let api: Api<TimeWindowPolicy> = Api::namespaced(self.client.clone(), namespace);
        let reference = format!("{namespace}/{name}");

        match tokio::time::timeout(self.timeout, api.get(name)).await {
            Ok(Ok(policy)) => Ok(policy),
            Ok(Err(e)) => Err(classify_fetch_error(&reference, e)),
            Err(_) => Err(Error::policy_fetch(format!(
                "{reference}: timed out after {:?}",
                self.timeout
            ))),
        }
    }
}

/// Split a failed lookup into not-found versus everything else
fn classify_fetch_error(reference: &str, err: kube::Error) -> Error {
    match err {
        kube::Error::Api(e) if e.code == 404 => Error::policy_not_found(reference),
        other => Error::policy_fetch(format!("{reference}: {other}")),
    }
}
