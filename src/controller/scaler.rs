//! Time-window scaling reconciler
//!
//! This module implements the reconciliation logic for annotated workloads.
//! Each cycle re-reads the referenced TimeWindowPolicy, evaluates the window
//! at the current instant, derives the transition from the observed replica
//! count and applies at most two targeted writes. No state is carried
//! between cycles: the replica snapshot annotation on the workload is the
//! only durable record, written before the workload is zeroed so a count is
//! never lost.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use kube::runtime::controller::Action;
use kube::runtime::events::EventType;
use kube::{Client, ResourceExt};
use tracing::{debug, error, info, instrument, warn};

use crate::events::{actions, reasons, EventPublisher, KubeEventPublisher};
use crate::patcher::{KubeWorkloadPatcher, WorkloadPatcher};
use crate::resolver::{KubePolicyResolver, PolicyResolver};
use crate::snapshot;
use crate::window::WindowPosition;
use crate::workload::ScalableWorkload;
use crate::Error;

/// Outcome of evaluating one workload against its policy window
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalingDecision {
    /// Active outside the window: record `current`, then scale to zero
    Suspend {
        /// Replica count to record before zeroing
        current: u32,
    },
    /// Suspended inside the window: restore the recorded count
    Resume,
    /// Already converged for the current window position
    NoOp,
}

/// Derive the transition from the observed replica count and window position
///
/// Suspension state is read from the workload itself (zero replicas means
/// suspended), never tracked in memory, so the same inputs produce the same
/// decision no matter how often or from how many instances it is computed.
pub fn decide(current_replicas: u32, position: WindowPosition) -> ScalingDecision {
    match (current_replicas, position) {
        (0, WindowPosition::Inside) => ScalingDecision::Resume,
        (0, WindowPosition::Outside) => ScalingDecision::NoOp,
        (current, WindowPosition::Outside) => ScalingDecision::Suspend { current },
        (_, WindowPosition::Inside) => ScalingDecision::NoOp,
    }
}

/// Shared state for the scaling controllers
///
/// One context serves both workload controllers. All collaborators are trait
/// objects so the reconciler tests run without a cluster.
pub struct Context {
    /// Policy lookup (trait object for testability)
    pub resolver: Arc<dyn PolicyResolver>,
    /// Workload writes (trait object for testability)
    pub patcher: Arc<dyn WorkloadPatcher>,
    /// Kubernetes Event sink
    pub events: Arc<dyn EventPublisher>,
    /// Delay between periodic evaluations of each workload
    pub check_interval: Duration,
}

impl Context {
    /// Create a builder for constructing a Context
    pub fn builder(client: Client) -> ContextBuilder {
        ContextBuilder::new(client)
    }

    /// Create a context for testing with mock collaborators
    ///
    /// Events go to a no-op publisher and the check interval keeps its
    /// default. Use [`Context::for_testing_with_events`] when a test needs
    /// to observe published events.
    #[cfg(test)]
    pub fn for_testing(
        resolver: Arc<dyn PolicyResolver>,
        patcher: Arc<dyn WorkloadPatcher>,
    ) -> Self {
        Self::for_testing_with_events(
            resolver,
            patcher,
            Arc::new(crate::events::NoopEventPublisher),
        )
    }

    /// Create a context for testing with a custom event publisher
    #[cfg(test)]
    pub fn for_testing_with_events(
        resolver: Arc<dyn PolicyResolver>,
        patcher: Arc<dyn WorkloadPatcher>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            resolver,
            patcher,
            events,
            check_interval: Duration::from_secs(crate::DEFAULT_CHECK_INTERVAL_SECS),
        }
    }
}

/// Builder for constructing [`Context`] instances
///
/// # Examples
///
/// ```ignore
/// let ctx = Context::builder(client)
///     .check_interval(Duration::from_secs(30))
///     .build();
/// ```
pub struct ContextBuilder {
    client: Client,
    resolver: Option<Arc<dyn PolicyResolver>>,
    patcher: Option<Arc<dyn WorkloadPatcher>>,
    events: Option<Arc<dyn EventPublisher>>,
    check_interval: Duration,
    api_timeout: Duration,
}

impl ContextBuilder {
    /// Create a new builder with the given Kubernetes client
    fn new(client: Client) -> Self {
        Self {
            client,
            resolver: None,
            patcher: None,
            events: None,
            check_interval: Duration::from_secs(crate::DEFAULT_CHECK_INTERVAL_SECS),
            api_timeout: Duration::from_secs(crate::DEFAULT_API_TIMEOUT_SECS),
        }
    }

    /// Set the delay between periodic evaluations
    pub fn check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Set the timeout applied to each Kubernetes API operation
    pub fn api_timeout(mut self, timeout: Duration) -> Self {
        self.api_timeout = timeout;
        self
    }

    /// Override the policy resolver (primarily for testing)
    pub fn resolver(mut self, resolver: Arc<dyn PolicyResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Override the workload patcher (primarily for testing)
    pub fn patcher(mut self, patcher: Arc<dyn WorkloadPatcher>) -> Self {
        self.patcher = Some(patcher);
        self
    }

    /// Override the event publisher (primarily for testing)
    pub fn events(mut self, events: Arc<dyn EventPublisher>) -> Self {
        self.events = Some(events);
        self
    }

    /// Build the Context
    pub fn build(self) -> Context {
        Context {
            resolver: self.resolver.unwrap_or_else(|| {
                Arc::new(KubePolicyResolver::new(self.client.clone(), self.api_timeout))
            }),
            patcher: self.patcher.unwrap_or_else(|| {
                Arc::new(KubeWorkloadPatcher::new(self.client.clone(), self.api_timeout))
            }),
            events: self.events.unwrap_or_else(|| {
                Arc::new(KubeEventPublisher::new(
                    self.client.clone(),
                    crate::CONTROLLER_NAME,
                ))
            }),
            check_interval: self.check_interval,
        }
    }
}

/// Reconcile a single workload against its referenced policy
///
/// Level-triggered: every invocation recomputes the decision from what is
/// observed right now. Workloads without a policy annotation are skipped
/// until their annotations change.
///
/// # Arguments
///
/// * `workload` - The workload to reconcile
/// * `ctx` - Shared controller context
///
/// # Returns
///
/// Returns an `Action` indicating when to requeue the workload, or an error
/// if the cycle could not complete.
#[instrument(skip(workload, ctx), fields(kind = %W::workload_kind(), workload = %workload.name_any()))]
pub async fn reconcile<W: ScalableWorkload>(
    workload: Arc<W>,
    ctx: Arc<Context>,
) -> Result<Action, Error> {
    reconcile_at(Utc::now(), workload, ctx).await
}

/// Reconcile a workload at a fixed instant
///
/// Split from [`reconcile`] so tests can pin the clock; production always
/// passes the current time.
pub async fn reconcile_at<W: ScalableWorkload>(
    now: DateTime<Utc>,
    workload: Arc<W>,
    ctx: Arc<Context>,
) -> Result<Action, Error> {
    let Some(policy_name) = workload.policy_name() else {
        debug!("no policy annotation, skipping");
        return Ok(Action::await_change());
    };
    let policy_name = policy_name.to_string();

    match run_cycle(now, workload.as_ref(), &policy_name, &ctx).await {
        Ok(()) => Ok(Action::requeue(ctx.check_interval)),
        Err(error) => {
            if error.is_config() {
                ctx.events
                    .publish(
                        &workload.object_ref(&()),
                        EventType::Warning,
                        error_reason(&error),
                        actions::SCALE,
                        Some(error.to_string()),
                    )
                    .await;
            }
            Err(error)
        }
    }
}

/// One evaluation of one workload: resolve, evaluate, decide, apply
async fn run_cycle<W: ScalableWorkload>(
    now: DateTime<Utc>,
    workload: &W,
    policy_name: &str,
    ctx: &Context,
) -> Result<(), Error> {
    let workload_ref = workload.workload_ref();

    let policy = ctx
        .resolver
        .resolve(&workload_ref.namespace, policy_name)
        .await?;
    let position = policy.spec.evaluate(now)?;
    let current = workload.replicas();

    match decide(current, position) {
        ScalingDecision::Suspend { current } => {
            info!(
                workload = %workload_ref,
                policy = policy_name,
                replicas = current,
                "outside window, suspending"
            );

            // The snapshot must land before the zero-patch. If it fails, the
            // workload stays active and the next cycle starts over.
            snapshot::capture(ctx.patcher.as_ref(), &workload_ref, current).await?;
            ctx.patcher.patch_replicas(&workload_ref, 0).await?;

            ctx.events
                .publish(
                    &workload.object_ref(&()),
                    EventType::Normal,
                    reasons::SUSPENDED,
                    actions::SUSPEND,
                    Some(format!(
                        "Scaled to 0 outside window, recorded {current} replicas"
                    )),
                )
                .await;
        }
        ScalingDecision::Resume => {
            let Some(target) = snapshot::read(workload.annotations())? else {
                return Err(Error::snapshot_missing(format!(
                    "{workload_ref} has no recorded replica count"
                )));
            };

            if target == 0 {
                // Only possible via out-of-band edits; restoring to zero is
                // already satisfied.
                debug!(workload = %workload_ref, "recorded count is zero, nothing to restore");
            } else {
                info!(
                    workload = %workload_ref,
                    policy = policy_name,
                    replicas = target,
                    "inside window, resuming"
                );

                ctx.patcher.patch_replicas(&workload_ref, target).await?;

                ctx.events
                    .publish(
                        &workload.object_ref(&()),
                        EventType::Normal,
                        reasons::RESUMED,
                        actions::RESUME,
                        Some(format!("Restored {target} replicas inside window")),
                    )
                    .await;
            }
        }
        ScalingDecision::NoOp => {
            if current == 0 {
                debug!(workload = %workload_ref, "already suspended outside window");
            } else {
                debug!(workload = %workload_ref, "already running inside window");
            }
        }
    }

    Ok(())
}

/// Decide how to respond to a failed reconciliation
///
/// Every error requeues at the check interval. TimeWindowPolicy objects are
/// not watched, so a policy fix never produces a workload event; waiting for
/// one would leave a misconfigured workload stuck until some unrelated edit.
///
/// # Arguments
///
/// * `workload` - The workload that failed reconciliation
/// * `error` - The error that occurred
/// * `ctx` - Shared controller context
///
/// # Returns
///
/// Returns an `Action` to requeue the workload after the check interval.
pub fn error_policy<W: ScalableWorkload>(
    workload: Arc<W>,
    error: &Error,
    ctx: Arc<Context>,
) -> Action {
    if error.is_config() {
        warn!(
            error = %error,
            kind = %W::workload_kind(),
            workload = %workload.name_any(),
            "reconciliation blocked by configuration"
        );
    } else {
        error!(
            error = %error,
            kind = %W::workload_kind(),
            workload = %workload.name_any(),
            "reconciliation failed"
        );
    }

    Action::requeue(ctx.check_interval)
}

/// Event reason for a config-class error
fn error_reason(error: &Error) -> &'static str {
    match error {
        Error::InvalidWindow(_) | Error::InvalidTimeZone(_) | Error::InvalidTimeFormat(_) => {
            reasons::INVALID_POLICY
        }
        Error::PolicyNotFound(_) => reasons::POLICY_NOT_FOUND,
        Error::SnapshotMissing(_) => reasons::SNAPSHOT_MISSING,
        Error::SnapshotInvalid(_) => reasons::SNAPSHOT_INVALID,
        _ => reasons::INVALID_POLICY,
    }
}
