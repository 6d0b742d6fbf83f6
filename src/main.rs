//! Tbr operator - time-window-driven scaling for Deployments and StatefulSets

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Api, Client, CustomResourceExt};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tbr::controller::{error_policy, reconcile, Context};
use tbr::crd::TimeWindowPolicy;

/// Tbr - scales workloads to zero outside their configured time windows
#[derive(Parser, Debug)]
#[command(name = "tbr", version, about, long_about = None)]
struct Cli {
    /// Generate the CRD manifest and exit
    #[arg(long)]
    crd: bool,

    /// Seconds between periodic evaluations of each workload
    #[arg(long, env = "CHECK_INTERVAL", default_value_t = tbr::DEFAULT_CHECK_INTERVAL_SECS)]
    check_interval: u64,

    /// Seconds allowed for a single Kubernetes API operation
    #[arg(long, env = "API_TIMEOUT", default_value_t = tbr::DEFAULT_API_TIMEOUT_SECS)]
    api_timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.crd {
        // Generate CRD YAML
        let crd = serde_yaml::to_string(&TimeWindowPolicy::crd())
            .map_err(|e| anyhow::anyhow!("Failed to serialize CRD: {}", e))?;
        println!("{crd}");
        return Ok(());
    }

    run_controller(cli).await
}

/// Ensure the TimeWindowPolicy CRD is installed
///
/// The operator installs its own CRD on startup using server-side apply.
/// This ensures the CRD version always matches the operator version.
async fn ensure_crds_installed(client: &Client) -> anyhow::Result<()> {
    use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
    use kube::api::{Patch, PatchParams};

    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    let params = PatchParams::apply(tbr::CONTROLLER_NAME).force();

    tracing::info!("Installing TimeWindowPolicy CRD...");
    crds.patch(
        "timewindowpolicies.abriment.dev",
        &params,
        &Patch::Apply(&TimeWindowPolicy::crd()),
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to install TimeWindowPolicy CRD: {}", e))?;

    tracing::info!("TimeWindowPolicy CRD installed/updated");
    Ok(())
}

/// Run in controller mode - watches Deployments and StatefulSets
///
/// Both controllers share one context. Every annotated workload is
/// re-evaluated on object change and on the periodic requeue, so window
/// transitions are picked up within one check interval.
async fn run_controller(cli: Cli) -> anyhow::Result<()> {
    tracing::info!("tbr controller starting...");

    // Create Kubernetes client
    let client = Client::try_default()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Kubernetes client: {}", e))?;

    // Operator installs its own CRD on startup
    ensure_crds_installed(&client).await?;

    let ctx = Arc::new(
        Context::builder(client.clone())
            .check_interval(Duration::from_secs(cli.check_interval))
            .api_timeout(Duration::from_secs(cli.api_timeout))
            .build(),
    );

    // Watch both workload kinds across all namespaces
    let deployments: Api<Deployment> = Api::all(client.clone());
    let stateful_sets: Api<StatefulSet> = Api::all(client);

    tracing::info!(
        check_interval_secs = cli.check_interval,
        "Starting tbr controllers..."
    );
    tracing::info!("  - Deployment controller");
    tracing::info!("  - StatefulSet controller");

    let deployment_controller = Controller::new(deployments, WatcherConfig::default())
        .shutdown_on_signal()
        .run(
            reconcile::<Deployment>,
            error_policy::<Deployment>,
            ctx.clone(),
        )
        .for_each(|result| async move {
            match result {
                Ok(action) => {
                    tracing::debug!(?action, "Deployment reconciliation completed");
                }
                Err(e) => {
                    tracing::error!(error = ?e, "Deployment reconciliation error");
                }
            }
        });

    let stateful_set_controller = Controller::new(stateful_sets, WatcherConfig::default())
        .shutdown_on_signal()
        .run(
            reconcile::<StatefulSet>,
            error_policy::<StatefulSet>,
            ctx.clone(),
        )
        .for_each(|result| async move {
            match result {
                Ok(action) => {
                    tracing::debug!(?action, "StatefulSet reconciliation completed");
                }
                Err(e) => {
                    tracing::error!(error = ?e, "StatefulSet reconciliation error");
                }
            }
        });

    // Run both controllers concurrently
    tokio::select! {
        _ = deployment_controller => {
            tracing::info!("Deployment controller completed");
        }
        _ = stateful_set_controller => {
            tracing::info!("StatefulSet controller completed");
        }
    }

    tracing::info!("tbr controller shutting down");
    Ok(())
}
