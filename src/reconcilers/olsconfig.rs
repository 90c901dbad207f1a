// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! OLSConfig reconciler - watches OLSConfig resources and the objects they own.

use crate::config::Config;
use crate::constants::{conditions, labels, OPERATOR_NAME};
use crate::error::{LightspeedError, Result};
use crate::reconcilers::app_server::reconcile_app_server;
use crate::types::olsconfig::{Condition, OLSConfigStatus};
use crate::types::OLSConfig;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Service, ServiceAccount};
use kube::{
    api::{Patch, PatchParams},
    runtime::{controller::Action, Controller},
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct OLSConfigReconciler {
    client: Client,
    config: Config,
}

impl OLSConfigReconciler {
    pub fn new(client: Client, config: Config) -> Self {
        Self { client, config }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let olsconfigs: Api<OLSConfig> = self.scoped_api();
        let owned = WatcherConfig::default().labels(&format!("{}={}", labels::MANAGED_BY, OPERATOR_NAME));

        let deployments: Api<Deployment> = self.scoped_api();
        let config_maps: Api<ConfigMap> = self.scoped_api();
        let services: Api<Service> = self.scoped_api();
        let service_accounts: Api<ServiceAccount> = self.scoped_api();
        let context = Arc::new(self);

        Controller::new(olsconfigs, WatcherConfig::default())
            .owns(deployments, owned.clone())
            .owns(config_maps, owned.clone())
            .owns(services, owned.clone())
            .owns(service_accounts, owned)
            .shutdown_on_signal()
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled OLSConfig: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        info!("OLSConfig controller stopped");
        Ok(())
    }

    fn scoped_api<K>(&self) -> Api<K>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        <K as kube::Resource>::DynamicType: Default,
    {
        match &self.config.watch_namespace {
            Some(namespace) => Api::namespaced(self.client.clone(), namespace),
            None => Api::all(self.client.clone()),
        }
    }
}

async fn reconcile(cr: Arc<OLSConfig>, ctx: Arc<OLSConfigReconciler>) -> Result<Action> {
    let name = cr.name_any();
    let namespace = cr.namespace().unwrap_or_default();
    debug!("Reconciling OLSConfig: {}/{}", namespace, name);

    let timeout = ctx.config.reconcile_timeout;
    let result = match tokio::time::timeout(timeout, reconcile_app_server(&ctx.client, &cr, &ctx.config)).await {
        Ok(result) => result,
        Err(_) => Err(LightspeedError::DeadlineExceeded(timeout)),
    };

    let condition = match &result {
        Ok(_) => reconciled_condition(true, "Application server is up to date"),
        Err(e) => reconciled_condition(false, &e.to_string()),
    };
    if let Err(e) = update_status(&ctx.client, &cr, condition).await {
        // The reconcile error, if any, is the one worth surfacing
        if result.is_ok() {
            return Err(e);
        }
        warn!("Failed to update status of OLSConfig {}/{}: {}", namespace, name, e);
    }

    result?;
    // Drift in the owned objects re-triggers us through the watches
    Ok(Action::await_change())
}

fn error_policy(cr: Arc<OLSConfig>, error: &LightspeedError, ctx: Arc<OLSConfigReconciler>) -> Action {
    error!(
        "Reconciliation of OLSConfig {}/{} failed: {}",
        cr.namespace().unwrap_or_default(),
        cr.name_any(),
        error
    );
    if error.is_retryable() {
        Action::requeue(ctx.config.error_requeue)
    } else {
        // Only an edit of the OLSConfig can fix an invalid spec
        Action::await_change()
    }
}

fn reconciled_condition(succeeded: bool, message: &str) -> Condition {
    Condition {
        condition_type: conditions::RECONCILED.to_string(),
        status: if succeeded { "True" } else { "False" }.to_string(),
        reason: Some(
            if succeeded {
                conditions::REASON_SUCCEEDED
            } else {
                conditions::REASON_FAILED
            }
            .to_string(),
        ),
        message: Some(message.to_string()),
    }
}

/// Replace the Reconciled condition, keeping any other conditions
fn status_with_condition(cr: &OLSConfig, condition: Condition) -> OLSConfigStatus {
    let mut conditions: Vec<Condition> = cr
        .status
        .as_ref()
        .and_then(|s| s.conditions.clone())
        .unwrap_or_default()
        .into_iter()
        .filter(|c| c.condition_type != condition.condition_type)
        .collect();
    conditions.push(condition);

    OLSConfigStatus {
        conditions: Some(conditions),
        observed_generation: cr.metadata.generation,
    }
}

async fn update_status(client: &Client, cr: &OLSConfig, condition: Condition) -> Result<()> {
    let status = status_with_condition(cr, condition);
    if cr.status.as_ref().and_then(|s| s.conditions.as_ref()) == status.conditions.as_ref()
        && cr.status.as_ref().and_then(|s| s.observed_generation) == status.observed_generation
    {
        return Ok(());
    }

    let olsconfigs: Api<OLSConfig> = Api::namespaced(client.clone(), &cr.namespace().unwrap_or_default());
    olsconfigs
        .patch_status(
            &cr.name_any(),
            &PatchParams::default(),
            &Patch::Merge(serde_json::json!({ "status": status })),
        )
        .await?;
    Ok(())
}
