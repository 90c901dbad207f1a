// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! One reconcile pass of the application server objects.

use crate::appserver::build_assets;
use crate::config::Config;
use crate::error::{LightspeedError, Result};
use crate::sync::{sync_object, ManagedObject, ObjectKind, SyncOutcome};
use crate::types::OLSConfig;
use kube::{Client, ResourceExt};
use tracing::{info, instrument};

/// Outcome of a successful reconcile pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// One entry per synced object, in sync order
    pub outcomes: Vec<(ObjectKind, SyncOutcome)>,
    /// Config fingerprint now stamped on the Deployment
    pub fingerprint: String,
}

impl ReconcileReport {
    /// Number of objects created or updated in this pass
    pub fn writes(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome != SyncOutcome::Unchanged)
            .count()
    }
}

/// Converge the ServiceAccount, Service, ConfigMap and Deployment of an
/// OLSConfig, in that order.
///
/// The Deployment mounts the ConfigMap and runs as the ServiceAccount, so it
/// goes last. The first failing step aborts the pass; the objects synced
/// before it stay as written and the next pass picks up from scratch.
#[instrument(skip(client, cr, config), fields(olsconfig = %format!("{}/{}", cr.namespace().unwrap_or_default(), cr.name_any())))]
pub async fn reconcile_app_server(client: &Client, cr: &OLSConfig, config: &Config) -> Result<ReconcileReport> {
    let assets = build_assets(cr, config)?;
    let namespace = cr.namespace().unwrap_or_default();

    let steps = [
        ManagedObject::ServiceAccount(assets.service_account),
        ManagedObject::Service(assets.service),
        ManagedObject::ConfigMap(assets.config_map),
        ManagedObject::Deployment(assets.deployment),
    ];

    let mut outcomes = Vec::with_capacity(steps.len());
    for object in &steps {
        let kind = object.kind();
        let outcome = sync_object(client, &namespace, object)
            .await
            .map_err(|e| LightspeedError::Sync {
                kind,
                source: Box::new(e),
            })?;
        outcomes.push((kind, outcome));
    }

    let report = ReconcileReport {
        outcomes,
        fingerprint: assets.fingerprint,
    };
    info!(
        "Application server reconciled ({} writes, config {})",
        report.writes(),
        report.fingerprint
    );
    Ok(report)
}
