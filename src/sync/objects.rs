// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Create-or-update of the managed object kinds.

use crate::constants::sync::MAX_CONFLICT_RETRIES;
use crate::constants::OPERATOR_NAME;
use crate::error::{LightspeedError, Result};
use crate::sync::merge;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Service, ServiceAccount};
use k8s_openapi::NamespaceResourceScope;
use kube::{
    api::{Api, PostParams},
    Client, Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    ServiceAccount,
    Service,
    ConfigMap,
    Deployment,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            ObjectKind::ServiceAccount => "ServiceAccount",
            ObjectKind::Service => "Service",
            ObjectKind::ConfigMap => "ConfigMap",
            ObjectKind::Deployment => "Deployment",
        };
        f.write_str(kind)
    }
}

/// What a sync did to the live object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Created,
    Updated,
    Unchanged,
}

/// A desired object of one of the kinds the operator manages
#[derive(Debug, Clone)]
pub enum ManagedObject {
    ServiceAccount(ServiceAccount),
    Service(Service),
    ConfigMap(ConfigMap),
    Deployment(Deployment),
}

impl ManagedObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            ManagedObject::ServiceAccount(_) => ObjectKind::ServiceAccount,
            ManagedObject::Service(_) => ObjectKind::Service,
            ManagedObject::ConfigMap(_) => ObjectKind::ConfigMap,
            ManagedObject::Deployment(_) => ObjectKind::Deployment,
        }
    }
}

/// Bring the live copy of `object` in line with it, creating it when absent.
///
/// Conflicts (a concurrent write between our read and our update) are
/// retried from a fresh read; after `MAX_CONFLICT_RETRIES` attempts a
/// `Conflict` error is returned for the caller to requeue.
pub async fn sync_object(client: &Client, namespace: &str, object: &ManagedObject) -> Result<SyncOutcome> {
    let kind = object.kind();
    match object {
        ManagedObject::ServiceAccount(desired) => {
            sync_typed(kind, Api::namespaced(client.clone(), namespace), desired, merge::merge_service_account).await
        }
        ManagedObject::Service(desired) => {
            sync_typed(kind, Api::namespaced(client.clone(), namespace), desired, merge::merge_service).await
        }
        ManagedObject::ConfigMap(desired) => {
            sync_typed(kind, Api::namespaced(client.clone(), namespace), desired, merge::merge_config_map).await
        }
        ManagedObject::Deployment(desired) => {
            sync_typed(kind, Api::namespaced(client.clone(), namespace), desired, merge::merge_deployment).await
        }
    }
}

#[instrument(skip(api, desired, merge_owned), fields(name = %desired.name_any()))]
async fn sync_typed<K>(
    kind: ObjectKind,
    api: Api<K>,
    desired: &K,
    merge_owned: fn(&K, &mut K),
) -> Result<SyncOutcome>
where
    K: Resource<Scope = NamespaceResourceScope>
        + Clone
        + PartialEq
        + Serialize
        + DeserializeOwned
        + fmt::Debug,
{
    let name = desired.name_any();
    let pp = PostParams {
        field_manager: Some(OPERATOR_NAME.to_string()),
        ..Default::default()
    };
    let mut last_conflict = String::new();

    for attempt in 1..=MAX_CONFLICT_RETRIES {
        let Some(live) = api.get_opt(&name).await? else {
            match api.create(&pp, desired).await {
                Ok(_) => {
                    info!("Created {} {}", kind, name);
                    return Ok(SyncOutcome::Created);
                }
                // Someone else created it since our read, compare against theirs
                Err(kube::Error::Api(err)) if err.code == 409 => {
                    warn!("{} {} appeared concurrently (attempt {}), re-reading", kind, name, attempt);
                    last_conflict = err.message;
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        };

        if let Some(owner) = merge::foreign_controller(desired.meta(), live.meta()) {
            return Err(LightspeedError::Invalid(format!(
                "{} {} is already controlled by {} {}",
                kind, name, owner.kind, owner.name
            )));
        }

        let mut merged = live.clone();
        merge_owned(desired, &mut merged);
        if merged == live {
            debug!("{} {} is up to date", kind, name);
            return Ok(SyncOutcome::Unchanged);
        }

        // `merged` carries the live resourceVersion, so a concurrent write fails with 409
        match api.replace(&name, &pp, &merged).await {
            Ok(_) => {
                info!("Updated {} {}", kind, name);
                return Ok(SyncOutcome::Updated);
            }
            Err(kube::Error::Api(err)) if err.code == 409 => {
                warn!("Conflict updating {} {} (attempt {}), re-reading", kind, name, attempt);
                last_conflict = err.message;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(LightspeedError::Conflict {
        kind,
        name,
        message: last_conflict,
    })
}
