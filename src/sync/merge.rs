// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Copy the fields the operator owns from a desired object onto the live one.
//!
//! Everything else on the live object (cluster IPs, server defaults, keys
//! added by other controllers, status) is left as found. A merge that
//! leaves the live object unchanged means there is nothing to write.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Container, Service, ServiceAccount};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;

/// Operator labels and annotations win per key; the owner reference is added once
pub fn merge_metadata(desired: &ObjectMeta, live: &mut ObjectMeta) {
    merge_map(&desired.labels, &mut live.labels);
    merge_map(&desired.annotations, &mut live.annotations);

    if let Some(owners) = &desired.owner_references {
        let live_owners = live.owner_references.get_or_insert_with(Vec::new);
        for owner in owners {
            if !live_owners.iter().any(|o| o.uid == owner.uid) {
                live_owners.push(owner.clone());
            }
        }
    }
}

/// The controller of `live`, when it is not the controller `desired` names.
/// The API server allows one controller per object.
pub fn foreign_controller<'a>(desired: &ObjectMeta, live: &'a ObjectMeta) -> Option<&'a OwnerReference> {
    let ours = desired
        .owner_references
        .as_ref()?
        .iter()
        .find(|o| o.controller == Some(true))?;
    live.owner_references
        .as_ref()?
        .iter()
        .find(|o| o.controller == Some(true) && o.uid != ours.uid)
}

fn merge_map(desired: &Option<BTreeMap<String, String>>, live: &mut Option<BTreeMap<String, String>>) {
    let Some(desired) = desired else {
        return;
    };
    let live = live.get_or_insert_with(BTreeMap::new);
    for (key, value) in desired {
        live.insert(key.clone(), value.clone());
    }
}

pub fn merge_service_account(desired: &ServiceAccount, live: &mut ServiceAccount) {
    merge_metadata(&desired.metadata, &mut live.metadata);
}

/// Selector, type and ports are owned; cluster IPs and other assigned fields are not
pub fn merge_service(desired: &Service, live: &mut Service) {
    merge_metadata(&desired.metadata, &mut live.metadata);

    let Some(desired_spec) = &desired.spec else {
        return;
    };
    let spec = live.spec.get_or_insert_with(Default::default);
    spec.selector = desired_spec.selector.clone();
    if desired_spec.type_.is_some() {
        spec.type_ = desired_spec.type_.clone();
    }
    spec.ports = desired_spec.ports.clone();
}

pub fn merge_config_map(desired: &ConfigMap, live: &mut ConfigMap) {
    merge_metadata(&desired.metadata, &mut live.metadata);
    live.data = desired.data.clone();
}

/// Replicas, selector, template metadata, service account, volumes and
/// containers are owned. Containers are matched by name so fields the API
/// server defaults on them survive.
pub fn merge_deployment(desired: &Deployment, live: &mut Deployment) {
    merge_metadata(&desired.metadata, &mut live.metadata);

    let Some(desired_spec) = &desired.spec else {
        return;
    };
    let spec = live.spec.get_or_insert_with(Default::default);
    spec.replicas = desired_spec.replicas;
    spec.selector = desired_spec.selector.clone();

    if let Some(desired_meta) = &desired_spec.template.metadata {
        let meta = spec.template.metadata.get_or_insert_with(Default::default);
        merge_map(&desired_meta.labels, &mut meta.labels);
        merge_map(&desired_meta.annotations, &mut meta.annotations);
    }

    let Some(desired_pod) = &desired_spec.template.spec else {
        return;
    };
    let pod = spec.template.spec.get_or_insert_with(Default::default);
    pod.service_account_name = desired_pod.service_account_name.clone();
    // Replaced wholesale so volumes of dropped secret references disappear
    pod.volumes = desired_pod.volumes.clone();

    let mut live_containers = std::mem::take(&mut pod.containers);
    pod.containers = desired_pod
        .containers
        .iter()
        .map(|container| {
            match live_containers.iter().position(|c| c.name == container.name) {
                Some(index) => {
                    let mut merged = live_containers.swap_remove(index);
                    merge_container(container, &mut merged);
                    merged
                }
                None => container.clone(),
            }
        })
        .collect();
}

fn merge_container(desired: &Container, live: &mut Container) {
    live.image = desired.image.clone();
    live.args = desired.args.clone();
    live.command = desired.command.clone();
    live.ports = desired.ports.clone();
    live.env = desired.env.clone();
    live.volume_mounts = desired.volume_mounts.clone();
}
