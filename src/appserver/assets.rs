// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Desired state of each object making up the application server.

use crate::appserver::volumes::SecretBinding;
use crate::constants::app_server::{
    CONFIG_FILE_ENV, CONFIG_FILE_NAME, CONFIG_MOUNT_PATH, CONFIG_VOLUME_NAME, PORT, PORT_NAME,
    VOLUME_DEFAULT_MODE,
};
use crate::constants::{annotations, labels, names, OPERATOR_NAME};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    ConfigMap, ConfigMapVolumeSource, Container, ContainerPort, EnvVar, PodSpec, PodTemplateSpec,
    Service, ServiceAccount, ServicePort, ServiceSpec, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, OwnerReference};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;

/// Labels selecting the application server pods
pub fn selector_labels() -> BTreeMap<String, String> {
    BTreeMap::from([
        (labels::NAME.to_string(), labels::NAME_VALUE.to_string()),
        (labels::COMPONENT.to_string(), labels::COMPONENT_VALUE.to_string()),
    ])
}

/// Labels put on every managed object
pub fn common_labels() -> BTreeMap<String, String> {
    let mut all = selector_labels();
    all.insert(labels::MANAGED_BY.to_string(), OPERATOR_NAME.to_string());
    all.insert(labels::PART_OF.to_string(), labels::PART_OF_VALUE.to_string());
    all
}

fn object_meta(name: &str, namespace: &str, owner: &OwnerReference) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        labels: Some(common_labels()),
        owner_references: Some(vec![owner.clone()]),
        ..Default::default()
    }
}

pub fn service_account(namespace: &str, owner: &OwnerReference) -> ServiceAccount {
    ServiceAccount {
        metadata: object_meta(names::SERVICE_ACCOUNT, namespace, owner),
        ..Default::default()
    }
}

pub fn service(namespace: &str, owner: &OwnerReference, tls_secret: &str) -> Service {
    let mut metadata = object_meta(names::SERVICE, namespace, owner);
    metadata.annotations = Some(BTreeMap::from([(
        annotations::SERVING_CERT_SECRET_NAME.to_string(),
        tls_secret.to_string(),
    )]));

    Service {
        metadata,
        spec: Some(ServiceSpec {
            type_: Some("ClusterIP".to_string()),
            selector: Some(selector_labels()),
            ports: Some(vec![ServicePort {
                name: Some(PORT_NAME.to_string()),
                port: PORT,
                protocol: Some("TCP".to_string()),
                target_port: Some(IntOrString::Int(PORT)),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn config_map(namespace: &str, owner: &OwnerReference, rendered: &str) -> ConfigMap {
    ConfigMap {
        metadata: object_meta(names::CONFIG_MAP, namespace, owner),
        data: Some(BTreeMap::from([(
            CONFIG_FILE_NAME.to_string(),
            rendered.to_string(),
        )])),
        ..Default::default()
    }
}

/// Inputs of the Deployment that do not come straight from the OLSConfig
pub struct DeploymentParams<'a> {
    pub image: &'a str,
    pub replicas: i32,
    pub fingerprint: &'a str,
    pub secrets: &'a [SecretBinding],
}

pub fn deployment(namespace: &str, owner: &OwnerReference, params: &DeploymentParams) -> Deployment {
    let hash = BTreeMap::from([(
        annotations::CONFIG_HASH.to_string(),
        params.fingerprint.to_string(),
    )]);

    let mut metadata = object_meta(names::DEPLOYMENT, namespace, owner);
    metadata.annotations = Some(hash.clone());

    let mut volumes = vec![Volume {
        name: CONFIG_VOLUME_NAME.to_string(),
        config_map: Some(ConfigMapVolumeSource {
            name: names::CONFIG_MAP.to_string(),
            default_mode: Some(VOLUME_DEFAULT_MODE),
            ..Default::default()
        }),
        ..Default::default()
    }];
    volumes.extend(params.secrets.iter().map(SecretBinding::volume));

    let mut volume_mounts = vec![VolumeMount {
        name: CONFIG_VOLUME_NAME.to_string(),
        mount_path: CONFIG_MOUNT_PATH.to_string(),
        read_only: Some(true),
        ..Default::default()
    }];
    volume_mounts.extend(params.secrets.iter().map(SecretBinding::volume_mount));

    let container = Container {
        name: names::CONTAINER.to_string(),
        image: Some(params.image.to_string()),
        ports: Some(vec![ContainerPort {
            name: Some(PORT_NAME.to_string()),
            container_port: PORT,
            protocol: Some("TCP".to_string()),
            ..Default::default()
        }]),
        env: Some(vec![EnvVar {
            name: CONFIG_FILE_ENV.to_string(),
            value: Some(format!("{}/{}", CONFIG_MOUNT_PATH, CONFIG_FILE_NAME)),
            ..Default::default()
        }]),
        volume_mounts: Some(volume_mounts),
        ..Default::default()
    };

    Deployment {
        metadata,
        spec: Some(DeploymentSpec {
            replicas: Some(params.replicas),
            selector: LabelSelector {
                match_labels: Some(selector_labels()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(selector_labels()),
                    annotations: Some(hash),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    service_account_name: Some(names::SERVICE_ACCOUNT.to_string()),
                    containers: vec![container],
                    volumes: Some(volumes),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}
