// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Desired state of the application server, derived from an OLSConfig.
//!
//! Everything here is pure: no cluster reads, so the same OLSConfig always
//! yields the same objects.

pub mod assets;
pub mod config;
pub mod volumes;

use crate::config::Config;
use crate::error::{LightspeedError, Result};
use crate::fingerprint::fingerprint;
use crate::types::OLSConfig;
use self::assets::DeploymentParams;
use self::config::AppServerConfig;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Service, ServiceAccount};
use kube::{Resource, ResourceExt};

/// The objects of one application server, in the order they are synced
#[derive(Debug, Clone)]
pub struct AppServerAssets {
    pub service_account: ServiceAccount,
    pub service: Service,
    pub config_map: ConfigMap,
    pub deployment: Deployment,
    /// Fingerprint of the rendered config carried by `deployment`
    pub fingerprint: String,
}

/// Build the desired objects for an OLSConfig
pub fn build_assets(cr: &OLSConfig, config: &Config) -> Result<AppServerAssets> {
    cr.validate()?;

    let namespace = cr
        .namespace()
        .ok_or_else(|| LightspeedError::Invalid(format!("OLSConfig {} has no namespace", cr.name_any())))?;
    let owner = cr.controller_owner_ref(&()).ok_or_else(|| {
        LightspeedError::Invalid(format!("OLSConfig {} has no uid to own objects with", cr.name_any()))
    })?;

    let secrets = volumes::secret_bindings(cr);
    let rendered = AppServerConfig::from_olsconfig(cr, &secrets)?.render()?;
    let fingerprint = fingerprint(rendered.as_bytes());

    let image = cr.image_override().unwrap_or(&config.app_server_image);
    let deployment = assets::deployment(
        &namespace,
        &owner,
        &DeploymentParams {
            image,
            replicas: cr.replicas(),
            fingerprint: &fingerprint,
            secrets: &secrets,
        },
    );

    Ok(AppServerAssets {
        service_account: assets::service_account(&namespace, &owner),
        service: assets::service(&namespace, &owner, cr.tls_secret_name()),
        config_map: assets::config_map(&namespace, &owner, &rendered),
        deployment,
        fingerprint,
    })
}
