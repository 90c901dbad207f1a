// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::app_server::DEFAULT_IMAGE;
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Image of the application server container
    pub app_server_image: String,
    /// Only watch OLSConfig resources in this namespace; all namespaces when unset
    pub watch_namespace: Option<String>,
    /// Deadline for a single reconcile invocation
    pub reconcile_timeout: Duration,
    /// Delay before a failed reconcile is retried
    pub error_requeue: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app_server_image: DEFAULT_IMAGE.to_string(),
            watch_namespace: None,
            reconcile_timeout: Duration::from_secs(30),
            error_requeue: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let app_server_image =
            env::var("APP_SERVER_IMAGE").unwrap_or(defaults.app_server_image);
        let watch_namespace = env::var("WATCH_NAMESPACE").ok().filter(|ns| !ns.is_empty());

        let reconcile_timeout = match env::var("RECONCILE_TIMEOUT_SECS") {
            Ok(v) => Duration::from_secs(
                v.parse()
                    .context("RECONCILE_TIMEOUT_SECS must be a number of seconds")?,
            ),
            Err(_) => defaults.reconcile_timeout,
        };
        let error_requeue = match env::var("ERROR_REQUEUE_SECS") {
            Ok(v) => Duration::from_secs(
                v.parse()
                    .context("ERROR_REQUEUE_SECS must be a number of seconds")?,
            ),
            Err(_) => defaults.error_requeue,
        };

        Ok(Config {
            app_server_image,
            watch_namespace,
            reconcile_timeout,
            error_requeue,
        })
    }
}
