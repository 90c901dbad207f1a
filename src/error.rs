// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::sync::ObjectKind;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LightspeedError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Conflicting update of {kind} {name}: {message}")]
    Conflict {
        kind: ObjectKind,
        name: String,
        message: String,
    },

    #[error("Invalid OLSConfig: {0}")]
    Invalid(String),

    #[error("Failed to render generated config: {0}")]
    ConfigRender(#[from] serde_yaml::Error),

    #[error("Reconcile did not finish within {0:?}")]
    DeadlineExceeded(Duration),

    #[error("Failed to sync {kind}: {source}")]
    Sync {
        kind: ObjectKind,
        #[source]
        source: Box<LightspeedError>,
    },
}

impl LightspeedError {
    /// Whether requeueing the same spec can succeed. An invalid spec only
    /// changes when the user edits the resource.
    pub fn is_retryable(&self) -> bool {
        match self {
            LightspeedError::Invalid(_) => false,
            LightspeedError::Sync { source, .. } => source.is_retryable(),
            _ => true,
        }
    }
}

pub type Result<T> = std::result::Result<T, LightspeedError>;
