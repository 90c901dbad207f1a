// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes reconcilers that react to watch events.

pub mod app_server;
pub mod olsconfig;

pub use app_server::{reconcile_app_server, ReconcileReport};
pub use olsconfig::OLSConfigReconciler;
