// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Print the OLSConfig CustomResourceDefinition as YAML.

use kube::CustomResourceExt;
use lightspeed_operator::types::OLSConfig;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&OLSConfig::crd())?);
    Ok(())
}
