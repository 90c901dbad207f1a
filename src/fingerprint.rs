// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Change-detection token for the generated application server config.

use sha2::{Digest, Sha256};

/// SHA-256 of the rendered config as lowercase hex.
///
/// Stamped on the Deployment pod template: when the config changes, the
/// template changes and the workload rolls.
pub fn fingerprint(artifact: &[u8]) -> String {
    format!("{:x}", Sha256::digest(artifact))
}
