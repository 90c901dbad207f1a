// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Secret volumes of the application server pod.
//!
//! The list is derived from the whole spec on every reconcile and replaces
//! the pod template volumes, so dropping a secret reference drops its volume.

use crate::constants::app_server::{
    CREDENTIALS_KEY, CREDENTIALS_MOUNT_ROOT, SECRET_VOLUME_PREFIX, TLS_MOUNT_ROOT,
    VOLUME_DEFAULT_MODE,
};
use crate::types::OLSConfig;
use k8s_openapi::api::core::v1::{SecretVolumeSource, Volume, VolumeMount};
use std::collections::BTreeSet;

/// A referenced secret and where the application server finds it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretBinding {
    pub secret_name: String,
    pub mount_path: String,
}

impl SecretBinding {
    fn new(secret_name: &str, mount_root: &str) -> Self {
        SecretBinding {
            secret_name: secret_name.to_string(),
            mount_path: format!("{}/{}", mount_root, secret_name),
        }
    }

    /// The secret name is used verbatim, so distinct secrets never share a volume
    pub fn volume_name(&self) -> String {
        format!("{}{}", SECRET_VOLUME_PREFIX, self.secret_name)
    }

    pub fn volume(&self) -> Volume {
        Volume {
            name: self.volume_name(),
            secret: Some(SecretVolumeSource {
                secret_name: Some(self.secret_name.clone()),
                default_mode: Some(VOLUME_DEFAULT_MODE),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn volume_mount(&self) -> VolumeMount {
        VolumeMount {
            name: self.volume_name(),
            mount_path: self.mount_path.clone(),
            read_only: Some(true),
            ..Default::default()
        }
    }
}

/// All secrets referenced by the spec, one binding per distinct name.
///
/// Provider credentials come first in provider order, then the serving
/// certificate. A name seen twice keeps its first mount path.
pub fn secret_bindings(cr: &OLSConfig) -> Vec<SecretBinding> {
    let provider_secrets = cr
        .spec
        .llm
        .providers
        .iter()
        .map(|p| SecretBinding::new(&p.credentials_secret_ref.name, CREDENTIALS_MOUNT_ROOT));
    let tls_secret = std::iter::once(SecretBinding::new(cr.tls_secret_name(), TLS_MOUNT_ROOT));

    let mut seen = BTreeSet::new();
    provider_secrets
        .chain(tls_secret)
        .filter(|b| seen.insert(b.secret_name.clone()))
        .collect()
}

/// Path of the API token file for a provider secret
pub fn credentials_path(bindings: &[SecretBinding], secret_name: &str) -> Option<String> {
    bindings
        .iter()
        .find(|b| b.secret_name == secret_name)
        .map(|b| format!("{}/{}", b.mount_path, CREDENTIALS_KEY))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::olsconfig::tests::{make_olsconfig, make_provider};
    use crate::types::olsconfig::SecretReference;

    #[test]
    fn test_volume_named_after_secret() {
        let binding = SecretBinding::new("new-token-secret", CREDENTIALS_MOUNT_ROOT);

        assert_eq!(
            binding.volume(),
            Volume {
                name: "secret-new-token-secret".to_string(),
                secret: Some(SecretVolumeSource {
                    secret_name: Some("new-token-secret".to_string()),
                    default_mode: Some(420),
                    ..Default::default()
                }),
                ..Default::default()
            }
        );
        assert_eq!(binding.volume_mount().mount_path, "/etc/apikeys/new-token-secret");
        assert_eq!(binding.volume_mount().read_only, Some(true));
    }

    #[test]
    fn test_bindings_follow_provider_order_then_tls() {
        let cr = make_olsconfig(vec![
            make_provider("openai", "openai-token"),
            make_provider("azure", "azure-token"),
        ]);

        let names: Vec<_> = secret_bindings(&cr)
            .into_iter()
            .map(|b| b.volume_name())
            .collect();

        assert_eq!(
            names,
            vec![
                "secret-openai-token",
                "secret-azure-token",
                "secret-lightspeed-tls"
            ]
        );
    }

    #[test]
    fn test_bindings_deduplicate_shared_secret() {
        let cr = make_olsconfig(vec![
            make_provider("openai", "shared-token"),
            make_provider("azure", "shared-token"),
        ]);

        let bindings = secret_bindings(&cr);

        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].mount_path, "/etc/apikeys/shared-token");
        assert_eq!(bindings[1].secret_name, "lightspeed-tls");
    }

    #[test]
    fn test_bindings_use_custom_tls_secret() {
        let mut cr = make_olsconfig(vec![make_provider("openai", "token-secret")]);
        cr.spec.ols.tls_secret_ref = Some(SecretReference {
            name: "my-cert".to_string(),
        });

        let bindings = secret_bindings(&cr);

        assert_eq!(bindings[1].mount_path, "/etc/certs/my-cert");
    }

    #[test]
    fn test_renamed_secret_replaces_binding() {
        let before = make_olsconfig(vec![make_provider("openai", "token-secret")]);
        let after = make_olsconfig(vec![make_provider("openai", "new-token-secret")]);

        let after_names: Vec<_> = secret_bindings(&after)
            .into_iter()
            .map(|b| b.secret_name)
            .collect();

        assert!(secret_bindings(&before)
            .iter()
            .any(|b| b.secret_name == "token-secret"));
        assert!(after_names.contains(&"new-token-secret".to_string()));
        assert!(!after_names.contains(&"token-secret".to_string()));
    }

    #[test]
    fn test_credentials_path() {
        let cr = make_olsconfig(vec![make_provider("openai", "token-secret")]);
        let bindings = secret_bindings(&cr);

        assert_eq!(
            credentials_path(&bindings, "token-secret").as_deref(),
            Some("/etc/apikeys/token-secret/apitoken")
        );
        assert_eq!(credentials_path(&bindings, "missing"), None);
    }
}
