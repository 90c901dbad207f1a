// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// The operator name, used as field manager and in the managed-by label
pub const OPERATOR_NAME: &str = "lightspeed-operator";

/// Kubernetes annotation keys used by the operator
pub mod annotations {
    /// Fingerprint of the generated config, stamped on the Deployment and its pod template
    pub const CONFIG_HASH: &str = "hash/olsconfig";
    /// Asks the serving-cert signer to issue the TLS secret for the Service
    pub const SERVING_CERT_SECRET_NAME: &str = "service.beta.openshift.io/serving-cert-secret-name";
}

/// Label keys and values put on every managed object
pub mod labels {
    pub const NAME: &str = "app.kubernetes.io/name";
    pub const COMPONENT: &str = "app.kubernetes.io/component";
    pub const MANAGED_BY: &str = "app.kubernetes.io/managed-by";
    pub const PART_OF: &str = "app.kubernetes.io/part-of";

    pub const NAME_VALUE: &str = "lightspeed-service-api";
    pub const COMPONENT_VALUE: &str = "application-server";
    pub const PART_OF_VALUE: &str = "openshift-lightspeed";
}

/// Fixed names of the managed objects, relative to the OLSConfig namespace
pub mod names {
    pub const SERVICE_ACCOUNT: &str = "lightspeed-app-server";
    pub const SERVICE: &str = "lightspeed-app-server";
    pub const DEPLOYMENT: &str = "lightspeed-app-server";
    pub const CONFIG_MAP: &str = "olsconfig";
    pub const CONTAINER: &str = "lightspeed-service-api";
}

/// Application server layout inside the pod
pub mod app_server {
    pub const DEFAULT_IMAGE: &str = "quay.io/openshift-lightspeed/lightspeed-service-api:latest";
    pub const DEFAULT_REPLICAS: i32 = 1;
    pub const PORT: i32 = 8443;
    pub const PORT_NAME: &str = "https";

    pub const CONFIG_FILE_NAME: &str = "olsconfig.yaml";
    pub const CONFIG_MOUNT_PATH: &str = "/etc/ols";
    pub const CONFIG_VOLUME_NAME: &str = "cm-olsconfig";
    pub const CONFIG_FILE_ENV: &str = "OLS_CONFIG_FILE";

    /// Provider credential secrets are mounted below this directory
    pub const CREDENTIALS_MOUNT_ROOT: &str = "/etc/apikeys";
    /// Key inside a credentials secret holding the API token
    pub const CREDENTIALS_KEY: &str = "apitoken";
    /// The serving certificate secret is mounted below this directory
    pub const TLS_MOUNT_ROOT: &str = "/etc/certs";
    pub const DEFAULT_TLS_SECRET: &str = "lightspeed-tls";

    /// Secret volumes are named after the secret with this prefix
    pub const SECRET_VOLUME_PREFIX: &str = "secret-";
    /// 0644
    pub const VOLUME_DEFAULT_MODE: i32 = 420;

    pub const DEFAULT_CACHE_MAX_ENTRIES: u32 = 1000;
}

/// Object synchronization
pub mod sync {
    /// Attempts per object before a conflict is reported to the caller
    pub const MAX_CONFLICT_RETRIES: u32 = 3;
}

/// Status conditions written to the OLSConfig
pub mod conditions {
    pub const RECONCILED: &str = "Reconciled";
    pub const REASON_SUCCEEDED: &str = "ReconcileSucceeded";
    pub const REASON_FAILED: &str = "ReconcileFailed";
}

/// CRD polling configuration
pub mod crd {
    pub const GROUP: &str = "ols.openshift.io";
    pub const VERSION: &str = "v1alpha1";
    pub const KIND: &str = "OLSConfig";
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}
