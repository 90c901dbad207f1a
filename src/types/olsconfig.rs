// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::app_server::{
    DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_REPLICAS, DEFAULT_TLS_SECRET, SECRET_VOLUME_PREFIX,
};
use crate::error::{LightspeedError, Result};
use kube::CustomResource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Desired state of the Lightspeed application server.
///
/// The managed objects have fixed names, so a namespace holds at most one
/// OLSConfig. A second one is reported invalid instead of taking them over.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[kube(group = "ols.openshift.io", version = "v1alpha1", kind = "OLSConfig")]
#[kube(namespaced)]
#[kube(status = "OLSConfigStatus")]
#[serde(rename_all = "camelCase")]
pub struct OLSConfigSpec {
    pub llm: LLMSpec,
    #[serde(default)]
    pub ols: OLSSpec,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LLMSpec {
    pub providers: Vec<ProviderSpec>,
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSpec {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub provider_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub credentials_secret_ref: SecretReference,
    #[serde(default)]
    pub models: Vec<ModelSpec>,
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Reference to a Secret in the OLSConfig namespace
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, schemars::JsonSchema)]
pub struct SecretReference {
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OLSSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_cache: Option<ConversationCacheSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment: Option<DeploymentConfig>,
    /// Secret holding the serving certificate of the application server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_secret_ref: Option<SecretReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_auth: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationCacheSpec {
    #[serde(rename = "type", default)]
    pub cache_type: CacheType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryCacheSpec>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CacheType {
    #[default]
    Memory,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemoryCacheSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<u32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
    /// Overrides the operator-wide application server image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OLSConfigStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OLSConfig {
    /// Check the spec for combinations the application server cannot run with
    pub fn validate(&self) -> Result<()> {
        let providers = &self.spec.llm.providers;
        if providers.is_empty() {
            return Err(invalid("spec.llm.providers must contain at least one provider"));
        }

        let mut seen = BTreeSet::new();
        for provider in providers {
            if provider.name.is_empty() {
                return Err(invalid("provider name must not be empty"));
            }
            if !seen.insert(provider.name.as_str()) {
                return Err(invalid(format!("duplicate provider name '{}'", provider.name)));
            }
            if provider.credentials_secret_ref.name.is_empty() {
                return Err(invalid(format!(
                    "provider '{}' has an empty credentialsSecretRef",
                    provider.name
                )));
            }
            check_secret_volume(&provider.credentials_secret_ref.name)?;
            if provider.models.is_empty() {
                return Err(invalid(format!(
                    "provider '{}' must list at least one model",
                    provider.name
                )));
            }
            check_url(&provider.name, provider.url.as_deref())?;
            for model in &provider.models {
                check_url(&provider.name, model.url.as_deref())?;
            }
        }

        if let Some(tls) = &self.spec.ols.tls_secret_ref {
            if tls.name.is_empty() {
                return Err(invalid("tlsSecretRef must name a secret"));
            }
            check_secret_volume(&tls.name)?;
        }

        if let Some(replicas) = self.spec.ols.deployment.as_ref().and_then(|d| d.replicas) {
            if replicas < 0 {
                return Err(invalid(format!("replicas must not be negative, got {}", replicas)));
            }
        }

        // Resolving the defaults checks that they name an existing provider/model
        self.default_provider_and_model()?;
        Ok(())
    }

    /// The provider and model the application server answers with when a
    /// request does not pick one
    pub fn default_provider_and_model(&self) -> Result<(&str, &str)> {
        let providers = &self.spec.llm.providers;
        let provider = match &self.spec.ols.default_provider {
            Some(name) => providers
                .iter()
                .find(|p| &p.name == name)
                .ok_or_else(|| invalid(format!("defaultProvider '{}' is not a configured provider", name)))?,
            None => providers
                .first()
                .ok_or_else(|| invalid("spec.llm.providers must contain at least one provider"))?,
        };

        let model = match &self.spec.ols.default_model {
            Some(name) => provider
                .models
                .iter()
                .find(|m| &m.name == name)
                .ok_or_else(|| {
                    invalid(format!(
                        "defaultModel '{}' is not a model of provider '{}'",
                        name, provider.name
                    ))
                })?,
            None => provider.models.first().ok_or_else(|| {
                invalid(format!("provider '{}' must list at least one model", provider.name))
            })?,
        };

        Ok((provider.name.as_str(), model.name.as_str()))
    }

    pub fn log_level(&self) -> LogLevel {
        self.spec.ols.log_level.unwrap_or_default()
    }

    pub fn replicas(&self) -> i32 {
        self.spec
            .ols
            .deployment
            .as_ref()
            .and_then(|d| d.replicas)
            .unwrap_or(DEFAULT_REPLICAS)
    }

    pub fn image_override(&self) -> Option<&str> {
        self.spec.ols.deployment.as_ref().and_then(|d| d.image.as_deref())
    }

    pub fn tls_secret_name(&self) -> &str {
        self.spec
            .ols
            .tls_secret_ref
            .as_ref()
            .map(|r| r.name.as_str())
            .unwrap_or(DEFAULT_TLS_SECRET)
    }

    pub fn cache_max_entries(&self) -> u32 {
        self.spec
            .ols
            .conversation_cache
            .as_ref()
            .and_then(|c| c.memory.as_ref())
            .and_then(|m| m.max_entries)
            .unwrap_or(DEFAULT_CACHE_MAX_ENTRIES)
    }
}

fn check_url(provider: &str, value: Option<&str>) -> Result<()> {
    if let Some(value) = value {
        url::Url::parse(value).map_err(|e| {
            invalid(format!("provider '{}' has an invalid url '{}': {}", provider, value, e))
        })?;
    }
    Ok(())
}

/// Mounted secrets get a pod volume named after them, and a volume name is a
/// DNS-1123 label: at most 63 characters of `[a-z0-9-]`, alphanumeric at both ends.
/// Secret names allow dots and are longer, so not every valid one fits.
fn check_secret_volume(secret: &str) -> Result<()> {
    const MAX_VOLUME_NAME_LEN: usize = 63;

    let volume = format!("{}{}", SECRET_VOLUME_PREFIX, secret);
    if volume.len() > MAX_VOLUME_NAME_LEN {
        return Err(invalid(format!(
            "secret name '{}' is too long to mount, at most {} characters are allowed",
            secret,
            MAX_VOLUME_NAME_LEN - SECRET_VOLUME_PREFIX.len()
        )));
    }
    let label_chars = volume
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !label_chars || volume.ends_with('-') {
        return Err(invalid(format!(
            "secret name '{}' cannot be mounted, only lowercase letters, digits and '-' are allowed",
            secret
        )));
    }
    Ok(())
}

fn invalid(message: impl Into<String>) -> LightspeedError {
    LightspeedError::Invalid(message.into())
}
