// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The `olsconfig.yaml` document read by the application server.
//!
//! Rendering must be byte-for-byte reproducible: the fingerprint of the
//! output decides whether the workload rolls. Only structs and vectors are
//! serialized, in declaration order.

use crate::appserver::volumes::{credentials_path, SecretBinding};
use crate::constants::app_server::TLS_MOUNT_ROOT;
use crate::error::{LightspeedError, Result};
use crate::types::olsconfig::CacheType;
use crate::types::OLSConfig;
use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AppServerConfig {
    pub llm_providers: Vec<ProviderConfig>,
    pub ols_config: OlsConfig,
    pub dev_config: DevConfig,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub provider_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub credentials_path: String,
    pub models: Vec<ModelConfig>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct OlsConfig {
    pub default_provider: String,
    pub default_model: String,
    pub logging_config: LoggingConfig,
    pub conversation_cache: ConversationCacheConfig,
    pub tls_config: TlsConfig,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub app_log_level: String,
    pub lib_log_level: String,
    pub uvicorn_log_level: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ConversationCacheConfig {
    #[serde(rename = "type")]
    pub cache_type: CacheType,
    pub memory: MemoryCacheConfig,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MemoryCacheConfig {
    pub max_entries: u32,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TlsConfig {
    pub tls_certificate_path: String,
    pub tls_key_path: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DevConfig {
    pub disable_auth: bool,
}

impl AppServerConfig {
    /// Assemble the config from the spec. Credential paths point at the
    /// mounts produced by `bindings`.
    pub fn from_olsconfig(cr: &OLSConfig, bindings: &[SecretBinding]) -> Result<Self> {
        let llm_providers = cr
            .spec
            .llm
            .providers
            .iter()
            .map(|p| -> Result<ProviderConfig> {
                let secret = &p.credentials_secret_ref.name;
                let credentials_path = credentials_path(bindings, secret).ok_or_else(|| {
                    LightspeedError::Invalid(format!(
                        "no volume bound for secret '{}' of provider '{}'",
                        secret, p.name
                    ))
                })?;
                Ok(ProviderConfig {
                    name: p.name.clone(),
                    provider_type: p.provider_type.clone(),
                    url: p.url.clone(),
                    credentials_path,
                    models: p
                        .models
                        .iter()
                        .map(|m| ModelConfig {
                            name: m.name.clone(),
                            url: m.url.clone(),
                        })
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let (default_provider, default_model) = cr.default_provider_and_model()?;
        let level = cr.log_level().to_string();
        let tls_dir = format!("{}/{}", TLS_MOUNT_ROOT, cr.tls_secret_name());

        Ok(AppServerConfig {
            llm_providers,
            ols_config: OlsConfig {
                default_provider: default_provider.to_string(),
                default_model: default_model.to_string(),
                logging_config: LoggingConfig {
                    app_log_level: level.clone(),
                    lib_log_level: level.clone(),
                    uvicorn_log_level: level,
                },
                conversation_cache: ConversationCacheConfig {
                    cache_type: CacheType::Memory,
                    memory: MemoryCacheConfig {
                        max_entries: cr.cache_max_entries(),
                    },
                },
                tls_config: TlsConfig {
                    tls_certificate_path: format!("{}/tls.crt", tls_dir),
                    tls_key_path: format!("{}/tls.key", tls_dir),
                },
            },
            dev_config: DevConfig {
                disable_auth: cr.spec.ols.disable_auth.unwrap_or(false),
            },
        })
    }

    pub fn render(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
