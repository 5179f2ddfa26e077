//! Configuration discovery and loading
//!
//! This module handles the configuration discovery hierarchy:
//! 1. Current directory: ./persona-engine.toml or ./.persona-engine/config.toml
//! 2. User config: ~/.persona-engine/config.toml
//! 3. Built-in defaults
//!
//! API keys may live in the config file or in conventional environment
//! variables; a provider with no resolvable key is omitted from the
//! rotation rather than configured present-but-always-failing.

use crate::engine::types::EngineConfig;
use crate::env;
use crate::providers::types::{ProviderKind, ProviderSettings};
use serde::{Deserialize, Serialize};
use std::env as std_env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineFileConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default = "default_provider_settings")]
    pub providers: Vec<ProviderSettings>,
}

impl Default for EngineFileConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            providers: default_provider_settings(),
        }
    }
}

/// The stock rotation: Anthropic first, then OpenAI, then Gemini. Keys
/// are expected from the environment unless the file provides them.
fn default_provider_settings() -> Vec<ProviderSettings> {
    vec![
        ProviderSettings {
            kind: ProviderKind::Anthropic,
            priority: 1,
            api_key: None,
            base_url: None,
            model: None,
        },
        ProviderSettings {
            kind: ProviderKind::OpenAi,
            priority: 2,
            api_key: None,
            base_url: None,
            model: None,
        },
        ProviderSettings {
            kind: ProviderKind::Gemini,
            priority: 3,
            api_key: None,
            base_url: None,
            model: None,
        },
    ]
}

impl EngineFileConfig {
    /// Load from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Save to TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Serialize to a TOML string
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Fill missing API keys from the process environment.
    pub fn resolve_credentials(&mut self) {
        self.resolve_credentials_with(|var| std_env::var(var).ok());
    }

    /// Credential resolution with an injectable lookup, so tests don't
    /// have to mutate process environment.
    pub fn resolve_credentials_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for provider in &mut self.providers {
            if provider.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
                continue;
            }
            let var = match provider.kind {
                ProviderKind::Anthropic => env::api_keys::ANTHROPIC,
                ProviderKind::OpenAi => env::api_keys::OPENAI,
                ProviderKind::Gemini => env::api_keys::GEMINI,
            };
            if let Some(key) = lookup(var).filter(|k| !k.trim().is_empty()) {
                debug!(
                    "Resolved API key for provider '{}' from ${}",
                    provider.kind.name(),
                    var
                );
                provider.api_key = Some(key);
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Configuration discovery system
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Discover and load configuration using the hierarchy
    pub fn discover() -> Result<EngineFileConfig, ConfigError> {
        if let Some(config_path) = Self::find_config_file() {
            info!("Loading configuration from: {:?}", config_path);
            return EngineFileConfig::from_toml_file(config_path);
        }

        info!("No configuration file found, using defaults");
        Ok(EngineFileConfig::default())
    }

    /// Find configuration file using discovery hierarchy
    pub fn find_config_file() -> Option<PathBuf> {
        for candidate in Self::config_candidates() {
            debug!("Checking for config file: {:?}", candidate);
            if candidate.is_file() {
                debug!("Found config file: {:?}", candidate);
                return Some(candidate);
            }
        }

        debug!("No config file found in discovery hierarchy");
        None
    }

    /// Get list of configuration file candidates in priority order
    fn config_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Ok(current_dir) = std_env::current_dir() {
            candidates.push(env::plain_config_file_path(&current_dir));
            candidates.push(env::local_config_file_path(&current_dir));
        }

        if let Some(home_dir) = Self::home_dir() {
            candidates.push(env::user_config_file_path(&home_dir));
        }

        candidates
    }

    fn home_dir() -> Option<PathBuf> {
        std_env::var("HOME")
            .or_else(|_| std_env::var("USERPROFILE"))
            .ok()
            .map(PathBuf::from)
    }

    /// Print the discovery hierarchy and which candidate, if any, would
    /// be loaded.
    pub fn show_discovery_info() {
        println!("Configuration discovery hierarchy (first match wins):");
        for candidate in Self::config_candidates() {
            let marker = if candidate.is_file() { "*" } else { " " };
            println!("  {} {}", marker, candidate.display());
        }
        match Self::find_config_file() {
            Some(path) => println!("Active configuration: {}", path.display()),
            None => println!("Active configuration: built-in defaults"),
        }
    }
}

/// Convert loaded configuration into the parts the engine is built
/// from: tunables plus the provider settings with resolved credentials.
pub fn runtime_parts(mut file_config: EngineFileConfig) -> (EngineConfig, Vec<ProviderSettings>) {
    file_config.resolve_credentials();
    (file_config.engine, file_config.providers)
}
