//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Configuration can be loaded from environment variables and config files.

use crate::models::AccountPlan;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub credits: CreditsConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    num_cpus::get()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
        }
    }
}

/// Persistence configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding the persisted collections
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    "./data".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Credit ledger configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CreditsConfig {
    /// Monthly allotment for a standard professional account
    #[serde(default = "default_standard_monthly")]
    pub standard_monthly_credits: u32,

    /// Monthly allotment for a privileged (clinic-owner) account
    #[serde(default = "default_privileged_monthly")]
    pub privileged_monthly_credits: u32,

    /// Per-month administrator top-up ceiling, as percent of the
    /// recipient's monthly allotment, shared across all administrators
    #[serde(default = "default_adjustment_cap_percent")]
    pub adjustment_cap_percent: u32,

    /// Minimum length of the justification required on a grant
    #[serde(default = "default_reason_min_chars")]
    pub adjustment_reason_min_chars: usize,

    /// Bounded retention of the adjustment log (oldest-first eviction).
    /// Must be sized to cover at least one month of grants.
    #[serde(default = "default_adjustment_log_max_entries")]
    pub adjustment_log_max_entries: usize,
}

fn default_standard_monthly() -> u32 {
    100
}

fn default_privileged_monthly() -> u32 {
    1000
}

fn default_adjustment_cap_percent() -> u32 {
    10
}

fn default_reason_min_chars() -> usize {
    20
}

fn default_adjustment_log_max_entries() -> usize {
    500
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            standard_monthly_credits: default_standard_monthly(),
            privileged_monthly_credits: default_privileged_monthly(),
            adjustment_cap_percent: default_adjustment_cap_percent(),
            adjustment_reason_min_chars: default_reason_min_chars(),
            adjustment_log_max_entries: default_adjustment_log_max_entries(),
        }
    }
}

impl CreditsConfig {
    /// Monthly allotment for a freshly synthesized balance on the given plan
    pub fn allotment(&self, plan: AccountPlan) -> u32 {
        match plan {
            AccountPlan::Standard => self.standard_monthly_credits,
            AccountPlan::Privileged => self.privileged_monthly_credits,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables with FOLIA_ prefix
            .add_source(
                Environment::with_prefix("FOLIA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            credits: CreditsConfig::default(),
        }
    }
}
