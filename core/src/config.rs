//! Relay configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use relay_crypto::parse_account;
use relay_ledger::default_representative;
use relay_rpc::NodeTimeouts;
use relay_types::Account;
use relay_utils::LogFormat;
use relay_work::thresholds::{format_difficulty, parse_difficulty};
use relay_work::WorkThresholds;

use crate::error::ConfigError;
use crate::orchestrator::RelayOptions;
use crate::settlement::SettlementPolicy;

/// Configuration for the relay.
///
/// Can be loaded from a TOML file via [`RelayConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default, so an
/// empty file is a valid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Ledger node JSON API endpoint.
    #[serde(default = "default_node_url")]
    pub node_url: String,

    /// Work service endpoint. Work is generated locally when absent.
    #[serde(default)]
    pub work_url: Option<String>,

    /// Minimum work difficulty for send blocks, as 16 hex digits.
    #[serde(default = "default_send_difficulty")]
    pub send_difficulty: String,

    /// Minimum work difficulty for receive blocks, as 16 hex digits.
    #[serde(default = "default_receive_difficulty")]
    pub receive_difficulty: String,

    /// Representative for accounts the node has never seen.
    #[serde(default = "default_representative_address")]
    pub default_representative: String,

    /// How far back to search account history when revealing a token.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(default = "default_receivable_count")]
    pub receivable_count: usize,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Timeout for a single work request to the work service.
    #[serde(default = "default_work_timeout_secs")]
    pub work_timeout_secs: u64,

    #[serde(default)]
    pub settlement: SettlementPolicy,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log filter, e.g. `"info"` or `"debug,relay_core=trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            node_url: default_node_url(),
            work_url: None,
            send_difficulty: default_send_difficulty(),
            receive_difficulty: default_receive_difficulty(),
            default_representative: default_representative_address(),
            history_limit: default_history_limit(),
            receivable_count: default_receivable_count(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            work_timeout_secs: default_work_timeout_secs(),
            settlement: SettlementPolicy::default(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}

// ── Defaults ───────────────────────────────────────────────────────────

fn default_node_url() -> String {
    "http://127.0.0.1:7076".to_string()
}

fn default_send_difficulty() -> String {
    format_difficulty(WorkThresholds::new().send)
}

fn default_receive_difficulty() -> String {
    format_difficulty(WorkThresholds::new().receive)
}

fn default_representative_address() -> String {
    default_representative().to_string()
}

fn default_history_limit() -> usize {
    50
}

fn default_receivable_count() -> usize {
    32
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_work_timeout_secs() -> u64 {
    120
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl RelayConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check every field that can be wrong without contacting anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds()?;
        self.representative()?;
        if self.node_url.trim().is_empty() {
            return Err(invalid("node_url", "must not be empty"));
        }
        if self.receivable_count == 0 {
            return Err(invalid("receivable_count", "must be at least 1"));
        }
        if self.history_limit == 0 {
            return Err(invalid("history_limit", "must be at least 1"));
        }
        if self.settlement.max_attempts == 0 {
            return Err(invalid("settlement.max_attempts", "must be at least 1"));
        }
        if !(self.settlement.backoff_factor.is_finite() && self.settlement.backoff_factor >= 1.0) {
            return Err(invalid("settlement.backoff_factor", "must be a number >= 1.0"));
        }
        Ok(())
    }

    pub fn thresholds(&self) -> Result<WorkThresholds, ConfigError> {
        let send = parse_difficulty(&self.send_difficulty)
            .map_err(|e| invalid("send_difficulty", e))?;
        let receive = parse_difficulty(&self.receive_difficulty)
            .map_err(|e| invalid("receive_difficulty", e))?;
        Ok(WorkThresholds { send, receive })
    }

    pub fn representative(&self) -> Result<Account, ConfigError> {
        parse_account(&self.default_representative).map_err(|e| invalid("default_representative", e))
    }

    pub fn node_timeouts(&self) -> NodeTimeouts {
        NodeTimeouts {
            connect: Duration::from_secs(self.connect_timeout_secs),
            request: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn work_timeout(&self) -> Duration {
        Duration::from_secs(self.work_timeout_secs)
    }

    pub fn relay_options(&self) -> Result<RelayOptions, ConfigError> {
        Ok(RelayOptions {
            thresholds: self.thresholds()?,
            settlement: self.settlement.clone(),
            receivable_count: self.receivable_count,
        })
    }
}

fn invalid(field: &'static str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
