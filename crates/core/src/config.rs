use serde::Deserialize;
use std::path::Path;

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `TRADEGUARD__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub approval: ApprovalConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// What the gate does when the content scanner reports a fault instead of a
/// verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultPolicy {
    /// Treat the content as approved and log the fault (availability first).
    #[default]
    FailOpen,
    /// Treat the content as blocked.
    FailClosed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScannerConfig {
    #[serde(default = "default_max_content_bytes")]
    pub max_content_bytes: usize,
    #[serde(default)]
    pub fault_policy: FaultPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApprovalConfig {
    #[serde(default = "default_min_monthly_budget")]
    pub min_monthly_budget: f64,
    #[serde(default = "default_min_total_keywords")]
    pub min_total_keywords: usize,
    #[serde(default = "default_min_headlines_per_group")]
    pub min_headlines_per_group: usize,
    #[serde(default = "default_top_rejection_reasons")]
    pub top_rejection_reasons: usize,
    #[serde(default = "default_days_per_month")]
    pub days_per_month: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub json: bool,
}

// Default functions
fn default_max_content_bytes() -> usize {
    20_000
}
fn default_min_monthly_budget() -> f64 {
    100.0
}
fn default_min_total_keywords() -> usize {
    5
}
fn default_min_headlines_per_group() -> usize {
    3
}
fn default_top_rejection_reasons() -> usize {
    5
}
fn default_days_per_month() -> f64 {
    30.4
}
fn default_log_filter() -> String {
    "tradeguard=info".to_string()
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_content_bytes: default_max_content_bytes(),
            fault_policy: FaultPolicy::default(),
        }
    }
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            min_monthly_budget: default_min_monthly_budget(),
            min_total_keywords: default_min_total_keywords(),
            min_headlines_per_group: default_min_headlines_per_group(),
            top_rejection_reasons: default_top_rejection_reasons(),
            days_per_month: default_days_per_month(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scanner: ScannerConfig::default(),
            approval: ApprovalConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and an optional config file.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("TRADEGUARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_thresholds() {
        let config = AppConfig::default();
        assert_eq!(config.scanner.fault_policy, FaultPolicy::FailOpen);
        assert_eq!(config.approval.min_total_keywords, 5);
        assert_eq!(config.approval.min_headlines_per_group, 3);
        assert_eq!(config.approval.top_rejection_reasons, 5);
        assert!((config.approval.min_monthly_budget - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"scanner": {"fault_policy": "fail_closed"}}"#).unwrap();
        assert_eq!(config.scanner.fault_policy, FaultPolicy::FailClosed);
        assert_eq!(config.scanner.max_content_bytes, 20_000);
        assert_eq!(config.logging.filter, "tradeguard=info");
    }
}
