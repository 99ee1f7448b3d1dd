//! Configuration for dashboard-operatord

use dashboard_reconcile::ReconcilerConfig;
use dashboard_types::DashboardSpec;
use serde::{Deserialize, Serialize};

use crate::simulation::SimulationConfig;

/// Main operator configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// Reconciliation engine configuration
    #[serde(default)]
    pub reconciler: ReconcilerConfig,

    /// Scheduler configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Dashboard section of the observed cluster spec
    #[serde(default)]
    pub dashboard: DashboardSpec,

    /// Seed data for the simulated cluster
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Reconciliation interval in seconds
    #[serde(default = "default_reconcile_interval")]
    pub reconcile_interval_secs: u64,

    /// Pending trigger requests beyond this are dropped
    #[serde(default = "default_trigger_capacity")]
    pub trigger_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            reconcile_interval_secs: default_reconcile_interval(),
            trigger_capacity: default_trigger_capacity(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_reconcile_interval() -> u64 {
    30
}

fn default_trigger_capacity() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl OperatorConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `DASHBOARD_`-prefixed environment variables
    ///
    /// Nested keys use a double underscore, e.g.
    /// `DASHBOARD_SCHEDULER__RECONCILE_INTERVAL_SECS=60`.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&OperatorConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("DASHBOARD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
