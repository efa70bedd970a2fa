use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `SPOTSERVE__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub scheduling: SchedulingConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Slot allocator bounds.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulingConfig {
    /// Highest priority suggested to operators (1..=ceiling).
    #[serde(default = "default_priority_ceiling")]
    pub priority_ceiling: u32,
    /// Overlapping-campaign cap per spot; at or above this the allocator
    /// reports `max_campaigns_reached`.
    #[serde(default = "default_max_campaigns_per_spot")]
    pub max_campaigns_per_spot: usize,
}

/// Serve-time defaults applied when a spot leaves them unset.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default = "default_rotation_interval_ms")]
    pub default_rotation_interval_ms: u64,
    #[serde(default = "default_max_slots")]
    pub default_max_slots: u32,
}

// Default functions
fn default_node_id() -> String {
    "node-01".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_priority_ceiling() -> u32 {
    10
}
fn default_max_campaigns_per_spot() -> usize {
    10
}
fn default_rotation_interval_ms() -> u64 {
    45_000
}
fn default_max_slots() -> u32 {
    5
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            priority_ceiling: default_priority_ceiling(),
            max_campaigns_per_spot: default_max_campaigns_per_spot(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            default_rotation_interval_ms: default_rotation_interval_ms(),
            default_max_slots: default_max_slots(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            scheduling: SchedulingConfig::default(),
            delivery: DeliveryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("SPOTSERVE")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
