use domain::services::{AttendanceSettings, SpoofThresholds};
use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub geofence: GeofenceConfig,
    #[serde(default)]
    pub spoof: SpoofConfig,
    #[serde(default)]
    pub face_match: FaceMatchConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Check-in bodies carry a base64 photo.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeofenceConfig {
    /// JSON snapshot of units, subjects, zones and zone assignments.
    #[serde(default)]
    pub directory_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpoofConfig {
    #[serde(default = "default_max_speed_mps")]
    pub max_speed_mps: f64,

    #[serde(default = "default_max_jump_meters")]
    pub max_jump_meters: f64,
}

impl Default for SpoofConfig {
    fn default() -> Self {
        Self {
            max_speed_mps: default_max_speed_mps(),
            max_jump_meters: default_max_jump_meters(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FaceMatchConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of the face verification service.
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_face_match_timeout_ms")]
    pub timeout_ms: u64,

    /// Refuse attendance that is not backed by a matched face.
    #[serde(default)]
    pub required: bool,
}

impl Default for FaceMatchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            timeout_ms: default_face_match_timeout_ms(),
            required: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_body_size() -> usize {
    5 * 1_048_576
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_max_speed_mps() -> f64 {
    domain::services::spoof_detection::MAX_PLAUSIBLE_SPEED_MPS
}
fn default_max_jump_meters() -> f64 {
    domain::services::spoof_detection::MAX_JUMP_DISTANCE_METERS
}
fn default_face_match_timeout_ms() -> u64 {
    5000
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Defaults used when no config file is available.
pub const DEFAULTS_TOML: &str = r#"
    [server]
    host = "0.0.0.0"
    port = 8080
    request_timeout_secs = 30

    [logging]
    level = "info"
    format = "json"

    [geofence]
    directory_path = ""

    [spoof]
    max_speed_mps = 40.0
    max_jump_meters = 5000.0

    [face_match]
    enabled = false
    url = ""
    timeout_ms = 5000
    required = false
"#;

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with ATT__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("ATT").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Builds a configuration from the embedded defaults plus overrides,
    /// without touching the file system. Not validated.
    pub fn from_overrides(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(DEFAULTS_TOML, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if !(self.spoof.max_speed_mps.is_finite() && self.spoof.max_speed_mps > 0.0) {
            return Err(ConfigValidationError::InvalidValue(
                "spoof.max_speed_mps must be positive".to_string(),
            ));
        }

        if !(self.spoof.max_jump_meters.is_finite() && self.spoof.max_jump_meters > 0.0) {
            return Err(ConfigValidationError::InvalidValue(
                "spoof.max_jump_meters must be positive".to_string(),
            ));
        }

        if self.face_match.enabled && self.face_match.url.trim().is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "ATT__FACE_MATCH__URL must be set when face matching is enabled".to_string(),
            ));
        }

        if self.face_match.required && !self.face_match.enabled {
            return Err(ConfigValidationError::InvalidValue(
                "face_match.required needs face_match.enabled".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }

    pub fn attendance_settings(&self) -> AttendanceSettings {
        AttendanceSettings {
            spoof: SpoofThresholds {
                max_speed_mps: self.spoof.max_speed_mps,
                max_jump_meters: self.spoof.max_jump_meters,
            },
            require_face_match: self.face_match.required,
        }
    }
}
