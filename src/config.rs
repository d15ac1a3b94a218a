use crate::warn;
use std::{env, time::Duration};
use strum_macros::Display;

/// Which link the ground station uses to reach the aircraft.
///
/// Each mode is bound to the fixed address the vehicle (or simulator)
/// exposes on its own network.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionMode {
    #[strum(serialize = "simulation")]
    Simulation,
    #[strum(serialize = "wifi_direct")]
    WifiDirect,
    #[strum(serialize = "skycontroller")]
    SkyController,
}

impl ConnectionMode {
    pub fn host(self) -> &'static str {
        match self {
            ConnectionMode::Simulation => "10.202.0.1",
            ConnectionMode::WifiDirect => "192.168.42.1",
            ConnectionMode::SkyController => "192.168.53.1",
        }
    }

    /// Parses the values accepted by `DRONE_CONNECTION_MODE`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "simulation" | "sim" | "sphinx" => Some(ConnectionMode::Simulation),
            "wifi" | "wifi_direct" | "auto" => Some(ConnectionMode::WifiDirect),
            "skycontroller" => Some(ConnectionMode::SkyController),
            _ => None,
        }
    }
}

#[derive(Debug, Display, Clone, PartialEq)]
pub enum ConfigError {
    ThresholdOutOfRange(f64),
    ThresholdsInverted { min: f64, warning: f64 },
}

impl std::error::Error for ConfigError {}

/// Battery limits consulted before every flight-affecting command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyThresholds {
    min_battery_for_flight: f64,
    low_battery_warning: f64,
}

impl SafetyThresholds {
    pub const DEFAULT_MIN_BATTERY: f64 = 20.0;
    pub const DEFAULT_LOW_WARNING: f64 = 25.0;

    pub fn new(min_battery_for_flight: f64, low_battery_warning: f64) -> Result<Self, ConfigError> {
        for v in [min_battery_for_flight, low_battery_warning] {
            if !(0.0..=100.0).contains(&v) {
                return Err(ConfigError::ThresholdOutOfRange(v));
            }
        }
        if min_battery_for_flight > low_battery_warning {
            return Err(ConfigError::ThresholdsInverted {
                min: min_battery_for_flight,
                warning: low_battery_warning,
            });
        }
        Ok(Self { min_battery_for_flight, low_battery_warning })
    }

    pub fn min_battery_for_flight(&self) -> f64 { self.min_battery_for_flight }
    pub fn low_battery_warning(&self) -> f64 { self.low_battery_warning }
}

impl Default for SafetyThresholds {
    fn default() -> Self {
        Self {
            min_battery_for_flight: Self::DEFAULT_MIN_BATTERY,
            low_battery_warning: Self::DEFAULT_LOW_WARNING,
        }
    }
}

/// How long a command may wait for its terminal telemetry condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandTimeouts {
    pub takeoff: Duration,
    pub land: Duration,
    pub goto: Duration,
    pub move_relative: Duration,
}

impl Default for CommandTimeouts {
    fn default() -> Self {
        Self {
            takeoff: Duration::from_secs(30),
            land: Duration::from_secs(60),
            goto: Duration::from_secs(30),
            move_relative: Duration::from_secs(30),
        }
    }
}

/// Everything a session needs at construction. Immutable afterwards.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub connection_mode: ConnectionMode,
    pub thresholds: SafetyThresholds,
    pub timeouts: CommandTimeouts,
    pub poll_interval: Duration,
    /// Port of the vehicle bridge on the mode's host.
    pub bridge_port: u16,
    /// Route `Simulation` through the bridge (Sphinx) instead of the in-process engine.
    pub use_bridge: bool,
}

impl SessionConfig {
    pub const POLL_INTERVAL: Duration = Duration::from_millis(500);
    pub const DEFAULT_BRIDGE_PORT: u16 = 8000;

    pub fn new(connection_mode: ConnectionMode, thresholds: SafetyThresholds) -> Self {
        Self {
            connection_mode,
            thresholds,
            timeouts: CommandTimeouts::default(),
            poll_interval: Self::POLL_INTERVAL,
            bridge_port: Self::DEFAULT_BRIDGE_PORT,
            use_bridge: false,
        }
    }

    pub fn simulation() -> Self { Self::new(ConnectionMode::Simulation, SafetyThresholds::default()) }

    /// Builds the configuration from `DRONE_CONNECTION_MODE`, `DRONE_BRIDGE_PORT`,
    /// `DRONE_USE_BRIDGE`, `MIN_BATTERY_LEVEL` and `LOW_BATTERY_WARNING`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mode = match env::var("DRONE_CONNECTION_MODE") {
            Ok(raw) => ConnectionMode::parse(&raw).unwrap_or_else(|| {
                warn!("Unknown connection mode '{raw}', falling back to simulation");
                ConnectionMode::Simulation
            }),
            Err(_) => ConnectionMode::Simulation,
        };
        let min = env_f64("MIN_BATTERY_LEVEL", SafetyThresholds::DEFAULT_MIN_BATTERY);
        let low = env_f64("LOW_BATTERY_WARNING", SafetyThresholds::DEFAULT_LOW_WARNING);
        let mut config = Self::new(mode, SafetyThresholds::new(min, low)?);
        config.bridge_port = env::var("DRONE_BRIDGE_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(Self::DEFAULT_BRIDGE_PORT);
        config.use_bridge = env::var("DRONE_USE_BRIDGE").is_ok();
        Ok(config)
    }

    pub fn bridge_url(&self) -> String {
        format!("http://{}:{}", self.connection_mode.host(), self.bridge_port)
    }

    /// Whether the in-process simulation engine stands in for the aircraft.
    pub fn simulated(&self) -> bool {
        self.connection_mode == ConnectionMode::Simulation && !self.use_bridge
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Ignoring non-numeric {key}='{raw}', using {default}");
            default
        }),
        Err(_) => default,
    }
}
