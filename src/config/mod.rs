//! Configuration module - environment variable parsing

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::game::player::DEFAULT_MAX_HP;
use crate::game::{PlayerStats, ZoneCatalog};
use crate::platform::{PermissionStatus, SimulationConfig};
use crate::util::time::DEFAULT_TICK_INTERVAL_MS;

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,

    /// Session tick period
    pub tick_interval: Duration,
    /// Run fixes through the position filter before scoring
    pub position_smoothing: bool,

    pub max_hp: f64,
    pub guard: f64,
    pub resonance: f64,

    /// Zone layout (static configuration data)
    pub zones: ZoneCatalog,

    /// Simulated location provider settings
    pub simulation: SimulationConfig,

    /// Stop the host after this long, runs until Ctrl+C when unset
    pub run_for: Option<Duration>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        let tick_ms: u64 = parse_or(&lookup, "TICK_INTERVAL_MS", DEFAULT_TICK_INTERVAL_MS)?;
        if tick_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "TICK_INTERVAL_MS",
                value: "0".to_string(),
            });
        }

        let max_hp: f64 = parse_or(&lookup, "MAX_HP", DEFAULT_MAX_HP)?;
        if !max_hp.is_finite() || max_hp <= 0.0 {
            return Err(ConfigError::Invalid {
                var: "MAX_HP",
                value: max_hp.to_string(),
            });
        }

        let guard: f64 = parse_or(&lookup, "PLAYER_GUARD", 0.0)?;
        if !guard.is_finite() || guard < 0.0 {
            return Err(ConfigError::Invalid {
                var: "PLAYER_GUARD",
                value: guard.to_string(),
            });
        }

        let zones = match lookup("ZONES_JSON") {
            Some(json) => ZoneCatalog::from_json(&json).map_err(ConfigError::Zones)?,
            None => ZoneCatalog::demo(),
        };

        let permission = match lookup("SIM_PERMISSION").as_deref() {
            None | Some("granted") => PermissionStatus::Granted,
            Some("denied") => PermissionStatus::Denied,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "SIM_PERMISSION",
                    value: other.to_string(),
                })
            }
        };

        let defaults = SimulationConfig::default();
        let start = zones
            .hazards
            .first()
            .map(|zone| zone.center)
            .unwrap_or(defaults.start);
        let simulation = SimulationConfig {
            seed: parse_or(&lookup, "SIM_SEED", defaults.seed)?,
            start,
            fix_interval: Duration::from_millis(parse_or(
                &lookup,
                "SIM_FIX_INTERVAL_MS",
                defaults.fix_interval.as_millis() as u64,
            )?),
            noise_m: parse_or(&lookup, "SIM_GPS_NOISE_M", defaults.noise_m)?,
            permission,
            haptics: parse_or(&lookup, "SIM_HAPTICS", defaults.haptics)?,
            ..defaults
        };

        let run_for = lookup("RUN_SECONDS")
            .map(|raw| {
                raw.parse::<u64>().map_err(|_| ConfigError::Invalid {
                    var: "RUN_SECONDS",
                    value: raw,
                })
            })
            .transpose()?
            .map(Duration::from_secs);

        Ok(Self {
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_format,
            tick_interval: Duration::from_millis(tick_ms),
            position_smoothing: parse_or(&lookup, "POSITION_SMOOTHING", true)?,
            max_hp,
            guard,
            resonance: parse_or(&lookup, "PLAYER_RESONANCE", 0.0)?,
            zones,
            simulation,
            run_for,
        })
    }

    /// Fresh player stats for a new session
    pub fn player_stats(&self) -> PlayerStats {
        PlayerStats::new(self.max_hp, self.guard, self.resonance)
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("Invalid ZONES_JSON: {0}")]
    Zones(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Coordinate;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert!(config.position_smoothing);
        assert_eq!(config.max_hp, 100.0);
        assert_eq!(config.zones, ZoneCatalog::demo());
        assert_eq!(config.simulation.permission, PermissionStatus::Granted);
        assert!(config.run_for.is_none());
        assert!(config.simulation.haptics);
        assert_eq!(config.player_stats().hp, 100.0);
    }

    #[test]
    fn reads_overrides() {
        let config = load(&[
            ("LOG_FORMAT", "json"),
            ("TICK_INTERVAL_MS", "250"),
            ("POSITION_SMOOTHING", "false"),
            ("MAX_HP", "150"),
            ("PLAYER_GUARD", "2.5"),
            ("SIM_SEED", "7"),
            ("SIM_PERMISSION", "denied"),
            ("RUN_SECONDS", "30"),
            ("SIM_HAPTICS", "false"),
        ])
        .unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.tick_interval, Duration::from_millis(250));
        assert!(!config.position_smoothing);
        assert_eq!(config.player_stats().max_hp, 150.0);
        assert_eq!(config.player_stats().guard, 2.5);
        assert_eq!(config.simulation.seed, 7);
        assert_eq!(config.simulation.permission, PermissionStatus::Denied);
        assert_eq!(config.run_for, Some(Duration::from_secs(30)));
        assert!(!config.simulation.haptics);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            load(&[("TICK_INTERVAL_MS", "0")]),
            Err(ConfigError::Invalid { var: "TICK_INTERVAL_MS", .. })
        ));
        assert!(matches!(
            load(&[("MAX_HP", "-3")]),
            Err(ConfigError::Invalid { var: "MAX_HP", .. })
        ));
        assert!(matches!(
            load(&[("POSITION_SMOOTHING", "sometimes")]),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            load(&[("ZONES_JSON", "[")]),
            Err(ConfigError::Zones(_))
        ));
        assert!(matches!(
            load(&[("LOG_FORMAT", "xml")]),
            Err(ConfigError::Invalid { var: "LOG_FORMAT", .. })
        ));
    }

    #[test]
    fn zones_json_moves_simulation_start() {
        let config = load(&[(
            "ZONES_JSON",
            r#"{"hazards":[{"id":"a","name":"A","center":{"latitude":1.5,"longitude":2.5},
                "profile":{"source_radius":0,"safe_radius":10,"base_damage":1,"scale":1,"offset":1}}]}"#,
        )])
        .unwrap();
        assert_eq!(config.zones.hazards.len(), 1);
        assert_eq!(config.simulation.start, Coordinate::new(1.5, 2.5));
    }
}
