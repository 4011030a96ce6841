//! # Courier Configuration
//!
//! Limits for the courier channel, with optional per-city overrides.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     COURIER_MAX_WEIGHT_KG=25                                           │
//! │     COURIER_ALLOWED_CITIES=Tallinn,Tartu                               │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/courier-eligibility/courier.toml (Linux)                 │
//! │     ~/Library/Application Support/com.courier.eligibility/... (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     DeliveryLimits::default()                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [limits]
//! max_weight_kg = 20.0
//! max_volume_m3 = 0.06
//! max_longest_side_cm = 100.0
//! max_single_side_cm = 80.0
//! max_items = 12
//! disallow_bulky = true
//! disallow_hazmat = true
//! disallow_fragile = false
//! require_known_dimensions = false
//! allowed_cities = ["Tallinn", "Tartu", "Pärnu"]
//!
//! [checker]
//! over_capacity = "block"  # block | keep_partial
//!
//! # Per-city overrides: only the listed fields change
//! [cities.tartu]
//! max_weight_kg = 15.0
//! disallow_fragile = true
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use courier_core::limits::normalize_city;
use courier_core::{DeliveryLimits, OverCapacityPolicy};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Environment Keys
// =============================================================================

pub const ENV_MAX_WEIGHT_KG: &str = "COURIER_MAX_WEIGHT_KG";
pub const ENV_MAX_VOLUME_M3: &str = "COURIER_MAX_VOLUME_M3";
pub const ENV_MAX_ITEMS: &str = "COURIER_MAX_ITEMS";
pub const ENV_MAX_LONGEST_SIDE_CM: &str = "COURIER_MAX_LONGEST_SIDE_CM";
pub const ENV_MAX_SINGLE_SIDE_CM: &str = "COURIER_MAX_SINGLE_SIDE_CM";
pub const ENV_DISALLOW_BULKY: &str = "COURIER_DISALLOW_BULKY";
pub const ENV_DISALLOW_HAZMAT: &str = "COURIER_DISALLOW_HAZMAT";
pub const ENV_DISALLOW_FRAGILE: &str = "COURIER_DISALLOW_FRAGILE";
pub const ENV_REQUIRE_KNOWN_DIMENSIONS: &str = "COURIER_REQUIRE_KNOWN_DIMENSIONS";
pub const ENV_ALLOWED_CITIES: &str = "COURIER_ALLOWED_CITIES";
pub const ENV_OVER_CAPACITY: &str = "COURIER_OVER_CAPACITY";

// =============================================================================
// Limits Settings
// =============================================================================

/// The `[limits]` section. Missing keys fall back to the engine defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsSettings {
    pub max_weight_kg: f64,
    pub max_volume_m3: f64,
    pub max_longest_side_cm: f64,
    pub max_single_side_cm: f64,
    pub max_items: u32,
    pub disallow_bulky: bool,
    pub disallow_hazmat: bool,
    pub disallow_fragile: bool,
    pub require_known_dimensions: bool,
    pub allowed_cities: Vec<String>,
}

impl Default for LimitsSettings {
    fn default() -> Self {
        LimitsSettings::from(DeliveryLimits::default())
    }
}

impl From<DeliveryLimits> for LimitsSettings {
    fn from(limits: DeliveryLimits) -> Self {
        LimitsSettings {
            max_weight_kg: limits.max_weight_kg,
            max_volume_m3: limits.max_volume_m3,
            max_longest_side_cm: limits.max_longest_side_cm,
            max_single_side_cm: limits.max_single_side_cm,
            max_items: limits.max_items,
            disallow_bulky: limits.disallow_bulky,
            disallow_hazmat: limits.disallow_hazmat,
            disallow_fragile: limits.disallow_fragile,
            require_known_dimensions: limits.require_known_dimensions,
            allowed_cities: limits.allowed_cities.into_iter().collect(),
        }
    }
}

impl From<&LimitsSettings> for DeliveryLimits {
    fn from(settings: &LimitsSettings) -> Self {
        DeliveryLimits {
            max_weight_kg: settings.max_weight_kg,
            max_volume_m3: settings.max_volume_m3,
            max_longest_side_cm: settings.max_longest_side_cm,
            max_single_side_cm: settings.max_single_side_cm,
            max_items: settings.max_items,
            disallow_bulky: settings.disallow_bulky,
            disallow_hazmat: settings.disallow_hazmat,
            disallow_fragile: settings.disallow_fragile,
            require_known_dimensions: settings.require_known_dimensions,
            allowed_cities: settings
                .allowed_cities
                .iter()
                .map(|city| city.trim().to_string())
                .filter(|city| !city.is_empty())
                .collect(),
        }
    }
}

// =============================================================================
// Per-City Overrides
// =============================================================================

/// A `[cities.<name>]` section. Unset fields keep the base value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_weight_kg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_volume_m3: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_longest_side_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_single_side_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disallow_bulky: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disallow_hazmat: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disallow_fragile: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_known_dimensions: Option<bool>,
}

impl LimitsOverride {
    /// Returns `base` with every set field replaced.
    pub fn apply_to(&self, base: &DeliveryLimits) -> DeliveryLimits {
        DeliveryLimits {
            max_weight_kg: self.max_weight_kg.unwrap_or(base.max_weight_kg),
            max_volume_m3: self.max_volume_m3.unwrap_or(base.max_volume_m3),
            max_longest_side_cm: self.max_longest_side_cm.unwrap_or(base.max_longest_side_cm),
            max_single_side_cm: self.max_single_side_cm.unwrap_or(base.max_single_side_cm),
            max_items: self.max_items.unwrap_or(base.max_items),
            disallow_bulky: self.disallow_bulky.unwrap_or(base.disallow_bulky),
            disallow_hazmat: self.disallow_hazmat.unwrap_or(base.disallow_hazmat),
            disallow_fragile: self.disallow_fragile.unwrap_or(base.disallow_fragile),
            require_known_dimensions: self
                .require_known_dimensions
                .unwrap_or(base.require_known_dimensions),
            allowed_cities: base.allowed_cities.clone(),
        }
    }
}

// =============================================================================
// Checker Settings
// =============================================================================

/// The `[checker]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerSettings {
    /// Whether a globally over-limit cart may still be offered as partial.
    pub over_capacity: OverCapacityPolicy,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete courier configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourierConfig {
    #[serde(default)]
    pub limits: LimitsSettings,

    #[serde(default)]
    pub checker: CheckerSettings,

    /// Per-city overrides keyed by city name (matched case-insensitively).
    #[serde(default)]
    pub cities: BTreeMap<String, LimitsOverride>,
}

impl CourierConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults, then
    /// validates it.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (courier.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// Like [`CourierConfig::load`], reading overrides through `lookup`
    /// instead of the process environment.
    pub fn load_with<F>(config_path: Option<PathBuf>, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading courier config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides_from(lookup)?;
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load courier config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a TOML file without applying overrides or validating.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoConfigPath)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Courier config saved");
        Ok(())
    }

    /// Validates the base limits and every city's resolved limits.
    pub fn validate(&self) -> ConfigResult<()> {
        let base = self.base_limits();
        base.validate().map_err(|source| ConfigError::InvalidLimits {
            scope: "base".to_string(),
            source,
        })?;

        for (city, city_override) in &self.cities {
            city_override
                .apply_to(&base)
                .validate()
                .map_err(|source| ConfigError::InvalidLimits {
                    scope: format!("city '{}'", city),
                    source,
                })?;

            if !base.allows_city(city) {
                warn!(city = %city, "Override configured for a city the courier does not serve");
            }
        }

        Ok(())
    }

    /// Applies `COURIER_*` overrides, reading each key through `lookup`.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let limits = &mut self.limits;

        if let Some(kg) = read_value::<_, f64>(&lookup, ENV_MAX_WEIGHT_KG)? {
            debug!(max_weight_kg = kg, "Overriding max weight from environment");
            limits.max_weight_kg = kg;
        }
        if let Some(m3) = read_value::<_, f64>(&lookup, ENV_MAX_VOLUME_M3)? {
            limits.max_volume_m3 = m3;
        }
        if let Some(items) = read_value::<_, u32>(&lookup, ENV_MAX_ITEMS)? {
            limits.max_items = items;
        }
        if let Some(cm) = read_value::<_, f64>(&lookup, ENV_MAX_LONGEST_SIDE_CM)? {
            limits.max_longest_side_cm = cm;
        }
        if let Some(cm) = read_value::<_, f64>(&lookup, ENV_MAX_SINGLE_SIDE_CM)? {
            limits.max_single_side_cm = cm;
        }
        if let Some(flag) = read_flag(&lookup, ENV_DISALLOW_BULKY)? {
            limits.disallow_bulky = flag;
        }
        if let Some(flag) = read_flag(&lookup, ENV_DISALLOW_HAZMAT)? {
            limits.disallow_hazmat = flag;
        }
        if let Some(flag) = read_flag(&lookup, ENV_DISALLOW_FRAGILE)? {
            limits.disallow_fragile = flag;
        }
        if let Some(flag) = read_flag(&lookup, ENV_REQUIRE_KNOWN_DIMENSIONS)? {
            limits.require_known_dimensions = flag;
        }
        if let Some(cities) = lookup(ENV_ALLOWED_CITIES) {
            debug!(cities = %cities, "Overriding allowed cities from environment");
            limits.allowed_cities = cities
                .split(',')
                .map(str::trim)
                .filter(|city| !city.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(policy) = lookup(ENV_OVER_CAPACITY) {
            self.checker.over_capacity = match policy.trim().to_lowercase().as_str() {
                "block" => OverCapacityPolicy::Block,
                "keep_partial" | "partial" => OverCapacityPolicy::KeepPartial,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_OVER_CAPACITY.to_string(),
                        value: policy,
                    })
                }
            };
        }

        Ok(())
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "courier", "eligibility")
            .map(|dirs| dirs.config_dir().join("courier.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Limits with no city override applied.
    pub fn base_limits(&self) -> DeliveryLimits {
        DeliveryLimits::from(&self.limits)
    }

    /// Limits to evaluate a cart bound for `city`.
    pub fn limits_for_city(&self, city: &str) -> DeliveryLimits {
        let base = self.base_limits();
        let wanted = normalize_city(city);
        match self
            .cities
            .iter()
            .find(|(name, _)| normalize_city(name) == wanted)
        {
            Some((name, city_override)) => {
                debug!(city = %name, "Applying per-city limits override");
                city_override.apply_to(&base)
            }
            None => base,
        }
    }

    pub fn over_capacity(&self) -> OverCapacityPolicy {
        self.checker.over_capacity
    }
}

/// Reads and parses one override, `None` when unset.
fn read_value<F, T>(lookup: &F, key: &str) -> ConfigResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .map(|value| {
            value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            })
        })
        .transpose()
}

fn read_flag<F>(lookup: &F, key: &str) -> ConfigResult<Option<bool>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = CourierConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.base_limits(), DeliveryLimits::default());
        assert_eq!(config.over_capacity(), OverCapacityPolicy::Block);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: CourierConfig = toml::from_str(
            r#"
            [limits]
            max_weight_kg = 25.0
            allowed_cities = ["Riga"]
            "#,
        )
        .unwrap();

        let limits = config.base_limits();
        assert_eq!(limits.max_weight_kg, 25.0);
        assert_eq!(limits.max_items, 12);
        assert!(limits.allows_city("riga"));
        assert!(!limits.allows_city("Tallinn"));
    }

    #[test]
    fn test_city_override() {
        let config: CourierConfig = toml::from_str(
            r#"
            [checker]
            over_capacity = "keep_partial"

            [cities.Tartu]
            max_weight_kg = 15.0
            disallow_fragile = true
            "#,
        )
        .unwrap();

        let tartu = config.limits_for_city("tartu");
        assert_eq!(tartu.max_weight_kg, 15.0);
        assert!(tartu.disallow_fragile);
        assert_eq!(tartu.max_items, 12);

        let tallinn = config.limits_for_city("Tallinn");
        assert_eq!(tallinn.max_weight_kg, 20.0);
        assert_eq!(config.over_capacity(), OverCapacityPolicy::KeepPartial);
    }

    #[test]
    fn test_validation_rejects_bad_override() {
        let mut config = CourierConfig::default();
        config.cities.insert(
            "Tartu".to_string(),
            LimitsOverride {
                max_items: Some(0),
                ..LimitsOverride::default()
            },
        );
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLimits { ref scope, .. } if scope == "city 'Tartu'"));
    }

    #[test]
    fn test_validation_rejects_empty_city_list() {
        let mut config = CourierConfig::default();
        config.limits.allowed_cities = vec!["  ".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = CourierConfig::default();
        config
            .apply_overrides_from(env(&[
                (ENV_MAX_WEIGHT_KG, "30"),
                (ENV_MAX_ITEMS, " 20 "),
                (ENV_DISALLOW_FRAGILE, "yes"),
                (ENV_ALLOWED_CITIES, "Tallinn, Narva ,"),
                (ENV_OVER_CAPACITY, "keep_partial"),
            ]))
            .unwrap();

        let limits = config.base_limits();
        assert_eq!(limits.max_weight_kg, 30.0);
        assert_eq!(limits.max_items, 20);
        assert!(limits.disallow_fragile);
        assert_eq!(limits.allowed_cities.len(), 2);
        assert!(limits.allows_city("Narva"));
        assert_eq!(config.over_capacity(), OverCapacityPolicy::KeepPartial);
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let mut config = CourierConfig::default();
        let err = config
            .apply_overrides_from(env(&[(ENV_MAX_ITEMS, "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == ENV_MAX_ITEMS));

        let err = config
            .apply_overrides_from(env(&[(ENV_DISALLOW_BULKY, "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("courier.toml");

        let mut config = CourierConfig::default();
        config.limits.max_weight_kg = 18.5;
        config.cities.insert(
            "Pärnu".to_string(),
            LimitsOverride {
                require_known_dimensions: Some(true),
                ..LimitsOverride::default()
            },
        );
        config.save(Some(path.clone())).unwrap();

        let loaded = CourierConfig::load_with(Some(path), |_| None).unwrap();
        assert_eq!(loaded, config);
        assert!(loaded.limits_for_city("PÄRNU").require_known_dimensions);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courier.toml");
        std::fs::write(&path, "[limits]\nmax_volume_m3 = -1.0\n").unwrap();

        let err = CourierConfig::load_with(Some(path), |_| None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLimits { .. }));
    }

    #[test]
    fn test_load_or_default_falls_back_on_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courier.toml");
        std::fs::write(&path, "[limits\nmax_items = ").unwrap();

        let config = CourierConfig::load_or_default(Some(path));
        assert_eq!(config.base_limits().max_items, DeliveryLimits::default().max_items);
        assert_eq!(config.over_capacity(), OverCapacityPolicy::Block);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = CourierConfig::load_with(Some(path), |_| None).unwrap();
        assert_eq!(config, CourierConfig::default());
    }
}
