//! # courier-config: Limits Configuration for the Courier Channel
//!
//! Loads [`courier_core::DeliveryLimits`] from a TOML file and `COURIER_*`
//! environment variables, with optional per-city overrides, and validates the
//! result once at load time.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  courier.toml ──┐                                                       │
//! │                 ├──► CourierConfig ──validate()──► limits_for_city()    │
//! │  COURIER_* ─────┘                                      │                │
//! │                                                        ▼                │
//! │                                        courier_core::check_eligibility  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use courier_config::CourierConfig;
//!
//! let config = CourierConfig::default();
//! let limits = config.limits_for_city("Tallinn");
//! assert_eq!(limits.max_items, 12);
//! ```

pub mod config;
pub mod error;

pub use config::{CheckerSettings, CourierConfig, LimitsOverride, LimitsSettings};
pub use error::{ConfigError, ConfigResult};
