//! # Limits & Reason Taxonomy
//!
//! The configuration record gating the courier channel and the closed set of
//! machine-readable disqualification codes.
//!
//! ## Reason Scopes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Reason Code Taxonomy                             │
//! │                                                                         │
//! │  CITY   CITY_NOT_SUPPORTED                                              │
//! │                                                                         │
//! │  LINE   MANUAL_BLOCK     BULKY_ITEM      HAZMAT_ITEM    FRAGILE_ITEM    │
//! │         MISSING_DIMENSIONS  ITEM_TOO_LARGE  ITEM_TOO_HEAVY              │
//! │         (whole line rejected, no quantity split)                        │
//! │                                                                         │
//! │  CART   CART_TOO_HEAVY   CART_TOO_LARGE  OVER_ITEM_COUNT                │
//! │         (shared bin full; line may be split)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Limits are read-only for the duration of one evaluation. A caller may pass
//! different limits on the next call (per-city overrides) without any state
//! carrying over.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::validation::{validate_limits, ValidationResult};
use crate::LIMIT_EPSILON;

/// `value` is above `max`, ignoring float drift.
#[inline]
pub(crate) fn exceeds(value: f64, max: f64) -> bool {
    value > max + LIMIT_EPSILON
}

// =============================================================================
// Reason Code
// =============================================================================

/// Why a line, or the whole cart, cannot use the courier channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    CityNotSupported,
    ItemTooHeavy,
    ItemTooLarge,
    CartTooHeavy,
    CartTooLarge,
    OverItemCount,
    BulkyItem,
    HazmatItem,
    FragileItem,
    MissingDimensions,
    ManualBlock,
}

/// Where a reason code originates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ReasonScope {
    City,
    Line,
    Cart,
}

impl ReasonCode {
    pub const ALL: [ReasonCode; 11] = [
        ReasonCode::CityNotSupported,
        ReasonCode::ItemTooHeavy,
        ReasonCode::ItemTooLarge,
        ReasonCode::CartTooHeavy,
        ReasonCode::CartTooLarge,
        ReasonCode::OverItemCount,
        ReasonCode::BulkyItem,
        ReasonCode::HazmatItem,
        ReasonCode::FragileItem,
        ReasonCode::MissingDimensions,
        ReasonCode::ManualBlock,
    ];

    /// Stable key used for localization lookups.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::CityNotSupported => "CITY_NOT_SUPPORTED",
            ReasonCode::ItemTooHeavy => "ITEM_TOO_HEAVY",
            ReasonCode::ItemTooLarge => "ITEM_TOO_LARGE",
            ReasonCode::CartTooHeavy => "CART_TOO_HEAVY",
            ReasonCode::CartTooLarge => "CART_TOO_LARGE",
            ReasonCode::OverItemCount => "OVER_ITEM_COUNT",
            ReasonCode::BulkyItem => "BULKY_ITEM",
            ReasonCode::HazmatItem => "HAZMAT_ITEM",
            ReasonCode::FragileItem => "FRAGILE_ITEM",
            ReasonCode::MissingDimensions => "MISSING_DIMENSIONS",
            ReasonCode::ManualBlock => "MANUAL_BLOCK",
        }
    }

    pub const fn scope(&self) -> ReasonScope {
        match self {
            ReasonCode::CityNotSupported => ReasonScope::City,
            ReasonCode::CartTooHeavy | ReasonCode::CartTooLarge | ReasonCode::OverItemCount => {
                ReasonScope::Cart
            }
            ReasonCode::ItemTooHeavy
            | ReasonCode::ItemTooLarge
            | ReasonCode::BulkyItem
            | ReasonCode::HazmatItem
            | ReasonCode::FragileItem
            | ReasonCode::MissingDimensions
            | ReasonCode::ManualBlock => ReasonScope::Line,
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Delivery Limits
// =============================================================================

/// Physical and policy limits of the courier channel.
///
/// ## Invariants
/// - every numeric limit is strictly positive
/// - `allowed_cities` is non-empty
///
/// Checked by [`DeliveryLimits::validate`] once at configuration load; the
/// engine itself never re-validates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryLimits {
    /// Cart-wide weight ceiling; also the ceiling for a single unit.
    pub max_weight_kg: f64,

    /// Cart-wide volume ceiling; also the ceiling for a single unit.
    pub max_volume_m3: f64,

    pub max_longest_side_cm: f64,

    /// Ceiling for each of the two shorter sides.
    pub max_single_side_cm: f64,

    /// Cart-wide unit count ceiling.
    pub max_items: u32,

    pub disallow_bulky: bool,
    pub disallow_hazmat: bool,
    pub disallow_fragile: bool,
    pub require_known_dimensions: bool,

    pub allowed_cities: BTreeSet<String>,
}

impl Default for DeliveryLimits {
    /// Tallinn-area courier defaults.
    fn default() -> Self {
        DeliveryLimits {
            max_weight_kg: 20.0,
            max_volume_m3: 0.06,
            max_longest_side_cm: 100.0,
            max_single_side_cm: 80.0,
            max_items: 12,
            disallow_bulky: true,
            disallow_hazmat: true,
            disallow_fragile: false,
            require_known_dimensions: false,
            allowed_cities: ["Tallinn", "Tartu", "Pärnu"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl DeliveryLimits {
    /// Whether `city` is served, ignoring surrounding whitespace and case.
    pub fn allows_city(&self, city: &str) -> bool {
        let wanted = normalize_city(city);
        !wanted.is_empty()
            && self
                .allowed_cities
                .iter()
                .any(|allowed| normalize_city(allowed) == wanted)
    }

    /// Checks the record's invariants.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_limits(self)
    }
}

/// Canonical form used for city comparisons.
pub fn normalize_city(city: &str) -> String {
    city.trim().to_lowercase()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ReasonCode::MissingDimensions).unwrap();
        assert_eq!(json, "\"MISSING_DIMENSIONS\"");
        for code in ReasonCode::ALL {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn test_reason_scopes() {
        assert_eq!(ReasonCode::CityNotSupported.scope(), ReasonScope::City);
        assert_eq!(ReasonCode::OverItemCount.scope(), ReasonScope::Cart);
        assert_eq!(ReasonCode::FragileItem.scope(), ReasonScope::Line);
    }

    #[test]
    fn test_allows_city_is_case_insensitive() {
        let limits = DeliveryLimits::default();
        assert!(limits.allows_city("Tallinn"));
        assert!(limits.allows_city("  tartu "));
        assert!(limits.allows_city("PÄRNU"));
        assert!(!limits.allows_city("Narva"));
        assert!(!limits.allows_city(""));
    }

    #[test]
    fn test_default_limits_are_valid() {
        assert!(DeliveryLimits::default().validate().is_ok());
    }

    #[test]
    fn test_exceeds_tolerates_drift() {
        assert!(!exceeds(0.01 * 3.0 + 0.03, 0.06));
        assert!(exceeds(0.0601, 0.06));
    }
}
