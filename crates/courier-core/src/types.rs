//! # Domain Types
//!
//! Cart-side types consumed and produced by the eligibility engine.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    CartLine     │   │  DeliveryClass  │   │     Totals      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id, name       │   │  Small          │   │  weight_kg      │       │
//! │  │  quantity       │   │  Medium         │   │  volume_m3      │       │
//! │  │  weight/volume  │   │  Heavy          │   │  item_count     │       │
//! │  │  L × W × H      │   │  Oversize       │   │                 │       │
//! │  │  flags          │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Immutable Lines
//! A `CartLine` is a value. Splitting a line or proposing a new quantity
//! produces a new line via [`CartLine::with_quantity`]; nothing here mutates a
//! caller's cart.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::limits::{exceeds, DeliveryLimits, ReasonCode};
use crate::{DEFAULT_UNIT_VOLUME_M3, DEFAULT_UNIT_WEIGHT_KG};

// =============================================================================
// Delivery Class
// =============================================================================

/// Catalog size class of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryClass {
    Small,
    Medium,
    /// Treated as bulky by the courier channel.
    Heavy,
    /// Treated as bulky by the courier channel.
    Oversize,
}

impl DeliveryClass {
    /// Whether this class counts as bulky for `disallow_bulky`.
    pub const fn is_bulky(&self) -> bool {
        matches!(self, DeliveryClass::Heavy | DeliveryClass::Oversize)
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// One catalog line of a cart snapshot.
///
/// Physical attributes are optional; missing values are not errors. They turn
/// into `MISSING_DIMENSIONS` when the limits demand known dimensions, and into
/// defaults when totals are summed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Opaque line identifier supplied by the cart store.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Number of units (positive).
    pub quantity: u32,

    /// Weight of one unit in kilograms.
    #[serde(default)]
    pub weight_kg: Option<f64>,

    /// Volume of one unit in cubic metres.
    #[serde(default)]
    pub volume_m3: Option<f64>,

    #[serde(default)]
    pub length_cm: Option<f64>,

    #[serde(default)]
    pub width_cm: Option<f64>,

    #[serde(default)]
    pub height_cm: Option<f64>,

    #[serde(default)]
    pub bulky: bool,

    #[serde(default)]
    pub fragile: bool,

    #[serde(default)]
    pub hazmat: bool,

    /// Explicit back-office override keeping the line off the courier channel.
    #[serde(default)]
    pub manual_delivery_block: bool,

    #[serde(default)]
    pub delivery_class: Option<DeliveryClass>,
}

impl CartLine {
    /// Creates a line with no physical attributes and no flags.
    pub fn new(id: impl Into<String>, name: impl Into<String>, quantity: u32) -> Self {
        CartLine {
            id: id.into(),
            name: name.into(),
            quantity,
            weight_kg: None,
            volume_m3: None,
            length_cm: None,
            width_cm: None,
            height_cm: None,
            bulky: false,
            fragile: false,
            hazmat: false,
            manual_delivery_block: false,
            delivery_class: None,
        }
    }

    pub fn with_weight_kg(mut self, weight_kg: f64) -> Self {
        self.weight_kg = Some(weight_kg);
        self
    }

    pub fn with_volume_m3(mut self, volume_m3: f64) -> Self {
        self.volume_m3 = Some(volume_m3);
        self
    }

    pub fn with_dimensions_cm(mut self, length: f64, width: f64, height: f64) -> Self {
        self.length_cm = Some(length);
        self.width_cm = Some(width);
        self.height_cm = Some(height);
        self
    }

    pub fn with_bulky(mut self, bulky: bool) -> Self {
        self.bulky = bulky;
        self
    }

    pub fn with_fragile(mut self, fragile: bool) -> Self {
        self.fragile = fragile;
        self
    }

    pub fn with_hazmat(mut self, hazmat: bool) -> Self {
        self.hazmat = hazmat;
        self
    }

    pub fn with_manual_block(mut self, blocked: bool) -> Self {
        self.manual_delivery_block = blocked;
        self
    }

    pub fn with_class(mut self, class: DeliveryClass) -> Self {
        self.delivery_class = Some(class);
        self
    }

    /// Returns a copy of this line carrying `quantity` units.
    pub fn with_quantity(&self, quantity: u32) -> Self {
        CartLine {
            quantity,
            ..self.clone()
        }
    }

    /// Unit weight used for aggregation (defaults when unknown).
    #[inline]
    pub fn unit_weight_kg(&self) -> f64 {
        self.weight_kg.unwrap_or(DEFAULT_UNIT_WEIGHT_KG)
    }

    /// Unit volume used for aggregation (defaults when unknown).
    #[inline]
    pub fn unit_volume_m3(&self) -> f64 {
        self.volume_m3.unwrap_or(DEFAULT_UNIT_VOLUME_M3)
    }

    /// Flag or size class marks this line as bulky.
    pub fn is_bulky(&self) -> bool {
        self.bulky || self.delivery_class.is_some_and(|c| c.is_bulky())
    }

    /// Weight and all three sides are known.
    pub fn has_known_dimensions(&self) -> bool {
        self.weight_kg.is_some()
            && self.length_cm.is_some()
            && self.width_cm.is_some()
            && self.height_cm.is_some()
    }

    /// Known side lengths, longest first.
    pub fn sides_desc_cm(&self) -> Vec<f64> {
        let mut sides: Vec<f64> = [self.length_cm, self.width_cm, self.height_cm]
            .into_iter()
            .flatten()
            .collect();
        sides.sort_by(|a, b| b.total_cmp(a));
        sides
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Aggregate weight, volume and unit count of a set of lines.
///
/// The one summary shape used for the eligible bucket, the remainder, the
/// whole cart, the splitter's running bin, and suggestion before/after.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub weight_kg: f64,
    pub volume_m3: f64,
    pub item_count: u32,
}

impl Totals {
    #[inline]
    pub const fn zero() -> Self {
        Totals {
            weight_kg: 0.0,
            volume_m3: 0.0,
            item_count: 0,
        }
    }

    /// Sums every unit of every line.
    pub fn of<'a>(lines: impl IntoIterator<Item = &'a CartLine>) -> Self {
        lines
            .into_iter()
            .fold(Totals::zero(), |totals, line| totals.with_units(line, line.quantity))
    }

    /// Returns these totals with `units` more units of `line` added.
    pub fn with_units(self, line: &CartLine, units: u32) -> Self {
        Totals {
            weight_kg: self.weight_kg + line.unit_weight_kg() * f64::from(units),
            volume_m3: self.volume_m3 + line.unit_volume_m3() * f64::from(units),
            item_count: self.item_count.saturating_add(units),
        }
    }

    /// Cart-level limits these totals break, in weight, volume, count order.
    pub fn breaches(&self, limits: &DeliveryLimits) -> Vec<ReasonCode> {
        [
            (
                exceeds(self.weight_kg, limits.max_weight_kg),
                ReasonCode::CartTooHeavy,
            ),
            (
                exceeds(self.volume_m3, limits.max_volume_m3),
                ReasonCode::CartTooLarge,
            ),
            (
                self.item_count > limits.max_items,
                ReasonCode::OverItemCount,
            ),
        ]
        .into_iter()
        .filter_map(|(hit, code)| hit.then_some(code))
        .collect()
    }

    /// All three totals are within the cart limits.
    pub fn fits(&self, limits: &DeliveryLimits) -> bool {
        self.breaches(limits).is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
