//! # Smart Suggestions
//!
//! Finds the one single-line edit to offer behind a "fix my cart" button.
//!
//! ## Strategy Precedence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  #  Trigger                       Edit                                  │
//! │  ── ───────────────────────────── ───────────────────────────────────   │
//! │  1  bulky line, bulky disallowed  RELOCATE_LINE                         │
//! │  2  hazmat line, hazmat disallowed RELOCATE_LINE                        │
//! │  3  cart weight over max          REDUCE_QUANTITY / REMOVE_LINE         │
//! │     (heaviest line by unit × qty, remove ceil(overage / unit))          │
//! │  4  cart volume over max          same, by volume                       │
//! │  5  item count over max           trim the physically smallest line     │
//! │  -  anything else                 no suggestion                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The first matching strategy wins even when a later one would also apply.
//! City and missing-dimension failures have no single-line numeric remedy.

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::limits::{exceeds, DeliveryLimits, ReasonCode};
use crate::types::{CartLine, Totals};
use crate::LIMIT_EPSILON;

// =============================================================================
// Suggestion Types
// =============================================================================

/// The edit a suggestion proposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuggestionAction {
    /// Keep the line with fewer units.
    ReduceQuantity {
        #[serde(rename = "lineId")]
        line_id: String,
        from: u32,
        to: u32,
    },
    /// Drop the line from the cart.
    RemoveLine {
        #[serde(rename = "lineId")]
        line_id: String,
    },
    /// Ship the line by another method, outside the courier channel.
    RelocateLine {
        #[serde(rename = "lineId")]
        line_id: String,
    },
}

impl SuggestionAction {
    pub fn line_id(&self) -> &str {
        match self {
            SuggestionAction::ReduceQuantity { line_id, .. }
            | SuggestionAction::RemoveLine { line_id }
            | SuggestionAction::RelocateLine { line_id } => line_id,
        }
    }

    /// The courier cart after this edit, as a new vector.
    ///
    /// Removing and relocating both take the line out of the courier cart.
    pub fn apply(&self, lines: &[CartLine]) -> Vec<CartLine> {
        match self {
            SuggestionAction::ReduceQuantity { line_id, to, .. } => lines
                .iter()
                .map(|line| {
                    if &line.id == line_id {
                        line.with_quantity(*to)
                    } else {
                        line.clone()
                    }
                })
                .collect(),
            SuggestionAction::RemoveLine { line_id }
            | SuggestionAction::RelocateLine { line_id } => lines
                .iter()
                .filter(|line| &line.id != line_id)
                .cloned()
                .collect(),
        }
    }
}

/// One proposed edit with the totals before and after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SmartSuggestion {
    pub action: SuggestionAction,
    /// The failure this edit addresses.
    pub reason: ReasonCode,
    pub before: Totals,
    pub after: Totals,
}

impl SmartSuggestion {
    pub fn line_id(&self) -> &str {
        self.action.line_id()
    }

    /// Shorthand for `self.action.apply(lines)`.
    pub fn apply(&self, lines: &[CartLine]) -> Vec<CartLine> {
        self.action.apply(lines)
    }
}

// =============================================================================
// Strategies
// =============================================================================

type Strategy = fn(&[CartLine], &DeliveryLimits, &Totals) -> Option<(SuggestionAction, ReasonCode)>;

/// Tried in order; the first `Some` wins.
const STRATEGIES: [Strategy; 5] = [
    relocate_bulky,
    relocate_hazmat,
    reduce_for_weight,
    reduce_for_volume,
    reduce_for_item_count,
];

fn relocate_bulky(
    lines: &[CartLine],
    limits: &DeliveryLimits,
    _totals: &Totals,
) -> Option<(SuggestionAction, ReasonCode)> {
    if !limits.disallow_bulky {
        return None;
    }
    let line = lines.iter().find(|line| line.is_bulky())?;
    Some((
        SuggestionAction::RelocateLine {
            line_id: line.id.clone(),
        },
        ReasonCode::BulkyItem,
    ))
}

fn relocate_hazmat(
    lines: &[CartLine],
    limits: &DeliveryLimits,
    _totals: &Totals,
) -> Option<(SuggestionAction, ReasonCode)> {
    if !limits.disallow_hazmat {
        return None;
    }
    let line = lines.iter().find(|line| line.hazmat)?;
    Some((
        SuggestionAction::RelocateLine {
            line_id: line.id.clone(),
        },
        ReasonCode::HazmatItem,
    ))
}

fn reduce_for_weight(
    lines: &[CartLine],
    limits: &DeliveryLimits,
    totals: &Totals,
) -> Option<(SuggestionAction, ReasonCode)> {
    if !exceeds(totals.weight_kg, limits.max_weight_kg) {
        return None;
    }
    let overage = totals.weight_kg - limits.max_weight_kg;
    let action = trim_largest_contributor(lines, overage, CartLine::unit_weight_kg)?;
    Some((action, ReasonCode::CartTooHeavy))
}

fn reduce_for_volume(
    lines: &[CartLine],
    limits: &DeliveryLimits,
    totals: &Totals,
) -> Option<(SuggestionAction, ReasonCode)> {
    if !exceeds(totals.volume_m3, limits.max_volume_m3) {
        return None;
    }
    let overage = totals.volume_m3 - limits.max_volume_m3;
    let action = trim_largest_contributor(lines, overage, CartLine::unit_volume_m3)?;
    Some((action, ReasonCode::CartTooLarge))
}

fn reduce_for_item_count(
    lines: &[CartLine],
    limits: &DeliveryLimits,
    totals: &Totals,
) -> Option<(SuggestionAction, ReasonCode)> {
    if totals.item_count <= limits.max_items {
        return None;
    }
    let overage = totals.item_count - limits.max_items;

    // Smallest footprint first; earliest line wins ties
    let score = |line: &CartLine| line.unit_weight_kg() + 1000.0 * line.unit_volume_m3();
    let line = lines
        .iter()
        .filter(|line| line.quantity > 0)
        .reduce(|best, line| if score(line) < score(best) { line } else { best })?;

    Some((reduce_or_remove(line, overage), ReasonCode::OverItemCount))
}

/// Picks the line contributing most of `unit × quantity` and removes just
/// enough units to cover `overage`.
fn trim_largest_contributor(
    lines: &[CartLine],
    overage: f64,
    unit: fn(&CartLine) -> f64,
) -> Option<SuggestionAction> {
    let contribution = |line: &CartLine| unit(line) * f64::from(line.quantity);
    let line = lines
        .iter()
        .filter(|line| line.quantity > 0 && unit(line) > 0.0)
        .reduce(|best, line| {
            if contribution(line) > contribution(best) {
                line
            } else {
                best
            }
        })?;

    // Drift guard: 0.1 / 0.01 must not round up to 11 units
    // The tolerance applies to the overage itself, matching `exceeds`
    let units = ((overage - LIMIT_EPSILON) / unit(line)).ceil().max(1.0);
    let units = if units >= f64::from(line.quantity) {
        line.quantity
    } else {
        units as u32
    };
    Some(reduce_or_remove(line, units))
}

fn reduce_or_remove(line: &CartLine, units: u32) -> SuggestionAction {
    if units < line.quantity {
        SuggestionAction::ReduceQuantity {
            line_id: line.id.clone(),
            from: line.quantity,
            to: line.quantity - units,
        }
    } else {
        SuggestionAction::RemoveLine {
            line_id: line.id.clone(),
        }
    }
}

// =============================================================================
// Generator
// =============================================================================

/// Proposes the first applicable single-line fix, or `None`.
///
/// The input cart is not touched; `after` is computed on a hypothetical copy
/// with the edit applied.
pub fn smart_suggestion(lines: &[CartLine], limits: &DeliveryLimits) -> Option<SmartSuggestion> {
    let before = Totals::of(lines);
    let (action, reason) = STRATEGIES
        .iter()
        .find_map(|strategy| strategy(lines, limits, &before))?;
    let after = Totals::of(&action.apply(lines));

    debug!(
        reason = %reason,
        line_id = action.line_id(),
        before_kg = before.weight_kg,
        after_kg = after.weight_kg,
        "smart suggestion"
    );

    Some(SmartSuggestion {
        action,
        reason,
        before,
        after,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parcel(id: &str, kg: f64, qty: u32) -> CartLine {
        CartLine::new(id, id, qty).with_weight_kg(kg).with_volume_m3(0.001)
    }

    #[test]
    fn test_nothing_to_fix() {
        let cart = [parcel("a", 1.0, 2)];
        assert!(smart_suggestion(&cart, &DeliveryLimits::default()).is_none());
    }

    #[test]
    fn test_bulky_beats_weight() {
        let cart = [parcel("a", 15.0, 2), parcel("sofa", 3.0, 1).with_bulky(true)];
        let suggestion = smart_suggestion(&cart, &DeliveryLimits::default()).unwrap();

        assert_eq!(
            suggestion.action,
            SuggestionAction::RelocateLine {
                line_id: "sofa".to_string()
            }
        );
        assert_eq!(suggestion.reason, ReasonCode::BulkyItem);
        assert!((suggestion.after.weight_kg - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_bulky_ignored_when_allowed() {
        let limits = DeliveryLimits {
            disallow_bulky: false,
            ..DeliveryLimits::default()
        };
        let cart = [parcel("sofa", 3.0, 1).with_bulky(true), parcel("gas", 1.0, 1).with_hazmat(true)];
        let suggestion = smart_suggestion(&cart, &limits).unwrap();
        assert_eq!(suggestion.reason, ReasonCode::HazmatItem);
        assert_eq!(suggestion.line_id(), "gas");
    }

    #[test]
    fn test_weight_overage_reduces_heaviest_contributor() {
        // a contributes 12kg, b 14kg; 6kg over
        let cart = [parcel("a", 4.0, 3), parcel("b", 7.0, 2)];
        let suggestion = smart_suggestion(&cart, &DeliveryLimits::default()).unwrap();
        assert_eq!(
            suggestion.action,
            SuggestionAction::ReduceQuantity {
                line_id: "b".to_string(),
                from: 2,
                to: 1
            }
        );
        assert!((suggestion.after.weight_kg - 19.0).abs() < 1e-9);
    }

    #[test]
    fn test_weight_overage_removes_line_when_needed() {
        let cart = [parcel("a", 12.0, 1), parcel("b", 11.0, 1)];
        let suggestion = smart_suggestion(&cart, &DeliveryLimits::default()).unwrap();
        assert_eq!(
            suggestion.action,
            SuggestionAction::RemoveLine {
                line_id: "a".to_string()
            }
        );
    }

    #[test]
    fn test_volume_overage() {
        let cart = [
            CartLine::new("pillow", "Pillow", 4).with_weight_kg(0.5).with_volume_m3(0.02),
            CartLine::new("mug", "Mug", 1).with_weight_kg(0.3).with_volume_m3(0.001),
        ];
        let suggestion = smart_suggestion(&cart, &DeliveryLimits::default()).unwrap();
        assert_eq!(suggestion.reason, ReasonCode::CartTooLarge);
        // 0.081 - 0.06 = 0.021 → two pillows
        assert_eq!(
            suggestion.action,
            SuggestionAction::ReduceQuantity {
                line_id: "pillow".to_string(),
                from: 4,
                to: 2
            }
        );
    }

    #[test]
    fn test_item_count_trims_smallest_line() {
        let cart = [parcel("big", 1.0, 10), parcel("tiny", 0.05, 5)];
        let suggestion = smart_suggestion(&cart, &DeliveryLimits::default()).unwrap();
        assert_eq!(suggestion.reason, ReasonCode::OverItemCount);
        assert_eq!(
            suggestion.action,
            SuggestionAction::ReduceQuantity {
                line_id: "tiny".to_string(),
                from: 5,
                to: 2
            }
        );
        assert_eq!(suggestion.after.item_count, 12);
    }

    #[test]
    fn test_item_count_removes_small_line_entirely() {
        let cart = [parcel("big", 1.0, 12), parcel("tiny", 0.05, 2)];
        let suggestion = smart_suggestion(&cart, &DeliveryLimits::default()).unwrap();
        assert_eq!(
            suggestion.action,
            SuggestionAction::RemoveLine {
                line_id: "tiny".to_string()
            }
        );
    }

    #[test]
    fn test_missing_dimensions_has_no_remedy() {
        let limits = DeliveryLimits {
            require_known_dimensions: true,
            ..DeliveryLimits::default()
        };
        let cart = [CartLine::new("x", "Unknown", 1)];
        assert!(smart_suggestion(&cart, &limits).is_none());
    }

    #[test]
    fn test_apply_does_not_touch_input() {
        let cart = vec![parcel("a", 2.0, 15)];
        let suggestion = smart_suggestion(&cart, &DeliveryLimits::default()).unwrap();
        let fixed = suggestion.apply(&cart);
        assert_eq!(cart[0].quantity, 15);
        assert_eq!(fixed[0].quantity, 10);
    }

    #[test]
    fn test_action_json_is_tagged() {
        let action = SuggestionAction::ReduceQuantity {
            line_id: "a".to_string(),
            from: 3,
            to: 1,
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "REDUCE_QUANTITY");
        assert_eq!(json["lineId"], "a");
        assert_eq!(json["to"], 1);
    }

    #[test]
    fn test_weight_fix_clears_the_limit_past_tolerance() {
        // 3kg × 7 + 2.000000002kg: one 3kg unit leaves the cart 2e-9 kg over
        let limits = DeliveryLimits::default();
        let cart = [parcel("a", 3.0, 7), parcel("b", 2.000_000_002, 1)];
        let suggestion = smart_suggestion(&cart, &limits).unwrap();

        assert_eq!(suggestion.reason, ReasonCode::CartTooHeavy);
        assert_eq!(
            suggestion.action,
            SuggestionAction::ReduceQuantity {
                line_id: "a".to_string(),
                from: 7,
                to: 5
            }
        );
        assert!(suggestion.after.fits(&limits));
    }

    #[test]
    fn test_volume_fix_leaves_a_fitting_cart() {
        let limits = DeliveryLimits::default();
        let cart = [
            CartLine::new("box", "Box", 3).with_weight_kg(0.2).with_volume_m3(0.03),
            CartLine::new("bag", "Bag", 1).with_weight_kg(0.2).with_volume_m3(0.000_000_003),
        ];
        let suggestion = smart_suggestion(&cart, &limits).unwrap();

        assert_eq!(suggestion.reason, ReasonCode::CartTooLarge);
        assert_eq!(
            suggestion.action,
            SuggestionAction::ReduceQuantity {
                line_id: "box".to_string(),
                from: 3,
                to: 1
            }
        );
        assert!(suggestion.after.fits(&limits));
    }
}
