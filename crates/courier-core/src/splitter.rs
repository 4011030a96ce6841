//! # Cart Splitter
//!
//! Partitions a cart into a courier-eligible bucket and a remainder bucket.
//!
//! ## Two Passes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         split_cart(lines, limits)                       │
//! │                                                                         │
//! │  Pass 1: per-unit disqualification (each line alone)                   │
//! │  ───────────────────────────────────────────────────                   │
//! │  manual block / bulky / hazmat / fragile / missing dims /              │
//! │  side too long / unit too heavy / unit too large                       │
//! │      │                                                                  │
//! │      ├── any hit ──► WHOLE line ineligible (all units, all reasons)    │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  Pass 2: cumulative bin packing (lines in PackingPolicy order)         │
//! │  ───────────────────────────────────────────────────────────           │
//! │                                                                         │
//! │   bin = 0kg / 0m³ / 0 items         shared by the whole cart            │
//! │   line A ×25  ─► unit, unit, ... unit #21 breaks 20kg                   │
//! │                 │                    │                                  │
//! │                 ▼                    ▼                                  │
//! │             eligible A×20      ineligible A×5 (CART_TOO_HEAVY)          │
//! │   line B ×1   ─► unit #1 breaks ──► ineligible B×1                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Packing is greedy: whichever line comes first in the policy's order claims
//! the bin first. [`InputOrder`] (the default) keeps cart order.

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::limits::{exceeds, DeliveryLimits, ReasonCode};
use crate::types::{CartLine, Totals};
use crate::LIMIT_EPSILON;

// =============================================================================
// Packing Policy
// =============================================================================

/// Decides which lines claim the shared bin first.
pub trait PackingPolicy {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Indices into `lines`, in the order they are offered to the bin.
    ///
    /// Out-of-range or repeated indices are ignored; lines the policy leaves
    /// out are packed last, in cart order.
    fn packing_order(&self, lines: &[CartLine]) -> Vec<usize>;
}

/// Greedy first-come packing: cart order is priority order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputOrder;

impl PackingPolicy for InputOrder {
    fn name(&self) -> &'static str {
        "input_order"
    }

    fn packing_order(&self, lines: &[CartLine]) -> Vec<usize> {
        (0..lines.len()).collect()
    }
}

/// Turns whatever the policy returned into a full permutation of `0..len`.
fn normalized_order<P: PackingPolicy + ?Sized>(policy: &P, lines: &[CartLine]) -> Vec<usize> {
    let mut seen = vec![false; lines.len()];
    let mut order = Vec::with_capacity(lines.len());
    let proposed = policy.packing_order(lines);
    for index in proposed.into_iter().chain(0..lines.len()) {
        if index < lines.len() && !seen[index] {
            seen[index] = true;
            order.push(index);
        }
    }
    order
}

// =============================================================================
// Split Result
// =============================================================================

/// A line (or the rejected part of one) with every reason it was rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct IneligibleLine {
    pub line: CartLine,
    pub reasons: Vec<ReasonCode>,
}

impl IneligibleLine {
    pub fn new(line: CartLine, reasons: Vec<ReasonCode>) -> Self {
        IneligibleLine { line, reasons }
    }

    pub fn has_reason(&self, reason: ReasonCode) -> bool {
        self.reasons.contains(&reason)
    }
}

/// Courier bucket, remainder bucket, and their totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SplitResult {
    pub eligible: Vec<CartLine>,
    pub ineligible: Vec<IneligibleLine>,
    pub eligible_totals: Totals,
    pub ineligible_totals: Totals,
    pub cart_totals: Totals,
}

impl SplitResult {
    /// Every unit fits the courier channel.
    pub fn is_complete(&self) -> bool {
        self.ineligible.is_empty()
    }
}

// =============================================================================
// Pass 1: Per-Unit Disqualification
// =============================================================================

/// Reasons a line can never ride the courier channel, regardless of quantity.
///
/// Empty means the line may be packed. Only known measurements are checked
/// here; defaults never disqualify a line.
pub fn unit_disqualifications(line: &CartLine, limits: &DeliveryLimits) -> Vec<ReasonCode> {
    let sides = line.sides_desc_cm();
    let side_too_long = sides.split_first().is_some_and(|(longest, shorter)| {
        exceeds(*longest, limits.max_longest_side_cm)
            || shorter
                .iter()
                .any(|side| exceeds(*side, limits.max_single_side_cm))
    });

    let checks = [
        (line.manual_delivery_block, ReasonCode::ManualBlock),
        (limits.disallow_bulky && line.is_bulky(), ReasonCode::BulkyItem),
        (limits.disallow_hazmat && line.hazmat, ReasonCode::HazmatItem),
        (limits.disallow_fragile && line.fragile, ReasonCode::FragileItem),
        (
            limits.require_known_dimensions && !line.has_known_dimensions(),
            ReasonCode::MissingDimensions,
        ),
        (side_too_long, ReasonCode::ItemTooLarge),
        (
            line.weight_kg
                .is_some_and(|kg| exceeds(kg, limits.max_weight_kg)),
            ReasonCode::ItemTooHeavy,
        ),
        (
            line.volume_m3
                .is_some_and(|m3| exceeds(m3, limits.max_volume_m3)),
            ReasonCode::ItemTooLarge,
        ),
    ];

    checks
        .into_iter()
        .filter_map(|(hit, code)| hit.then_some(code))
        .fold(Vec::new(), |mut reasons, code| {
            if !reasons.contains(&code) {
                reasons.push(code);
            }
            reasons
        })
}

// =============================================================================
// Pass 2: Cumulative Bin Packing
// =============================================================================

/// How many units of one line the bin took.
#[derive(Debug, Clone, PartialEq)]
struct Packed {
    accepted: u32,
    /// Limits the first rejected unit would have broken.
    breached: Vec<ReasonCode>,
}

/// Whole units of size `unit` that fit into `room`. Weightless or
/// unmeasurable units, and a NaN bin total, are unbounded here; the item
/// count still caps them.
fn units_within(room: f64, unit: f64) -> u32 {
    if unit > 0.0 && !room.is_nan() {
        // Saturating cast: negative room gives 0, huge ratios give u32::MAX
        ((room + LIMIT_EPSILON) / unit).floor() as u32
    } else {
        u32::MAX
    }
}

/// Offers the units of `line` to `bin`, in one step.
///
/// Accepts the largest prefix of units that keeps the bin within every cart
/// limit, the same greedy prefix that adding them one by one takes. Returns the bin after the
/// accepted units and the packing outcome; `breached` holds the limits the
/// first rejected unit would break.
fn pack_line(bin: Totals, line: &CartLine, limits: &DeliveryLimits) -> (Totals, Packed) {
    let fits = |units: u32| bin.with_units(line, units).fits(limits);

    let mut accepted = line
        .quantity
        .min(limits.max_items.saturating_sub(bin.item_count))
        .min(units_within(limits.max_weight_kg - bin.weight_kg, line.unit_weight_kg()))
        .min(units_within(limits.max_volume_m3 - bin.volume_m3, line.unit_volume_m3()));

    // Float rounding can leave the estimate a unit off in either direction
    while accepted > 0 && !fits(accepted) {
        accepted -= 1;
    }
    while accepted < line.quantity && fits(accepted + 1) {
        accepted += 1;
    }

    let breached = if accepted < line.quantity {
        bin.with_units(line, accepted + 1).breaches(limits)
    } else {
        Vec::new()
    };

    (bin.with_units(line, accepted), Packed { accepted, breached })
}

// =============================================================================
// Split
// =============================================================================

/// Splits `lines` with the default greedy [`InputOrder`] policy.
pub fn split_cart(lines: &[CartLine], limits: &DeliveryLimits) -> SplitResult {
    split_cart_with(&InputOrder, lines, limits)
}

/// Splits `lines`, letting `policy` decide which lines claim the bin first.
///
/// Output lists keep cart order whatever the packing order was.
pub fn split_cart_with<P: PackingPolicy + ?Sized>(
    policy: &P,
    lines: &[CartLine],
    limits: &DeliveryLimits,
) -> SplitResult {
    let disqualified: Vec<Vec<ReasonCode>> = lines
        .iter()
        .map(|line| unit_disqualifications(line, limits))
        .collect();

    let (bin, packed) = normalized_order(policy, lines)
        .into_iter()
        .filter(|&index| disqualified[index].is_empty())
        .fold((Totals::zero(), Vec::new()), |(bin, mut packed), index| {
            let (bin, outcome) = pack_line(bin, &lines[index], limits);
            packed.push((index, outcome));
            (bin, packed)
        });

    let mut outcomes: Vec<Option<Packed>> = vec![None; lines.len()];
    for (index, outcome) in packed {
        outcomes[index] = Some(outcome);
    }

    let mut eligible = Vec::new();
    let mut ineligible = Vec::new();

    for ((line, reasons), outcome) in lines.iter().zip(disqualified).zip(outcomes) {
        match outcome {
            None => ineligible.push(IneligibleLine::new(line.clone(), reasons)),
            // Nothing to deliver for a zero-unit line
            Some(_) if line.quantity == 0 => {}
            Some(Packed { accepted, .. }) if accepted == line.quantity => {
                eligible.push(line.clone());
            }
            Some(Packed { accepted, breached }) => {
                if accepted > 0 {
                    eligible.push(line.with_quantity(accepted));
                }
                let breached = if breached.is_empty() {
                    vec![ReasonCode::CartTooHeavy]
                } else {
                    breached
                };
                ineligible.push(IneligibleLine::new(
                    line.with_quantity(line.quantity - accepted),
                    breached,
                ));
            }
        }
    }

    let result = SplitResult {
        eligible_totals: Totals::of(&eligible),
        ineligible_totals: Totals::of(ineligible.iter().map(|i| &i.line)),
        cart_totals: Totals::of(lines),
        eligible,
        ineligible,
    };

    debug!(
        policy = policy.name(),
        lines = lines.len(),
        eligible = result.eligible.len(),
        ineligible = result.ineligible.len(),
        bin_weight_kg = bin.weight_kg,
        bin_items = bin.item_count,
        "cart split"
    );

    result
}

// =============================================================================
// Unit Tests
// =============================================================================
