//! # Eligibility Checker
//!
//! Reduces a cart, a delivery city and a limits record to one decision.
//!
//! ## Decision Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  check(lines, city, limits)                                             │
//! │       │                                                                 │
//! │       ├── city not served? ──► BLOCKED (CITY_NOT_SUPPORTED on every     │
//! │       │                        line, splitter never runs)               │
//! │       ▼                                                                 │
//! │  split_cart ──► eligible / ineligible                                   │
//! │  full-cart totals vs limits ──► cart reasons                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ineligible lines?   none ──► ELIGIBLE                                  │
//! │                      some, eligible left ──► PARTIAL                    │
//! │                      some, nothing left  ──► BLOCKED                    │
//! │  cart reasons?       ──► BLOCKED (OverCapacityPolicy::Block)            │
//! │  eligible weight > max? ──► BLOCKED + CART_TOO_HEAVY                    │
//! │  no eligible units?  ──► BLOCKED                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Primary Reason
//! First cart reason if any, else the first reason of the first ineligible
//! line. An eligible cart has none.

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::limits::{exceeds, DeliveryLimits, ReasonCode};
use crate::splitter::{split_cart_with, IneligibleLine, InputOrder, PackingPolicy};
use crate::types::{CartLine, Totals};

// =============================================================================
// State
// =============================================================================

/// Top-line outcome shown by the delivery-method widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum EligibilityState {
    /// The whole cart can go by courier.
    Eligible,
    /// Part of the cart can go by courier, the rest needs another method.
    Partial,
    /// Courier is not offered for this cart.
    Blocked,
}

/// What to do when the full cart breaks a cart-wide limit but a partial
/// split exists.
///
/// `Block` is the current product decision: a globally over-limit cart is not
/// offered as "partial" even though its first lines would fit. `KeepPartial`
/// lets the split stand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OverCapacityPolicy {
    #[default]
    Block,
    KeepPartial,
}

// =============================================================================
// Result
// =============================================================================

/// One eligibility decision. Built fresh per call, never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityResult {
    pub state: EligibilityState,
    pub primary_reason: Option<ReasonCode>,
    /// Cart-wide reasons, in the order they were found.
    pub cart_reasons: Vec<ReasonCode>,
    /// Totals of the full cart as submitted.
    pub totals: Totals,
    pub limits: DeliveryLimits,
    /// City exactly as the caller supplied it.
    pub city: String,
    pub eligible_items: Vec<CartLine>,
    pub ineligible_items: Vec<IneligibleLine>,
}

impl EligibilityResult {
    pub fn is_eligible(&self) -> bool {
        self.state == EligibilityState::Eligible
    }

    /// Per-line reasons as `(line id, reasons)`.
    pub fn line_reasons(&self) -> impl Iterator<Item = (&str, &[ReasonCode])> + '_ {
        self.ineligible_items
            .iter()
            .map(|item| (item.line.id.as_str(), item.reasons.as_slice()))
    }

    /// Totals of the courier bucket.
    pub fn eligible_totals(&self) -> Totals {
        Totals::of(&self.eligible_items)
    }
}

// =============================================================================
// Checker
// =============================================================================

/// Eligibility checker with an explicit packing policy and over-capacity
/// policy. Holds no per-call state.
#[derive(Debug, Clone, Default)]
pub struct EligibilityChecker<P = InputOrder> {
    policy: P,
    over_capacity: OverCapacityPolicy,
}

impl EligibilityChecker<InputOrder> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: PackingPolicy> EligibilityChecker<P> {
    pub fn with_policy(policy: P) -> Self {
        EligibilityChecker {
            policy,
            over_capacity: OverCapacityPolicy::default(),
        }
    }

    pub fn over_capacity(mut self, over_capacity: OverCapacityPolicy) -> Self {
        self.over_capacity = over_capacity;
        self
    }

    /// Decides whether `lines` can be delivered by courier to `city`.
    pub fn check(&self, lines: &[CartLine], city: &str, limits: &DeliveryLimits) -> EligibilityResult {
        let totals = Totals::of(lines);

        if !limits.allows_city(city) {
            debug!(city = %city, lines = lines.len(), "city not served by courier");
            return EligibilityResult {
                state: EligibilityState::Blocked,
                primary_reason: Some(ReasonCode::CityNotSupported),
                cart_reasons: Vec::new(),
                totals,
                limits: limits.clone(),
                city: city.to_string(),
                eligible_items: Vec::new(),
                ineligible_items: lines
                    .iter()
                    .map(|line| IneligibleLine::new(line.clone(), vec![ReasonCode::CityNotSupported]))
                    .collect(),
            };
        }

        let split = split_cart_with(&self.policy, lines, limits);
        let mut cart_reasons = totals.breaches(limits);

        let mut state = match (split.ineligible.is_empty(), split.eligible.is_empty()) {
            (true, _) => EligibilityState::Eligible,
            (false, false) => EligibilityState::Partial,
            (false, true) => EligibilityState::Blocked,
        };

        if !cart_reasons.is_empty() && self.over_capacity == OverCapacityPolicy::Block {
            state = EligibilityState::Blocked;
        }

        if exceeds(split.eligible_totals.weight_kg, limits.max_weight_kg) {
            state = EligibilityState::Blocked;
            if !cart_reasons.contains(&ReasonCode::CartTooHeavy) {
                cart_reasons.push(ReasonCode::CartTooHeavy);
            }
        }

        if split.eligible.is_empty() || split.eligible_totals.item_count == 0 {
            state = EligibilityState::Blocked;
        }

        let primary_reason = match state {
            EligibilityState::Eligible => None,
            _ => cart_reasons
                .first()
                .or_else(|| split.ineligible.first().and_then(|item| item.reasons.first()))
                .copied(),
        };

        debug!(
            city = %city,
            state = ?state,
            primary_reason = ?primary_reason,
            cart_reasons = ?cart_reasons,
            eligible = split.eligible.len(),
            ineligible = split.ineligible.len(),
            "eligibility decided"
        );

        EligibilityResult {
            state,
            primary_reason,
            cart_reasons,
            totals,
            limits: limits.clone(),
            city: city.to_string(),
            eligible_items: split.eligible,
            ineligible_items: split.ineligible,
        }
    }
}

/// Checks a cart with greedy cart-order packing and the default
/// over-capacity policy.
pub fn check_eligibility(lines: &[CartLine], city: &str, limits: &DeliveryLimits) -> EligibilityResult {
    EligibilityChecker::new().check(lines, city, limits)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parcel(id: &str, kg: f64, qty: u32) -> CartLine {
        CartLine::new(id, id, qty)
            .with_weight_kg(kg)
            .with_volume_m3(0.001)
            .with_dimensions_cm(20.0, 20.0, 10.0)
    }

    #[test]
    fn test_eligible_cart_has_no_reason() {
        let result = check_eligibility(&[parcel("a", 2.0, 2)], "Tartu", &DeliveryLimits::default());
        assert_eq!(result.state, EligibilityState::Eligible);
        assert!(result.primary_reason.is_none());
        assert!(result.cart_reasons.is_empty());
        assert_eq!(result.city, "Tartu");
        assert!(result.is_eligible());
    }

    #[test]
    fn test_unknown_city_blocks_every_line() {
        let cart = [parcel("a", 1.0, 1), parcel("b", 1.0, 1)];
        let result = check_eligibility(&cart, "Narva", &DeliveryLimits::default());

        assert_eq!(result.state, EligibilityState::Blocked);
        assert_eq!(result.primary_reason, Some(ReasonCode::CityNotSupported));
        assert!(result.eligible_items.is_empty());
        assert_eq!(result.ineligible_items.len(), 2);
        assert!(result
            .line_reasons()
            .all(|(_, reasons)| reasons == [ReasonCode::CityNotSupported]));
    }

    #[test]
    fn test_partial_when_a_flagged_line_is_dropped() {
        let cart = [parcel("a", 1.0, 1), parcel("b", 1.0, 1).with_hazmat(true)];
        let result = check_eligibility(&cart, "Tallinn", &DeliveryLimits::default());

        assert_eq!(result.state, EligibilityState::Partial);
        assert_eq!(result.primary_reason, Some(ReasonCode::HazmatItem));
        assert_eq!(result.eligible_items.len(), 1);
    }

    #[test]
    fn test_over_capacity_escalates_to_blocked() {
        let limits = DeliveryLimits::default();
        let cart = [parcel("a", 5.0, 3), parcel("b", 8.0, 1)];

        let result = check_eligibility(&cart, "Tallinn", &limits);
        assert_eq!(result.state, EligibilityState::Blocked);
        assert_eq!(result.cart_reasons, vec![ReasonCode::CartTooHeavy]);
        assert_eq!(result.primary_reason, Some(ReasonCode::CartTooHeavy));
        // The split is still reported
        assert_eq!(result.eligible_items.len(), 1);

        let result = EligibilityChecker::new()
            .over_capacity(OverCapacityPolicy::KeepPartial)
            .check(&cart, "Tallinn", &limits);
        assert_eq!(result.state, EligibilityState::Partial);
        assert_eq!(result.primary_reason, Some(ReasonCode::CartTooHeavy));
    }

    #[test]
    fn test_empty_cart_is_blocked_without_reason() {
        let result = check_eligibility(&[], "Tallinn", &DeliveryLimits::default());
        assert_eq!(result.state, EligibilityState::Blocked);
        assert!(result.primary_reason.is_none());
    }

    #[test]
    fn test_result_json_shape() {
        let result = check_eligibility(&[parcel("a", 1.0, 1)], "Pärnu", &DeliveryLimits::default());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["state"], "eligible");
        assert!(json["primaryReason"].is_null());
        assert_eq!(json["totals"]["itemCount"], 1);
        assert_eq!(json["limits"]["maxItems"], 12);
    }

    #[test]
    fn test_zero_quantity_cart_is_blocked() {
        let zero = CartLine::new("z", "Zero", 0).with_weight_kg(1.0);
        let result = check_eligibility(&[zero.clone()], "Tallinn", &DeliveryLimits::default());
        assert_eq!(result.state, EligibilityState::Blocked);
        assert!(result.primary_reason.is_none());
        assert!(result.eligible_items.is_empty());

        // A zero-unit line next to a real one does not count as delivered
        let result = check_eligibility(&[zero, parcel("a", 1.0, 1)], "Tallinn", &DeliveryLimits::default());
        assert_eq!(result.state, EligibilityState::Eligible);
        assert_eq!(result.eligible_items.len(), 1);
        assert_eq!(result.eligible_items[0].id, "a");
    }

    #[test]
    fn test_city_is_echoed_as_supplied() {
        let result = check_eligibility(&[parcel("a", 1.0, 1)], "  tallinn ", &DeliveryLimits::default());
        assert!(result.is_eligible());
        assert_eq!(result.city, "  tallinn ");

        let result = check_eligibility(&[parcel("a", 1.0, 1)], "Narva", &DeliveryLimits::default());
        assert_eq!(result.city, "Narva");
    }

    struct Reversed;

    impl PackingPolicy for Reversed {
        fn name(&self) -> &'static str {
            "reversed"
        }

        fn packing_order(&self, lines: &[CartLine]) -> Vec<usize> {
            (0..lines.len()).rev().collect()
        }
    }

    #[test]
    fn test_checker_with_custom_policy() {
        let limits = DeliveryLimits::default();
        let cart = [parcel("a", 15.0, 1), parcel("b", 10.0, 1)];

        let result = EligibilityChecker::with_policy(Reversed)
            .over_capacity(OverCapacityPolicy::KeepPartial)
            .check(&cart, "Tallinn", &limits);
        assert_eq!(result.state, EligibilityState::Partial);
        assert_eq!(result.eligible_items[0].id, "b");
        assert_eq!(result.ineligible_items[0].line.id, "a");
        assert!((result.eligible_totals().weight_kg - 10.0).abs() < 1e-9);

        let greedy = EligibilityChecker::new()
            .over_capacity(OverCapacityPolicy::KeepPartial)
            .check(&cart, "Tallinn", &limits);
        assert_eq!(greedy.eligible_items[0].id, "a");
        assert!((greedy.eligible_totals().weight_kg - 15.0).abs() < 1e-9);
    }
}
