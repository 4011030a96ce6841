//! # courier-core: Delivery Eligibility for the Courier Channel
//!
//! This crate is the decision engine behind the on-demand micro-courier
//! delivery option. It contains all eligibility logic as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Courier Eligibility Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          Storefront (cart store, checkout, delivery widget)     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ cart snapshot + city + limits          │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ courier-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  limits   │  │ splitter  │  │  checker  │  │suggestion │  │   │
//! │  │   │ Reasons   │─►│ Packing   │─►│ State     │  │ Fix my    │  │   │
//! │  │   │ Limits    │  │ Split     │  │ Primary   │  │ cart      │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │      courier-config (limits from TOML/env, per-city overrides)  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Cart lines, delivery classes and the canonical [`Totals`]
//! - [`limits`] - Limits record and the closed [`ReasonCode`] taxonomy
//! - [`splitter`] - Eligible / remainder partitioning with greedy bin packing
//! - [`checker`] - One top-line decision per cart and city
//! - [`suggestion`] - Smallest single-line fix for an ineligible cart
//! - [`validation`] - Shape checks for limits and cart snapshots
//! - [`error`] - Validation error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same cart + city + limits = same result, every time
//! 2. **No I/O**: configuration is loaded elsewhere and passed in
//! 3. **Never Fails**: every cart, however incomplete, yields a well-formed result
//! 4. **Machine-Readable Reasons**: message text belongs to the UI, not here
//!
//! ## Example Usage
//!
//! ```rust
//! use courier_core::{check_eligibility, CartLine, DeliveryLimits, EligibilityState};
//!
//! let limits = DeliveryLimits::default();
//! let cart = vec![CartLine::new("sku-1", "Desk lamp", 1)
//!     .with_weight_kg(5.0)
//!     .with_volume_m3(0.01)
//!     .with_dimensions_cm(20.0, 20.0, 10.0)];
//!
//! let result = check_eligibility(&cart, "Tallinn", &limits);
//! assert_eq!(result.state, EligibilityState::Eligible);
//! assert!(result.primary_reason.is_none());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checker;
pub mod error;
pub mod limits;
pub mod splitter;
pub mod suggestion;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checker::{
    check_eligibility, EligibilityChecker, EligibilityResult, EligibilityState,
    OverCapacityPolicy,
};
pub use error::ValidationError;
pub use limits::{DeliveryLimits, ReasonCode, ReasonScope};
pub use splitter::{split_cart, IneligibleLine, InputOrder, PackingPolicy, SplitResult};
pub use suggestion::{smart_suggestion, SmartSuggestion, SuggestionAction};
pub use types::{CartLine, DeliveryClass, Totals};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Unit weight assumed for a line without `weight_kg` when summing totals.
///
/// Never used for the per-unit checks in [`splitter::unit_disqualifications`].
pub const DEFAULT_UNIT_WEIGHT_KG: f64 = 1.0;

/// Unit volume assumed for a line without `volume_m3` when summing totals.
pub const DEFAULT_UNIT_VOLUME_M3: f64 = 0.01;

/// Tolerance applied to every "exceeds limit" comparison.
///
/// Repeated float addition drifts (`0.01 * 6 > 0.06`); a cart sitting exactly
/// on a limit must still fit.
pub const LIMIT_EPSILON: f64 = 1e-9;
