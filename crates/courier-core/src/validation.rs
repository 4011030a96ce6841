//! # Validation Module
//!
//! Shape checks for limits records and cart snapshots.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Configuration load (courier-config)                          │
//! │  └── validate_limits: once per load, rejects bad limits early          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Cart intake (caller, optional)                               │
//! │  └── validate_cart: ids, quantities, measurements                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Evaluation (split / check / suggest)                         │
//! │  └── NO validation: any snapshot yields a well-formed decision         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use courier_core::validation::{validate_cart, validate_limits};
//! use courier_core::{CartLine, DeliveryLimits};
//!
//! validate_limits(&DeliveryLimits::default()).unwrap();
//! validate_cart(&[CartLine::new("sku-1", "Mug", 2)]).unwrap();
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::limits::DeliveryLimits;
use crate::types::CartLine;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Limits
// =============================================================================

/// Validates a limits record.
///
/// ## Rules
/// - `max_weight_kg`, `max_volume_m3`, `max_longest_side_cm`,
///   `max_single_side_cm` are finite and > 0
/// - `max_items` > 0
/// - `allowed_cities` holds at least one non-blank name
pub fn validate_limits(limits: &DeliveryLimits) -> ValidationResult<()> {
    let numeric = [
        ("max_weight_kg", limits.max_weight_kg),
        ("max_volume_m3", limits.max_volume_m3),
        ("max_longest_side_cm", limits.max_longest_side_cm),
        ("max_single_side_cm", limits.max_single_side_cm),
    ];

    // NaN fails the comparison too
    if let Some((field, _)) = numeric
        .iter()
        .find(|(_, value)| !(value.is_finite() && *value > 0.0))
    {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if limits.max_items == 0 {
        return Err(ValidationError::MustBePositive {
            field: "max_items".to_string(),
        });
    }

    if limits.allowed_cities.iter().all(|c| c.trim().is_empty()) {
        return Err(ValidationError::Required {
            field: "allowed_cities".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Cart Snapshot
// =============================================================================

/// Validates a single cart line.
///
/// ## Rules
/// - `id` is non-blank
/// - `quantity` > 0
/// - every known measurement is finite and >= 0
pub fn validate_cart_line(line: &CartLine) -> ValidationResult<()> {
    if line.id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "line id".to_string(),
        });
    }

    if line.quantity == 0 {
        return Err(ValidationError::MustBePositive {
            field: format!("line '{}' quantity", line.id),
        });
    }

    let measurements = [
        ("weight_kg", line.weight_kg),
        ("volume_m3", line.volume_m3),
        ("length_cm", line.length_cm),
        ("width_cm", line.width_cm),
        ("height_cm", line.height_cm),
    ];

    for (name, value) in measurements {
        if let Some(value) = value {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::InvalidMeasurement {
                    field: format!("line '{}' {}", line.id, name),
                    value,
                });
            }
        }
    }

    Ok(())
}

/// Validates a cart snapshot: every line, plus unique line ids.
pub fn validate_cart(lines: &[CartLine]) -> ValidationResult<()> {
    let mut seen = HashSet::with_capacity(lines.len());
    for line in lines {
        validate_cart_line(line)?;
        if !seen.insert(line.id.as_str()) {
            return Err(ValidationError::Duplicate {
                field: "line id".to_string(),
                value: line.id.clone(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
