//! # Error Types
//!
//! Domain-specific error types for courier-core.
//!
//! ## Where Errors Can Happen
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Surfaces                                  │
//! │                                                                         │
//! │  courier-core (this file)                                              │
//! │  └── ValidationError  - limits / cart snapshot shape violations        │
//! │                                                                         │
//! │  courier-config (separate crate)                                       │
//! │  └── ConfigError      - file, parse and env override failures          │
//! │                                                                         │
//! │  Evaluation (split / check / suggest)                                  │
//! │  └── NONE: every input yields a well-formed decision                   │
//! │                                                                         │
//! │  Flow: ValidationError → ConfigError → CLI (anyhow) → stderr           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include the offending field (and line id) in every message
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Shape violations in a limits record or a cart snapshot.
///
/// Invalid limits are a contract violation of the caller and are meant to be
/// rejected once, when configuration is loaded, not on every evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be strictly greater than zero.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// A physical measurement is negative, NaN or infinite.
    #[error("{field} has invalid measurement {value}")]
    InvalidMeasurement { field: String, value: f64 },

    /// Duplicate value (e.g., two cart lines sharing an id).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Unit Tests
// =============================================================================
