//! Cart snapshot input and the JSON report written to stdout.

use std::path::Path;

use anyhow::{Context, Result};
use courier_core::{
    smart_suggestion, CartLine, DeliveryLimits, EligibilityChecker, EligibilityResult,
    SmartSuggestion,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Accepted cart file shapes: a bare array of lines or `{ "lines": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CartFile {
    Lines(Vec<CartLine>),
    Snapshot { lines: Vec<CartLine> },
}

pub fn parse_cart(json: &str) -> Result<Vec<CartLine>> {
    let file: CartFile = serde_json::from_str(json).context("Cart is not a valid snapshot")?;
    Ok(match file {
        CartFile::Lines(lines) | CartFile::Snapshot { lines } => lines,
    })
}

pub fn read_cart(path: &Path) -> Result<Vec<CartLine>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read cart {}", path.display()))?;
    let lines = parse_cart(&json).with_context(|| format!("In {}", path.display()))?;
    debug!(path = %path.display(), lines = lines.len(), "Cart snapshot loaded");
    Ok(lines)
}

/// What `courier-check` prints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub result: EligibilityResult,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<SmartSuggestion>,

    /// Re-check of the cart with the suggestion applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_suggestion: Option<EligibilityResult>,
}

impl Report {
    pub fn build(
        checker: &EligibilityChecker,
        lines: &[CartLine],
        city: &str,
        limits: &DeliveryLimits,
        suggest: bool,
    ) -> Self {
        let result = checker.check(lines, city, limits);
        info!(
            city = %result.city,
            state = ?result.state,
            primary_reason = ?result.primary_reason,
            eligible_units = result.eligible_totals().item_count,
            "Courier eligibility decided"
        );

        // Only whole-cart failures get a suggestion; city gating is not fixable by editing lines.
        let suggestion = if suggest && !result.is_eligible() && limits.allows_city(city) {
            smart_suggestion(lines, limits)
        } else {
            None
        };
        let after_suggestion = suggestion
            .as_ref()
            .map(|s| checker.check(&s.apply(lines), city, limits));

        Report {
            result,
            suggestion,
            after_suggestion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::{EligibilityState, ReasonCode, SuggestionAction};

    #[test]
    fn test_parse_bare_array() {
        let lines = parse_cart(r#"[{"id":"a","name":"Lamp","quantity":2,"weightKg":1.5}]"#).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].weight_kg, Some(1.5));
    }

    #[test]
    fn test_parse_snapshot_object() {
        let lines = parse_cart(r#"{"lines":[{"id":"a","name":"Lamp","quantity":1,"hazmat":true}]}"#)
            .unwrap();
        assert!(lines[0].hazmat);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_cart(r#"{"items": 3}"#).is_err());
    }

    #[test]
    fn test_read_cart_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        std::fs::write(&path, r#"[{"id":"a","name":"Lamp","quantity":1}]"#).unwrap();
        assert_eq!(read_cart(&path).unwrap().len(), 1);
        assert!(read_cart(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_report_with_suggestion() {
        let lines = vec![
            CartLine::new("ok", "Mug", 1).with_weight_kg(0.4),
            CartLine::new("acid", "Drain cleaner", 1)
                .with_weight_kg(1.0)
                .with_hazmat(true),
        ];
        let limits = DeliveryLimits::default();
        let report = Report::build(&EligibilityChecker::new(), &lines, "Tallinn", &limits, true);

        assert_eq!(report.result.state, EligibilityState::Partial);
        let suggestion = report.suggestion.as_ref().unwrap();
        assert_eq!(suggestion.reason, ReasonCode::HazmatItem);
        assert!(matches!(suggestion.action, SuggestionAction::RelocateLine { .. }));
        assert_eq!(
            report.after_suggestion.as_ref().map(|r| r.state),
            Some(EligibilityState::Eligible)
        );

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("afterSuggestion").is_some());
    }

    #[test]
    fn test_report_skips_suggestion_for_unserved_city() {
        let lines = vec![CartLine::new("a", "Box", 1).with_hazmat(true)];
        let report = Report::build(
            &EligibilityChecker::new(),
            &lines,
            "Narva",
            &DeliveryLimits::default(),
            true,
        );
        assert_eq!(report.result.primary_reason, Some(ReasonCode::CityNotSupported));
        assert!(report.suggestion.is_none());

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("suggestion").is_none());
    }
}
