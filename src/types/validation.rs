//! Validation result types.

use serde::{Deserialize, Serialize};

/// Outcome of validating a bot configuration.
///
/// `issues` are hard failures that block saving; `warnings` are soft concerns
/// surfaced to the operator. `max_correction_percent` is the worst-case
/// per-trade adjustment the convergence loop would apply to stay on target,
/// as a fraction (0.05 = 5%).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Whether the configuration may be saved.
    pub valid: bool,
    /// Hard failures.
    pub issues: Vec<String>,
    /// Soft concerns.
    pub warnings: Vec<String>,
    /// Worst-case per-trade correction, as a fraction.
    pub max_correction_percent: f64,
}

impl ValidationResult {
    /// A passing result with no findings.
    pub fn ok(max_correction_percent: f64) -> Self {
        Self {
            valid: true,
            issues: vec![],
            warnings: vec![],
            max_correction_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_shape() {
        let result = ValidationResult::ok(0.03);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"valid\":true"));
        assert!(json.contains("\"maxCorrectionPercent\":0.03"));
    }
}
