//! Probability to risk category mapping.
//!
//! The category is always recomputed from the probability on display and is
//! never persisted.

use serde::Serialize;

const MODERATE_THRESHOLD: f64 = 0.3;
const HIGH_THRESHOLD: f64 = 0.6;

/// Risk band derived from a predicted probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RiskCategory {
    Low,
    Moderate,
    High,
}

impl RiskCategory {
    /// Classify a probability. Never fails: values outside [0, 1] (and NaN)
    /// fall through the same inequality chain.
    pub fn from_probability(probability: f64) -> Self {
        if probability < MODERATE_THRESHOLD {
            RiskCategory::Low
        } else if probability < HIGH_THRESHOLD {
            RiskCategory::Moderate
        } else {
            RiskCategory::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskCategory::Low => "Low Risk",
            RiskCategory::Moderate => "Moderate Risk",
            RiskCategory::High => "High Risk",
        }
    }

    /// Hex display color for the category.
    pub fn color(&self) -> &'static str {
        match self {
            RiskCategory::Low => "#10b981",
            RiskCategory::Moderate => "#f59e0b",
            RiskCategory::High => "#ef4444",
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Category plus its display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub category: RiskCategory,
    pub color: &'static str,
}

pub fn classify(probability: f64) -> RiskAssessment {
    let category = RiskCategory::from_probability(probability);
    RiskAssessment {
        category,
        color: category.color(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        assert_eq!(classify(0.0).category, RiskCategory::Low);
        assert_eq!(classify(0.29).category, RiskCategory::Low);
        assert_eq!(classify(0.45).category, RiskCategory::Moderate);
        assert_eq!(classify(0.75).category, RiskCategory::High);
        assert_eq!(classify(1.0).category, RiskCategory::High);
    }

    #[test]
    fn test_boundaries_are_inclusive_upwards() {
        assert_eq!(classify(0.30).category, RiskCategory::Moderate);
        assert_eq!(classify(0.60).category, RiskCategory::High);
        assert_eq!(classify(0.2999999).category, RiskCategory::Low);
        assert_eq!(classify(0.5999999).category, RiskCategory::Moderate);
    }

    #[test]
    fn test_out_of_range_inputs_do_not_fail() {
        assert_eq!(classify(-0.5).category, RiskCategory::Low);
        assert_eq!(classify(1.7).category, RiskCategory::High);
        assert_eq!(classify(f64::NAN).category, RiskCategory::High);
    }

    #[test]
    fn test_colors_and_labels() {
        assert_eq!(classify(0.1).color, "#10b981");
        assert_eq!(classify(0.4).color, "#f59e0b");
        assert_eq!(classify(0.9).color, "#ef4444");
        assert_eq!(RiskCategory::Moderate.to_string(), "Moderate Risk");
    }
}
