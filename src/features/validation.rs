use super::types::{FeatureVector, ValidationWarning};

/// Plausible physiological range for an integer measurement.
struct Range {
    field: &'static str,
    label: &'static str,
    unit: &'static str,
    min: u16,
    max: u16,
}

const AGE: Range = Range { field: "Age", label: "Age", unit: "years", min: 1, max: 120 };
const RESTING_BP: Range = Range { field: "RestingBP", label: "Resting BP", unit: "mm Hg", min: 60, max: 250 };
const CHOLESTEROL: Range = Range { field: "Cholesterol", label: "Cholesterol", unit: "mg/dl", min: 1, max: 700 };
const MAX_HR: Range = Range { field: "MaxHR", label: "Max HR", unit: "bpm", min: 60, max: 220 };

const OLDPEAK_MIN: f64 = -5.0;
const OLDPEAK_MAX: f64 = 10.0;

fn check_range(range: &Range, value: u16, warnings: &mut Vec<ValidationWarning>) {
    if value < range.min || value > range.max {
        warnings.push(ValidationWarning {
            field: range.field.to_string(),
            message: format!(
                "{} {} {} out of range ({}-{} {})",
                range.label, value, range.unit, range.min, range.max, range.unit
            ),
            value: value.to_string(),
        });
    }
}

/// Check a feature vector against plausible clinical ranges.
/// Warnings flag likely data-entry mistakes; they never block a submission.
pub fn validate_features(features: &FeatureVector) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    check_range(&AGE, features.age, &mut warnings);
    check_range(&RESTING_BP, features.resting_bp, &mut warnings);
    check_range(&MAX_HR, features.max_hr, &mut warnings);

    // The reference dataset encodes a missing cholesterol reading as 0
    if features.cholesterol == 0 {
        warnings.push(ValidationWarning {
            field: CHOLESTEROL.field.to_string(),
            message: "Cholesterol recorded as 0 (not measured?)".to_string(),
            value: "0".to_string(),
        });
    } else {
        check_range(&CHOLESTEROL, features.cholesterol, &mut warnings);
    }

    if features.fasting_bs > 1 {
        warnings.push(ValidationWarning {
            field: "FastingBS".to_string(),
            message: format!("Fasting BS flag must be 0 or 1, got {}", features.fasting_bs),
            value: features.fasting_bs.to_string(),
        });
    }

    if !features.oldpeak.is_finite()
        || features.oldpeak < OLDPEAK_MIN
        || features.oldpeak > OLDPEAK_MAX
    {
        warnings.push(ValidationWarning {
            field: "Oldpeak".to_string(),
            message: format!(
                "Oldpeak {} out of range ({}-{})",
                features.oldpeak, OLDPEAK_MIN, OLDPEAK_MAX
            ),
            value: features.oldpeak.to_string(),
        });
    }

    warnings
}
