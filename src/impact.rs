//! Display-time view over feature impacts.
//!
//! Ranking never touches the stored order; it returns a new sequence.

use serde::Serialize;

use crate::service::FeatureImpact;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increases,
    Decreases,
}

/// One row of the ranked impact chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedImpact {
    pub feature: String,
    pub value: f64,
    pub direction: Direction,
    /// Bar length in percent, |value| * 100 capped at 100
    pub bar_width: f64,
}

/// Impacts sorted by descending magnitude. Ties keep service order.
pub fn rank_impacts(impacts: &[FeatureImpact]) -> Vec<RankedImpact> {
    let mut ranked: Vec<RankedImpact> = impacts
        .iter()
        .map(|impact| RankedImpact {
            feature: impact.feature.clone(),
            value: impact.value,
            direction: if impact.value > 0.0 {
                Direction::Increases
            } else {
                Direction::Decreases
            },
            bar_width: (impact.value.abs() * 100.0).min(100.0),
        })
        .collect();

    ranked.sort_by(|a, b| b.value.abs().total_cmp(&a.value.abs()));
    ranked
}

/// Signed value with three decimals, e.g. "+0.310" or "-0.052".
pub fn format_contribution(value: f64) -> String {
    if value > 0.0 {
        format!("+{:.3}", value)
    } else {
        format!("{:.3}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impact(feature: &str, value: f64) -> FeatureImpact {
        FeatureImpact {
            feature: feature.to_string(),
            value,
        }
    }

    #[test]
    fn test_sorted_by_magnitude_not_sign() {
        let impacts = vec![
            impact("num__Age", 0.05),
            impact("cat__ST_Slope_Up", -0.62),
            impact("num__Oldpeak", 0.31),
        ];
        let ranked = rank_impacts(&impacts);
        let names: Vec<&str> = ranked.iter().map(|r| r.feature.as_str()).collect();
        assert_eq!(names, vec!["cat__ST_Slope_Up", "num__Oldpeak", "num__Age"]);

        // Input order is untouched
        assert_eq!(impacts[0].feature, "num__Age");
    }

    #[test]
    fn test_direction_and_bar_width() {
        let ranked = rank_impacts(&[impact("a", 1.7), impact("b", -0.25), impact("c", 0.0)]);
        assert_eq!(ranked[0].direction, Direction::Increases);
        assert_eq!(ranked[0].bar_width, 100.0);
        assert_eq!(ranked[1].direction, Direction::Decreases);
        assert_eq!(ranked[1].bar_width, 25.0);
        assert_eq!(ranked[2].direction, Direction::Decreases);
        assert_eq!(ranked[2].bar_width, 0.0);
    }

    #[test]
    fn test_ties_keep_service_order() {
        let ranked = rank_impacts(&[impact("first", 0.2), impact("second", -0.2)]);
        assert_eq!(ranked[0].feature, "first");
        assert_eq!(ranked[1].feature, "second");
    }

    #[test]
    fn test_format_contribution() {
        assert_eq!(format_contribution(0.31), "+0.310");
        assert_eq!(format_contribution(-0.0521), "-0.052");
        assert_eq!(format_contribution(0.0), "0.000");
    }
}
