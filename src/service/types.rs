use serde::{Deserialize, Serialize};

/// Classification returned by `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Human-readable classification label
    pub result: String,
    /// Probability of the positive class, expected in [0, 1]
    pub probability: f64,
    /// Raw class index (0/1) when the service reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<u8>,
}

/// Signed contribution of one feature to a prediction.
/// Positive values push the risk up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImpact {
    pub feature: String,
    pub value: f64,
}

/// Attribution returned by `POST /explain`, in service order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub shap_values: Vec<FeatureImpact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_value: Option<f64>,
}

/// Body of `GET /`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthStatus {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_response_parses_service_body() {
        let body = r#"{"prediction": 1, "probability": 0.8123, "result": "Heart Disease Detected"}"#;
        let parsed: PredictionResult = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.result, "Heart Disease Detected");
        assert_eq!(parsed.probability, 0.8123);
        assert_eq!(parsed.prediction, Some(1));
    }

    #[test]
    fn test_predict_response_without_class_index() {
        let body = r#"{"result": "No Heart Disease", "probability": 0.12}"#;
        let parsed: PredictionResult = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.prediction, None);

        let json = serde_json::to_value(&parsed).unwrap();
        assert!(json.get("prediction").is_none());
    }

    #[test]
    fn test_explain_response_keeps_order() {
        let body = r#"{
            "shap_values": [
                {"feature": "num__Age", "value": 0.05},
                {"feature": "cat__ST_Slope_Flat", "value": -0.41},
                {"feature": "num__Oldpeak", "value": 0.22}
            ],
            "base_value": -0.3
        }"#;
        let parsed: Explanation = serde_json::from_str(body).unwrap();
        let names: Vec<&str> = parsed.shap_values.iter().map(|i| i.feature.as_str()).collect();
        assert_eq!(names, vec!["num__Age", "cat__ST_Slope_Flat", "num__Oldpeak"]);
        assert_eq!(parsed.base_value, Some(-0.3));
    }

    #[test]
    fn test_explain_response_missing_values_is_error() {
        let body = r#"{"base_value": 0.1}"#;
        assert!(serde_json::from_str::<Explanation>(body).is_err());
    }
}
