use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChestPainType {
    /// Atypical angina
    #[serde(rename = "ATA")]
    AtypicalAngina,
    /// Non-anginal pain
    #[serde(rename = "NAP")]
    NonAnginal,
    /// Asymptomatic
    #[serde(rename = "ASY")]
    Asymptomatic,
    /// Typical angina
    #[serde(rename = "TA")]
    TypicalAngina,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestingEcg {
    Normal,
    /// ST-T wave abnormality
    #[serde(rename = "ST")]
    StAbnormality,
    /// Left ventricular hypertrophy
    #[serde(rename = "LVH")]
    LeftVentricularHypertrophy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExerciseAngina {
    #[serde(rename = "Y")]
    Yes,
    #[serde(rename = "N")]
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StSlope {
    Up,
    Flat,
    Down,
}

/// Clinical inputs describing one patient, submitted as one unit.
///
/// Field names on the wire match the prediction service's request schema.
/// The type is `Clone` only; every consumer (requests, history entries,
/// exports) takes its own copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    #[serde(rename = "Age", deserialize_with = "number_or_text")]
    pub age: u16,
    #[serde(rename = "Sex")]
    pub sex: Sex,
    #[serde(rename = "ChestPainType")]
    pub chest_pain_type: ChestPainType,
    /// Resting blood pressure in mm Hg
    #[serde(rename = "RestingBP", deserialize_with = "number_or_text")]
    pub resting_bp: u16,
    /// Serum cholesterol in mg/dl
    #[serde(rename = "Cholesterol", deserialize_with = "number_or_text")]
    pub cholesterol: u16,
    /// 1 if fasting blood sugar > 120 mg/dl, else 0
    #[serde(rename = "FastingBS", deserialize_with = "number_or_text")]
    pub fasting_bs: u8,
    #[serde(rename = "RestingECG")]
    pub resting_ecg: RestingEcg,
    /// Maximum heart rate achieved
    #[serde(rename = "MaxHR", deserialize_with = "number_or_text")]
    pub max_hr: u16,
    #[serde(rename = "ExerciseAngina")]
    pub exercise_angina: ExerciseAngina,
    /// ST depression
    #[serde(rename = "Oldpeak", deserialize_with = "number_or_text")]
    pub oldpeak: f64,
    #[serde(rename = "ST_Slope")]
    pub st_slope: StSlope,
}

impl Default for FeatureVector {
    /// Form defaults for the categorical fields and the service's reference
    /// patient for the numeric ones.
    fn default() -> Self {
        Self {
            age: 50,
            sex: Sex::Male,
            chest_pain_type: ChestPainType::AtypicalAngina,
            resting_bp: 120,
            cholesterol: 200,
            fasting_bs: 0,
            resting_ecg: RestingEcg::Normal,
            max_hr: 150,
            exercise_angina: ExerciseAngina::No,
            oldpeak: 1.0,
            st_slope: StSlope::Up,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText<T> {
    Number(T),
    Text(String),
}

/// Numeric form fields are stored as text by browser forms ("54", "1.5").
/// Accept either a JSON number or a string that parses as one.
fn number_or_text<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match NumberOrText::<T>::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(text) => text
            .trim()
            .parse()
            .map_err(|e| serde::de::Error::custom(format!("invalid number '{}': {}", text, e))),
    }
}

/// A non-blocking warning about an implausible feature value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationWarning {
    /// Wire name of the field that triggered the warning
    pub field: String,
    pub message: String,
    /// The offending value, formatted for display
    pub value: String,
}
