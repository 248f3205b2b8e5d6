use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ExampleData;

/// Input to the remote risk-prediction endpoint: a known city and the date
/// the assessment is for.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    pub city: String,
    pub date: NaiveDate,
}

impl ExampleData for PredictionRequest {
    fn example_data() -> Self {
        PredictionRequest {
            city: "Mumbai".to_owned(),
            date: NaiveDate::from_ymd_opt(2025, 7, 14)
                .unwrap_or(NaiveDate::MIN),
        }
    }
}

/// The remote model's assessment. The service clamps `landslide_chance`
/// to [5, 95] before returning it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictionReport {
    pub rainfall: f64,
    pub elevation: f64,
    pub soil_type: String,
    pub slope: String,
    pub vegetation: String,
    pub risk_level: RiskLevel,
    pub landslide_chance: f64,
}

/// Risk band as reported by the remote service. The banding itself happens
/// on the remote side; this is a pass-through vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatPrompt {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub reply: String,
}

/// Query for location-specific landslide background information.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationQuery {
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationReport {
    pub response: String,
}
