use serde::{de, Deserialize, Deserializer, Serialize};

use crate::{domain::FlowerId, error::ApiError};

/// Browser forms hand ids over as strings read from `data-*` attributes.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumericId {
    Number(i64),
    Text(String),
}

fn numeric_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumericId::deserialize(deserializer)? {
        NumericId::Number(id) => Ok(id),
        NumericId::Text(raw) => raw
            .parse()
            .map_err(|_| de::Error::custom(format!("'{raw}' is not a numeric id"))),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrimFlowerRequest {
    #[serde(deserialize_with = "numeric_id")]
    pub flower_id: i64,
    #[serde(deserialize_with = "numeric_id")]
    pub vase_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeWaterRequest {
    #[serde(deserialize_with = "numeric_id")]
    pub vase_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddFlowerRequest {
    #[serde(rename = "type")]
    pub flower_type: String,
}

/// Body of every JSON action endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flower_id: Option<FlowerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl ActionResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            flower_id: None,
            error: None,
        }
    }

    pub fn created(flower_id: FlowerId) -> Self {
        Self {
            flower_id: Some(flower_id),
            ..Self::ok()
        }
    }

    pub fn failed(error: ApiError) -> Self {
        Self {
            success: false,
            flower_id: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminStats {
    pub total_flowers: i64,
    pub active_flowers: i64,
    pub flowers_in_vases: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowerTypeOption {
    pub value: String,
    pub display_name: String,
    pub lifespan_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminOverview {
    pub stats: AdminStats,
    pub flower_types: Vec<FlowerTypeOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_flower_id: Option<FlowerId>,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
