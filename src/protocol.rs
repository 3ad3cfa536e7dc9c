
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Serialize)]
pub struct ResponseOk<T: Serialize> {
    pub id: String,
    pub result: T,
}

#[derive(Debug, Serialize)]
pub struct ResponseErr {
    pub id: String,
    pub error: String,
}

impl<T: Serialize> ResponseOk<T> {
    pub fn new(id: &str, result: T) -> Self {
        Self { id: id.to_string(), result }
    }

    pub fn into_value(self) -> anyhow::Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl ResponseErr {
    pub fn new(id: &str, error: impl std::fmt::Display) -> Self {
        Self {
            id: id.to_string(),
            error: error.to_string(),
        }
    }
}

/// Body of an `average` request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageParams {
    pub documents: Vec<Vec<String>>,
    /// Opaque positions echoed back so the caller can reassemble its stream.
    #[serde(default)]
    pub segment_numbers: Option<Vec<Value>>,
    /// Dimension the caller expects; must match the loaded table.
    #[serde(default)]
    pub dimension: Option<usize>,
}
