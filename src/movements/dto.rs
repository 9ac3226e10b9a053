use serde::Deserialize;

use crate::movements::repo::{MovementReason, MovementType};

/// Body of POST /products/:id/movements. For `ajuste`, `quantity` is the
/// absolute target count; for every other type it is the delta magnitude.
#[derive(Debug, Deserialize)]
pub struct RecordMovementRequest {
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub quantity: i32,
    pub reason: MovementReason,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub cost: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}
