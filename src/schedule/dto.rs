use serde::{Deserialize, Serialize};

use super::grid::ScheduleMap;
use crate::notices::Notice;

#[derive(Debug, Deserialize)]
pub struct UpdateScheduleRequest {
    #[serde(default)]
    pub schedule: ScheduleMap,
}

#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub schedule: ScheduleMap,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<Notice>,
}
