use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A reusable work template. Day-off shifts carry no times and no grace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Shift {
    pub id: u64,
    #[schema(example = "Morning")]
    pub name: String,
    #[schema(example = "08:00", nullable = true)]
    pub start_time: Option<String>,
    #[schema(example = "17:00", nullable = true)]
    pub end_time: Option<String>,
    #[schema(example = 15)]
    pub grace_period_minutes: u32,
    pub is_day_off: bool,
}

#[cfg(test)]
impl Shift {
    pub fn working(id: u64, name: &str, start: &str, end: &str, grace_period_minutes: u32) -> Self {
        Self {
            id,
            name: name.to_string(),
            start_time: Some(start.to_string()),
            end_time: Some(end.to_string()),
            grace_period_minutes,
            is_day_off: false,
        }
    }

    pub fn day_off(id: u64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            start_time: None,
            end_time: None,
            grace_period_minutes: 0,
            is_day_off: true,
        }
    }
}
