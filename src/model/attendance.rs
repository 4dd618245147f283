use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Clock-in/clock-out instants recorded against one schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendance {
    pub schedule_id: u64,
    pub time_in: Option<NaiveDateTime>,
    pub time_out: Option<NaiveDateTime>,
}
