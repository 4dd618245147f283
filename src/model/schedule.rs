use chrono::NaiveDate;

use crate::model::{attendance::Attendance, shift::Shift};

/// One employee's shift assignment for one calendar day, joined with the
/// shift template and whatever attendance was recorded for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub id: u64,
    pub employee_id: u64,
    pub date: NaiveDate,
    pub shift: Shift,
    pub attendance: Option<Attendance>,
}
