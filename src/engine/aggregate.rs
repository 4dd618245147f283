use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::engine::{
    period::PayMonth,
    time_calc::{clock_of, lateness_minutes, worked_minutes},
};
use crate::model::{employee::RosterEntry, schedule::ScheduleEntry};

/// Day and minute counters for one employee over one pay window.
///
/// `scheduled_working_days == working_days + absent_days` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct AttendanceSummary {
    pub off_days: u32,
    pub scheduled_working_days: u32,
    /// Days present.
    pub working_days: u32,
    pub absent_days: u32,
    pub late_count: u32,
    pub total_late_minutes: u32,
    pub total_work_minutes: u32,
}

impl AttendanceSummary {
    /// Folds one schedule day into the counters.
    pub fn record(&mut self, entry: &ScheduleEntry) {
        let shift = &entry.shift;
        if shift.is_day_off {
            self.off_days += 1;
            return;
        }

        self.scheduled_working_days += 1;

        let attendance = entry.attendance.as_ref();
        let Some(time_in) = attendance.and_then(|a| a.time_in.as_ref()).map(clock_of) else {
            self.absent_days += 1;
            return;
        };
        let time_out = attendance.and_then(|a| a.time_out.as_ref()).map(clock_of);

        self.working_days += 1;

        let late = match (shift.start_time.as_deref(), shift.end_time.as_deref()) {
            (Some(start), Some(end)) => {
                lateness_minutes(start, end, &time_in, shift.grace_period_minutes)
            }
            _ => 0,
        };
        if late > 0 {
            self.late_count += 1;
            self.total_late_minutes += late;
        }

        if let Some(time_out) = time_out {
            self.total_work_minutes += worked_minutes(&time_in, &time_out);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct EmployeeAggregate {
    #[serde(flatten)]
    pub employee: RosterEntry,
    #[serde(flatten)]
    pub summary: AttendanceSummary,
}

/// Accumulates schedule days per employee. Seeded with the whole roster so
/// that employees without any schedule in the window still get a row.
#[derive(Debug, Default)]
pub struct PeriodAggregator {
    by_employee: BTreeMap<u64, EmployeeAggregate>,
}

impl PeriodAggregator {
    pub fn seeded<'a>(roster: impl IntoIterator<Item = &'a RosterEntry>) -> Self {
        let by_employee = roster
            .into_iter()
            .map(|employee| {
                (
                    employee.employee_id,
                    EmployeeAggregate {
                        employee: employee.clone(),
                        summary: AttendanceSummary::default(),
                    },
                )
            })
            .collect();

        Self { by_employee }
    }

    /// Returns false when the entry belongs to someone outside the roster.
    pub fn record(&mut self, entry: &ScheduleEntry) -> bool {
        match self.by_employee.get_mut(&entry.employee_id) {
            Some(aggregate) => {
                aggregate.summary.record(entry);
                true
            }
            None => false,
        }
    }

    /// Rows ordered by employee name, then id.
    pub fn finish(self) -> Vec<EmployeeAggregate> {
        let mut rows: Vec<_> = self.by_employee.into_values().collect();
        rows.sort_by(|a, b| {
            a.employee
                .name
                .cmp(&b.employee.name)
                .then(a.employee.employee_id.cmp(&b.employee.employee_id))
        });
        rows
    }
}

/// Aggregates every schedule day inside `month`'s window for the roster.
pub fn aggregate(
    month: &PayMonth,
    roster: &[RosterEntry],
    entries: &[ScheduleEntry],
) -> Vec<EmployeeAggregate> {
    let mut aggregator = PeriodAggregator::seeded(roster);

    for entry in entries.iter().filter(|e| month.contains(e.date)) {
        if !aggregator.record(entry) {
            warn!(
                employee_id = entry.employee_id,
                schedule_id = entry.id,
                "Schedule belongs to an employee outside the roster, skipped"
            );
        }
    }

    aggregator.finish()
}
