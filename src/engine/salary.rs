//! Salary breakdown for one employee over one pay window.
//!
//! Values stay `f64` here. Rounding to whole currency units happens once,
//! when a [`PayrollLine`] snapshot is taken.

use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, EnumIter};

use crate::engine::aggregate::AttendanceSummary;
use crate::model::payroll::{Adjustment, PayrollLine};

/// Nominal working days in one pay cycle.
pub const NOMINAL_WORKING_DAYS: f64 = 26.0;

/// Share of total salary deducted per block of lateness.
pub const LATE_PENALTY_RATE: f64 = 0.01;
pub const LATE_BLOCK_MINUTES: f64 = 30.0;

/// The fixed parts a job's total salary is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SalaryComponent {
    BaseSalary,
    PositionAllowance,
    TransportAllowance,
    MealAllowance,
    HealthAllowance,
}

impl SalaryComponent {
    pub fn share(self) -> f64 {
        match self {
            Self::BaseSalary => 0.56,
            Self::PositionAllowance => 0.15,
            Self::TransportAllowance => 0.10,
            Self::MealAllowance => 0.14,
            Self::HealthAllowance => 0.05,
        }
    }

    /// Prorated components are paid per day present; the rest in full.
    pub fn is_prorated(self) -> bool {
        matches!(
            self,
            Self::BaseSalary | Self::TransportAllowance | Self::MealAllowance
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SalaryBreakdown {
    pub total_salary: f64,
    pub base_salary: f64,
    pub position_allowance: f64,
    pub transport_allowance: f64,
    pub meal_allowance: f64,
    pub health_allowance: f64,
    pub gross_before_penalty: f64,
    pub late_penalty: f64,
}

impl SalaryBreakdown {
    pub fn compute(total_salary: i64, full_salary: bool, summary: &AttendanceSummary) -> Self {
        let total = total_salary as f64;
        let amount = |component: SalaryComponent| total * component.share();

        let (gross_before_penalty, late_penalty) = if full_salary {
            (total, 0.0)
        } else {
            let days = summary.working_days as f64;
            let gross: f64 = SalaryComponent::iter()
                .map(|component| {
                    if component.is_prorated() {
                        amount(component) / NOMINAL_WORKING_DAYS * days
                    } else {
                        amount(component)
                    }
                })
                .sum();
            let blocks = summary.total_late_minutes as f64 / LATE_BLOCK_MINUTES;
            (gross, total * LATE_PENALTY_RATE * blocks)
        };

        Self {
            total_salary: total,
            base_salary: amount(SalaryComponent::BaseSalary),
            position_allowance: amount(SalaryComponent::PositionAllowance),
            transport_allowance: amount(SalaryComponent::TransportAllowance),
            meal_allowance: amount(SalaryComponent::MealAllowance),
            health_allowance: amount(SalaryComponent::HealthAllowance),
            gross_before_penalty,
            late_penalty,
        }
    }

    pub fn net_before_adjustment(&self) -> f64 {
        self.gross_before_penalty - self.late_penalty
    }

    pub fn take_home(&self, loan_installment: i64, adjustment: &Adjustment) -> f64 {
        self.net_before_adjustment() - loan_installment as f64 - adjustment.extra_deduction
            + adjustment.extra_addition
    }
}

fn whole(value: f64) -> i64 {
    value.round() as i64
}

/// Takes the rounded snapshot of one employee's payroll.
pub fn payroll_line(
    employee_id: u64,
    is_full_salary_payroll: bool,
    summary: &AttendanceSummary,
    breakdown: &SalaryBreakdown,
    loan_installment: i64,
    adjustment: &Adjustment,
) -> PayrollLine {
    PayrollLine {
        employee_id,
        total_salary: whole(breakdown.total_salary),
        is_full_salary_payroll,
        scheduled_working_days: summary.scheduled_working_days,
        working_days: summary.working_days,
        off_days: summary.off_days,
        absent_days: summary.absent_days,
        late_count: summary.late_count,
        total_late_minutes: summary.total_late_minutes,
        total_work_minutes: summary.total_work_minutes,
        loan_installment,
        base_salary: whole(breakdown.base_salary),
        position_allowance: whole(breakdown.position_allowance),
        transport_allowance: whole(breakdown.transport_allowance),
        meal_allowance: whole(breakdown.meal_allowance),
        health_allowance: whole(breakdown.health_allowance),
        gross_before_penalty: whole(breakdown.gross_before_penalty),
        late_penalty: whole(breakdown.late_penalty),
        extra_deduction: whole(adjustment.extra_deduction),
        extra_addition: whole(adjustment.extra_addition),
        thp: whole(breakdown.take_home(loan_installment, adjustment)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(working_days: u32, total_late_minutes: u32) -> AttendanceSummary {
        AttendanceSummary {
            scheduled_working_days: 26,
            working_days,
            absent_days: 26 - working_days,
            total_late_minutes,
            late_count: u32::from(total_late_minutes > 0),
            ..Default::default()
        }
    }

    #[test]
    fn component_shares_sum_to_one() {
        let total: f64 = SalaryComponent::iter().map(SalaryComponent::share).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(SalaryComponent::MealAllowance.as_ref(), "meal_allowance");
    }

    #[test]
    fn rounded_components_stay_within_tolerance_of_total() {
        for total in [0_i64, 1, 7, 99, 1_234_567, 4_999_999, 5_000_000, 12_345_678] {
            let b = SalaryBreakdown::compute(total, false, &summary(26, 0));
            let rounded = whole(b.base_salary)
                + whole(b.position_allowance)
                + whole(b.transport_allowance)
                + whole(b.meal_allowance)
                + whole(b.health_allowance);
            assert!((rounded - total).abs() <= 2, "total {total} rounded to {rounded}");
        }
    }

    #[test]
    fn full_attendance_pays_full_salary() {
        let b = SalaryBreakdown::compute(5_000_000, false, &summary(26, 0));
        assert!((b.gross_before_penalty - 5_000_000.0).abs() < 1e-6);
        assert_eq!(b.late_penalty, 0.0);
    }

    #[test]
    fn absence_prorates_only_daily_components() {
        let b = SalaryBreakdown::compute(2_600_000, false, &summary(13, 0));
        // base 1_456_000, transport 260_000, meal 364_000 halved; position and health in full.
        let expected = (1_456_000.0 + 260_000.0 + 364_000.0) / 2.0 + 390_000.0 + 130_000.0;
        assert!((b.gross_before_penalty - expected).abs() < 1e-6);
        assert!((b.base_salary - 1_456_000.0).abs() < 1e-6);
    }

    #[test]
    fn no_attendance_still_pays_fixed_allowances() {
        let b = SalaryBreakdown::compute(1_000_000, false, &summary(0, 0));
        assert!((b.gross_before_penalty - 200_000.0).abs() < 1e-6);
    }

    #[test]
    fn late_penalty_counts_partial_blocks_proportionally() {
        let b = SalaryBreakdown::compute(3_000_000, false, &summary(26, 45));
        // 1% of 3_000_000 per 30 minutes, 1.5 blocks.
        assert!((b.late_penalty - 45_000.0).abs() < 1e-6);
        assert!((b.net_before_adjustment() - 2_955_000.0).abs() < 1e-6);
    }

    #[test]
    fn full_salary_mode_ignores_attendance() {
        for s in [summary(0, 600), summary(10, 0), summary(26, 90)] {
            let b = SalaryBreakdown::compute(7_000_000, true, &s);
            assert_eq!(b.gross_before_penalty, 7_000_000.0);
            assert_eq!(b.late_penalty, 0.0);
        }
    }

    #[test]
    fn take_home_applies_loan_and_manual_adjustments() {
        let b = SalaryBreakdown::compute(5_000_000, true, &summary(26, 0));
        let adjustment = Adjustment {
            employee_id: 1,
            extra_deduction: 25_000.4,
            extra_addition: 10_000.0,
        };
        let line = payroll_line(1, true, &summary(26, 0), &b, 100_000, &adjustment);

        assert_eq!(line.gross_before_penalty, 5_000_000);
        assert_eq!(line.loan_installment, 100_000);
        assert_eq!(line.extra_deduction, 25_000);
        assert_eq!(line.thp, 5_000_000 - 100_000 - 25_000 + 10_000);
    }

    #[test]
    fn snapshot_rounds_only_at_the_end() {
        // 1_000_001 / 26 * 25 for each prorated part would drift if rounded early.
        let b = SalaryBreakdown::compute(1_000_001, false, &summary(25, 7));
        let line = payroll_line(1, false, &summary(25, 7), &b, 0, &Adjustment::default());
        assert_eq!(line.thp, (b.gross_before_penalty - b.late_penalty).round() as i64);
        assert_eq!(line.gross_before_penalty, b.gross_before_penalty.round() as i64);
    }
}
