//! Everything a payroll lock writes, gathered before any of it is written.
//!
//! A [`LockPlan`] holds the period window, one snapshot per employee and one
//! charge per loan. The store commits a plan as a single transaction; the
//! unlock path is its inverse and rewinds the charges through
//! [`loan_ledger::reverse`](crate::engine::loan_ledger::reverse).

use std::collections::{HashMap, HashSet};

use crate::engine::{
    aggregate::{EmployeeAggregate, aggregate},
    loan_ledger::{LoanCharge, LoanLedger},
    period::PayMonth,
    salary::{SalaryBreakdown, payroll_line},
};
use crate::error::PayrollError;
use crate::model::{
    employee::RosterEntry,
    loan::EmployeeLoan,
    payroll::{Adjustment, PayrollLine, PreviewRow},
    schedule::ScheduleEntry,
};

/// The raw data one pay window is computed from.
#[derive(Debug, Clone, Default)]
pub struct PayrollInputs {
    pub roster: Vec<RosterEntry>,
    pub schedules: Vec<ScheduleEntry>,
    /// Active loans.
    pub loans: Vec<EmployeeLoan>,
}

impl PayrollInputs {
    pub fn summaries(&self, month: &PayMonth) -> Vec<EmployeeAggregate> {
        aggregate(month, &self.roster, &self.schedules)
    }

    /// Runs the whole computation without adjustments and without side effects.
    pub fn preview(&self, month: &PayMonth) -> Vec<PreviewRow> {
        let ledger = LoanLedger::new(self.loans.iter().cloned());
        let none = Adjustment::default();

        self.summaries(month)
            .into_iter()
            .map(|row| {
                let line = compute_line(&row, &ledger, &none);
                PreviewRow {
                    company_id: row.employee.company_id,
                    name: row.employee.name,
                    job_title: row.employee.job_title,
                    job_level: row.employee.job_level,
                    line,
                }
            })
            .collect()
    }
}

fn compute_line(row: &EmployeeAggregate, ledger: &LoanLedger, adjustment: &Adjustment) -> PayrollLine {
    let employee = &row.employee;
    let breakdown = SalaryBreakdown::compute(
        employee.total_salary,
        employee.is_full_salary_payroll,
        &row.summary,
    );

    payroll_line(
        employee.employee_id,
        employee.is_full_salary_payroll,
        &row.summary,
        &breakdown,
        ledger.installment_for(employee.employee_id),
        adjustment,
    )
}

#[derive(Debug, Clone)]
pub struct LockPlan {
    month: PayMonth,
    items: Vec<PayrollLine>,
    charges: Vec<LoanCharge>,
}

impl LockPlan {
    pub fn builder(month: PayMonth) -> LockPlanBuilder {
        LockPlanBuilder {
            month,
            adjustments: HashMap::new(),
            items: Vec::new(),
            charges: Vec::new(),
        }
    }

    /// Computes the full plan for `month` from `inputs`.
    pub fn prepare(
        month: PayMonth,
        inputs: &PayrollInputs,
        adjustments: Vec<Adjustment>,
    ) -> Result<Self, PayrollError> {
        let ledger = LoanLedger::new(inputs.loans.iter().cloned());

        LockPlan::builder(month)
            .adjustments(adjustments, &inputs.roster)?
            .compute(&inputs.summaries(&month), &ledger)
            .charges(ledger.charges())
            .build()
    }

    pub fn month(&self) -> &PayMonth {
        &self.month
    }

    pub fn items(&self) -> &[PayrollLine] {
        &self.items
    }

    pub fn charges(&self) -> &[LoanCharge] {
        &self.charges
    }
}

pub struct LockPlanBuilder {
    month: PayMonth,
    adjustments: HashMap<u64, Adjustment>,
    items: Vec<PayrollLine>,
    charges: Vec<LoanCharge>,
}

impl LockPlanBuilder {
    /// Registers manual adjustments. Each must name a roster employee, carry
    /// non-negative finite amounts, and appear at most once.
    pub fn adjustments(
        mut self,
        adjustments: Vec<Adjustment>,
        roster: &[RosterEntry],
    ) -> Result<Self, PayrollError> {
        let known: HashSet<u64> = roster.iter().map(|e| e.employee_id).collect();

        for adjustment in adjustments {
            let id = adjustment.employee_id;
            if !known.contains(&id) {
                return Err(PayrollError::validation(format!(
                    "adjustment references unknown employee {id}"
                )));
            }
            for (field, value) in [
                ("extra_deduction", adjustment.extra_deduction),
                ("extra_addition", adjustment.extra_addition),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(PayrollError::validation(format!(
                        "{field} for employee {id} must be a non-negative amount"
                    )));
                }
            }
            if self.adjustments.insert(id, adjustment).is_some() {
                return Err(PayrollError::validation(format!(
                    "employee {id} has more than one adjustment"
                )));
            }
        }

        Ok(self)
    }

    /// Adds one snapshot per aggregate row, merging registered adjustments.
    pub fn compute(mut self, rows: &[EmployeeAggregate], ledger: &LoanLedger) -> Self {
        let none = Adjustment::default();
        for row in rows {
            let adjustment = self
                .adjustments
                .get(&row.employee.employee_id)
                .unwrap_or(&none);
            self.items.push(compute_line(row, ledger, adjustment));
        }
        self
    }

    #[cfg(test)]
    pub fn item(mut self, line: PayrollLine) -> Self {
        self.items.push(line);
        self
    }

    pub fn charges(mut self, charges: Vec<LoanCharge>) -> Self {
        self.charges.extend(charges);
        self
    }

    /// Checks the plan is internally consistent: one item per employee, one
    /// charge per loan, and every charge deducted from its employee's item.
    pub fn build(self) -> Result<LockPlan, PayrollError> {
        let mut items_by_employee = HashMap::new();
        for item in &self.items {
            if items_by_employee.insert(item.employee_id, item).is_some() {
                return Err(PayrollError::Integrity(format!(
                    "employee {} appears twice in period {}",
                    item.employee_id, self.month
                )));
            }
        }

        let mut charged: HashMap<u64, i64> = HashMap::new();
        let mut loans = HashSet::new();
        for charge in &self.charges {
            if !loans.insert(charge.loan_id) {
                return Err(PayrollError::Integrity(format!(
                    "loan {} is charged twice in period {}",
                    charge.loan_id, self.month
                )));
            }
            *charged.entry(charge.employee_id).or_insert(0) += charge.amount;
        }

        for (employee_id, amount) in charged {
            let deducted = items_by_employee
                .get(&employee_id)
                .map(|item| item.loan_installment);
            if deducted != Some(amount) {
                return Err(PayrollError::Integrity(format!(
                    "loan charges for employee {employee_id} do not match the payroll deduction"
                )));
            }
        }

        Ok(LockPlan {
            month: self.month,
            items: self.items,
            charges: self.charges,
        })
    }
}
