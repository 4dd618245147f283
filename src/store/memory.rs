//! In-process store used by the service tests. Commits work on a copy of
//! the state and swap it in only when every write succeeded.

use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::engine::{
    loan_ledger,
    lock::{LockPlan, PayrollInputs},
    period::PayMonth,
};
use crate::error::PayrollError;
use crate::model::{
    employee::RosterEntry,
    loan::{EmployeeLoan, EmployeeLoanPayment, LoanPaymentDetail, LoanUpdate, NewLoan},
    payroll::{PayrollItem, PayrollPeriod, PayrollPeriodSummary, Payslip},
    schedule::ScheduleEntry,
};
use crate::store::{PayrollStore, UnlockOutcome};

/// Where a commit should be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// After the period and its items are written, before any loan moves.
    AfterItems,
    /// After the first loan charge is applied.
    AfterFirstCharge,
}

#[derive(Debug, Clone, Default)]
pub struct State {
    pub roster: Vec<RosterEntry>,
    pub schedules: Vec<ScheduleEntry>,
    pub loans: Vec<EmployeeLoan>,
    pub payments: Vec<EmployeeLoanPayment>,
    pub periods: Vec<PayrollPeriod>,
    pub items: Vec<PayrollItem>,
    next_id: u64,
    clock: i64,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// A strictly increasing timestamp so "newest first" orderings are stable.
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(self.clock)
    }

    fn employee(&self, employee_id: u64) -> Option<&RosterEntry> {
        self.roster.iter().find(|e| e.employee_id == employee_id)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fault: Mutex<Option<Fault>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roster(self, roster: Vec<RosterEntry>) -> Self {
        self.state.lock().unwrap().roster = roster;
        self
    }

    pub fn with_schedules(self, schedules: Vec<ScheduleEntry>) -> Self {
        self.state.lock().unwrap().schedules = schedules;
        self
    }

    /// Seeds an existing loan, keeping its id.
    pub fn with_loan(self, loan: EmployeeLoan) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.next_id = state.next_id.max(loan.id);
            state.loans.push(loan);
        }
        self
    }

    /// Fails the next commit at `fault`.
    pub fn fail_next_commit(&self, fault: Fault) {
        *self.fault.lock().unwrap() = Some(fault);
    }

    pub fn snapshot(&self) -> State {
        self.state.lock().unwrap().clone()
    }

    pub fn loan(&self, loan_id: u64) -> EmployeeLoan {
        self.snapshot()
            .loans
            .into_iter()
            .find(|l| l.id == loan_id)
            .unwrap()
    }

    /// Writes a loan directly, as another process would.
    pub fn set_loan(&self, loan: EmployeeLoan) {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.loans.iter_mut().find(|l| l.id == loan.id) {
            *existing = loan;
        }
    }

    fn injected(&self, at: Fault) -> Result<(), PayrollError> {
        let mut fault = self.fault.lock().unwrap();
        if *fault == Some(at) {
            *fault = None;
            return Err(PayrollError::Integrity(format!("injected failure {at:?}")));
        }
        Ok(())
    }
}

impl PayrollStore for MemoryStore {
    async fn load_inputs(&self, month: &PayMonth) -> Result<PayrollInputs, PayrollError> {
        let state = self.state.lock().unwrap();
        Ok(PayrollInputs {
            roster: state.roster.clone(),
            schedules: state
                .schedules
                .iter()
                .filter(|s| month.contains(s.date))
                .cloned()
                .collect(),
            loans: state.loans.iter().filter(|l| l.is_active).cloned().collect(),
        })
    }

    async fn find_period(&self, year: i32, month: u32) -> Result<Option<PayrollPeriod>, PayrollError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .periods
            .iter()
            .find(|p| p.year == year && p.month == month)
            .cloned())
    }

    async fn commit_lock(&self, plan: &LockPlan) -> Result<PayrollPeriod, PayrollError> {
        let mut guard = self.state.lock().unwrap();
        let mut state = guard.clone();
        let month = plan.month();

        if state
            .periods
            .iter()
            .any(|p| p.year == month.year() && p.month == month.month())
        {
            return Err(PayrollError::Conflict {
                year: month.year(),
                month: month.month(),
            });
        }

        let created_at = state.tick();
        let period = PayrollPeriod {
            id: state.next_id(),
            year: month.year(),
            month: month.month(),
            period_start: month.start(),
            period_end: month.end(),
            created_at,
        };
        state.periods.push(period.clone());

        for line in plan.items() {
            let employee = state
                .employee(line.employee_id)
                .cloned()
                .ok_or_else(|| PayrollError::Integrity(format!("employee {} is gone", line.employee_id)))?;
            let id = state.next_id();
            state.items.push(PayrollItem {
                id,
                payroll_period_id: period.id,
                employee_name: employee.name,
                company_id: employee.company_id,
                line: line.clone(),
            });
        }
        self.injected(Fault::AfterItems)?;

        for (n, charge) in plan.charges().iter().enumerate() {
            let loan = state
                .loans
                .iter_mut()
                .find(|l| {
                    l.id == charge.loan_id
                        && l.is_active
                        && l.paid_months == charge.expected_paid_months
                })
                .ok_or_else(|| {
                    PayrollError::Integrity(format!(
                        "loan {} changed while period {month} was being locked",
                        charge.loan_id
                    ))
                })?;
            loan.paid_months = charge.paid_months;
            loan.is_active = !charge.settles;

            let id = state.next_id();
            state.payments.push(EmployeeLoanPayment {
                id,
                employee_loan_id: charge.loan_id,
                payroll_period_id: period.id,
                amount: charge.amount,
                settled_loan: charge.settles,
                created_at,
            });
            if n == 0 {
                self.injected(Fault::AfterFirstCharge)?;
            }
        }

        *guard = state;
        Ok(period)
    }

    async fn commit_unlock(&self, period_id: u64) -> Result<UnlockOutcome, PayrollError> {
        let mut guard = self.state.lock().unwrap();
        let mut state = guard.clone();

        let period = state
            .periods
            .iter()
            .find(|p| p.id == period_id)
            .cloned()
            .ok_or_else(|| PayrollError::not_found("payroll period", period_id))?;

        let payments: Vec<_> = state
            .payments
            .iter()
            .filter(|p| p.payroll_period_id == period_id)
            .cloned()
            .collect();

        for reversal in loan_ledger::reverse(&payments) {
            let rewound = state
                .loans
                .iter_mut()
                .find(|l| l.id == reversal.loan_id)
                .is_some_and(|loan| reversal.rewind(loan));
            if !rewound {
                return Err(PayrollError::Integrity(format!(
                    "loan {} cannot be rewound by {} payment(s)",
                    reversal.loan_id, reversal.payments
                )));
            }
        }

        state.payments.retain(|p| p.payroll_period_id != period_id);
        let before = state.items.len();
        state.items.retain(|i| i.payroll_period_id != period_id);
        let removed_items = before - state.items.len();
        state.periods.retain(|p| p.id != period_id);

        *guard = state;
        Ok(UnlockOutcome {
            period,
            reversed_payments: payments.len(),
            removed_items,
        })
    }

    async fn list_periods(&self) -> Result<Vec<PayrollPeriodSummary>, PayrollError> {
        let state = self.state.lock().unwrap();
        let mut periods: Vec<_> = state
            .periods
            .iter()
            .map(|p| PayrollPeriodSummary {
                period: p.clone(),
                item_count: state.items.iter().filter(|i| i.payroll_period_id == p.id).count() as i64,
            })
            .collect();
        periods.sort_by(|a, b| (b.period.year, b.period.month).cmp(&(a.period.year, a.period.month)));
        Ok(periods)
    }

    async fn get_period(&self, period_id: u64) -> Result<Option<PayrollPeriod>, PayrollError> {
        let state = self.state.lock().unwrap();
        Ok(state.periods.iter().find(|p| p.id == period_id).cloned())
    }

    async fn period_items(&self, period_id: u64) -> Result<Vec<PayrollItem>, PayrollError> {
        let state = self.state.lock().unwrap();
        let mut items: Vec<_> = state
            .items
            .iter()
            .filter(|i| i.payroll_period_id == period_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            (&a.employee_name, a.line.employee_id).cmp(&(&b.employee_name, b.line.employee_id))
        });
        Ok(items)
    }

    async fn payslips(&self, employee_id: u64, year: Option<i32>) -> Result<Vec<Payslip>, PayrollError> {
        let state = self.state.lock().unwrap();
        let mut payslips: Vec<_> = state
            .items
            .iter()
            .filter(|i| i.line.employee_id == employee_id)
            .filter_map(|i| {
                state
                    .periods
                    .iter()
                    .find(|p| p.id == i.payroll_period_id)
                    .map(|p| (p, i.line.thp))
            })
            .filter(|(p, _)| year.is_none_or(|y| p.year == y))
            .map(|(p, thp)| Payslip {
                period_id: p.id,
                year: p.year,
                month: p.month,
                period_start: p.period_start,
                period_end: p.period_end,
                processed_at: p.created_at,
                thp,
            })
            .collect();
        payslips.sort_by(|a, b| (b.year, b.month).cmp(&(a.year, a.month)));
        Ok(payslips)
    }

    async fn payslip(&self, employee_id: u64, period_id: u64) -> Result<Option<PayrollItem>, PayrollError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .items
            .iter()
            .find(|i| i.payroll_period_id == period_id && i.line.employee_id == employee_id)
            .cloned())
    }

    async fn employee_exists(&self, employee_id: u64) -> Result<bool, PayrollError> {
        Ok(self.state.lock().unwrap().employee(employee_id).is_some())
    }

    async fn list_loans(&self, employee_id: Option<u64>) -> Result<Vec<EmployeeLoan>, PayrollError> {
        let state = self.state.lock().unwrap();
        let mut loans: Vec<_> = state
            .loans
            .iter()
            .filter(|l| employee_id.is_none_or(|id| l.employee_id == id))
            .cloned()
            .collect();
        loans.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(loans)
    }

    async fn get_loan(&self, loan_id: u64) -> Result<Option<EmployeeLoan>, PayrollError> {
        let state = self.state.lock().unwrap();
        Ok(state.loans.iter().find(|l| l.id == loan_id).cloned())
    }

    async fn loan_payments(&self, loan_id: u64) -> Result<Vec<LoanPaymentDetail>, PayrollError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .payments
            .iter()
            .filter(|p| p.employee_loan_id == loan_id)
            .filter_map(|p| {
                let period = state.periods.iter().find(|pp| pp.id == p.payroll_period_id)?;
                Some(LoanPaymentDetail {
                    payment: p.clone(),
                    year: period.year,
                    month: period.month,
                    period_start: period.period_start,
                    period_end: period.period_end,
                })
            })
            .collect())
    }

    async fn insert_loan(&self, loan: &NewLoan) -> Result<EmployeeLoan, PayrollError> {
        let mut state = self.state.lock().unwrap();
        let created_at = state.tick();
        let created = EmployeeLoan {
            id: state.next_id(),
            employee_id: loan.employee_id,
            loan_date: loan.loan_date,
            amount: loan.amount,
            months: loan.months,
            installment: loan.installment,
            paid_months: 0,
            is_active: true,
            description: loan.description.clone(),
            created_at,
        };
        state.loans.push(created.clone());
        Ok(created)
    }

    async fn update_loan(&self, loan_id: u64, update: &LoanUpdate) -> Result<Option<EmployeeLoan>, PayrollError> {
        let mut state = self.state.lock().unwrap();
        let Some(loan) = state.loans.iter_mut().find(|l| l.id == loan_id) else {
            return Ok(None);
        };
        if let Some(is_active) = update.is_active {
            loan.is_active = is_active;
        }
        if let Some(description) = &update.description {
            loan.description = description.clone();
        }
        Ok(Some(loan.clone()))
    }

    async fn delete_loan(&self, loan_id: u64) -> Result<bool, PayrollError> {
        let mut state = self.state.lock().unwrap();
        if state.payments.iter().any(|p| p.employee_loan_id == loan_id) {
            return Ok(false);
        }
        let before = state.loans.len();
        state.loans.retain(|l| l.id != loan_id);
        Ok(state.loans.len() < before)
    }
}

/// A date in the March 2025 pay window.
pub fn march(day: u32) -> NaiveDate {
    if day >= 26 {
        NaiveDate::from_ymd_opt(2025, 2, day).unwrap()
    } else {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }
}
