//! Persistence for payroll runs and the loan ledger.
//!
//! Lock and unlock each run as one transaction: either every write lands or
//! none does.

#[cfg(test)]
pub mod memory;
pub mod mysql;

use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::{lock::{LockPlan, PayrollInputs}, period::PayMonth};
use crate::error::PayrollError;
use crate::model::{
    loan::{EmployeeLoan, LoanPaymentDetail, LoanUpdate, NewLoan},
    payroll::{PayrollItem, PayrollPeriod, PayrollPeriodSummary, Payslip},
};

pub use mysql::MySqlStore;

/// What an unlock removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UnlockOutcome {
    pub period: PayrollPeriod,
    pub reversed_payments: usize,
    pub removed_items: usize,
}

#[allow(async_fn_in_trait)]
pub trait PayrollStore {
    /// Roster, schedules inside the window, and active loans.
    async fn load_inputs(&self, month: &PayMonth) -> Result<PayrollInputs, PayrollError>;

    async fn find_period(&self, year: i32, month: u32) -> Result<Option<PayrollPeriod>, PayrollError>;

    /// Writes the period, its items, its loan payments and the loan counter
    /// advances in one transaction. A period that already exists for the
    /// month yields [`PayrollError::Conflict`]; a loan whose counters moved
    /// since the plan was built yields [`PayrollError::Integrity`].
    async fn commit_lock(&self, plan: &LockPlan) -> Result<PayrollPeriod, PayrollError>;

    /// Rewinds the period's loan payments and deletes payments, items and the
    /// period in one transaction.
    async fn commit_unlock(&self, period_id: u64) -> Result<UnlockOutcome, PayrollError>;

    /// Newest first.
    async fn list_periods(&self) -> Result<Vec<PayrollPeriodSummary>, PayrollError>;

    async fn get_period(&self, period_id: u64) -> Result<Option<PayrollPeriod>, PayrollError>;

    /// Ordered by employee name.
    async fn period_items(&self, period_id: u64) -> Result<Vec<PayrollItem>, PayrollError>;

    async fn payslips(&self, employee_id: u64, year: Option<i32>) -> Result<Vec<Payslip>, PayrollError>;

    /// The employee's snapshot in one period, if they were paid in it.
    async fn payslip(&self, employee_id: u64, period_id: u64) -> Result<Option<PayrollItem>, PayrollError>;

    async fn employee_exists(&self, employee_id: u64) -> Result<bool, PayrollError>;

    /// Newest first.
    async fn list_loans(&self, employee_id: Option<u64>) -> Result<Vec<EmployeeLoan>, PayrollError>;

    async fn get_loan(&self, loan_id: u64) -> Result<Option<EmployeeLoan>, PayrollError>;

    async fn loan_payments(&self, loan_id: u64) -> Result<Vec<LoanPaymentDetail>, PayrollError>;

    async fn insert_loan(&self, loan: &NewLoan) -> Result<EmployeeLoan, PayrollError>;

    async fn update_loan(&self, loan_id: u64, update: &LoanUpdate) -> Result<Option<EmployeeLoan>, PayrollError>;

    /// Deletes the loan only while no payment references it. Returns whether
    /// a row was removed.
    async fn delete_loan(&self, loan_id: u64) -> Result<bool, PayrollError>;
}
