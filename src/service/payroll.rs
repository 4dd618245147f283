use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info, instrument};
use utoipa::ToSchema;

use crate::engine::{aggregate::EmployeeAggregate, lock::LockPlan, period::PayMonth};
use crate::error::PayrollError;
use crate::model::payroll::{
    Adjustment, PayrollPeriod, PayrollPeriodSummary, Payslip, PayslipDetail, PeriodDetail,
    PreviewRow,
};
use crate::store::{PayrollStore, UnlockOutcome};

/// Rows computed for one pay window.
#[derive(Debug, Serialize, ToSchema)]
#[aliases(
    PreviewReport = MonthlyReport<PreviewRow>,
    AttendanceReport = MonthlyReport<EmployeeAggregate>
)]
pub struct MonthlyReport<T> {
    #[schema(example = "2025-03")]
    pub month: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub rows: Vec<T>,
}

impl<T> MonthlyReport<T> {
    fn new(month: &PayMonth, rows: Vec<T>) -> Self {
        Self {
            month: month.to_string(),
            period_start: month.start(),
            period_end: month.end(),
            rows,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LockReceipt {
    pub period: PayrollPeriod,
    pub item_count: usize,
    pub loan_payments: usize,
}

/// Computes the month's payroll without writing anything.
#[instrument(skip(store))]
pub async fn preview<S: PayrollStore>(store: &S, month: &str) -> Result<PreviewReport, PayrollError> {
    let month: PayMonth = month.parse()?;
    let inputs = store.load_inputs(&month).await?;

    Ok(MonthlyReport::new(&month, inputs.preview(&month)))
}

/// Attendance counters for the month, without salary computation.
#[instrument(skip(store))]
pub async fn attendance_summary<S: PayrollStore>(
    store: &S,
    month: &str,
) -> Result<AttendanceReport, PayrollError> {
    let month: PayMonth = month.parse()?;
    let inputs = store.load_inputs(&month).await?;

    Ok(MonthlyReport::new(&month, inputs.summaries(&month)))
}

/// Freezes the month: one snapshot per employee plus one installment per
/// chargeable loan, committed atomically.
#[instrument(skip(store, adjustments), fields(adjustments = adjustments.len()))]
pub async fn lock_period<S: PayrollStore>(
    store: &S,
    month: &str,
    adjustments: Vec<Adjustment>,
) -> Result<LockReceipt, PayrollError> {
    let month: PayMonth = month.parse()?;

    if store.find_period(month.year(), month.month()).await?.is_some() {
        return Err(PayrollError::Conflict {
            year: month.year(),
            month: month.month(),
        });
    }

    let inputs = store.load_inputs(&month).await?;
    let plan = LockPlan::prepare(month, &inputs, adjustments)?;

    let period = store.commit_lock(&plan).await.map_err(|e| {
        error!(error = %e, month = %month, "Payroll lock failed");
        e
    })?;

    info!(
        period_id = period.id,
        month = %month,
        items = plan.items().len(),
        loan_payments = plan.charges().len(),
        "Payroll period locked"
    );

    Ok(LockReceipt {
        period,
        item_count: plan.items().len(),
        loan_payments: plan.charges().len(),
    })
}

/// Removes a locked period and rewinds the loan installments it collected.
#[instrument(skip(store))]
pub async fn unlock_period<S: PayrollStore>(
    store: &S,
    period_id: u64,
) -> Result<UnlockOutcome, PayrollError> {
    let outcome = store.commit_unlock(period_id).await.map_err(|e| {
        if !matches!(e, PayrollError::NotFound { .. }) {
            error!(error = %e, "Payroll unlock failed");
        }
        e
    })?;

    info!(
        year = outcome.period.year,
        month = outcome.period.month,
        reversed_payments = outcome.reversed_payments,
        removed_items = outcome.removed_items,
        "Payroll period unlocked"
    );

    Ok(outcome)
}

pub async fn list_periods<S: PayrollStore>(store: &S) -> Result<Vec<PayrollPeriodSummary>, PayrollError> {
    store.list_periods().await
}

pub async fn period_detail<S: PayrollStore>(store: &S, period_id: u64) -> Result<PeriodDetail, PayrollError> {
    let period = store
        .get_period(period_id)
        .await?
        .ok_or_else(|| PayrollError::not_found("payroll period", period_id))?;
    let items = store.period_items(period_id).await?;

    Ok(PeriodDetail { period, items })
}

pub async fn payslips<S: PayrollStore>(
    store: &S,
    employee_id: u64,
    year: Option<i32>,
) -> Result<Vec<Payslip>, PayrollError> {
    if let Some(year) = year.filter(|y| !(1..=9999).contains(y)) {
        return Err(PayrollError::validation(format!("year {year} is out of range")));
    }
    if !store.employee_exists(employee_id).await? {
        return Err(PayrollError::not_found("employee", employee_id));
    }

    store.payslips(employee_id, year).await
}

/// One employee's full breakdown for one locked period.
pub async fn payslip_detail<S: PayrollStore>(
    store: &S,
    employee_id: u64,
    period_id: u64,
) -> Result<PayslipDetail, PayrollError> {
    let period = store
        .get_period(period_id)
        .await?
        .ok_or_else(|| PayrollError::not_found("payroll period", period_id))?;
    let item = store
        .payslip(employee_id, period_id)
        .await?
        .ok_or_else(|| PayrollError::not_found("payslip", period_id))?;

    Ok(PayslipDetail { period, item })
}
