use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A locked payroll run for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PayrollPeriod {
    pub id: u64,
    #[schema(example = 2025)]
    pub year: i32,
    #[schema(example = 3)]
    pub month: u32,
    #[schema(example = "2025-02-26")]
    pub period_start: NaiveDate,
    #[schema(example = "2025-03-26")]
    pub period_end: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// History row: a period and how many snapshots it holds.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct PayrollPeriodSummary {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub period: PayrollPeriod,
    pub item_count: i64,
}

/// One employee's computed payroll, with every monetary value rounded to
/// whole currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PayrollLine {
    pub employee_id: u64,
    pub total_salary: i64,
    pub is_full_salary_payroll: bool,
    pub scheduled_working_days: u32,
    pub working_days: u32,
    pub off_days: u32,
    pub absent_days: u32,
    pub late_count: u32,
    pub total_late_minutes: u32,
    pub total_work_minutes: u32,
    pub loan_installment: i64,
    pub base_salary: i64,
    pub position_allowance: i64,
    pub transport_allowance: i64,
    pub meal_allowance: i64,
    pub health_allowance: i64,
    pub gross_before_penalty: i64,
    pub late_penalty: i64,
    pub extra_deduction: i64,
    pub extra_addition: i64,
    /// Take-home pay.
    pub thp: i64,
}

/// Persisted, immutable snapshot of a [`PayrollLine`] within a locked period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow, ToSchema)]
pub struct PayrollItem {
    pub id: u64,
    pub payroll_period_id: u64,
    pub employee_name: String,
    pub company_id: String,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub line: PayrollLine,
}

/// Preview row: the same computation as a lock, without persistence.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PreviewRow {
    pub company_id: String,
    pub name: String,
    #[schema(nullable = true)]
    pub job_title: Option<String>,
    #[schema(nullable = true)]
    pub job_level: Option<String>,
    #[serde(flatten)]
    pub line: PayrollLine,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PeriodDetail {
    #[serde(flatten)]
    pub period: PayrollPeriod,
    pub items: Vec<PayrollItem>,
}

/// Caller-supplied manual adjustment, applied to one lock only.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
pub struct Adjustment {
    #[schema(example = 1001)]
    pub employee_id: u64,
    #[serde(default)]
    #[schema(example = 50000.0)]
    pub extra_deduction: f64,
    #[serde(default)]
    #[schema(example = 0.0)]
    pub extra_addition: f64,
}

/// One employee's full breakdown for one locked period.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PayslipDetail {
    pub period: PayrollPeriod,
    pub item: PayrollItem,
}

/// An employee's view of one locked period.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Payslip {
    pub period_id: u64,
    pub year: i32,
    pub month: u32,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub processed_at: DateTime<Utc>,
    pub thp: i64,
}
