use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct EmployeeLoan {
    pub id: u64,
    pub employee_id: u64,
    pub loan_date: NaiveDate,
    #[schema(example = 1200000)]
    pub amount: i64,
    #[schema(example = 12)]
    pub months: u32,
    #[schema(example = 100000)]
    pub installment: i64,
    #[schema(example = 3)]
    pub paid_months: u32,
    pub is_active: bool,
    #[schema(nullable = true)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl EmployeeLoan {
    /// Whether the next payroll lock should collect an installment.
    pub fn is_chargeable(&self) -> bool {
        self.is_active && self.paid_months < self.months
    }
}

/// One installment deducted from one loan by one locked payroll period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct EmployeeLoanPayment {
    pub id: u64,
    pub employee_loan_id: u64,
    pub payroll_period_id: u64,
    pub amount: i64,
    /// The payment that brought `paid_months` up to `months`.
    pub settled_loan: bool,
    pub created_at: DateTime<Utc>,
}

/// A payment together with the period that collected it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct LoanPaymentDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub payment: EmployeeLoanPayment,
    pub year: i32,
    pub month: u32,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}

/// Validated input for a new loan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub employee_id: u64,
    pub loan_date: NaiveDate,
    pub amount: i64,
    pub months: u32,
    pub installment: i64,
    pub description: Option<String>,
}

/// Fields staff may edit on an existing loan. Counters are owned by the
/// payroll ledger and cannot be edited here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct LoanUpdate {
    pub is_active: Option<bool>,
    /// `Some(None)` clears the description.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}
