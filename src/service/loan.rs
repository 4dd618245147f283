use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::engine::loan_ledger;
use crate::error::PayrollError;
use crate::model::loan::{EmployeeLoan, LoanPaymentDetail, LoanUpdate};
use crate::store::PayrollStore;

/// Terms of a new loan as submitted by staff.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoanTerms {
    #[schema(example = 1001)]
    pub employee_id: u64,
    #[schema(example = "2025-01-05", value_type = String, format = "date")]
    pub loan_date: NaiveDate,
    #[schema(example = 1200000)]
    pub amount: i64,
    #[schema(example = 12)]
    pub months: i64,
    /// Defaults to `amount / months`, rounded down.
    #[schema(example = 100000)]
    pub installment: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoanDetail {
    #[serde(flatten)]
    pub loan: EmployeeLoan,
    pub payments: Vec<LoanPaymentDetail>,
}

#[instrument(skip(store, terms), fields(employee_id = terms.employee_id))]
pub async fn create_loan<S: PayrollStore>(store: &S, terms: LoanTerms) -> Result<EmployeeLoan, PayrollError> {
    let loan = loan_ledger::new_loan(
        terms.employee_id,
        terms.loan_date,
        terms.amount,
        terms.months,
        terms.installment,
        terms.description,
    )?;

    if !store.employee_exists(loan.employee_id).await? {
        return Err(PayrollError::not_found("employee", loan.employee_id));
    }

    let created = store.insert_loan(&loan).await?;
    info!(
        loan_id = created.id,
        amount = created.amount,
        months = created.months,
        installment = created.installment,
        "Employee loan created"
    );

    Ok(created)
}

pub async fn list_loans<S: PayrollStore>(
    store: &S,
    employee_id: Option<u64>,
) -> Result<Vec<EmployeeLoan>, PayrollError> {
    store.list_loans(employee_id).await
}

pub async fn loan_detail<S: PayrollStore>(store: &S, loan_id: u64) -> Result<LoanDetail, PayrollError> {
    let loan = store
        .get_loan(loan_id)
        .await?
        .ok_or_else(|| PayrollError::not_found("employee loan", loan_id))?;
    let payments = store.loan_payments(loan_id).await?;

    Ok(LoanDetail { loan, payments })
}

/// Edits the active flag and description. A fully paid loan cannot be
/// reactivated.
#[instrument(skip(store, update))]
pub async fn update_loan<S: PayrollStore>(
    store: &S,
    loan_id: u64,
    update: LoanUpdate,
) -> Result<EmployeeLoan, PayrollError> {
    let current = store
        .get_loan(loan_id)
        .await?
        .ok_or_else(|| PayrollError::not_found("employee loan", loan_id))?;

    if update.is_active == Some(true) && current.paid_months >= current.months {
        return Err(PayrollError::validation(format!(
            "loan {loan_id} is fully paid and cannot be reactivated"
        )));
    }

    let update = LoanUpdate {
        description: update
            .description
            .map(|d| d.filter(|text| !text.trim().is_empty())),
        ..update
    };

    let updated = store
        .update_loan(loan_id, &update)
        .await?
        .ok_or_else(|| PayrollError::not_found("employee loan", loan_id))?;
    info!(is_active = updated.is_active, "Employee loan updated");

    Ok(updated)
}

/// Removes a loan that no payroll run has collected from yet.
#[instrument(skip(store))]
pub async fn delete_loan<S: PayrollStore>(store: &S, loan_id: u64) -> Result<(), PayrollError> {
    if store.get_loan(loan_id).await?.is_none() {
        return Err(PayrollError::not_found("employee loan", loan_id));
    }
    if !store.delete_loan(loan_id).await? {
        return Err(PayrollError::validation(format!(
            "loan {loan_id} has recorded payments and cannot be deleted"
        )));
    }

    info!("Employee loan deleted");
    Ok(())
}
