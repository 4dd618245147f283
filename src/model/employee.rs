use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An employee as seen by payroll: identity plus the salary configuration of
/// their job. Employees without a job are paid nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "employee_id": 1,
        "company_id": "EMP-001",
        "name": "John Doe",
        "job_title": "Cashier",
        "job_level": "Staff",
        "total_salary": 5000000,
        "is_full_salary_payroll": false
    })
)]
pub struct RosterEntry {
    pub employee_id: u64,
    pub company_id: String,
    pub name: String,
    #[schema(nullable = true)]
    pub job_title: Option<String>,
    #[schema(nullable = true)]
    pub job_level: Option<String>,
    pub total_salary: i64,
    pub is_full_salary_payroll: bool,
}
