use crate::api::loan::LoanFilter;
use crate::api::payroll::{LockRequest, MonthQuery, PayslipQuery};
use crate::engine::aggregate::{AttendanceSummary, EmployeeAggregate};
use crate::model::employee::RosterEntry;
use crate::model::loan::{EmployeeLoan, EmployeeLoanPayment, LoanPaymentDetail, LoanUpdate};
use crate::model::payroll::{
    Adjustment, PayrollItem, PayrollLine, PayrollPeriod, PayrollPeriodSummary, Payslip,
    PayslipDetail, PeriodDetail, PreviewRow,
};
use crate::service::loan::{LoanDetail, LoanTerms};
use crate::service::payroll::{AttendanceReport, LockReceipt, PreviewReport};
use crate::store::UnlockOutcome;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Payroll API",
        version = "1.0.0",
        description = r#"
## Attendance-to-Payroll Engine

Turns a month of schedules and attendance into locked payroll snapshots.

### 🔹 Key Features
- **Preview**
  - Compute every employee's payroll for a month without persisting anything
- **Lock / Unlock**
  - Freeze a month into immutable snapshots and collect loan installments in one transaction
  - Unlock a month and reverse its installments
- **Loans**
  - Record employee loans and follow their installment history
- **Attendance**
  - Day and minute counters per employee for a pay window

### 🗓 Pay window
Month `YYYY-MM` covers the 26th of the prior month up to, but excluding, the 26th of the named month.

### 🔐 Security
All endpoints require a **JWT Bearer** access token.
Only **Admin** or **HR** may preview, lock, unlock or manage loans; employees may read their own payslips.
"#,
    ),
    paths(
        crate::api::payroll::preview_payroll,
        crate::api::payroll::lock_payroll,
        crate::api::payroll::list_periods,
        crate::api::payroll::get_period,
        crate::api::payroll::unlock_period,
        crate::api::payroll::employee_payslips,
        crate::api::payroll::employee_payslip,

        crate::api::attendance::attendance_summary,

        crate::api::loan::list_loans,
        crate::api::loan::create_loan,
        crate::api::loan::get_loan,
        crate::api::loan::update_loan,
        crate::api::loan::delete_loan
    ),
    components(
        schemas(
            MonthQuery,
            LockRequest,
            PayslipQuery,
            LoanFilter,
            Adjustment,
            RosterEntry,
            AttendanceSummary,
            EmployeeAggregate,
            PayrollLine,
            PreviewRow,
            PreviewReport,
            AttendanceReport,
            PayrollPeriod,
            PayrollPeriodSummary,
            PayrollItem,
            PeriodDetail,
            Payslip,
            PayslipDetail,
            LockReceipt,
            UnlockOutcome,
            EmployeeLoan,
            EmployeeLoanPayment,
            LoanPaymentDetail,
            LoanTerms,
            LoanUpdate,
            LoanDetail
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Payroll", description = "Payroll preview, lock and history APIs"),
        (name = "Attendance", description = "Attendance summary APIs"),
        (name = "Loans", description = "Employee loan APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
