use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::model::payroll::Adjustment;
use crate::service::payroll as service;
use crate::store::MySqlStore;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct MonthQuery {
    /// Payroll month as `YYYY-MM`.
    #[schema(example = "2025-03")]
    pub month: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LockRequest {
    #[schema(example = "2025-03")]
    pub month: String,

    #[serde(default)]
    pub adjustments: Vec<Adjustment>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PayslipQuery {
    #[schema(example = 2025)]
    pub year: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/payroll/preview",
    params(MonthQuery),
    responses(
        (status = 200, description = "Computed payroll, nothing persisted", body = crate::service::payroll::PreviewReport),
        (status = 400, description = "Malformed month"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn preview_payroll(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let report = service::preview(store.get_ref(), &query.month).await?;
    Ok(HttpResponse::Ok().json(report))
}

#[utoipa::path(
    post,
    path = "/api/payroll/lock",
    request_body = LockRequest,
    responses(
        (status = 201, description = "Payroll period locked", body = crate::service::payroll::LockReceipt),
        (status = 400, description = "Malformed month or adjustment"),
        (status = 409, description = "Month already locked"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn lock_payroll(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    payload: web::Json<LockRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let LockRequest { month, adjustments } = payload.into_inner();
    info!(user_id = auth.user_id, user = %auth.username, month = %month, "Payroll lock requested");
    let receipt = service::lock_period(store.get_ref(), &month, adjustments).await?;

    Ok(HttpResponse::Created().json(receipt))
}

#[utoipa::path(
    get,
    path = "/api/payroll/periods",
    responses(
        (status = 200, description = "Locked periods, newest first", body = [crate::model::payroll::PayrollPeriodSummary]),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_periods(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let periods = service::list_periods(store.get_ref()).await?;
    Ok(HttpResponse::Ok().json(periods))
}

#[utoipa::path(
    get,
    path = "/api/payroll/periods/{period_id}",
    params(
        ("period_id", description = "Payroll period ID")
    ),
    responses(
        (status = 200, description = "Period with its snapshots", body = crate::model::payroll::PeriodDetail),
        (status = 404, description = "Period not found"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_period(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let detail = service::period_detail(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[utoipa::path(
    delete,
    path = "/api/payroll/periods/{period_id}",
    params(
        ("period_id", description = "Payroll period ID")
    ),
    responses(
        (status = 200, description = "Period unlocked and loan installments reversed", body = crate::store::UnlockOutcome),
        (status = 404, description = "Period not found"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn unlock_period(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let period_id = path.into_inner();
    info!(user_id = auth.user_id, user = %auth.username, period_id, "Payroll unlock requested");

    let outcome = service::unlock_period(store.get_ref(), period_id).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}/payslips",
    params(
        ("employee_id", description = "Employee ID"),
        PayslipQuery
    ),
    responses(
        (status = 200, description = "Payslips, newest first", body = [crate::model::payroll::Payslip]),
        (status = 404, description = "Employee not found"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn employee_payslips(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
    query: web::Query<PayslipQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    auth.require_self_or_hr(employee_id)?;

    let payslips = service::payslips(store.get_ref(), employee_id, query.year).await?;
    Ok(HttpResponse::Ok().json(payslips))
}

#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}/payslips/{period_id}",
    params(
        ("employee_id", description = "Employee ID"),
        ("period_id", description = "Payroll period ID")
    ),
    responses(
        (status = 200, description = "Full payroll breakdown for one period", body = crate::model::payroll::PayslipDetail),
        (status = 404, description = "Period not found or employee not paid in it"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn employee_payslip(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<(u64, u64)>,
) -> actix_web::Result<impl Responder> {
    let (employee_id, period_id) = path.into_inner();
    auth.require_self_or_hr(employee_id)?;

    let payslip = service::payslip_detail(store.get_ref(), employee_id, period_id).await?;
    Ok(HttpResponse::Ok().json(payslip))
}
