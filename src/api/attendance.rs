use actix_web::{HttpResponse, Responder, web};

use crate::api::payroll::MonthQuery;
use crate::auth::auth::AuthUser;
use crate::service::payroll as service;
use crate::store::MySqlStore;

#[utoipa::path(
    get,
    path = "/api/attendance/summary",
    params(MonthQuery),
    responses(
        (status = 200, description = "Attendance counters per employee", body = crate::service::payroll::AttendanceReport),
        (status = 400, description = "Malformed month"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn attendance_summary(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let report = service::attendance_summary(store.get_ref(), &query.month).await?;
    Ok(HttpResponse::Ok().json(report))
}
