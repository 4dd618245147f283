use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::model::loan::LoanUpdate;
use crate::service::loan::{self as service, LoanTerms};
use crate::store::MySqlStore;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LoanFilter {
    #[schema(example = 1001)]
    pub employee_id: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/loans",
    params(LoanFilter),
    responses(
        (status = 200, description = "Loans, newest first", body = [crate::model::loan::EmployeeLoan]),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Loans"
)]
pub async fn list_loans(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    query: web::Query<LoanFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let loans = service::list_loans(store.get_ref(), query.employee_id).await?;
    Ok(HttpResponse::Ok().json(loans))
}

#[utoipa::path(
    post,
    path = "/api/loans",
    request_body = LoanTerms,
    responses(
        (status = 201, description = "Loan created", body = crate::model::loan::EmployeeLoan),
        (status = 400, description = "Invalid loan terms"),
        (status = 404, description = "Employee not found"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Loans"
)]
pub async fn create_loan(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    payload: web::Json<LoanTerms>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let loan = service::create_loan(store.get_ref(), payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(loan))
}

#[utoipa::path(
    get,
    path = "/api/loans/{loan_id}",
    params(
        ("loan_id", description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan with its payments", body = crate::service::loan::LoanDetail),
        (status = 404, description = "Loan not found"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Loans"
)]
pub async fn get_loan(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let detail = service::loan_detail(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[utoipa::path(
    patch,
    path = "/api/loans/{loan_id}",
    request_body = LoanUpdate,
    params(
        ("loan_id", description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan updated", body = crate::model::loan::EmployeeLoan),
        (status = 400, description = "Fully paid loan cannot be reactivated"),
        (status = 404, description = "Loan not found"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Loans"
)]
pub async fn update_loan(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
    payload: web::Json<LoanUpdate>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let loan = service::update_loan(store.get_ref(), path.into_inner(), payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(loan))
}

#[utoipa::path(
    delete,
    path = "/api/loans/{loan_id}",
    params(
        ("loan_id", description = "Loan ID")
    ),
    responses(
        (status = 204, description = "Loan deleted"),
        (status = 400, description = "Loan already has payments"),
        (status = 404, description = "Loan not found"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Loans"
)]
pub async fn delete_loan(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    service::delete_loan(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
