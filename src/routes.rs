use crate::{
    api::{attendance, loan, payroll},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{http::Method, web};
use anyhow::anyhow;
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Per-IP limiters shared by every worker.
#[derive(Clone)]
pub struct RateLimits {
    protected: Limiter,
    mutation: Limiter,
}

impl RateLimits {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            protected: build_limiter(config.rate_protected_per_min, None)?,
            mutation: build_limiter(
                config.rate_mutation_per_min,
                Some(vec![Method::POST, Method::PATCH, Method::DELETE]),
            )?,
        })
    }
}

// Helper to build a limiter, optionally restricted to some methods
fn build_limiter(requests_per_min: u32, methods: Option<Vec<Method>>) -> anyhow::Result<Limiter> {
    if requests_per_min == 0 {
        return Err(anyhow!("rate limits must allow at least one request per minute"));
    }
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);

    let mut builder = GovernorConfigBuilder::default().key_extractor(PeerIpKeyExtractor);
    builder.per_millisecond(per_ms).burst_size(requests_per_min);
    if let Some(methods) = methods {
        builder.methods(methods);
    }
    let cfg = builder
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit of {requests_per_min} per minute"))?;

    Ok(Arc::new(Governor::new(&cfg)))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limits: &RateLimits) {
    // Handlers authenticate through the `AuthUser` extractor.
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(limits.mutation.clone()) // POST/PATCH/DELETE only
            .wrap(limits.protected.clone()) // rate limiting
            .service(
                web::scope("/payroll")
                    // /payroll/preview
                    .service(
                        web::resource("/preview").route(web::get().to(payroll::preview_payroll)),
                    )
                    // /payroll/lock
                    .service(web::resource("/lock").route(web::post().to(payroll::lock_payroll)))
                    // /payroll/periods
                    .service(
                        web::resource("/periods").route(web::get().to(payroll::list_periods)),
                    )
                    // /payroll/periods/{id}
                    .service(
                        web::resource("/periods/{id}")
                            .route(web::get().to(payroll::get_period))
                            .route(web::delete().to(payroll::unlock_period)),
                    ),
            )
            .service(
                web::scope("/employees")
                    // /employees/{id}/payslips
                    .service(
                        web::resource("/{id}/payslips")
                            .route(web::get().to(payroll::employee_payslips)),
                    )
                    // /employees/{id}/payslips/{period_id}
                    .service(
                        web::resource("/{id}/payslips/{period_id}")
                            .route(web::get().to(payroll::employee_payslip)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    // /attendance/summary
                    .service(
                        web::resource("/summary")
                            .route(web::get().to(attendance::attendance_summary)),
                    ),
            )
            .service(
                web::scope("/loans")
                    // /loans
                    .service(
                        web::resource("")
                            .route(web::get().to(loan::list_loans))
                            .route(web::post().to(loan::create_loan)),
                    )
                    // /loans/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(loan::get_loan))
                            .route(web::patch().to(loan::update_loan))
                            .route(web::delete().to(loan::delete_loan)),
                    ),
            ),
    );
}
