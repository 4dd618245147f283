use chrono::{NaiveDate, NaiveDateTime, SubsecRound, Utc};
use sqlx::{MySql, MySqlPool, QueryBuilder};
use tracing::debug;

use crate::engine::{
    loan_ledger,
    lock::{LockPlan, PayrollInputs},
    period::PayMonth,
};
use crate::error::PayrollError;
use crate::model::{
    attendance::Attendance,
    employee::RosterEntry,
    loan::{EmployeeLoan, EmployeeLoanPayment, LoanPaymentDetail, LoanUpdate, NewLoan},
    payroll::{PayrollItem, PayrollPeriod, PayrollPeriodSummary, Payslip},
    schedule::ScheduleEntry,
    shift::Shift,
};
use crate::store::{PayrollStore, UnlockOutcome};

/// MySQL placeholders are capped at 65535 per statement.
const ITEM_BATCH: usize = 500;

const PERIOD_COLUMNS: &str = "id, year, month, period_start, period_end, created_at";

const LOAN_COLUMNS: &str = "id, employee_id, loan_date, amount, months, installment, \
     paid_months, is_active, description, created_at";

const ITEM_COLUMNS: &str = "pi.id, pi.payroll_period_id, e.name AS employee_name, e.company_id, \
     pi.employee_id, pi.total_salary, pi.is_full_salary_payroll, pi.scheduled_working_days, \
     pi.working_days, pi.off_days, pi.absent_days, pi.late_count, pi.total_late_minutes, \
     pi.total_work_minutes, pi.loan_installment, pi.base_salary, pi.position_allowance, \
     pi.transport_allowance, pi.meal_allowance, pi.health_allowance, pi.gross_before_penalty, \
     pi.late_penalty, pi.extra_deduction, pi.extra_addition, pi.thp";

#[derive(sqlx::FromRow)]
struct RosterRow {
    employee_id: u64,
    company_id: String,
    name: String,
    job_title: Option<String>,
    job_level: Option<String>,
    total_salary: Option<i64>,
    is_full_salary_payroll: Option<bool>,
}

impl From<RosterRow> for RosterEntry {
    fn from(row: RosterRow) -> Self {
        Self {
            employee_id: row.employee_id,
            company_id: row.company_id,
            name: row.name,
            job_title: row.job_title,
            job_level: row.job_level,
            total_salary: row.total_salary.unwrap_or(0),
            is_full_salary_payroll: row.is_full_salary_payroll.unwrap_or(false),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ScheduleRow {
    schedule_id: u64,
    employee_id: u64,
    date: NaiveDate,
    shift_id: u64,
    shift_name: String,
    start_time: Option<String>,
    end_time: Option<String>,
    grace_period_minutes: u32,
    is_day_off: bool,
    attendance_id: Option<u64>,
    time_in: Option<NaiveDateTime>,
    time_out: Option<NaiveDateTime>,
}

impl From<ScheduleRow> for ScheduleEntry {
    fn from(row: ScheduleRow) -> Self {
        let attendance = row.attendance_id.map(|_| Attendance {
            schedule_id: row.schedule_id,
            time_in: row.time_in,
            time_out: row.time_out,
        });

        Self {
            id: row.schedule_id,
            employee_id: row.employee_id,
            date: row.date,
            shift: Shift {
                id: row.shift_id,
                name: row.shift_name,
                start_time: row.start_time,
                end_time: row.end_time,
                grace_period_minutes: row.grace_period_minutes,
                is_day_off: row.is_day_off,
            },
            attendance,
        }
    }
}

/// Duplicate key (SQLSTATE 23000) on insert.
fn is_duplicate_key(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23000"),
        _ => false,
    }
}

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl PayrollStore for MySqlStore {
    async fn load_inputs(&self, month: &PayMonth) -> Result<PayrollInputs, PayrollError> {
        let roster = sqlx::query_as::<_, RosterRow>(
            r#"
            SELECT e.id AS employee_id, e.company_id, e.name,
                   j.title AS job_title, j.level AS job_level,
                   j.total_salary, j.is_full_salary_payroll
            FROM employees e
            LEFT JOIN jobs j ON j.id = e.job_id
            ORDER BY e.name, e.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let schedules = sqlx::query_as::<_, ScheduleRow>(
            r#"
            SELECT s.id AS schedule_id, s.employee_id, s.date,
                   sh.id AS shift_id, sh.name AS shift_name, sh.start_time, sh.end_time,
                   sh.grace_period_minutes, sh.is_day_off,
                   a.id AS attendance_id, a.time_in, a.time_out
            FROM schedules s
            JOIN shifts sh ON sh.id = s.shift_id
            LEFT JOIN attendance a ON a.schedule_id = s.id
            WHERE s.date >= ? AND s.date < ?
            ORDER BY s.employee_id, s.date
            "#,
        )
        .bind(month.start())
        .bind(month.end())
        .fetch_all(&self.pool)
        .await?;

        let loans = sqlx::query_as::<_, EmployeeLoan>(&format!(
            "SELECT {LOAN_COLUMNS} FROM employee_loans WHERE is_active = TRUE ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(
            month = %month,
            employees = roster.len(),
            schedules = schedules.len(),
            loans = loans.len(),
            "Loaded payroll inputs"
        );

        Ok(PayrollInputs {
            roster: roster.into_iter().map(Into::into).collect(),
            schedules: schedules.into_iter().map(Into::into).collect(),
            loans,
        })
    }

    async fn find_period(&self, year: i32, month: u32) -> Result<Option<PayrollPeriod>, PayrollError> {
        let period = sqlx::query_as::<_, PayrollPeriod>(&format!(
            "SELECT {PERIOD_COLUMNS} FROM payroll_periods WHERE year = ? AND month = ?"
        ))
        .bind(year)
        .bind(month)
        .fetch_optional(&self.pool)
        .await?;

        Ok(period)
    }

    async fn commit_lock(&self, plan: &LockPlan) -> Result<PayrollPeriod, PayrollError> {
        let month = plan.month();
        let created_at = Utc::now().trunc_subsecs(0);

        // Dropping `tx` on any early return rolls everything back.
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO payroll_periods (year, month, period_start, period_end, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(month.year())
        .bind(month.month())
        .bind(month.start())
        .bind(month.end())
        .bind(created_at)
        .execute(&mut *tx)
        .await;

        let period_id = match inserted {
            Ok(result) => result.last_insert_id(),
            Err(e) if is_duplicate_key(&e) => {
                return Err(PayrollError::Conflict {
                    year: month.year(),
                    month: month.month(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        for chunk in plan.items().chunks(ITEM_BATCH) {
            let mut insert: QueryBuilder<MySql> = QueryBuilder::new(
                "INSERT INTO payroll_items (payroll_period_id, employee_id, total_salary, \
                 is_full_salary_payroll, scheduled_working_days, working_days, off_days, \
                 absent_days, late_count, total_late_minutes, total_work_minutes, \
                 loan_installment, base_salary, position_allowance, transport_allowance, \
                 meal_allowance, health_allowance, gross_before_penalty, late_penalty, \
                 extra_deduction, extra_addition, thp) ",
            );
            insert.push_values(chunk, |mut row, item| {
                row.push_bind(period_id)
                    .push_bind(item.employee_id)
                    .push_bind(item.total_salary)
                    .push_bind(item.is_full_salary_payroll)
                    .push_bind(item.scheduled_working_days)
                    .push_bind(item.working_days)
                    .push_bind(item.off_days)
                    .push_bind(item.absent_days)
                    .push_bind(item.late_count)
                    .push_bind(item.total_late_minutes)
                    .push_bind(item.total_work_minutes)
                    .push_bind(item.loan_installment)
                    .push_bind(item.base_salary)
                    .push_bind(item.position_allowance)
                    .push_bind(item.transport_allowance)
                    .push_bind(item.meal_allowance)
                    .push_bind(item.health_allowance)
                    .push_bind(item.gross_before_penalty)
                    .push_bind(item.late_penalty)
                    .push_bind(item.extra_deduction)
                    .push_bind(item.extra_addition)
                    .push_bind(item.thp);
            });
            insert.build().execute(&mut *tx).await?;
        }

        for charge in plan.charges() {
            let updated = sqlx::query(
                r#"
                UPDATE employee_loans
                SET paid_months = ?, is_active = ?
                WHERE id = ? AND paid_months = ? AND is_active = TRUE
                "#,
            )
            .bind(charge.paid_months)
            .bind(!charge.settles)
            .bind(charge.loan_id)
            .bind(charge.expected_paid_months)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() != 1 {
                return Err(PayrollError::Integrity(format!(
                    "loan {} changed while period {month} was being locked",
                    charge.loan_id
                )));
            }

            sqlx::query(
                r#"
                INSERT INTO employee_loan_payments
                    (employee_loan_id, payroll_period_id, amount, settled_loan, created_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(charge.loan_id)
            .bind(period_id)
            .bind(charge.amount)
            .bind(charge.settles)
            .bind(created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(PayrollPeriod {
            id: period_id,
            year: month.year(),
            month: month.month(),
            period_start: month.start(),
            period_end: month.end(),
            created_at,
        })
    }

    async fn commit_unlock(&self, period_id: u64) -> Result<UnlockOutcome, PayrollError> {
        let mut tx = self.pool.begin().await?;

        let period = sqlx::query_as::<_, PayrollPeriod>(&format!(
            "SELECT {PERIOD_COLUMNS} FROM payroll_periods WHERE id = ? FOR UPDATE"
        ))
        .bind(period_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| PayrollError::not_found("payroll period", period_id))?;

        let payments = sqlx::query_as::<_, EmployeeLoanPayment>(
            r#"
            SELECT id, employee_loan_id, payroll_period_id, amount, settled_loan, created_at
            FROM employee_loan_payments
            WHERE payroll_period_id = ?
            FOR UPDATE
            "#,
        )
        .bind(period_id)
        .fetch_all(&mut *tx)
        .await?;

        for reversal in loan_ledger::reverse(&payments) {
            // MySQL assigns SET left to right; `is_active` must see the old `paid_months`.
            let updated = sqlx::query(
                r#"
                UPDATE employee_loans
                SET is_active = CASE WHEN paid_months >= months THEN TRUE ELSE is_active END,
                    paid_months = paid_months - ?
                WHERE id = ? AND paid_months >= ?
                "#,
            )
            .bind(reversal.payments)
            .bind(reversal.loan_id)
            .bind(reversal.payments)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() != 1 {
                return Err(PayrollError::Integrity(format!(
                    "loan {} cannot be rewound by {} payment(s)",
                    reversal.loan_id, reversal.payments
                )));
            }
        }

        sqlx::query("DELETE FROM employee_loan_payments WHERE payroll_period_id = ?")
            .bind(period_id)
            .execute(&mut *tx)
            .await?;

        let removed_items = sqlx::query("DELETE FROM payroll_items WHERE payroll_period_id = ?")
            .bind(period_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM payroll_periods WHERE id = ?")
            .bind(period_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(UnlockOutcome {
            period,
            reversed_payments: payments.len(),
            removed_items: removed_items as usize,
        })
    }

    async fn list_periods(&self) -> Result<Vec<PayrollPeriodSummary>, PayrollError> {
        let periods = sqlx::query_as::<_, PayrollPeriodSummary>(
            r#"
            SELECT p.id, p.year, p.month, p.period_start, p.period_end, p.created_at,
                   COUNT(pi.id) AS item_count
            FROM payroll_periods p
            LEFT JOIN payroll_items pi ON pi.payroll_period_id = p.id
            GROUP BY p.id
            ORDER BY p.year DESC, p.month DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(periods)
    }

    async fn get_period(&self, period_id: u64) -> Result<Option<PayrollPeriod>, PayrollError> {
        let period = sqlx::query_as::<_, PayrollPeriod>(&format!(
            "SELECT {PERIOD_COLUMNS} FROM payroll_periods WHERE id = ?"
        ))
        .bind(period_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(period)
    }

    async fn period_items(&self, period_id: u64) -> Result<Vec<PayrollItem>, PayrollError> {
        let items = sqlx::query_as::<_, PayrollItem>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM payroll_items pi
            JOIN employees e ON e.id = pi.employee_id
            WHERE pi.payroll_period_id = ?
            ORDER BY e.name, e.id
            "#
        ))
        .bind(period_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn payslips(&self, employee_id: u64, year: Option<i32>) -> Result<Vec<Payslip>, PayrollError> {
        let payslips = sqlx::query_as::<_, Payslip>(
            r#"
            SELECT p.id AS period_id, p.year, p.month, p.period_start, p.period_end,
                   p.created_at AS processed_at, pi.thp
            FROM payroll_items pi
            JOIN payroll_periods p ON p.id = pi.payroll_period_id
            WHERE pi.employee_id = ?
              AND (? IS NULL OR p.year = ?)
            ORDER BY p.year DESC, p.month DESC
            "#,
        )
        .bind(employee_id)
        .bind(year)
        .bind(year)
        .fetch_all(&self.pool)
        .await?;

        Ok(payslips)
    }

    async fn payslip(&self, employee_id: u64, period_id: u64) -> Result<Option<PayrollItem>, PayrollError> {
        let item = sqlx::query_as::<_, PayrollItem>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM payroll_items pi
            JOIN employees e ON e.id = pi.employee_id
            WHERE pi.payroll_period_id = ? AND pi.employee_id = ?
            "#
        ))
        .bind(period_id)
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    async fn employee_exists(&self, employee_id: u64) -> Result<bool, PayrollError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees WHERE id = ?")
            .bind(employee_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    async fn list_loans(&self, employee_id: Option<u64>) -> Result<Vec<EmployeeLoan>, PayrollError> {
        let loans = sqlx::query_as::<_, EmployeeLoan>(&format!(
            r#"
            SELECT {LOAN_COLUMNS}
            FROM employee_loans
            WHERE (? IS NULL OR employee_id = ?)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(employee_id)
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    async fn get_loan(&self, loan_id: u64) -> Result<Option<EmployeeLoan>, PayrollError> {
        let loan = sqlx::query_as::<_, EmployeeLoan>(&format!(
            "SELECT {LOAN_COLUMNS} FROM employee_loans WHERE id = ?"
        ))
        .bind(loan_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(loan)
    }

    async fn loan_payments(&self, loan_id: u64) -> Result<Vec<LoanPaymentDetail>, PayrollError> {
        let payments = sqlx::query_as::<_, LoanPaymentDetail>(
            r#"
            SELECT lp.id, lp.employee_loan_id, lp.payroll_period_id, lp.amount,
                   lp.settled_loan, lp.created_at,
                   p.year, p.month, p.period_start, p.period_end
            FROM employee_loan_payments lp
            JOIN payroll_periods p ON p.id = lp.payroll_period_id
            WHERE lp.employee_loan_id = ?
            ORDER BY lp.created_at, lp.id
            "#,
        )
        .bind(loan_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    async fn insert_loan(&self, loan: &NewLoan) -> Result<EmployeeLoan, PayrollError> {
        let result = sqlx::query(
            r#"
            INSERT INTO employee_loans
                (employee_id, loan_date, amount, months, installment, description)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(loan.employee_id)
        .bind(loan.loan_date)
        .bind(loan.amount)
        .bind(loan.months)
        .bind(loan.installment)
        .bind(loan.description.as_deref())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        self.get_loan(id)
            .await?
            .ok_or_else(|| PayrollError::Integrity(format!("loan {id} vanished after insert")))
    }

    async fn update_loan(&self, loan_id: u64, update: &LoanUpdate) -> Result<Option<EmployeeLoan>, PayrollError> {
        if update.is_active.is_some() || update.description.is_some() {
            let mut query: QueryBuilder<MySql> = QueryBuilder::new("UPDATE employee_loans SET ");
            let mut fields = query.separated(", ");
            if let Some(is_active) = update.is_active {
                fields.push("is_active = ").push_bind_unseparated(is_active);
            }
            if let Some(description) = &update.description {
                fields
                    .push("description = ")
                    .push_bind_unseparated(description.clone());
            }
            query.push(" WHERE id = ").push_bind(loan_id);
            query.build().execute(&self.pool).await?;
        }

        self.get_loan(loan_id).await
    }

    async fn delete_loan(&self, loan_id: u64) -> Result<bool, PayrollError> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM employee_loans
            WHERE id = ?
              AND NOT EXISTS (
                  SELECT 1 FROM employee_loan_payments WHERE employee_loan_id = ?
              )
            "#,
        )
        .bind(loan_id)
        .bind(loan_id)
        .execute(&self.pool)
        .await?;

        Ok(deleted.rows_affected() == 1)
    }
}
