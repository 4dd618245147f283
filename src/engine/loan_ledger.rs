use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::error::PayrollError;
use crate::model::loan::{EmployeeLoan, EmployeeLoanPayment, NewLoan};

/// One installment to collect during a lock, with the counter values the
/// loan must still hold when the lock commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanCharge {
    pub loan_id: u64,
    pub employee_id: u64,
    pub amount: i64,
    pub expected_paid_months: u32,
    pub paid_months: u32,
    /// This charge pays the loan off.
    pub settles: bool,
}

/// Undo of every payment one period recorded against one loan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanReversal {
    pub loan_id: u64,
    pub payments: u32,
}

impl LoanReversal {
    /// Takes the payments back off `loan`. A loan that was fully paid becomes
    /// active again; otherwise `is_active` is left alone. Returns `false`, with
    /// the loan untouched, when it has fewer paid months than are reversed.
    pub fn rewind(&self, loan: &mut EmployeeLoan) -> bool {
        if loan.paid_months < self.payments {
            return false;
        }
        if loan.paid_months >= loan.months {
            loan.is_active = true;
        }
        loan.paid_months -= self.payments;
        true
    }
}

/// The loans a payroll lock collects from.
#[derive(Debug, Default)]
pub struct LoanLedger {
    loans: Vec<EmployeeLoan>,
    installments: HashMap<u64, i64>,
}

impl LoanLedger {
    /// Keeps only loans that are active and not yet fully paid.
    pub fn new(loans: impl IntoIterator<Item = EmployeeLoan>) -> Self {
        let loans: Vec<_> = loans.into_iter().filter(EmployeeLoan::is_chargeable).collect();

        let mut installments = HashMap::new();
        for loan in &loans {
            *installments.entry(loan.employee_id).or_insert(0) += loan.installment;
        }

        Self {
            loans,
            installments,
        }
    }

    /// Sum of installments across all of an employee's chargeable loans.
    pub fn installment_for(&self, employee_id: u64) -> i64 {
        self.installments.get(&employee_id).copied().unwrap_or(0)
    }

    /// One charge per chargeable loan.
    pub fn charges(&self) -> Vec<LoanCharge> {
        self.loans
            .iter()
            .map(|loan| {
                let paid_months = (loan.paid_months + 1).min(loan.months);
                LoanCharge {
                    loan_id: loan.id,
                    employee_id: loan.employee_id,
                    amount: loan.installment,
                    expected_paid_months: loan.paid_months,
                    paid_months,
                    settles: paid_months >= loan.months,
                }
            })
            .collect()
    }
}

/// Groups a period's payments per loan so each loan is rewound once.
pub fn reverse(payments: &[EmployeeLoanPayment]) -> Vec<LoanReversal> {
    let mut by_loan: BTreeMap<u64, LoanReversal> = BTreeMap::new();

    for payment in payments {
        let reversal = by_loan
            .entry(payment.employee_loan_id)
            .or_insert_with(|| LoanReversal {
                loan_id: payment.employee_loan_id,
                payments: 0,
            });
        reversal.payments += 1;
    }

    by_loan.into_values().collect()
}

/// Validates loan terms. The installment defaults to `amount / months`,
/// rounded down.
pub fn new_loan(
    employee_id: u64,
    loan_date: NaiveDate,
    amount: i64,
    months: i64,
    installment: Option<i64>,
    description: Option<String>,
) -> Result<NewLoan, PayrollError> {
    if amount <= 0 {
        return Err(PayrollError::validation("loan amount must be positive"));
    }
    let months = u32::try_from(months)
        .ok()
        .filter(|m| *m > 0)
        .ok_or_else(|| PayrollError::validation("loan months must be a positive number"))?;

    let installment = installment.unwrap_or(amount / months as i64);
    if installment <= 0 {
        return Err(PayrollError::validation("loan installment must be positive"));
    }

    Ok(NewLoan {
        employee_id,
        loan_date,
        amount,
        months,
        installment,
        description: description.filter(|d| !d.trim().is_empty()),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    pub(crate) fn loan(id: u64, employee_id: u64, months: u32, installment: i64, paid: u32) -> EmployeeLoan {
        EmployeeLoan {
            id,
            employee_id,
            loan_date: NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
            amount: installment * months as i64,
            months,
            installment,
            paid_months: paid,
            is_active: paid < months,
            description: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 5, 9, 0, 0).unwrap(),
        }
    }

    fn payment(id: u64, loan_id: u64) -> EmployeeLoanPayment {
        EmployeeLoanPayment {
            id,
            employee_loan_id: loan_id,
            payroll_period_id: 1,
            amount: 100_000,
            settled_loan: false,
            created_at: Utc.with_ymd_and_hms(2025, 3, 26, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn sums_installments_across_concurrent_loans() {
        let ledger = LoanLedger::new(vec![
            loan(1, 7, 12, 100_000, 3),
            loan(2, 7, 6, 50_000, 0),
            loan(3, 8, 10, 20_000, 9),
        ]);
        assert_eq!(ledger.installment_for(7), 150_000);
        assert_eq!(ledger.installment_for(8), 20_000);
        assert_eq!(ledger.installment_for(99), 0);
    }

    #[test]
    fn skips_inactive_and_fully_paid_loans() {
        let mut inactive = loan(1, 7, 12, 100_000, 3);
        inactive.is_active = false;
        let mut inconsistent = loan(2, 7, 6, 50_000, 6);
        inconsistent.is_active = true;

        let ledger = LoanLedger::new(vec![inactive, inconsistent]);
        assert_eq!(ledger.installment_for(7), 0);
        assert!(ledger.charges().is_empty());
    }

    #[test]
    fn charge_advances_counter_by_one() {
        let ledger = LoanLedger::new(vec![loan(1, 7, 12, 100_000, 3)]);
        assert_eq!(
            ledger.charges(),
            vec![LoanCharge {
                loan_id: 1,
                employee_id: 7,
                amount: 100_000,
                expected_paid_months: 3,
                paid_months: 4,
                settles: false,
            }]
        );
    }

    #[test]
    fn last_installment_settles_the_loan() {
        let ledger = LoanLedger::new(vec![loan(1, 7, 12, 100_000, 11)]);
        let charge = &ledger.charges()[0];
        assert_eq!(charge.paid_months, 12);
        assert!(charge.settles);
    }

    #[test]
    fn reversal_groups_payments_per_loan() {
        let reversals = reverse(&[payment(1, 4), payment(2, 9), payment(3, 4)]);
        assert_eq!(
            reversals,
            vec![
                LoanReversal { loan_id: 4, payments: 2 },
                LoanReversal { loan_id: 9, payments: 1 },
            ]
        );
    }

    #[test]
    fn rewinding_a_fully_paid_loan_reactivates_it() {
        // Settled by a later period than the one being reversed.
        let mut settled = loan(1, 7, 12, 100_000, 12);
        assert!(!settled.is_active);

        assert!(LoanReversal { loan_id: 1, payments: 1 }.rewind(&mut settled));
        assert_eq!(settled.paid_months, 11);
        assert!(settled.is_active);
        assert_eq!(LoanLedger::new(vec![settled]).installment_for(7), 100_000);
    }

    #[test]
    fn rewinding_keeps_manual_deactivation() {
        let mut paused = loan(1, 7, 12, 100_000, 5);
        paused.is_active = false;

        assert!(LoanReversal { loan_id: 1, payments: 2 }.rewind(&mut paused));
        assert_eq!(paused.paid_months, 3);
        assert!(!paused.is_active);
    }

    #[test]
    fn rewind_past_zero_is_refused() {
        let mut fresh = loan(1, 7, 12, 100_000, 1);
        assert!(!LoanReversal { loan_id: 1, payments: 2 }.rewind(&mut fresh));
        assert_eq!(fresh, loan(1, 7, 12, 100_000, 1));
    }

    #[test]
    fn validates_loan_terms() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();

        let created = new_loan(1, date, 1_000_000, 3, None, Some("  ".into())).unwrap();
        assert_eq!(created.installment, 333_333);
        assert_eq!(created.months, 3);
        assert_eq!(created.description, None);

        for (amount, months, installment) in [(0, 3, None), (1000, 0, None), (1000, -2, None), (1000, 3, Some(0)), (2, 3, None)] {
            let err = new_loan(1, date, amount, months, installment, None).unwrap_err();
            assert!(matches!(err, PayrollError::Validation(_)));
        }
    }
}
