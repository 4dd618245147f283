//! Attendance-to-payroll computation. Everything here is pure; persistence
//! lives in [`crate::store`].

pub mod aggregate;
pub mod loan_ledger;
pub mod lock;
pub mod period;
pub mod salary;
pub mod time_calc;
