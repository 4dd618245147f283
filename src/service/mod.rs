//! Operations behind the HTTP handlers, written against [`PayrollStore`]
//! so they run the same over MySQL and in tests.
//!
//! [`PayrollStore`]: crate::store::PayrollStore

pub mod loan;
pub mod payroll;
