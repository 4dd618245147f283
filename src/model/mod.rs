pub mod attendance;
pub mod employee;
pub mod loan;
pub mod payroll;
pub mod role;
pub mod schedule;
pub mod shift;
