pub mod attendance;
pub mod loan;
pub mod payroll;
