/// Role ids as issued in the `role` claim.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin = 1,
    Hr = 2,
    Employee = 3,
    System = 4,
    ApiUser = 5,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Hr),
            3 => Some(Role::Employee),
            4 => Some(Role::System),
            5 => Some(Role::ApiUser),
            _ => None,
        }
    }

    /// May preview, lock and unlock payroll and manage loans.
    pub fn manages_payroll(self) -> bool {
        matches!(self, Role::Admin | Role::Hr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_admin_and_hr_manage_payroll() {
        let managers: Vec<_> = (0..=6)
            .filter_map(Role::from_id)
            .filter(|r| r.manages_payroll())
            .collect();
        assert_eq!(managers, [Role::Admin, Role::Hr]);
        assert_eq!(Role::from_id(0), None);
    }
}
