//! Every admin operation, registered by name.

mod pets;
mod schema;
mod sms;
mod tokens;
mod users;

pub use pets::{FindNullFields, RepairEmptyStrings};
pub use schema::{CheckSchema, InitSchema};
pub use sms::{SendDoseReminder, SendTestSms};
pub use tokens::{CheckToken, ConfirmToken, CreateTestDose, ExpireStaleDoses};
pub use users::{ActiveMedications, DeleteTestData, InspectUser};

use crate::operation::AdminOperation;

/// All operations, in the order `--help` lists them.
pub fn all_operations() -> Vec<Box<dyn AdminOperation>> {
    vec![
        Box::new(CheckSchema),
        Box::new(InitSchema),
        Box::new(InspectUser),
        Box::new(FindNullFields),
        Box::new(RepairEmptyStrings),
        Box::new(CreateTestDose),
        Box::new(CheckToken),
        Box::new(ConfirmToken),
        Box::new(ExpireStaleDoses),
        Box::new(ActiveMedications),
        Box::new(SendTestSms),
        Box::new(SendDoseReminder),
        Box::new(DeleteTestData),
    ]
}

pub fn find_operation(name: &str) -> Option<Box<dyn AdminOperation>> {
    all_operations().into_iter().find(|op| op.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use petclaims_db::Capability;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique_and_resolvable() {
        let ops = all_operations();
        let names: HashSet<&str> = ops.iter().map(|op| op.name()).collect();
        assert_eq!(names.len(), ops.len());
        for name in names {
            assert_eq!(find_operation(name).map(|op| op.name()), Some(name));
        }
        assert!(find_operation("drop-everything").is_none());
    }

    #[test]
    fn test_public_safe_operations_run_restricted() {
        for name in ["check-schema", "check-token", "confirm-token"] {
            let op = find_operation(name).unwrap();
            assert_eq!(op.requires(), Some(Capability::Restricted), "{}", name);
        }
        assert_eq!(find_operation("send-test-sms").unwrap().requires(), None);
        assert_eq!(
            find_operation("delete-test-data").unwrap().requires(),
            Some(Capability::Elevated)
        );
    }
}
