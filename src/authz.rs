use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// User role stored on the account and embedded in the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Employee,
}

impl Default for Role {
    fn default() -> Self {
        Self::Employee
    }
}

/// Every role-gated operation the API exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ListProducts,
    ViewProduct,
    CreateProduct,
    UpdateProduct,
    DeactivateProduct,
    RecordMovement,
    ViewProductMovements,
    ListCategories,
    ViewCategory,
    CreateCategory,
    UpdateCategory,
    DeactivateCategory,
    ListUsers,
    ViewDashboard,
    ViewInventoryReport,
    ViewMovementsReport,
}

const ANY_AUTHENTICATED: &[Role] = &[];
const MANAGER_OR_ADMIN: &[Role] = &[Role::Manager, Role::Admin];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// The authorization table. An empty set means any authenticated user.
pub const fn allowed_roles(action: Action) -> &'static [Role] {
    use Action::*;
    match action {
        ListProducts | ViewProduct | ViewProductMovements => ANY_AUTHENTICATED,
        ListCategories | ViewCategory => ANY_AUTHENTICATED,
        ViewDashboard => ANY_AUTHENTICATED,
        CreateProduct | UpdateProduct | RecordMovement => MANAGER_OR_ADMIN,
        CreateCategory | UpdateCategory => MANAGER_OR_ADMIN,
        ViewInventoryReport | ViewMovementsReport => MANAGER_OR_ADMIN,
        DeactivateProduct | DeactivateCategory | ListUsers => ADMIN_ONLY,
    }
}

/// Shared gate: checked by every handler instead of inline role comparisons.
pub fn require(role: Role, action: Action) -> Result<(), ApiError> {
    let allowed = allowed_roles(action);
    if allowed.is_empty() || allowed.contains(&role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "you do not have permission to perform this action",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employee_cannot_write_the_catalog() {
        assert!(require(Role::Employee, Action::CreateProduct).is_err());
        assert!(require(Role::Employee, Action::UpdateProduct).is_err());
        assert!(require(Role::Employee, Action::RecordMovement).is_err());
        assert!(require(Role::Employee, Action::DeactivateProduct).is_err());
    }

    #[test]
    fn manager_writes_but_does_not_deactivate() {
        assert!(require(Role::Manager, Action::CreateProduct).is_ok());
        assert!(require(Role::Manager, Action::UpdateProduct).is_ok());
        assert!(require(Role::Manager, Action::RecordMovement).is_ok());
        assert!(require(Role::Manager, Action::DeactivateProduct).is_err());
        assert!(require(Role::Manager, Action::ListUsers).is_err());
    }

    #[test]
    fn admin_is_allowed_everywhere() {
        for action in [
            Action::ListProducts,
            Action::CreateProduct,
            Action::DeactivateProduct,
            Action::DeactivateCategory,
            Action::ListUsers,
            Action::ViewInventoryReport,
        ] {
            assert!(require(Role::Admin, action).is_ok());
        }
    }

    #[test]
    fn reads_are_open_to_all_roles() {
        for role in [Role::Admin, Role::Manager, Role::Employee] {
            assert!(require(role, Action::ListProducts).is_ok());
            assert!(require(role, Action::ViewDashboard).is_ok());
            assert!(require(role, Action::ListCategories).is_ok());
        }
    }

    #[test]
    fn reports_are_gated_to_manager_and_admin() {
        assert!(require(Role::Employee, Action::ViewInventoryReport).is_err());
        assert!(require(Role::Employee, Action::ViewMovementsReport).is_err());
        assert!(require(Role::Manager, Action::ViewMovementsReport).is_ok());
    }
}
