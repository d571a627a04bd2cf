//! Staff roles and permission checks
//!
//! Roles form a fixed ladder; a permission names the lowest role allowed to
//! perform an action, and a check is an ordinal comparison.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, ErrorCode};

/// Back-office role, ordered from least to most privileged
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Viewer,
    Operations,
    Finance,
    Admin,
    Owner,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Viewer,
        Role::Operations,
        Role::Finance,
        Role::Admin,
        Role::Owner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Operations => "operations",
            Role::Finance => "finance",
            Role::Admin => "admin",
            Role::Owner => "owner",
        }
    }

    /// `true` when this role ranks at or above `required`
    pub fn at_least(&self, required: Role) -> bool {
        *self >= required
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.at_least(permission.min_role())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == normalized)
            .ok_or_else(|| {
                AppError::with_message(ErrorCode::IdentityInvalid, format!("Unknown role: {s}"))
            })
    }
}

/// Guarded back-office actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Read catalog, packages, inquiries and queries
    Read,
    /// Create/update locations, hotels, activities, itineraries, packages
    CatalogWrite,
    /// Create/update inquiries and tour package queries
    QueriesWrite,
    /// Read purchases, sales, vouchers, ledgers
    AccountingRead,
    /// Create/update purchases, sales, returns, vouchers, ledgers, TDS
    AccountingWrite,
    /// Outstanding and TDS reports
    ReportsView,
    /// Manage operational staff and inquiry assignment
    StaffManage,
    /// Send one-off WhatsApp messages
    WhatsAppSend,
    /// Run WhatsApp marketing campaigns
    WhatsAppCampaign,
}

impl Permission {
    pub fn min_role(&self) -> Role {
        match self {
            Permission::Read => Role::Viewer,
            Permission::CatalogWrite => Role::Operations,
            Permission::QueriesWrite => Role::Operations,
            Permission::WhatsAppSend => Role::Operations,
            Permission::AccountingRead => Role::Finance,
            Permission::AccountingWrite => Role::Finance,
            Permission::ReportsView => Role::Finance,
            Permission::StaffManage => Role::Admin,
            Permission::WhatsAppCampaign => Role::Admin,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::CatalogWrite => "catalog:write",
            Permission::QueriesWrite => "queries:write",
            Permission::AccountingRead => "accounting:read",
            Permission::AccountingWrite => "accounting:write",
            Permission::ReportsView => "reports:view",
            Permission::StaffManage => "staff:manage",
            Permission::WhatsAppSend => "whatsapp:send",
            Permission::WhatsAppCampaign => "whatsapp:campaign",
        }
    }
}

/// Check a role against a permission, producing the API error on failure
pub fn require(role: Role, permission: Permission) -> Result<(), AppError> {
    if role.can(permission) {
        return Ok(());
    }
    let code = if permission.min_role() == Role::Admin {
        ErrorCode::AdminRequired
    } else {
        ErrorCode::RoleRequired
    };
    Err(AppError::new(code)
        .with_detail("permission", permission.name())
        .with_detail("required_role", permission.min_role().as_str())
        .with_detail("role", role.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Owner > Role::Admin);
        assert!(Role::Admin > Role::Finance);
        assert!(Role::Finance > Role::Operations);
        assert!(Role::Operations > Role::Viewer);
        assert!(Role::Finance.at_least(Role::Finance));
        assert!(!Role::Operations.at_least(Role::Finance));
    }

    #[test]
    fn test_parse_role_case_insensitive() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" finance ".parse::<Role>().unwrap(), Role::Finance);
        let err = "superuser".parse::<Role>().unwrap_err();
        assert_eq!(err.code, ErrorCode::IdentityInvalid);
    }

    #[test]
    fn test_permissions() {
        assert!(Role::Viewer.can(Permission::Read));
        assert!(!Role::Viewer.can(Permission::CatalogWrite));
        assert!(Role::Operations.can(Permission::QueriesWrite));
        assert!(!Role::Operations.can(Permission::AccountingWrite));
        assert!(Role::Finance.can(Permission::ReportsView));
        assert!(!Role::Finance.can(Permission::WhatsAppCampaign));
        assert!(Role::Owner.can(Permission::StaffManage));
    }

    #[test]
    fn test_require_error_codes() {
        assert!(require(Role::Finance, Permission::AccountingWrite).is_ok());

        let err = require(Role::Operations, Permission::AccountingWrite).unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleRequired);
        assert_eq!(
            err.details.as_ref().unwrap().get("required_role").unwrap(),
            "finance"
        );

        let err = require(Role::Finance, Permission::StaffManage).unwrap_err();
        assert_eq!(err.code, ErrorCode::AdminRequired);
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&Role::Operations).unwrap(), "\"operations\"");
        let role: Role = serde_json::from_str("\"owner\"").unwrap();
        assert_eq!(role, Role::Owner);
    }
}
