use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Coarse-grained capability checked by handlers and the client shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewDashboard,
    ViewInventory,
    ManageInventory,
    ManageStores,
    ManageSupplies,
    ViewOrders,
    ManageOrders,
    ViewAnalytics,
    ManageUsers,
}

impl Permission {
    pub const ALL: [Permission; 9] = [
        Permission::ViewDashboard,
        Permission::ViewInventory,
        Permission::ManageInventory,
        Permission::ManageStores,
        Permission::ManageSupplies,
        Permission::ViewOrders,
        Permission::ManageOrders,
        Permission::ViewAnalytics,
        Permission::ManageUsers,
    ];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Role {
    Admin,
    #[default]
    Employer,
    Pharmacist,
}

const EMPLOYER_PERMISSIONS: &[Permission] = &[
    Permission::ViewDashboard,
    Permission::ViewInventory,
    Permission::ManageInventory,
    Permission::ManageStores,
    Permission::ManageSupplies,
    Permission::ViewOrders,
    Permission::ManageOrders,
    Permission::ViewAnalytics,
];

const PHARMACIST_PERMISSIONS: &[Permission] = &[
    Permission::ViewDashboard,
    Permission::ViewInventory,
    Permission::ManageSupplies,
    Permission::ViewOrders,
    Permission::ManageOrders,
];

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employer => "employer",
            Role::Pharmacist => "pharmacist",
        }
    }

    pub fn permissions(self) -> &'static [Permission] {
        match self {
            Role::Admin => &Permission::ALL,
            Role::Employer => EMPLOYER_PERMISSIONS,
            Role::Pharmacist => PHARMACIST_PERMISSIONS,
        }
    }

    pub fn can(self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "employer" => Ok(Role::Employer),
            "pharmacist" => Ok(Role::Pharmacist),
            other => anyhow::bail!("unknown role: {other}"),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Two-level role check: admins pass every check, everyone else only their own role.
pub fn role_grants(current: &str, requested: &str) -> bool {
    current.eq_ignore_ascii_case(Role::Admin.as_str()) || current.eq_ignore_ascii_case(requested)
}
