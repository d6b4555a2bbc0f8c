use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// Principals, Scopes and the Field Capability Table
// ============================================================================
//
// The identity provider hands us an already authenticated principal. Two
// questions are answered here and nowhere else:
// - which orders the principal may see (Scope)
// - which order fields the principal may read or write (capability table)
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Caterer,
    Admin,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            // "client" is what the identity provider historically issued
            "customer" | "client" => Ok(Role::Customer),
            "caterer" => Ok(Role::Caterer),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub role: Role,
    pub caterer_account_id: Option<i64>,
}

impl Principal {
    #[cfg(test)]
    pub fn customer(id: i64) -> Self {
        Self { id, role: Role::Customer, caterer_account_id: None }
    }

    #[cfg(test)]
    pub fn caterer(id: i64, caterer_account_id: i64) -> Self {
        Self { id, role: Role::Caterer, caterer_account_id: Some(caterer_account_id) }
    }

    #[cfg(test)]
    pub fn admin(id: i64) -> Self {
        Self { id, role: Role::Admin, caterer_account_id: None }
    }

    /// The slice of orders this principal can see. `None` for a caterer
    /// principal that is not linked to a caterer account.
    pub fn scope(&self) -> Option<Scope> {
        match self.role {
            Role::Customer => Some(Scope::Client(self.id)),
            Role::Caterer => self.caterer_account_id.map(Scope::Caterer),
            Role::Admin => Some(Scope::All),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Client(i64),
    Caterer(i64),
    All,
}

impl Scope {
    #[cfg(test)]
    pub fn permits(&self, client_id: i64, caterer_id: i64) -> bool {
        match *self {
            Scope::Client(id) => client_id == id,
            Scope::Caterer(id) => caterer_id == id,
            Scope::All => true,
        }
    }
}

/// Order fields whose visibility or writability depends on the role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderField {
    Status,
    FinalTotal,
    DepositPaid,
    DeliveryInstructions,
}

impl OrderField {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderField::Status => "status",
            OrderField::FinalTotal => "final_total",
            OrderField::DepositPaid => "deposit_paid",
            OrderField::DeliveryInstructions => "delivery_instructions",
        }
    }
}

impl fmt::Display for OrderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Access {
    None,
    Read,
    Write,
}

const CAPABILITIES: &[(Role, OrderField, Access)] = &[
    (Role::Customer, OrderField::Status, Access::Read),
    (Role::Customer, OrderField::FinalTotal, Access::Read),
    (Role::Customer, OrderField::DepositPaid, Access::Read),
    (Role::Customer, OrderField::DeliveryInstructions, Access::Read),
    (Role::Caterer, OrderField::Status, Access::Write),
    (Role::Caterer, OrderField::FinalTotal, Access::Write),
    (Role::Caterer, OrderField::DepositPaid, Access::Write),
    (Role::Caterer, OrderField::DeliveryInstructions, Access::Write),
    (Role::Admin, OrderField::Status, Access::Write),
    (Role::Admin, OrderField::FinalTotal, Access::Write),
    (Role::Admin, OrderField::DepositPaid, Access::Write),
    (Role::Admin, OrderField::DeliveryInstructions, Access::Write),
];

/// Look up a (role, field) pair. Pairs missing from the table get no access.
pub fn access(role: Role, field: OrderField) -> Access {
    CAPABILITIES
        .iter()
        .find(|(r, f, _)| *r == role && *f == field)
        .map(|(_, _, access)| *access)
        .unwrap_or(Access::None)
}

pub fn can_read(role: Role, field: OrderField) -> bool {
    access(role, field) >= Access::Read
}

pub fn can_write(role: Role, field: OrderField) -> bool {
    access(role, field) == Access::Write
}
