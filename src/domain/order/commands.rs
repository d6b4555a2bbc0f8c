use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::access::Role;

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================

/// Fields a caterer or admin may revise after creation. Absent (or `null`)
/// fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailsUpdate {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub final_total: Option<Decimal>,
    #[serde(default)]
    pub deposit_paid: Option<Decimal>,
    #[serde(default)]
    pub delivery_instructions: Option<String>,
}

impl DetailsUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.final_total.is_none()
            && self.deposit_paid.is_none()
            && self.delivery_instructions.is_none()
    }
}

#[derive(Debug, Clone)]
pub enum OrderCommand {
    UpdateDetails {
        role: Role,
        update: DetailsUpdate,
    },
}
