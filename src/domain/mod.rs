// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// - access: roles, principals, scopes and the field capability table
// - order: the order aggregate and everything needed to create and revise it
//
// Nothing here talks to the database directly; storage goes through the
// traits in `crate::store`.
//
// ============================================================================

pub mod access;
pub mod order;
