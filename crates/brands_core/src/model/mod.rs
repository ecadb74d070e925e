//! Domain model for the brands registry.
//!
//! # Responsibility
//! - Define the canonical brand record and its payload shapes.
//! - Own field-level validation rules for create/update requests.
//!
//! # Invariants
//! - Every brand is identified by a stable `BrandId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod brand;
