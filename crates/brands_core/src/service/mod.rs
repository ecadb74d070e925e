//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate pooled repository calls into use-case level APIs.
//! - Keep the HTTP layer decoupled from storage details.

pub mod brand_service;
