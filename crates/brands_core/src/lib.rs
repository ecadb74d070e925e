//! Core domain logic for the brands registry.
//! This crate is the single source of truth for brand invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{check_liveness, open_pool, DbError, DbPool, DbTarget, PoolOptions};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::brand::{
    Brand, BrandId, BrandListQuery, BrandPage, BrandPatch, BrandStatus, BrandValidationError,
    CreateBrandInput, FieldConstraint, FieldViolation, NewBrand, UpdateBrandInput,
};
pub use repo::brand_repo::{
    BrandListOptions, BrandRepository, RepoError, RepoResult, SqliteBrandRepository,
};
pub use service::brand_service::{BrandService, BrandServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
