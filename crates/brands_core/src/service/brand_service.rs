//! Brand use-case service (the persistence gateway entry point).
//!
//! # Responsibility
//! - Check out a pooled connection per call and run one repository operation.
//! - Validate raw payloads before they reach storage.
//! - Classify failures into domain outcomes callers can map directly.
//!
//! # Invariants
//! - A malformed id never matches a record: `get`/`update` report
//!   `NotFound`, `delete` reports `false`.
//! - Raw store error text never leaves this layer except through `Internal`.
//! - No call is retried here; conflicts and misses are content-driven.
//! - Schema readiness is verified on the first successful checkout and then
//!   cached for every clone sharing the pool.

use crate::db::{DbError, DbPool};
use crate::model::brand::{
    Brand, BrandId, BrandListQuery, BrandPage, BrandValidationError, CreateBrandInput,
    UpdateBrandInput,
};
use crate::repo::brand_repo::{
    ensure_brand_connection_ready, BrandListOptions, BrandRepository, RepoError, RepoResult,
    SqliteBrandRepository,
};
use log::{error, info, warn};
use once_cell::sync::OnceCell;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, BrandServiceError>;

/// Domain-level outcome of a failed gateway call.
#[derive(Debug)]
pub enum BrandServiceError {
    /// Payload failed schema constraints.
    Validation(BrandValidationError),
    /// No live brand with the given (raw) id.
    NotFound(String),
    /// Name uniqueness would be violated; the write was rolled back.
    Conflict,
    /// Store could not be reached or stayed busy past the timeout.
    StoreUnavailable(DbError),
    /// Anything else; details are for logs only.
    Internal(RepoError),
}

impl Display for BrandServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "brand not found: {id}"),
            Self::Conflict => write!(f, "brand name already exists"),
            Self::StoreUnavailable(err) => write!(f, "brand store unavailable: {err}"),
            Self::Internal(err) => write!(f, "brand store failure: {err}"),
        }
    }
}

impl Error for BrandServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::StoreUnavailable(err) => Some(err),
            Self::Internal(err) => Some(err),
            Self::NotFound(_) | Self::Conflict => None,
        }
    }
}

impl From<RepoError> for BrandServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id.to_string()),
            RepoError::Conflict { .. } => Self::Conflict,
            RepoError::Db(err) if is_transient(&err) => Self::StoreUnavailable(err),
            other => Self::Internal(other),
        }
    }
}

impl From<DbError> for BrandServiceError {
    fn from(value: DbError) -> Self {
        RepoError::Db(value).into()
    }
}

impl BrandServiceError {
    /// Stable short code used in logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::NotFound(_) => "not_found",
            Self::Conflict => "name_conflict",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::Internal(_) => "internal",
        }
    }
}

/// Pool-backed service exposing the brand CRUD use-cases.
///
/// Cheap to clone; clones share the same pool.
#[derive(Clone)]
pub struct BrandService {
    pool: DbPool,
    schema_ready: Arc<OnceCell<()>>,
}

impl BrandService {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            schema_ready: Arc::new(OnceCell::new()),
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Validates and inserts a new brand.
    pub fn create_brand(&self, input: &CreateBrandInput) -> ServiceResult<Brand> {
        let brand = input.validate().map_err(BrandServiceError::Validation)?;
        self.run("brand_create", |repo| repo.create_brand(&brand))
    }

    /// Loads one brand by raw id.
    pub fn get_brand(&self, raw_id: &str) -> ServiceResult<Brand> {
        let Some(id) = parse_brand_id(raw_id) else {
            return Err(BrandServiceError::NotFound(raw_id.to_string()));
        };
        self.run("brand_get", |repo| {
            repo.get_brand(id)?.ok_or(RepoError::NotFound(id))
        })
    }

    /// Lists brands with clamped pagination and optional name filter.
    pub fn list_brands(&self, query: &BrandListQuery) -> ServiceResult<BrandPage> {
        let options = BrandListOptions::normalize(query.limit, query.offset, query.q.as_deref());
        self.run("brand_list", |repo| repo.list_brands(&options))
    }

    /// Validates and applies a partial update.
    pub fn update_brand(&self, raw_id: &str, input: &UpdateBrandInput) -> ServiceResult<Brand> {
        let patch = input.validate().map_err(BrandServiceError::Validation)?;
        let Some(id) = parse_brand_id(raw_id) else {
            return Err(BrandServiceError::NotFound(raw_id.to_string()));
        };
        self.run("brand_update", |repo| repo.update_brand(id, &patch))
    }

    /// Hard-deletes one brand. Returns `false` when nothing matched.
    pub fn delete_brand(&self, raw_id: &str) -> ServiceResult<bool> {
        let Some(id) = parse_brand_id(raw_id) else {
            return Ok(false);
        };
        self.run("brand_delete", |repo| repo.delete_brand(id))
    }

    fn run<T>(
        &self,
        event: &'static str,
        op: impl FnOnce(&mut SqliteBrandRepository<'_>) -> RepoResult<T>,
    ) -> ServiceResult<T> {
        let started_at = Instant::now();
        let result = self
            .pool
            .get()
            .map_err(|err| BrandServiceError::from(DbError::from(err)))
            .and_then(|mut conn| {
                self.schema_ready
                    .get_or_try_init(|| ensure_brand_connection_ready(&conn))?;
                let mut repo = SqliteBrandRepository::from_checked(&mut conn);
                op(&mut repo).map_err(BrandServiceError::from)
            });

        let duration_ms = started_at.elapsed().as_millis();
        match &result {
            Ok(_) => info!("event={event} module=service status=ok duration_ms={duration_ms}"),
            Err(
                err @ (BrandServiceError::Validation(_)
                | BrandServiceError::NotFound(_)
                | BrandServiceError::Conflict),
            ) => warn!(
                "event={event} module=service status=rejected duration_ms={duration_ms} error_code={}",
                err.code()
            ),
            Err(err) => error!(
                "event={event} module=service status=error duration_ms={duration_ms} error_code={} error={}",
                err.code(),
                err
            ),
        }

        result
    }
}

/// Parses a caller-supplied id. Anything that is not a non-nil UUID is `None`.
pub fn parse_brand_id(raw: &str) -> Option<BrandId> {
    Uuid::parse_str(raw.trim()).ok().filter(|id| !id.is_nil())
}

fn is_transient(err: &DbError) -> bool {
    match err {
        DbError::Pool(_) => true,
        DbError::Sqlite(rusqlite::Error::SqliteFailure(failure, _)) => matches!(
            failure.code,
            ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::CannotOpen
                | ErrorCode::SystemIoFailure
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::parse_brand_id;

    #[test]
    fn parse_brand_id_rejects_malformed_and_nil() {
        assert!(parse_brand_id("not-a-uuid").is_none());
        assert!(parse_brand_id("").is_none());
        assert!(parse_brand_id("00000000-0000-0000-0000-000000000000").is_none());
        assert!(parse_brand_id("11111111-2222-4333-8444-555555555555").is_some());
    }
}
