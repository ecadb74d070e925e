//! Pooled SQLite connections for request-scoped gateway calls.
//!
//! # Responsibility
//! - Resolve the configured database target.
//! - Build an r2d2 pool whose connections are configured on acquire.
//! - Run migrations once before the pool is handed out.
//!
//! # Invariants
//! - Every checkout is validated (`test_on_check_out`) before use.
//! - In-memory targets use a single long-lived connection so all callers
//!   share one database.

use super::migrations::apply_migrations;
use super::open::configure_connection;
use super::{DbError, DbResult};
use log::{error, info};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub type DbPool = Pool<SqliteConnectionManager>;

const MEMORY_ALIASES: &[&str] = &[":memory:", "sqlite::memory:", "sqlite://:memory:"];

/// Where the brands store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbTarget {
    File(PathBuf),
    Memory,
}

impl DbTarget {
    /// Parses a database url.
    ///
    /// Accepted forms: `sqlite://path`, `sqlite:path`, a plain path, or
    /// `sqlite::memory:` / `:memory:`.
    pub fn parse(url: &str) -> DbResult<Self> {
        let trimmed = url.trim();
        if MEMORY_ALIASES.contains(&trimmed) {
            return Ok(Self::Memory);
        }

        let path = trimmed
            .strip_prefix("sqlite://")
            .or_else(|| trimmed.strip_prefix("sqlite:"))
            .unwrap_or(trimmed);
        if path.is_empty() || path.contains("://") {
            return Err(DbError::InvalidTarget(trimmed.to_string()));
        }

        Ok(Self::File(PathBuf::from(path)))
    }

    fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }
}

/// Pool sizing and checkout behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolOptions {
    pub max_size: u32,
    pub connection_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_size: 8,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

/// Builds a migrated connection pool for `target`.
///
/// # Errors
/// - Returns `DbError::Pool` when connections cannot be established in time.
/// - Returns migration errors unchanged.
pub fn open_pool(target: &DbTarget, options: &PoolOptions) -> DbResult<DbPool> {
    let started_at = Instant::now();
    info!(
        "event=db_pool_open module=db status=start mode={} max_size={}",
        target.mode(),
        options.max_size
    );

    let result = build_pool(target, options).and_then(|pool| {
        let mut conn = pool.get()?;
        apply_migrations(&mut conn)?;
        Ok(pool)
    });

    match &result {
        Ok(pool) => info!(
            "event=db_pool_open module=db status=ok mode={} connections={} duration_ms={}",
            target.mode(),
            pool.state().connections,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_pool_open module=db status=error mode={} duration_ms={} error_code=db_pool_open_failed error={}",
            target.mode(),
            started_at.elapsed().as_millis(),
            err
        ),
    }

    result
}

/// Round-trips `SELECT 1` through a pooled connection.
pub fn check_liveness(pool: &DbPool) -> DbResult<i64> {
    let conn = pool.get()?;
    let value = conn.query_row("SELECT 1;", [], |row| row.get::<_, i64>(0))?;
    Ok(value)
}

fn build_pool(target: &DbTarget, options: &PoolOptions) -> DbResult<DbPool> {
    let builder = Pool::builder()
        .connection_timeout(options.connection_timeout)
        .test_on_check_out(true);

    let pool = match target {
        DbTarget::File(path) => {
            let manager = SqliteConnectionManager::file(path)
                .with_init(|conn| configure_connection(conn));
            builder.max_size(options.max_size.max(1)).build(manager)?
        }
        DbTarget::Memory => {
            let manager =
                SqliteConnectionManager::memory().with_init(|conn| configure_connection(conn));
            builder
                .max_size(1)
                .min_idle(Some(1))
                .idle_timeout(None)
                .max_lifetime(None)
                .build(manager)?
        }
    };

    Ok(pool)
}
