//! Brand repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD + paginated list APIs over the `brands` table.
//! - Keep SQL details inside the core persistence boundary.
//! - Translate unique-name violations into `RepoError::Conflict`.
//!
//! # Invariants
//! - Writes only accept validated `NewBrand` / `BrandPatch` values.
//! - Every mutation runs in one immediate transaction; a failed write is
//!   rolled back before the error is returned.
//! - `updated_at` never moves backwards and never changes on a no-op update.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{DbError, CASE_FOLD_FN};
use crate::model::brand::{Brand, BrandId, BrandPage, BrandPatch, BrandStatus, NewBrand};
use rusqlite::ffi;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const BRAND_SELECT_SQL: &str = "SELECT
    id,
    name,
    holder,
    status,
    created_at,
    updated_at
FROM brands";

const NOW_MS_SQL: &str = "CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER)";

const REQUIRED_BRAND_COLUMNS: &[&str] = &[
    "id",
    "name",
    "holder",
    "status",
    "created_at",
    "updated_at",
];

/// Default page size when callers omit `limit`.
pub const BRANDS_DEFAULT_LIMIT: u32 = 10;
/// Upper bound applied to caller-supplied `limit`.
pub const BRANDS_LIMIT_MAX: u32 = 100;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for brand persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(BrandId),
    /// Another brand already owns this name.
    Conflict { name: String },
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "brand not found: {id}"),
            Self::Conflict { .. } => write!(f, "brand name already exists"),
            Self::InvalidData(message) => write!(f, "invalid persisted brand data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Normalized list options. Build with [`BrandListOptions::normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandListOptions {
    pub limit: u32,
    pub offset: u32,
    /// Name filter, kept verbatim. `None` when absent or whitespace-only.
    pub name_filter: Option<String>,
}

impl Default for BrandListOptions {
    fn default() -> Self {
        Self {
            limit: BRANDS_DEFAULT_LIMIT,
            offset: 0,
            name_filter: None,
        }
    }
}

impl BrandListOptions {
    /// Clamps `limit` into `[1, 100]` (default 10), `offset` to `>= 0`, and
    /// drops blank filters. Non-blank filters keep their surrounding spaces.
    pub fn normalize(limit: Option<i64>, offset: Option<i64>, filter: Option<&str>) -> Self {
        let limit = match limit {
            Some(value) => value.clamp(1, i64::from(BRANDS_LIMIT_MAX)) as u32,
            None => BRANDS_DEFAULT_LIMIT,
        };
        let offset = offset
            .unwrap_or(0)
            .clamp(0, i64::from(u32::MAX)) as u32;
        let name_filter = filter
            .filter(|value| !value.trim().is_empty())
            .map(str::to_string);

        Self {
            limit,
            offset,
            name_filter,
        }
    }
}

/// Repository interface for brand CRUD operations.
pub trait BrandRepository {
    /// Inserts a brand with a fresh id and server timestamps.
    fn create_brand(&mut self, brand: &NewBrand) -> RepoResult<Brand>;
    /// Inserts a brand with a caller-provided id (import paths and tests).
    fn create_brand_with_id(&mut self, id: BrandId, brand: &NewBrand) -> RepoResult<Brand>;
    fn get_brand(&self, id: BrandId) -> RepoResult<Option<Brand>>;
    fn list_brands(&mut self, options: &BrandListOptions) -> RepoResult<BrandPage>;
    /// Applies present patch fields. An empty patch returns the current row.
    fn update_brand(&mut self, id: BrandId, patch: &BrandPatch) -> RepoResult<Brand>;
    /// Hard-deletes one brand. Returns whether a row was removed.
    fn delete_brand(&mut self, id: BrandId) -> RepoResult<bool>;
}

/// SQLite-backed brand repository.
pub struct SqliteBrandRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteBrandRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` on schema drift.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_brand_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Wraps a connection whose database already passed
    /// [`ensure_brand_connection_ready`].
    pub fn from_checked(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl BrandRepository for SqliteBrandRepository<'_> {
    fn create_brand(&mut self, brand: &NewBrand) -> RepoResult<Brand> {
        self.create_brand_with_id(Uuid::new_v4(), brand)
    }

    fn create_brand_with_id(&mut self, id: BrandId, brand: &NewBrand) -> RepoResult<Brand> {
        if id.is_nil() {
            return Err(RepoError::InvalidData("brand id must not be nil".to_string()));
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let inserted = tx.execute(
            "INSERT INTO brands (id, name, holder, status) VALUES (?1, ?2, ?3, ?4);",
            params![
                id.to_string(),
                brand.name(),
                brand.holder(),
                brand.status().as_str(),
            ],
        );
        if let Err(err) = inserted {
            // Dropping `tx` rolls the insert back.
            return Err(map_write_error(err, brand.name()));
        }

        let created = select_brand(&tx, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("inserted brand {id} could not be read back"))
        })?;
        tx.commit()?;
        Ok(created)
    }

    fn get_brand(&self, id: BrandId) -> RepoResult<Option<Brand>> {
        select_brand(self.conn, id)
    }

    fn list_brands(&mut self, options: &BrandListOptions) -> RepoResult<BrandPage> {
        // Both sides are folded with Unicode lowercase; the pattern in Rust,
        // stored names through the registered SQL function.
        let pattern = options
            .name_filter
            .as_deref()
            .map(|filter| like_contains_pattern(&filter.to_lowercase()));
        let name_match = format!("(?1 IS NULL OR {CASE_FOLD_FN}(name) LIKE ?1 ESCAPE '\\')");
        let tx = self.conn.transaction()?;

        let total: i64 = tx.query_row(
            &format!("SELECT COUNT(*) FROM brands WHERE {name_match};"),
            params![pattern.as_deref()],
            |row| row.get(0),
        )?;

        let mut items = Vec::new();
        {
            let mut stmt = tx.prepare(&format!(
                "{BRAND_SELECT_SQL}
                 WHERE {name_match}
                 ORDER BY created_at DESC, id ASC
                 LIMIT ?2 OFFSET ?3;"
            ))?;
            let mut rows = stmt.query(params![
                pattern.as_deref(),
                i64::from(options.limit),
                i64::from(options.offset),
            ])?;
            while let Some(row) = rows.next()? {
                items.push(parse_brand_row(row)?);
            }
        }
        tx.commit()?;

        let total = u64::try_from(total)
            .map_err(|_| RepoError::InvalidData(format!("negative brand count {total}")))?;
        Ok(BrandPage { total, items })
    }

    fn update_brand(&mut self, id: BrandId, patch: &BrandPatch) -> RepoResult<Brand> {
        if patch.is_empty() {
            return select_brand(self.conn, id)?.ok_or(RepoError::NotFound(id));
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = select_brand(&tx, id)?.ok_or(RepoError::NotFound(id))?;
        let next = patch.apply_to(&current);
        if next == current {
            return Ok(current);
        }

        let updated = tx.execute(
            &format!(
                "UPDATE brands
                 SET
                    name = ?2,
                    holder = ?3,
                    status = ?4,
                    updated_at = MAX(updated_at, {NOW_MS_SQL})
                 WHERE id = ?1;"
            ),
            params![
                id.to_string(),
                next.name.as_str(),
                next.holder.as_deref(),
                next.status.as_str(),
            ],
        );
        match updated {
            Ok(0) => return Err(RepoError::NotFound(id)),
            Ok(_) => {}
            Err(err) => return Err(map_write_error(err, next.name.as_str())),
        }

        let stored = select_brand(&tx, id)?.ok_or(RepoError::NotFound(id))?;
        tx.commit()?;
        Ok(stored)
    }

    fn delete_brand(&mut self, id: BrandId) -> RepoResult<bool> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let removed = tx.execute("DELETE FROM brands WHERE id = ?1;", [id.to_string()])?;
        tx.commit()?;
        Ok(removed > 0)
    }
}

/// Checks that `conn` carries the migrated `brands` schema.
pub fn ensure_brand_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table_exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'brands'
        );",
        [],
        |row| row.get(0),
    )?;
    if table_exists == 0 {
        return Err(RepoError::MissingRequiredTable("brands"));
    }

    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('brands');")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    for &column in REQUIRED_BRAND_COLUMNS {
        if !columns.iter().any(|name| name == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: "brands",
                column,
            });
        }
    }

    Ok(())
}

fn select_brand(conn: &Connection, id: BrandId) -> RepoResult<Option<Brand>> {
    let mut stmt = conn.prepare(&format!("{BRAND_SELECT_SQL} WHERE id = ?1;"))?;
    let row = stmt
        .query_row([id.to_string()], |row| Ok(parse_brand_row(row)))
        .optional()?;
    row.transpose()
}

fn parse_brand_row(row: &Row<'_>) -> RepoResult<Brand> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in brands.id"))
    })?;

    let status_text: String = row.get("status")?;
    let status = BrandStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid brand status `{status_text}` in brands.status"
        ))
    })?;

    let created_at: i64 = row.get("created_at")?;
    let updated_at: i64 = row.get("updated_at")?;
    if updated_at < created_at {
        return Err(RepoError::InvalidData(format!(
            "brands.updated_at {updated_at} precedes created_at {created_at} for {id}"
        )));
    }

    Ok(Brand {
        id,
        name: row.get("name")?,
        holder: row.get("holder")?,
        status,
        created_at,
        updated_at,
    })
}

fn map_write_error(err: rusqlite::Error, name: &str) -> RepoError {
    match err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            RepoError::Conflict {
                name: name.to_string(),
            }
        }
        other => other.into(),
    }
}

/// Builds a `LIKE` pattern matching `needle` anywhere, escaping wildcards.
fn like_contains_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::{like_contains_pattern, BrandListOptions};

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_contains_pattern("ac"), "%ac%");
        assert_eq!(like_contains_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn normalize_clamps_limit_and_offset() {
        let defaults = BrandListOptions::normalize(None, None, None);
        assert_eq!(defaults, BrandListOptions::default());

        let clamped = BrandListOptions::normalize(Some(0), Some(-5), Some("   "));
        assert_eq!(clamped.limit, 1);
        assert_eq!(clamped.offset, 0);
        assert_eq!(clamped.name_filter, None);

        let capped = BrandListOptions::normalize(Some(500), Some(7), Some(" acme "));
        assert_eq!(capped.limit, 100);
        assert_eq!(capped.offset, 7);
        assert_eq!(capped.name_filter.as_deref(), Some(" acme "));
    }
}
