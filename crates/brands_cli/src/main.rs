//! Database connectivity probe.
//!
//! # Responsibility
//! - Open the store named by `DATABASE_URL` (migrating it if needed).
//! - Run a trivial query and print `DB OK: <value>`.
//! - Exit non-zero with the failure on stderr when the store is unreachable.

use brands_core::{check_liveness, core_version, open_pool, DbTarget, PoolOptions};
use std::process::ExitCode;

const DEFAULT_DATABASE_URL: &str = "sqlite://brands.db";

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    println!("brands_core version={}", core_version());

    match probe() {
        Ok(value) => {
            println!("DB OK: {value}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("DB ERROR: {err}");
            ExitCode::FAILURE
        }
    }
}

fn probe() -> Result<i64, brands_core::DbError> {
    let url = std::env::var("DATABASE_URL")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
    let target = DbTarget::parse(&url)?;
    let pool = open_pool(
        &target,
        &PoolOptions {
            max_size: 1,
            ..PoolOptions::default()
        },
    )?;
    check_liveness(&pool)
}
