use brands_core::db::migrations::latest_version;
use brands_core::db::open_db_in_memory;
use brands_core::{
    BrandListOptions, BrandPatch, BrandRepository, BrandStatus, CreateBrandInput, NewBrand,
    RepoError, SqliteBrandRepository, UpdateBrandInput,
};
use rusqlite::Connection;
use uuid::Uuid;

fn new_brand(name: &str) -> NewBrand {
    CreateBrandInput {
        name: Some(name.to_string()),
        ..CreateBrandInput::default()
    }
    .validate()
    .unwrap()
}

fn patch(name: Option<&str>, holder: Option<&str>, status: Option<&str>) -> BrandPatch {
    UpdateBrandInput {
        name: name.map(str::to_string),
        holder: holder.map(str::to_string),
        status: status.map(str::to_string),
    }
    .validate()
    .unwrap()
}

fn brand_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM brands;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn create_and_get_roundtrip() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBrandRepository::try_new(&mut conn).unwrap();

    let input = CreateBrandInput {
        name: Some("Acme".to_string()),
        holder: Some("Jane".to_string()),
        status: Some("draft".to_string()),
    }
    .validate()
    .unwrap();
    let created = repo.create_brand(&input).unwrap();

    assert!(!created.id.is_nil());
    assert_eq!(created.name, "Acme");
    assert_eq!(created.holder.as_deref(), Some("Jane"));
    assert_eq!(created.status, BrandStatus::Draft);
    assert!(created.updated_at >= created.created_at);

    let loaded = repo.get_brand(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn duplicate_name_conflicts_without_leaving_a_row() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut repo = SqliteBrandRepository::try_new(&mut conn).unwrap();
        repo.create_brand(&new_brand("Acme")).unwrap();

        let err = repo.create_brand(&new_brand("Acme")).unwrap_err();
        assert!(matches!(err, RepoError::Conflict { ref name } if name == "Acme"));
    }

    assert_eq!(brand_count(&conn), 1);
}

#[test]
fn get_unknown_id_returns_none() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteBrandRepository::try_new(&mut conn).unwrap();

    assert!(repo.get_brand(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn empty_update_returns_current_record_unchanged() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBrandRepository::try_new(&mut conn).unwrap();
    let created = repo.create_brand(&new_brand("Acme")).unwrap();

    let unchanged = repo
        .update_brand(created.id, &BrandPatch::default())
        .unwrap();
    assert_eq!(unchanged, created);
}

#[test]
fn empty_update_on_missing_brand_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBrandRepository::try_new(&mut conn).unwrap();
    let id = Uuid::new_v4();

    let err = repo.update_brand(id, &BrandPatch::default()).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(missing) if missing == id));
}

#[test]
fn holder_only_update_keeps_other_fields_and_advances_timestamp() {
    let mut conn = open_db_in_memory().unwrap();
    let created = {
        let mut repo = SqliteBrandRepository::try_new(&mut conn).unwrap();
        repo.create_brand(&new_brand("Acme")).unwrap()
    };
    conn.execute(
        "UPDATE brands SET created_at = 1000, updated_at = 1000 WHERE id = ?1;",
        [created.id.to_string()],
    )
    .unwrap();

    let mut repo = SqliteBrandRepository::try_new(&mut conn).unwrap();
    let updated = repo
        .update_brand(created.id, &patch(None, Some("Jane"), None))
        .unwrap();

    assert_eq!(updated.name, "Acme");
    assert_eq!(updated.status, BrandStatus::Active);
    assert_eq!(updated.holder.as_deref(), Some("Jane"));
    assert_eq!(updated.created_at, 1000);
    assert!(updated.updated_at > 1000);
}

#[test]
fn update_with_identical_values_does_not_touch_timestamp() {
    let mut conn = open_db_in_memory().unwrap();
    let created = {
        let mut repo = SqliteBrandRepository::try_new(&mut conn).unwrap();
        repo.create_brand(&new_brand("Acme")).unwrap()
    };
    conn.execute(
        "UPDATE brands SET created_at = 1000, updated_at = 2000 WHERE id = ?1;",
        [created.id.to_string()],
    )
    .unwrap();

    let mut repo = SqliteBrandRepository::try_new(&mut conn).unwrap();
    let same = repo
        .update_brand(created.id, &patch(Some("Acme"), None, Some("active")))
        .unwrap();
    assert_eq!(same.updated_at, 2000);
}

#[test]
fn updated_at_never_moves_backwards() {
    let mut conn = open_db_in_memory().unwrap();
    let created = {
        let mut repo = SqliteBrandRepository::try_new(&mut conn).unwrap();
        repo.create_brand(&new_brand("Acme")).unwrap()
    };
    let far_future = 32_503_680_000_000_i64;
    conn.execute(
        "UPDATE brands SET updated_at = ?2 WHERE id = ?1;",
        rusqlite::params![created.id.to_string(), far_future],
    )
    .unwrap();

    let mut repo = SqliteBrandRepository::try_new(&mut conn).unwrap();
    let updated = repo
        .update_brand(created.id, &patch(None, None, Some("inactive")))
        .unwrap();
    assert_eq!(updated.status, BrandStatus::Inactive);
    assert_eq!(updated.updated_at, far_future);
}

#[test]
fn rename_onto_existing_name_conflicts_and_keeps_prior_state() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBrandRepository::try_new(&mut conn).unwrap();
    repo.create_brand(&new_brand("Acme")).unwrap();
    let globex = repo.create_brand(&new_brand("Globex")).unwrap();

    let err = repo
        .update_brand(globex.id, &patch(Some("Acme"), Some("Hank"), None))
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict { .. }));

    let reloaded = repo.get_brand(globex.id).unwrap().unwrap();
    assert_eq!(reloaded, globex);
}

#[test]
fn update_missing_brand_returns_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBrandRepository::try_new(&mut conn).unwrap();
    let id = Uuid::new_v4();

    let err = repo
        .update_brand(id, &patch(None, Some("Jane"), None))
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(missing) if missing == id));
}

#[test]
fn delete_reports_whether_a_row_was_removed() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBrandRepository::try_new(&mut conn).unwrap();
    let created = repo.create_brand(&new_brand("Acme")).unwrap();

    assert!(repo.delete_brand(created.id).unwrap());
    assert!(!repo.delete_brand(created.id).unwrap());
    assert!(repo.get_brand(created.id).unwrap().is_none());
}

#[test]
fn deleted_name_can_be_reused_with_a_new_id() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBrandRepository::try_new(&mut conn).unwrap();
    let first = repo.create_brand(&new_brand("Acme")).unwrap();
    repo.delete_brand(first.id).unwrap();

    let second = repo.create_brand(&new_brand("Acme")).unwrap();
    assert_ne!(second.id, first.id);
}

#[test]
fn list_total_ignores_pagination_window() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBrandRepository::try_new(&mut conn).unwrap();
    for name in ["Acme", "Globex", "Initech"] {
        repo.create_brand(&new_brand(name)).unwrap();
    }

    let page = repo
        .list_brands(&BrandListOptions::normalize(Some(1), Some(0), None))
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 1);

    let all = repo
        .list_brands(&BrandListOptions::normalize(Some(100), None, None))
        .unwrap();
    assert_eq!(all.total, all.items.len() as u64);

    let past_end = repo
        .list_brands(&BrandListOptions::normalize(Some(10), Some(10), None))
        .unwrap();
    assert_eq!(past_end.total, 3);
    assert!(past_end.items.is_empty());
}

#[test]
fn list_filter_is_case_insensitive_substring() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBrandRepository::try_new(&mut conn).unwrap();
    for name in ["Acme Corp", "ACME Labs", "Globex", "50% Off"] {
        repo.create_brand(&new_brand(name)).unwrap();
    }

    let page = repo
        .list_brands(&BrandListOptions::normalize(None, None, Some("acme")))
        .unwrap();
    assert_eq!(page.total, 2);
    assert!(page.items.iter().all(|item| item.name.to_lowercase().contains("acme")));

    let literal_percent = repo
        .list_brands(&BrandListOptions::normalize(None, None, Some("0%")))
        .unwrap();
    assert_eq!(literal_percent.total, 1);
    assert_eq!(literal_percent.items[0].name, "50% Off");

    let wildcard_underscore = repo
        .list_brands(&BrandListOptions::normalize(None, None, Some("_")))
        .unwrap();
    assert_eq!(wildcard_underscore.total, 0);
}

#[test]
fn list_filter_folds_non_ascii_case() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBrandRepository::try_new(&mut conn).unwrap();
    for name in ["Ñandú Foods", "ÉCLAIR Paris", "Globex"] {
        repo.create_brand(&new_brand(name)).unwrap();
    }

    let lower = repo
        .list_brands(&BrandListOptions::normalize(None, None, Some("ñandú")))
        .unwrap();
    assert_eq!(lower.total, 1);
    assert_eq!(lower.items[0].name, "Ñandú Foods");

    let upper = repo
        .list_brands(&BrandListOptions::normalize(None, None, Some("ÑANDÚ")))
        .unwrap();
    assert_eq!(upper.total, 1);

    let accented = repo
        .list_brands(&BrandListOptions::normalize(None, None, Some("éclair")))
        .unwrap();
    assert_eq!(accented.total, 1);
    assert_eq!(accented.items[0].name, "ÉCLAIR Paris");
}

#[test]
fn list_filter_keeps_surrounding_spaces() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBrandRepository::try_new(&mut conn).unwrap();
    for name in ["Acme Corp", "Corpus Labs"] {
        repo.create_brand(&new_brand(name)).unwrap();
    }

    let spaced = repo
        .list_brands(&BrandListOptions::normalize(None, None, Some(" corp")))
        .unwrap();
    assert_eq!(spaced.total, 1);
    assert_eq!(spaced.items[0].name, "Acme Corp");

    let bare = repo
        .list_brands(&BrandListOptions::normalize(None, None, Some("corp")))
        .unwrap();
    assert_eq!(bare.total, 2);
}

#[test]
fn list_orders_newest_first_with_id_tie_break() {
    let mut conn = open_db_in_memory().unwrap();
    let ids = [
        "00000000-0000-4000-8000-000000000001",
        "00000000-0000-4000-8000-000000000002",
        "00000000-0000-4000-8000-000000000003",
    ]
    .map(|id| Uuid::parse_str(id).unwrap());
    {
        let mut repo = SqliteBrandRepository::try_new(&mut conn).unwrap();
        repo.create_brand_with_id(ids[2], &new_brand("Initech")).unwrap();
        repo.create_brand_with_id(ids[0], &new_brand("Acme")).unwrap();
        repo.create_brand_with_id(ids[1], &new_brand("Globex")).unwrap();
    }
    conn.execute("UPDATE brands SET created_at = 1000, updated_at = 1000;", [])
        .unwrap();
    conn.execute(
        "UPDATE brands SET created_at = 5000, updated_at = 5000 WHERE id = ?1;",
        [ids[2].to_string()],
    )
    .unwrap();

    let mut repo = SqliteBrandRepository::try_new(&mut conn).unwrap();
    let options = BrandListOptions::normalize(Some(2), Some(1), None);
    let first = repo.list_brands(&options).unwrap();
    let second = repo.list_brands(&options).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.items[0].id, ids[0]);
    assert_eq!(first.items[1].id, ids[1]);

    let head = repo
        .list_brands(&BrandListOptions::normalize(Some(1), None, None))
        .unwrap();
    assert_eq!(head.items[0].id, ids[2]);
}

#[test]
fn create_with_nil_id_is_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBrandRepository::try_new(&mut conn).unwrap();

    let err = repo
        .create_brand_with_id(Uuid::nil(), &new_brand("Acme"))
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn read_rejects_invalid_persisted_status() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "PRAGMA ignore_check_constraints = ON;
         INSERT INTO brands (id, name, status)
         VALUES ('11111111-2222-4333-8444-555555555555', 'Acme', 'archived');",
    )
    .unwrap();

    let repo = SqliteBrandRepository::try_new(&mut conn).unwrap();
    let err = repo
        .get_brand(Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap())
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let mut conn = Connection::open_in_memory().unwrap();

    let result = SqliteBrandRepository::try_new(&mut conn);
    match result {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_brands_table() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteBrandRepository::try_new(&mut conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("brands"))
    ));
}

#[test]
fn repository_rejects_connection_missing_required_column() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE brands (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL DEFAULT 'active',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteBrandRepository::try_new(&mut conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "brands",
            column: "holder"
        })
    ));
}
