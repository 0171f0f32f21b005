//! Laws the dashboard's building blocks must obey.
//!
//! These run against the library types directly and the files written by
//! the stores, without going through a session.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use secrecy::SecretString;

use revtee_core::{DateRange, KpiScope, PasswordDigest, ProductSelection, SalesRecord, UserRole};
use revtee_dashboard::services::Authenticator;
use revtee_dashboard::services::analytics;
use revtee_dashboard::store::{CredentialStore, RecordStore, RecordTable, UserTable};
use revtee_integration_tests::{TestFiles, jan, record};

fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_string())
}

fn sample() -> Vec<SalesRecord> {
    let mut undated = record(3, "Tee", 9, 9, 9, 900);
    undated.date = None;
    vec![
        record(1, "Tee", 5, 20, 2, 500),
        record(2, "Hoodie", 1, 10, 1, 300),
        record(2, "Tee", 3, 30, 3, 300),
        undated,
        record(20, "Cap", 2, 5, 0, 100),
        record(7, "Tee Noir", 4, 8, 2, 250),
    ]
}

// =============================================================================
// Hashing
// =============================================================================

#[test]
fn test_hash_is_deterministic() {
    for password in ["admin", "", "p@ss word", "ünïcødé"] {
        assert_eq!(PasswordDigest::of(password), PasswordDigest::of(password));
    }
}

#[test]
fn test_hash_distinguishes_inputs() {
    let inputs = ["admin", "Admin", "admin ", "x", "root", ""];
    for a in inputs {
        for b in inputs {
            assert_eq!(
                PasswordDigest::of(a) == PasswordDigest::of(b),
                a == b,
                "{a:?} vs {b:?}"
            );
        }
    }
}

#[test]
fn test_hash_of_admin() {
    assert_eq!(
        PasswordDigest::of("admin").as_str(),
        "8c6976e5b5410415bde908bd4dee15dfb167a9c873fc4bb8a81f6f2ab448a918"
    );
}

// =============================================================================
// Authentication
// =============================================================================

#[test]
fn test_authenticate_seeded_store() {
    let table = UserTable::seeded();
    let auth = Authenticator::new(&table);
    assert!(auth.authenticate("admin", &secret("admin")));
    assert!(!auth.authenticate("admin", &secret("wrong")));
}

#[test]
fn test_authenticate_requires_matching_pair() {
    let mut table = UserTable::seeded();
    table.add("amina", "tee", UserRole::Viewer).unwrap();
    let auth = Authenticator::new(&table);

    assert!(auth.authenticate("amina", &secret("tee")));
    assert!(!auth.authenticate("amina", &secret("admin")));
    assert!(!auth.authenticate("admin", &secret("tee")));
    assert!(!auth.authenticate("Amina", &secret("tee")));
    assert!(!auth.authenticate("nobody", &secret("tee")));
    assert!(!auth.authenticate("", &secret("")));
}

#[test]
fn test_is_admin_against_seed() {
    let table = UserTable::seeded();
    let auth = Authenticator::new(&table);
    assert!(auth.is_admin("admin"));
    for username in ["", "Admin", "administrator", "root", " admin"] {
        assert!(!auth.is_admin(username), "{username:?}");
    }
}

#[test]
fn test_rename_scenario() {
    let mut table = UserTable::seeded();
    table.rename_and_rehash("admin", "root", "x").unwrap();
    let auth = Authenticator::new(&table);

    assert!(auth.authenticate("root", &secret("x")));
    for password in ["admin", "x", ""] {
        assert!(!auth.authenticate("admin", &secret(password)));
    }
    // The role travels with the account.
    assert!(auth.is_admin("root"));
}

// =============================================================================
// Filtering
// =============================================================================

#[test]
fn test_filter_is_idempotent() {
    let records = sample();
    let ranges = [
        DateRange::between(jan(1), jan(7)).unwrap(),
        DateRange::unbounded(),
        DateRange::from_bounds(Some(jan(2)), None).unwrap(),
    ];
    let selections = [
        ProductSelection::All,
        ProductSelection::from_names(["Tee"]),
        ProductSelection::from_names(["Tee Noir", "Cap"]),
        ProductSelection::from_names(Vec::<String>::new()),
    ];

    for range in &ranges {
        for selection in &selections {
            let once = analytics::filter(&records, range, selection);
            let twice = analytics::filter(once.iter().copied(), range, selection);
            assert_eq!(once, twice, "{range} / {selection}");
        }
    }
}

#[test]
fn test_filter_all_is_date_subset() {
    let records = sample();
    let range = DateRange::between(jan(1), jan(7)).unwrap();

    let by_all = analytics::filter(&records, &range, &ProductSelection::All);
    let by_date: Vec<&SalesRecord> = records.iter().filter(|r| range.contains(r.date)).collect();
    assert_eq!(by_all, by_date);
    assert_eq!(by_all.len(), 4);
}

#[test]
fn test_filter_range_is_inclusive() {
    let records = sample();
    let range = DateRange::between(jan(2), jan(2)).unwrap();
    let subset = analytics::filter(&records, &range, &ProductSelection::All);
    assert_eq!(subset.len(), 2);
    assert!(subset.iter().all(|r| r.date == Some(jan(2))));
}

// =============================================================================
// Aggregation
// =============================================================================

#[test]
fn test_aggregate_empty_subset() {
    let kpis = analytics::aggregate(KpiScope::AllProducts, Vec::<&SalesRecord>::new()).unwrap();
    assert_eq!(kpis.total_units, 0);
    assert_eq!(kpis.total_visitors, 0);
    assert_eq!(kpis.conversion_rate, Decimal::ZERO);
    assert_eq!(kpis.total_revenue, Decimal::ZERO);
}

#[test]
fn test_aggregate_conversion_scenario() {
    let tee = record(1, "Tee", 5, 20, 2, 500);
    let range = DateRange::between(jan(1), jan(1)).unwrap();
    let subset = analytics::filter([&tee], &range, &ProductSelection::All);

    let kpis = analytics::aggregate(KpiScope::AllProducts, subset).unwrap();
    assert_eq!(kpis.conversion_rate, Decimal::from(10));
    assert_eq!(kpis.conversion_rate_display(), "10.00%");
}

#[test]
fn test_kpis_one_set_per_selected_product() {
    let records = sample();
    let selection = ProductSelection::from_names(["Cap", "Tee", "Missing"]);
    let subset = analytics::filter(&records, &DateRange::unbounded(), &selection);

    let sets = analytics::kpis(&subset, &selection).unwrap();
    let scopes: Vec<String> = sets.iter().map(|s| s.scope.to_string()).collect();
    assert_eq!(scopes, ["Cap", "Tee", "Missing"]);
    assert_eq!(sets[2].total_units, 0);
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_record_round_trip_is_stable() {
    let files = TestFiles::new();
    files.write_data(
        "Date,Produits_vendus,Ventes,Visiteurs,Conversions,Revenus\n\
         2024-01-01 00:00:00,Tee,5.0,20,2,500.50\n\
         01/02/2024,\"Tee, Noir\",1,2,0,10\n\
         garbage,Cap,1,1,1,1\n",
    );
    let store = RecordStore::new(&files.config.data_file);

    let first = store.load().unwrap().table;
    store.persist(&first).unwrap();
    let after_first = files.read_data();

    let second = store.load().unwrap().table;
    store.persist(&second).unwrap();
    assert_eq!(files.read_data(), after_first);
    assert_eq!(first, second);
    assert!(after_first.contains("\"Tee, Noir\""));
}

#[test]
fn test_user_round_trip_is_stable() {
    let files = TestFiles::new();
    let store = CredentialStore::new(&files.config.users_file);
    let mut table = store.load().unwrap().table;
    table.add("amina", "tee", UserRole::Viewer).unwrap();
    store.persist(&table).unwrap();
    let after_first = files.read_users();

    let reloaded = store.load().unwrap().table;
    store.persist(&reloaded).unwrap();
    assert_eq!(files.read_users(), after_first);
}

#[test]
fn test_record_table_from_records_persists_in_order() {
    let files = TestFiles::new();
    let store = RecordStore::new(&files.config.data_file);
    store
        .persist(&RecordTable::from_records(vec![
            record(2, "B", 1, 1, 1, 1),
            record(1, "A", 1, 1, 1, 1),
        ]))
        .unwrap();

    let products = store.load().unwrap().table.products();
    assert_eq!(products, ["B", "A"]);
}
