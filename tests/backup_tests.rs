// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use moneyflow::commands::{backup, strategy};
use moneyflow::db::{self, KeyValueStore, MODEL_KEY};
use moneyflow::graph::FlowModel;
use moneyflow::cli;
use rusqlite::Connection;
use tempfile::tempdir;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn run(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["moneyflow"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("backup", sub)) => backup::handle(conn, sub),
        Some(("strategy", sub)) => strategy::handle(conn, sub),
        _ => panic!("unexpected subcommand"),
    }
}

#[test]
fn export_then_import_restores_model() {
    let source = setup();
    let seeded = db::load_model(&source).unwrap();
    run(&source, &["strategy", "set", "--summary", "Index funds, rebalance yearly"]).unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("backup.json");
    let path_str = path.to_string_lossy().to_string();
    run(&source, &["backup", "export", "--out", &path_str]).unwrap();

    let target = setup();
    run(&target, &["backup", "import", "--path", &path_str]).unwrap();
    let restored = db::load_model(&target).unwrap();
    assert_eq!(restored.nodes(), seeded.nodes());
    assert_eq!(restored.links(), seeded.links());
    assert_eq!(restored.strategy().summary, "Index funds, rebalance yearly");
    assert!(restored.strategy().updated_at.is_some());
}

#[test]
fn invalid_backup_leaves_store_untouched() {
    let conn = setup();
    db::save_model(&conn, &FlowModel::new()).unwrap();
    let before = conn.get(MODEL_KEY).unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(
        &path,
        r#"{"nodes":[{"id":1,"type":"bucket","name":"A"}],"links":[{"source":1,"target":1,"amount":5}]}"#,
    )
    .unwrap();
    let path_str = path.to_string_lossy().to_string();
    assert!(run(&conn, &["backup", "import", "--path", &path_str]).is_err());
    assert!(run(&conn, &["backup", "import", "--path", "/nonexistent/backup.json"]).is_err());
    assert_eq!(conn.get(MODEL_KEY).unwrap(), before);
}

#[test]
fn legacy_backup_is_migrated_on_import() {
    let conn = setup();
    let dir = tempdir().unwrap();
    let path = dir.path().join("old.json");
    std::fs::write(
        &path,
        r#"{
            "nodes": [
                {"id": 1, "type": "income", "name": "Salary", "value": 1000, "x": 10, "y": 20},
                {"id": 4, "type": "asset", "name": "Fund", "value": 500}
            ],
            "links": [{"source": 1, "target": 4, "amount": 200}],
            "simulation": {"enabled": true, "months": 12}
        }"#,
    )
    .unwrap();
    let path_str = path.to_string_lossy().to_string();
    run(&conn, &["backup", "import", "--path", &path_str]).unwrap();

    let m = db::load_model(&conn).unwrap();
    assert_eq!(m.owners(), ["me".to_string()]);
    assert_eq!(m.node(1).unwrap().owner.as_deref(), Some("me"));
    assert_eq!(m.node(4).unwrap().kind.interest_rate(), rust_decimal::Decimal::new(25, 3));
    assert_eq!(m.next_id(), 5);
    assert_eq!(m.simulation().months, 12);
}

#[test]
fn default_backup_name_is_dated() {
    let name = backup::default_backup_name();
    assert!(name.starts_with("money_flow_backup_"));
    assert!(name.ends_with(".json"));
    assert_eq!(name.len(), "money_flow_backup_2025-01-31.json".len());
}
