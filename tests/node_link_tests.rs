// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use moneyflow::commands::{links, nodes, profiles};
use moneyflow::db::{self, KeyValueStore, MODEL_KEY};
use moneyflow::graph::FlowModel;
use moneyflow::models::{NodeKind, NodeType};
use moneyflow::cli;
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    db::save_model(&conn, &FlowModel::new()).unwrap();
    conn
}

fn run(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["moneyflow"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("node", sub)) => nodes::handle(conn, sub),
        Some(("link", sub)) => links::handle(conn, sub),
        Some(("profile", sub)) => profiles::handle(conn, sub),
        _ => panic!("unexpected subcommand"),
    }
}

fn model(conn: &Connection) -> FlowModel {
    db::load_model(conn).unwrap()
}

#[test]
fn node_add_defaults_owner_to_current_profile() {
    let conn = setup();
    run(&conn, &["profile", "add", "--name", "partner"]).unwrap();
    run(&conn, &["profile", "use", "--name", "partner"]).unwrap();
    run(&conn, &["node", "add", "--type", "income", "--name", "Wage", "--value", "3000"]).unwrap();
    run(&conn, &["node", "add", "--type", "bucket", "--name", "Joint", "--shared"]).unwrap();

    let m = model(&conn);
    assert_eq!(m.node(1).unwrap().owner.as_deref(), Some("partner"));
    assert_eq!(m.node(2).unwrap().owner, None);
    assert_eq!(m.node(1).unwrap().value, Decimal::from(3000));
}

#[test]
fn asset_add_takes_rate_target_and_sub_items() {
    let conn = setup();
    run(
        &conn,
        &[
            "node", "add", "--type", "asset", "--name", "ISA", "--value", "1000", "--rate", "5",
            "--target", "60", "--sub", "Bonds=30", "--sub", "S&P 500=70",
        ],
    )
    .unwrap();

    let m = model(&conn);
    let NodeKind::Asset(profile) = &m.node(1).unwrap().kind else {
        panic!("expected an asset");
    };
    assert_eq!(profile.interest_rate, Decimal::new(5, 2));
    assert_eq!(profile.target_weight, Some(Decimal::from(60)));
    assert_eq!(profile.sub_items[0].name, "S&P 500");
    assert_eq!(profile.sub_items[1].name, "Bonds");
}

#[test]
fn invalid_node_is_not_saved() {
    let conn = setup();
    let before = conn.get(MODEL_KEY).unwrap();
    assert!(run(&conn, &["node", "add", "--type", "expense", "--name", "Rent", "--value", "-5"]).is_err());
    assert!(run(&conn, &["node", "add", "--type", "loan", "--name", "X"]).is_err());
    assert!(
        run(
            &conn,
            &["node", "add", "--type", "asset", "--name", "A", "--sub", "x=70", "--sub", "y=40"]
        )
        .is_err()
    );
    assert_eq!(conn.get(MODEL_KEY).unwrap(), before);
}

#[test]
fn bucket_becomes_asset_keeping_rate() {
    let conn = setup();
    run(&conn, &["node", "add", "--type", "bucket", "--name", "Savings", "--rate", "1.5"]).unwrap();
    run(&conn, &["node", "update", "--id", "1", "--type", "asset", "--target", "20"]).unwrap();

    let m = model(&conn);
    let node = m.node(1).unwrap();
    assert_eq!(node.node_type(), NodeType::Asset);
    assert_eq!(node.kind.interest_rate(), Decimal::new(15, 3));
    assert_eq!(node.kind.target_weight(), Some(Decimal::from(20)));

    run(&conn, &["node", "update", "--id", "1", "--clear-target"]).unwrap();
    assert_eq!(model(&conn).node(1).unwrap().kind.target_weight(), None);
}

#[test]
fn update_without_fields_is_an_error() {
    let conn = setup();
    run(&conn, &["node", "add", "--type", "income", "--name", "Wage"]).unwrap();
    assert!(run(&conn, &["node", "update", "--id", "1"]).is_err());
    assert!(run(&conn, &["node", "update", "--id", "9", "--name", "Nope"]).is_err());
}

#[test]
fn links_are_validated_and_pruned_with_nodes() {
    let conn = setup();
    run(&conn, &["node", "add", "--type", "income", "--name", "Wage", "--value", "100"]).unwrap();
    run(&conn, &["node", "add", "--type", "bucket", "--name", "Main"]).unwrap();
    run(&conn, &["node", "add", "--type", "expense", "--name", "Rent", "--value", "40"]).unwrap();

    run(&conn, &["link", "add", "--from", "1", "--to", "2", "--amount", "100"]).unwrap();
    run(&conn, &["link", "add", "--from", "2", "--to", "3", "--amount", "40"]).unwrap();
    assert!(run(&conn, &["link", "add", "--from", "2", "--to", "2", "--amount", "1"]).is_err());
    assert!(run(&conn, &["link", "add", "--from", "1", "--to", "2", "--amount", "5"]).is_err());
    assert!(run(&conn, &["link", "add", "--from", "1", "--to", "9", "--amount", "5"]).is_err());
    assert_eq!(model(&conn).links().len(), 2);

    run(&conn, &["node", "rm", "--id", "2"]).unwrap();
    let m = model(&conn);
    assert!(m.links().is_empty());
    assert_eq!(m.nodes().len(), 2);
}

#[test]
fn link_move_keeps_amount_and_respects_duplicates() {
    let conn = setup();
    for name in ["A", "B", "C"] {
        run(&conn, &["node", "add", "--type", "bucket", "--name", name]).unwrap();
    }
    run(&conn, &["link", "add", "--from", "1", "--to", "2", "--amount", "250"]).unwrap();
    run(&conn, &["link", "add", "--from", "1", "--to", "3", "--amount", "10"]).unwrap();

    // Target taken: nothing changes.
    assert!(
        run(
            &conn,
            &["link", "update", "--from", "1", "--to", "2", "--new-from", "1", "--new-to", "3"]
        )
        .is_err()
    );
    assert!(model(&conn).link(1, 2).is_some());

    run(
        &conn,
        &["link", "update", "--from", "1", "--to", "2", "--new-from", "3", "--new-to", "2"],
    )
    .unwrap();
    let m = model(&conn);
    assert!(m.link(1, 2).is_none());
    assert_eq!(m.link(3, 2).unwrap().amount, Decimal::from(250));

    run(&conn, &["link", "update", "--from", "3", "--to", "2", "--amount", "300"]).unwrap();
    assert_eq!(model(&conn).link(3, 2).unwrap().amount, Decimal::from(300));
}

#[test]
fn removing_missing_link_is_not_an_error() {
    let conn = setup();
    run(&conn, &["link", "rm", "--from", "1", "--to", "2"]).unwrap();
}

#[test]
fn profile_rules() {
    let conn = setup();
    assert!(run(&conn, &["profile", "add", "--name", "  "]).is_err());
    assert!(run(&conn, &["profile", "add", "--name", "me"]).is_err());
    assert!(run(&conn, &["profile", "rm", "--name", "me"]).is_err());
    assert!(run(&conn, &["profile", "use", "--name", "ghost"]).is_err());

    run(&conn, &["profile", "add", "--name", "kid"]).unwrap();
    run(&conn, &["profile", "use", "--name", "kid"]).unwrap();
    run(&conn, &["node", "add", "--type", "bucket", "--name", "Pocket money"]).unwrap();
    run(&conn, &["profile", "rm", "--name", "kid"]).unwrap();

    let m = model(&conn);
    assert_eq!(m.owners(), ["me".to_string()]);
    assert_eq!(m.current_profile(), "me");
    assert_eq!(m.node(1).unwrap().owner, None);
}

#[test]
fn newer_stored_document_survives_mutating_commands() {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    let newer = r#"{"version": 3, "nodes": [{"id": 1, "type": "bucket", "name": "Future"}]}"#;
    conn.set(MODEL_KEY, newer).unwrap();

    assert!(run(&conn, &["profile", "add", "--name", "x"]).is_err());
    assert!(run(&conn, &["node", "add", "--type", "income", "--name", "Wage"]).is_err());
    assert_eq!(conn.get(MODEL_KEY).unwrap().as_deref(), Some(newer));
}

#[test]
fn unreadable_document_is_kept_aside_before_defaults_are_saved() {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn.set(MODEL_KEY, "{truncated").unwrap();

    run(&conn, &["profile", "add", "--name", "x"]).unwrap();
    assert_eq!(
        conn.get(db::QUARANTINE_KEY).unwrap().as_deref(),
        Some("{truncated")
    );
    let m = model(&conn);
    assert_eq!(m.nodes().len(), 8);
    assert!(m.owners().iter().any(|o| o == "x"));
}
