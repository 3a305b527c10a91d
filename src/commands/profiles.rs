// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

use crate::db::{load_model, save_model};
use crate::utils::{arg_str, maybe_print_json, pretty_table, require_done};

#[derive(Serialize)]
struct ProfileRow<'a> {
    name: &'a str,
    current: bool,
    nodes: usize,
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let mut model = load_model(conn)?;
            let name = require_done(model.add_owner(arg_str(sub, "name")?), "Profile")?;
            save_model(conn, &model)?;
            println!("Added profile '{}'", name);
        }
        Some(("rm", sub)) => {
            let name = arg_str(sub, "name")?;
            let mut model = load_model(conn)?;
            require_done(model.delete_owner(name)?, "Profile removal")?;
            save_model(conn, &model)?;
            println!(
                "Removed profile '{}' (current: '{}')",
                name,
                model.current_profile()
            );
        }
        Some(("use", sub)) => {
            let name = arg_str(sub, "name")?;
            let mut model = load_model(conn)?;
            model.switch_profile(name)?;
            save_model(conn, &model)?;
            println!("Switched to profile '{}'", name);
        }
        Some(("list", sub)) => {
            let model = load_model(conn)?;
            let rows: Vec<ProfileRow> = model
                .owners()
                .iter()
                .map(|o| ProfileRow {
                    name: o,
                    current: o == model.current_profile(),
                    nodes: model
                        .nodes()
                        .iter()
                        .filter(|n| n.owner.as_deref() == Some(o.as_str()))
                        .count(),
                })
                .collect();
            if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
                return Ok(());
            }
            let data = rows
                .iter()
                .map(|r| {
                    vec![
                        r.name.to_string(),
                        if r.current { "*".into() } else { String::new() },
                        r.nodes.to_string(),
                    ]
                })
                .collect();
            println!("{}", pretty_table(&["Profile", "Current", "Nodes"], data));
        }
        _ => {}
    }
    Ok(())
}
