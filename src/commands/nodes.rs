// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use rusqlite::Connection;

use crate::codec::NodeRecord;
use crate::db::{load_model, save_model};
use crate::models::{NodeExtras, NodeType, NodeUpdate, SubItem};
use crate::utils::{
    arg_id, arg_str, fmt_amount, fmt_rate, maybe_print_json, parse_decimal, parse_rate_percent,
    parse_sub_item, parse_weight, pretty_table,
};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("update", sub)) => update(conn, sub)?,
        Some(("rm", sub)) => {
            let id = arg_id(sub, "id")?;
            let mut model = load_model(conn)?;
            let removed = model.delete_node(id)?;
            save_model(conn, &model)?;
            println!("Removed {} '{}' (#{})", removed.node_type(), removed.name, id);
        }
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn parse_subs(m: &clap::ArgMatches) -> Result<Option<Vec<SubItem>>> {
    match m.get_many::<String>("sub") {
        Some(vals) => Ok(Some(
            vals.map(|s| parse_sub_item(s))
                .collect::<Result<Vec<_>>>()?,
        )),
        None => Ok(None),
    }
}

fn parse_position(m: &clap::ArgMatches) -> Option<(f64, f64)> {
    match (m.get_one::<f64>("x"), m.get_one::<f64>("y")) {
        (Some(x), Some(y)) => Some((*x, *y)),
        _ => None,
    }
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let node_type: NodeType = arg_str(sub, "type")?.parse()?;
    let name = arg_str(sub, "name")?;
    let value = parse_decimal(arg_str(sub, "value")?)?;
    let extras = NodeExtras {
        interest_rate: sub
            .get_one::<String>("rate")
            .map(|s| parse_rate_percent(s))
            .transpose()?,
        target_weight: sub
            .get_one::<String>("target")
            .map(|s| parse_weight(s))
            .transpose()?,
        sub_items: parse_subs(sub)?.unwrap_or_default(),
        position: parse_position(sub),
    };

    let mut model = load_model(conn)?;
    // New nodes belong to the active profile unless told otherwise.
    let owner = if sub.get_flag("shared") {
        None
    } else {
        Some(match sub.get_one::<String>("owner") {
            Some(o) => o.clone(),
            None => model.current_profile().to_string(),
        })
    };
    let node = model.add_node(node_type, name, value, owner.as_deref(), extras)?;
    let (id, label) = (node.id, node.name.clone());
    save_model(conn, &model)?;
    println!("Added {} '{}' (#{})", node_type, label, id);
    Ok(())
}

fn update(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = arg_id(sub, "id")?;
    let owner = if sub.get_flag("shared") {
        Some(None)
    } else {
        sub.get_one::<String>("owner").map(|o| Some(o.clone()))
    };
    let target_weight = if sub.get_flag("clear-target") {
        Some(None)
    } else {
        sub.get_one::<String>("target")
            .map(|s| parse_weight(s).map(Some))
            .transpose()?
    };
    let sub_items = if sub.get_flag("clear-subs") {
        Some(Vec::new())
    } else {
        parse_subs(sub)?
    };
    let update = NodeUpdate {
        node_type: sub
            .get_one::<String>("type")
            .map(|s| s.parse::<NodeType>())
            .transpose()?,
        name: sub.get_one::<String>("name").cloned(),
        value: sub
            .get_one::<String>("value")
            .map(|s| parse_decimal(s))
            .transpose()?,
        owner,
        interest_rate: sub
            .get_one::<String>("rate")
            .map(|s| parse_rate_percent(s))
            .transpose()?,
        target_weight,
        sub_items,
        position: parse_position(sub),
    };
    if update.is_empty() {
        bail!("Nothing to update for node #{}", id);
    }

    let mut model = load_model(conn)?;
    let node = model.update_node(id, update)?;
    let label = node.name.clone();
    save_model(conn, &model)?;
    println!("Updated '{}' (#{})", label, id);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let model = load_model(conn)?;
    let profile = if sub.get_flag("all") {
        ""
    } else {
        model.current_profile()
    };
    let nodes: Vec<_> = model.nodes_for(profile).collect();

    let records: Vec<NodeRecord> = nodes.iter().map(|n| NodeRecord::from(*n)).collect();
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &records)? {
        return Ok(());
    }

    let data = nodes
        .iter()
        .map(|n| {
            let rate = if n.holds_balance() {
                fmt_rate(&n.kind.interest_rate())
            } else {
                String::new()
            };
            vec![
                n.id.to_string(),
                n.node_type().to_string(),
                n.name.clone(),
                fmt_amount(&n.value),
                n.owner.clone().unwrap_or_else(|| "(shared)".into()),
                rate,
                n.kind
                    .target_weight()
                    .map(|w| format!("{}%", w.normalize()))
                    .unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Id", "Type", "Name", "Value", "Owner", "Rate", "Target"],
            data
        )
    );
    Ok(())
}
