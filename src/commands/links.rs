// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use rusqlite::Connection;

use crate::db::{load_model, save_model};
use crate::models::LinkUpdate;
use crate::utils::{
    arg_id, arg_str, fmt_amount, maybe_print_json, parse_amount, pretty_table, require_done,
};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let from = arg_id(sub, "from")?;
            let to = arg_id(sub, "to")?;
            let amount = parse_amount(arg_str(sub, "amount")?)?;
            let mut model = load_model(conn)?;
            let outcome = model.add_link(from, to, amount)?.map(|l| l.amount);
            let amount = require_done(outcome, "Link")?;
            save_model(conn, &model)?;
            println!("Linked #{} -> #{} ({}/month)", from, to, fmt_amount(&amount));
        }
        Some(("update", sub)) => update(conn, sub)?,
        Some(("rm", sub)) => {
            let from = arg_id(sub, "from")?;
            let to = arg_id(sub, "to")?;
            let mut model = load_model(conn)?;
            if model.delete_link(from, to) {
                save_model(conn, &model)?;
                println!("Removed link #{} -> #{}", from, to);
            } else {
                println!("No link #{} -> #{}", from, to);
            }
        }
        Some(("list", sub)) => {
            let model = load_model(conn)?;
            let links: Vec<_> = model.links_for(model.current_profile()).collect();
            if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &links)? {
                return Ok(());
            }
            let name = |id| {
                model
                    .node(id)
                    .map(|n| n.name.clone())
                    .unwrap_or_else(|| format!("#{}", id))
            };
            let data = links
                .iter()
                .map(|l| {
                    vec![
                        format!("{} (#{})", name(l.source), l.source),
                        format!("{} (#{})", name(l.target), l.target),
                        fmt_amount(&l.amount),
                    ]
                })
                .collect();
            println!("{}", pretty_table(&["From", "To", "Monthly"], data));
        }
        _ => {}
    }
    Ok(())
}

fn update(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let from = arg_id(sub, "from")?;
    let to = arg_id(sub, "to")?;
    let amount = sub
        .get_one::<String>("amount")
        .map(|s| parse_amount(s))
        .transpose()?;
    let new_from = sub.get_one::<u64>("new-from").copied();
    let new_to = sub.get_one::<u64>("new-to").copied();

    let mut model = load_model(conn)?;
    let (source, target, amount) = match (new_from, new_to) {
        (Some(nf), Some(nt)) => {
            let outcome = model
                .rekey_link((from, to), (nf, nt), amount)?
                .map(|l| (l.source, l.target, l.amount));
            require_done(outcome, "Link move")?
        }
        _ => {
            if amount.is_none() {
                bail!("Nothing to update for link #{} -> #{}", from, to);
            }
            let link = model.update_link(from, to, LinkUpdate { amount })?;
            (link.source, link.target, link.amount)
        }
    };
    save_model(conn, &model)?;
    println!(
        "Link #{} -> #{} now {}/month",
        source,
        target,
        fmt_amount(&amount)
    );
    Ok(())
}
