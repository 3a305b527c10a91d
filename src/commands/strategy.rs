// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

use crate::db::{load_model, save_model};
use crate::utils::{arg_str, maybe_print_json};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let summary = arg_str(sub, "summary")?;
            let mut model = load_model(conn)?;
            model.set_strategy(summary, Utc::now());
            save_model(conn, &model)?;
            println!("Strategy saved");
        }
        Some(("show", sub)) => {
            let model = load_model(conn)?;
            let s = model.strategy();
            if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), s)? {
                return Ok(());
            }
            if s.summary.is_empty() {
                println!("No strategy recorded");
            } else {
                println!("{}", s.summary);
                if let Some(at) = s.updated_at {
                    println!("(updated {})", at.format("%Y-%m-%d %H:%M UTC"));
                }
            }
        }
        _ => {}
    }
    Ok(())
}
