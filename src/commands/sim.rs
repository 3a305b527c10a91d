// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use rusqlite::Connection;

use crate::db::{load_model, save_model};
use crate::utils::{fmt_rate, maybe_print_json, parse_rate_percent, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let months = sub.get_one::<u32>("months").copied();
            let inflation = sub
                .get_one::<String>("inflation")
                .map(|s| parse_rate_percent(s))
                .transpose()?;
            let real = match (sub.get_flag("real"), sub.get_flag("nominal")) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            if months.is_none() && inflation.is_none() && real.is_none() {
                bail!("Nothing to set (use --months, --inflation, --real or --nominal)");
            }

            let mut model = load_model(conn)?;
            if let Some(months) = months {
                model.set_horizon(months);
            }
            if let Some(rate) = inflation {
                model.set_inflation_rate(rate)?;
            }
            if let Some(real) = real {
                model.set_real_value(real);
            }
            save_model(conn, &model)?;
            println!("{}", describe(model.simulation()));
        }
        Some(("show", sub)) => {
            let model = load_model(conn)?;
            let s = model.simulation();
            if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), s)? {
                return Ok(());
            }
            let data = vec![
                vec!["Projection".into(), describe(s)],
                vec!["Inflation".into(), fmt_rate(&s.inflation_rate)],
            ];
            println!("{}", pretty_table(&["Setting", "Value"], data));
        }
        _ => {}
    }
    Ok(())
}

fn describe(s: &crate::models::Simulation) -> String {
    if !s.is_active() {
        return "Projection off (current values only)".into();
    }
    let basis = if s.is_real_value { "real" } else { "nominal" };
    format!("Projecting {} months, {} values", s.months, basis)
}
