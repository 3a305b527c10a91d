// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use rusqlite::Connection;
use serde_json::json;

use crate::commands::reports::{flow_rows, report_profile};
use crate::db::load_model;
use crate::utils::arg_str;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("flows", sub)) => export_flows(conn, sub),
        _ => Ok(()),
    }
}

fn export_flows(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = arg_str(sub, "format")?.to_lowercase();
    let out = arg_str(sub, "out")?;
    if fmt != "csv" && fmt != "json" {
        bail!("Unknown format: {} (use csv|json)", fmt);
    }

    let model = load_model(conn)?;
    let profile = report_profile(&model, sub)?;
    let rows = flow_rows(&model, &profile)?;

    if fmt == "csv" {
        let mut wtr = csv::Writer::from_path(out)?;
        wtr.write_record([
            "id", "type", "name", "value", "in", "out", "net", "projected",
        ])?;
        for r in &rows {
            wtr.write_record([
                r.id.to_string(),
                r.node_type.clone(),
                r.name.clone(),
                r.value.to_string(),
                r.inflow.to_string(),
                r.outflow.to_string(),
                r.net.to_string(),
                r.future_value.map(|v| v.round_dp(2).to_string()).unwrap_or_default(),
            ])?;
        }
        wtr.flush()?;
    } else {
        let doc = json!({
            "profile": profile,
            "simulation": model.simulation(),
            "nodes": rows,
        });
        std::fs::write(out, serde_json::to_string_pretty(&doc)?)?;
    }
    println!("Exported {} flow rows to {}", rows.len(), out);
    Ok(())
}
