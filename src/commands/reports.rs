// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::load_model;
use crate::error::FlowError;
use crate::flows::{allocation, calculate_flows, summarize};
use crate::graph::FlowModel;
use crate::models::NodeId;
use crate::utils::{fmt_amount, maybe_print_json, pretty_table};

/// One row of the per-node flow report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRow {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: String,
    pub name: String,
    pub value: Decimal,
    pub inflow: Decimal,
    pub outflow: Decimal,
    pub net: Decimal,
    pub future_value: Option<Decimal>,
}

/// `--profile` if given, else the current one. Unknown names are an error.
pub fn report_profile(model: &FlowModel, m: &clap::ArgMatches) -> Result<String> {
    match m.get_one::<String>("profile").map(|s| s.trim()) {
        Some(p) if model.owners().iter().any(|o| o == p) => Ok(p.to_string()),
        Some(p) => Err(FlowError::ProfileNotFound(p.to_string()).into()),
        None => Ok(model.current_profile().to_string()),
    }
}

pub fn flow_rows(model: &FlowModel, profile: &str) -> Result<Vec<FlowRow>> {
    let stats = calculate_flows(model, profile)?;
    Ok(model
        .nodes_for(profile)
        .map(|n| {
            let b = stats.balance(n.id);
            FlowRow {
                id: n.id,
                node_type: n.node_type().to_string(),
                name: n.name.clone(),
                value: n.value,
                inflow: b.inflow,
                outflow: b.outflow,
                net: b.net,
                future_value: stats.future_value(n.id),
            }
        })
        .collect())
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("flows", sub)) => {
            let model = load_model(conn)?;
            let profile = report_profile(&model, sub)?;
            let rows = flow_rows(&model, &profile)?;
            if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
                return Ok(());
            }
            let data = rows
                .iter()
                .map(|r| {
                    vec![
                        r.id.to_string(),
                        r.node_type.clone(),
                        r.name.clone(),
                        fmt_amount(&r.value),
                        fmt_amount(&r.inflow),
                        fmt_amount(&r.outflow),
                        fmt_amount(&r.net),
                        r.future_value.map(|v| fmt_amount(&v)).unwrap_or_default(),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(
                    &["Id", "Type", "Name", "Value", "In", "Out", "Net", "Projected"],
                    data
                )
            );
        }
        Some(("summary", sub)) => {
            let model = load_model(conn)?;
            let profile = report_profile(&model, sub)?;
            let stats = calculate_flows(&model, &profile)?;
            let s = summarize(&model, &profile, &stats)?;
            if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
                return Ok(());
            }
            let horizon = if s.horizon_months == 0 {
                "today".to_string()
            } else if s.real_value {
                format!("{} months (real)", s.horizon_months)
            } else {
                format!("{} months", s.horizon_months)
            };
            let data = vec![
                vec!["Profile".into(), s.profile.clone()],
                vec!["Horizon".into(), horizon],
                vec!["Net worth".into(), fmt_amount(&s.net_worth)],
                vec!["Monthly income".into(), fmt_amount(&s.total_income)],
                vec!["Monthly invested".into(), fmt_amount(&s.total_invested)],
                vec!["Monthly expenses".into(), fmt_amount(&s.total_expenses)],
                vec!["Unallocated".into(), fmt_amount(&s.unallocated)],
            ];
            println!("{}", pretty_table(&["Metric", "Value"], data));
        }
        Some(("allocation", sub)) => {
            let model = load_model(conn)?;
            let profile = report_profile(&model, sub)?;
            let stats = calculate_flows(&model, &profile)?;
            let rows = allocation(&model, &profile, &stats)?;
            if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
                return Ok(());
            }
            let pct = |d: Decimal| format!("{}%", d.round_dp(2));
            let mut data = Vec::new();
            for r in &rows {
                data.push(vec![
                    r.name.clone(),
                    fmt_amount(&r.value),
                    pct(r.share),
                    r.target_weight.map(pct).unwrap_or_default(),
                    r.drift.map(pct).unwrap_or_default(),
                ]);
                for s in &r.sub_items {
                    data.push(vec![
                        format!("  {}", s.name),
                        fmt_amount(&s.value),
                        pct(s.ratio),
                        String::new(),
                        String::new(),
                    ]);
                }
            }
            println!(
                "{}",
                pretty_table(&["Asset", "Value", "Share", "Target", "Drift"], data)
            );
        }
        _ => {}
    }
    Ok(())
}
