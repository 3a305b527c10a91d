// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fs;

use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::Connection;
use tracing::info;

use crate::codec;
use crate::db::{load_model, save_model};
use crate::utils::arg_str;

pub fn default_backup_name() -> String {
    format!("money_flow_backup_{}.json", Local::now().format("%Y-%m-%d"))
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("export", sub)) => {
            let out = match sub.get_one::<String>("out") {
                Some(p) => p.clone(),
                None => default_backup_name(),
            };
            let model = load_model(conn)?;
            fs::write(&out, codec::serialize(&model)?)
                .with_context(|| format!("Write backup to {}", out))?;
            println!("Backed up {} nodes to {}", model.nodes().len(), out);
        }
        Some(("import", sub)) => {
            let path = arg_str(sub, "path")?;
            let raw =
                fs::read_to_string(path).with_context(|| format!("Read backup {}", path))?;
            // Validate fully before touching the stored model.
            let model = codec::deserialize(&raw).with_context(|| format!("Restore {}", path))?;
            save_model(conn, &model)?;
            info!(path, nodes = model.nodes().len(), "backup restored");
            println!(
                "Restored {} nodes and {} links from {}",
                model.nodes().len(),
                model.links().len(),
                path
            );
        }
        _ => {}
    }
    Ok(())
}
