// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, OptionalExtension, params};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::codec;
use crate::error::FlowError;
use crate::graph::FlowModel;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Moneyflow", "moneyflow"));

/// Key the whole model document is stored under.
pub const MODEL_KEY: &str = "money_flow_v2";

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("moneyflow.sqlite"))
}

pub fn open_or_init(path_override: Option<&Path>) -> Result<Connection> {
    let path = match path_override {
        Some(p) => p.to_path_buf(),
        None => db_path()?,
    };
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    debug!(path = %path.display(), "database ready");
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    CREATE TABLE IF NOT EXISTS kv(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    "#,
    )?;
    Ok(())
}

/// String blob storage the model document is written to.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl KeyValueStore for Connection {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let v: Option<String> = self
            .query_row("SELECT value FROM kv WHERE key=?1", params![key], |r| {
                r.get(0)
            })
            .optional()
            .with_context(|| format!("Read key '{}'", key))?;
        Ok(v)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.execute(
            "INSERT INTO kv(key, value) VALUES(?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at=datetime('now')",
            params![key, value],
        )
        .with_context(|| format!("Write key '{}'", key))?;
        Ok(())
    }
}

/// Where an unreadable stored document is copied before defaults take over.
pub const QUARANTINE_KEY: &str = "money_flow_v2.unreadable";

/// Loads the stored model. An empty store is seeded and saved. A document
/// written by a newer version is refused so it cannot be saved over. Any other
/// unreadable document is copied to [`QUARANTINE_KEY`] and replaced by the
/// seed in memory; the original blob stays until the next successful save.
pub fn load_model(store: &impl KeyValueStore) -> Result<FlowModel> {
    match store.get(MODEL_KEY)? {
        Some(raw) => match codec::deserialize(&raw) {
            Ok(model) => Ok(model),
            Err(e @ FlowError::UnsupportedVersion { .. }) => Err(e)
                .context("Stored model was written by a newer moneyflow; refusing to touch it"),
            Err(e) => {
                store.set(QUARANTINE_KEY, &raw)?;
                warn!(
                    error = %e,
                    copy = QUARANTINE_KEY,
                    "stored model could not be loaded, using defaults"
                );
                Ok(FlowModel::seeded()?)
            }
        },
        None => {
            info!("no stored model, seeding defaults");
            let model = FlowModel::seeded()?;
            save_model(store, &model)?;
            Ok(model)
        }
    }
}

pub fn save_model(store: &impl KeyValueStore, model: &FlowModel) -> Result<()> {
    let raw = codec::serialize(model)?;
    store.set(MODEL_KEY, &raw)?;
    debug!(bytes = raw.len(), nodes = model.nodes().len(), "model saved");
    Ok(())
}
