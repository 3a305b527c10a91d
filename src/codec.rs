// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! JSON document format for a whole [`FlowModel`], including migration of
//! documents written by older versions.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::FlowError;
use crate::graph::{DEFAULT_PROFILE, FlowModel, check_amount, check_node, normalize_sub_items};
use crate::models::{
    AssetProfile, Link, Node, NodeId, NodeKind, NodeType, Simulation, Strategy, SubItem,
    default_asset_rate,
};

pub const DOCUMENT_VERSION: u32 = 2;
/// Documents without a `version` field predate versioning.
pub const LEGACY_VERSION: u32 = 1;

fn legacy_version() -> u32 {
    LEGACY_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default = "legacy_version")]
    pub version: u32,
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub next_id: Option<NodeId>,
    #[serde(default)]
    pub simulation: Option<Simulation>,
    #[serde(default)]
    pub owners: Option<Vec<String>>,
    #[serde(default)]
    pub current_profile: Option<String>,
    #[serde(default)]
    pub strategy: Option<Strategy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub name: String,
    #[serde(default)]
    pub value: Decimal,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    /// Missing means "written before profiles existed"; empty means shared.
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub interest_rate: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_weight: Option<Decimal>,
    #[serde(default)]
    pub sub_items: Vec<SubItem>,
}

impl From<&Node> for NodeRecord {
    fn from(n: &Node) -> Self {
        NodeRecord {
            id: n.id,
            node_type: n.node_type(),
            name: n.name.clone(),
            value: n.value,
            x: n.x,
            y: n.y,
            owner: Some(n.owner.clone().unwrap_or_default()),
            interest_rate: Some(n.kind.interest_rate()),
            target_weight: n.kind.target_weight(),
            sub_items: n.kind.sub_items().to_vec(),
        }
    }
}

impl NodeRecord {
    fn into_node(self) -> Node {
        let kind = match self.node_type {
            NodeType::Income => NodeKind::Income,
            NodeType::Expense => NodeKind::Expense,
            NodeType::Bucket => NodeKind::Bucket {
                interest_rate: self.interest_rate.unwrap_or(Decimal::ZERO),
            },
            NodeType::Asset => NodeKind::Asset(AssetProfile {
                interest_rate: self.interest_rate.unwrap_or_else(default_asset_rate),
                target_weight: self.target_weight,
                sub_items: normalize_sub_items(self.sub_items),
            }),
        };
        let owner = match self.owner {
            None => Some(DEFAULT_PROFILE.to_string()),
            Some(o) if o.trim().is_empty() => None,
            Some(o) => Some(o.trim().to_string()),
        };
        Node {
            id: self.id,
            name: self.name,
            value: self.value,
            owner,
            kind,
            x: self.x,
            y: self.y,
        }
    }
}

pub fn to_document(model: &FlowModel) -> Document {
    Document {
        version: DOCUMENT_VERSION,
        nodes: model.nodes().iter().map(NodeRecord::from).collect(),
        links: model.links().to_vec(),
        next_id: Some(model.next_id()),
        simulation: Some(model.simulation().clone()),
        owners: Some(model.owners().to_vec()),
        current_profile: Some(model.current_profile().to_string()),
        strategy: Some(model.strategy().clone()),
    }
}

pub fn serialize(model: &FlowModel) -> Result<String, FlowError> {
    Ok(serde_json::to_string_pretty(&to_document(model))?)
}

/// Parses and migrates a stored document into a brand new model.
pub fn deserialize(raw: &str) -> Result<FlowModel, FlowError> {
    let doc: Document = serde_json::from_str(raw)?;
    from_document(doc)
}

pub fn from_document(doc: Document) -> Result<FlowModel, FlowError> {
    if doc.version > DOCUMENT_VERSION {
        return Err(FlowError::UnsupportedVersion {
            found: doc.version,
            supported: DOCUMENT_VERSION,
        });
    }
    if doc.version < DOCUMENT_VERSION {
        debug!(from = doc.version, to = DOCUMENT_VERSION, "migrating document");
    }

    let mut owners: Vec<String> = Vec::new();
    for o in doc.owners.unwrap_or_default() {
        let o = o.trim().to_string();
        if !o.is_empty() && !owners.contains(&o) {
            owners.push(o);
        }
    }
    if owners.is_empty() {
        owners.push(DEFAULT_PROFILE.to_string());
    }

    let mut ids = HashSet::new();
    let mut nodes = Vec::with_capacity(doc.nodes.len());
    for record in doc.nodes {
        let node = record.into_node();
        if !ids.insert(node.id) {
            return Err(invalid(format!("duplicate node id {}", node.id)));
        }
        check_node(&node).map_err(|e| invalid(format!("node #{}: {}", node.id, e)))?;
        if let Some(o) = &node.owner {
            if !owners.contains(o) {
                warn!(owner = %o, node = node.id, "node owner missing from profiles, adding it");
                owners.push(o.clone());
            }
        }
        nodes.push(node);
    }

    let mut pairs = HashSet::new();
    for l in &doc.links {
        if l.source == l.target {
            return Err(invalid(format!("link #{} -> #{} is a self-loop", l.source, l.target)));
        }
        if !ids.contains(&l.source) || !ids.contains(&l.target) {
            return Err(invalid(format!(
                "link #{} -> #{} references a missing node",
                l.source, l.target
            )));
        }
        if !pairs.insert((l.source, l.target)) {
            return Err(invalid(format!("duplicate link #{} -> #{}", l.source, l.target)));
        }
        check_amount(l.amount).map_err(|e| invalid(e.to_string()))?;
    }

    let min_next = ids.iter().max().map_or(1, |m| m + 1);
    let next_id = doc.next_id.unwrap_or(1).max(min_next);

    let current_profile = match doc.current_profile {
        Some(p) if owners.contains(&p) => p,
        _ => owners[0].clone(),
    };

    let mut simulation = doc.simulation.unwrap_or_default();
    simulation.enabled = simulation.months > 0;
    if simulation.inflation_rate < Decimal::ZERO {
        return Err(invalid(format!(
            "inflation rate must not be negative (got {})",
            simulation.inflation_rate
        )));
    }

    Ok(FlowModel {
        nodes,
        links: doc.links,
        next_id,
        owners,
        current_profile,
        simulation,
        strategy: doc.strategy.unwrap_or_default(),
    })
}

fn invalid(msg: String) -> FlowError {
    FlowError::InvalidDocument(msg)
}

impl FlowModel {
    /// Replaces this model with the one in `raw`, or leaves it untouched on error.
    pub fn reload_from(&mut self, raw: &str) -> Result<(), FlowError> {
        let fresh = deserialize(raw)?;
        *self = fresh;
        Ok(())
    }
}
