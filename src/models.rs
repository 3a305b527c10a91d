// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FlowError;

pub type NodeId = u64;

/// Annual rate given to new asset nodes (2.5%).
pub fn default_asset_rate() -> Decimal {
    Decimal::new(25, 3)
}

/// Annual inflation assumed until the user configures one (2.5%).
pub fn default_inflation_rate() -> Decimal {
    Decimal::new(25, 3)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Income,
    Bucket,
    Expense,
    Asset,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Income => "income",
            NodeType::Bucket => "bucket",
            NodeType::Expense => "expense",
            NodeType::Asset => "asset",
        }
    }

    /// Buckets and assets carry a balance; incomes and expenses carry a monthly rate.
    pub fn holds_balance(self) -> bool {
        matches!(self, NodeType::Bucket | NodeType::Asset)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(NodeType::Income),
            "bucket" => Ok(NodeType::Bucket),
            "expense" => Ok(NodeType::Expense),
            "asset" => Ok(NodeType::Asset),
            other => Err(FlowError::Validation(format!(
                "Unknown node type '{}' (use income|bucket|expense|asset)",
                other
            ))),
        }
    }
}

/// Named slice of an asset's value, `ratio` in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubItem {
    pub name: String,
    pub ratio: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetProfile {
    pub interest_rate: Decimal,
    pub target_weight: Option<Decimal>,
    pub sub_items: Vec<SubItem>,
}

impl Default for AssetProfile {
    fn default() -> Self {
        Self {
            interest_rate: default_asset_rate(),
            target_weight: None,
            sub_items: Vec::new(),
        }
    }
}

/// Node kind together with the fields that only make sense for that kind.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Income,
    Expense,
    Bucket { interest_rate: Decimal },
    Asset(AssetProfile),
}

impl NodeKind {
    pub fn with_defaults(t: NodeType) -> Self {
        match t {
            NodeType::Income => NodeKind::Income,
            NodeType::Expense => NodeKind::Expense,
            NodeType::Bucket => NodeKind::Bucket {
                interest_rate: Decimal::ZERO,
            },
            NodeType::Asset => NodeKind::Asset(AssetProfile::default()),
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Income => NodeType::Income,
            NodeKind::Expense => NodeType::Expense,
            NodeKind::Bucket { .. } => NodeType::Bucket,
            NodeKind::Asset(_) => NodeType::Asset,
        }
    }

    pub fn interest_rate(&self) -> Decimal {
        match self {
            NodeKind::Bucket { interest_rate } => *interest_rate,
            NodeKind::Asset(a) => a.interest_rate,
            NodeKind::Income | NodeKind::Expense => Decimal::ZERO,
        }
    }

    pub fn target_weight(&self) -> Option<Decimal> {
        match self {
            NodeKind::Asset(a) => a.target_weight,
            _ => None,
        }
    }

    pub fn sub_items(&self) -> &[SubItem] {
        match self {
            NodeKind::Asset(a) => &a.sub_items,
            _ => &[],
        }
    }

    /// Re-shape into another kind. A bucket's rate survives becoming an asset
    /// and vice versa; everything else starts from the new kind's defaults.
    pub fn convert(self, to: NodeType) -> Self {
        if self.node_type() == to {
            return self;
        }
        match (self, to) {
            (NodeKind::Bucket { interest_rate }, NodeType::Asset) => {
                NodeKind::Asset(AssetProfile {
                    interest_rate,
                    ..AssetProfile::default()
                })
            }
            (NodeKind::Asset(a), NodeType::Bucket) => NodeKind::Bucket {
                interest_rate: a.interest_rate,
            },
            (_, t) => NodeKind::with_defaults(t),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    /// Monthly amount for incomes/expenses, current balance for buckets/assets.
    pub value: Decimal,
    /// `None` marks a shared node, visible from every profile.
    pub owner: Option<String>,
    pub kind: NodeKind,
    pub x: f64,
    pub y: f64,
}

impl Node {
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn holds_balance(&self) -> bool {
        self.node_type().holds_balance()
    }

    pub fn is_visible_to(&self, profile: &str) -> bool {
        match &self.owner {
            None => true,
            Some(o) => profile.is_empty() || o == profile,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub source: NodeId,
    pub target: NodeId,
    pub amount: Decimal,
}

impl Link {
    pub fn connects(&self, source: NodeId, target: NodeId) -> bool {
        self.source == source && self.target == target
    }

    pub fn touches(&self, id: NodeId) -> bool {
        self.source == id || self.target == id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Simulation {
    /// Legacy switch, mirrors `months > 0`.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub months: u32,
    #[serde(default = "default_inflation_rate")]
    pub inflation_rate: Decimal,
    #[serde(default)]
    pub is_real_value: bool,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            enabled: false,
            months: 0,
            inflation_rate: default_inflation_rate(),
            is_real_value: false,
        }
    }
}

impl Simulation {
    pub fn is_active(&self) -> bool {
        self.months > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Optional fields for `add_node`; unset fields take the kind's defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeExtras {
    pub interest_rate: Option<Decimal>,
    pub target_weight: Option<Decimal>,
    pub sub_items: Vec<SubItem>,
    pub position: Option<(f64, f64)>,
}

/// Partial node update. `owner: Some(None)` makes the node shared,
/// `target_weight: Some(None)` clears the target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeUpdate {
    pub node_type: Option<NodeType>,
    pub name: Option<String>,
    pub value: Option<Decimal>,
    pub owner: Option<Option<String>>,
    pub interest_rate: Option<Decimal>,
    pub target_weight: Option<Option<Decimal>>,
    pub sub_items: Option<Vec<SubItem>>,
    pub position: Option<(f64, f64)>,
}

impl NodeUpdate {
    pub fn is_empty(&self) -> bool {
        *self == NodeUpdate::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkUpdate {
    pub amount: Option<Decimal>,
}
