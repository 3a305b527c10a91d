// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The money graph: nodes, directed monthly links between them, the profiles
//! nodes belong to, and the projection settings that travel with them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{FlowError, Outcome, Rejection};
use crate::models::{
    Link, LinkUpdate, Node, NodeExtras, NodeId, NodeKind, NodeType, NodeUpdate, Simulation,
    Strategy, SubItem,
};

pub const DEFAULT_PROFILE: &str = "me";

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

#[derive(Debug, Clone, PartialEq)]
pub struct FlowModel {
    pub(crate) nodes: Vec<Node>,
    pub(crate) links: Vec<Link>,
    pub(crate) next_id: NodeId,
    pub(crate) owners: Vec<String>,
    pub(crate) current_profile: String,
    pub(crate) simulation: Simulation,
    pub(crate) strategy: Strategy,
}

impl Default for FlowModel {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowModel {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            next_id: 1,
            owners: vec![DEFAULT_PROFILE.to_string()],
            current_profile: DEFAULT_PROFILE.to_string(),
            simulation: Simulation::default(),
            strategy: Strategy::default(),
        }
    }

    /// Starter graph used when nothing has been stored yet.
    pub fn seeded() -> Result<Self, FlowError> {
        fn seed(
            m: &mut FlowModel,
            t: NodeType,
            name: &str,
            value: i64,
        ) -> Result<NodeId, FlowError> {
            let owner = Some(DEFAULT_PROFILE);
            let node = m.add_node(t, name, Decimal::from(value), owner, NodeExtras::default())?;
            Ok(node.id)
        }

        let mut m = Self::new();
        let salary = seed(&mut m, NodeType::Income, "Salary", 3_500_000)?;
        let main = seed(&mut m, NodeType::Bucket, "Main account", 0)?;
        let isa = seed(&mut m, NodeType::Asset, "ISA", 25_000_000)?;
        let living = seed(&mut m, NodeType::Bucket, "Living", 1_000_000)?;
        seed(&mut m, NodeType::Asset, "Overseas stocks", 20_000_000)?;
        let rent = seed(&mut m, NodeType::Expense, "Housing", 500_000)?;
        let telecom = seed(&mut m, NodeType::Expense, "Telecom", 60_000)?;
        let subs = seed(&mut m, NodeType::Expense, "AI subscriptions", 30_000)?;

        for (s, t, amount) in [
            (salary, main, 3_500_000),
            (main, isa, 1_000_000),
            (main, living, 1_000_000),
            (living, rent, 500_000),
            (living, telecom, 60_000),
            (living, subs, 30_000),
        ] {
            if let Some(r) = m.add_link(s, t, Decimal::from(amount))?.rejection() {
                return Err(FlowError::Validation(format!(
                    "starter link #{} -> #{} refused: {}",
                    s, t, r
                )));
            }
        }
        debug!(nodes = m.nodes.len(), links = m.links.len(), "seeded default graph");
        Ok(m)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn link(&self, source: NodeId, target: NodeId) -> Option<&Link> {
        self.links.iter().find(|l| l.connects(source, target))
    }

    pub fn next_id(&self) -> NodeId {
        self.next_id
    }

    pub fn owners(&self) -> &[String] {
        &self.owners
    }

    pub fn current_profile(&self) -> &str {
        &self.current_profile
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Nodes owned by `profile` plus shared nodes.
    pub fn nodes_for<'a>(&'a self, profile: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes.iter().filter(move |n| n.is_visible_to(profile))
    }

    /// Links with at least one endpoint visible from `profile`.
    pub fn links_for<'a>(&'a self, profile: &'a str) -> impl Iterator<Item = &'a Link> + 'a {
        self.links.iter().filter(move |l| {
            [l.source, l.target]
                .iter()
                .any(|id| self.node(*id).is_some_and(|n| n.is_visible_to(profile)))
        })
    }

    // --- nodes ---

    pub fn add_node(
        &mut self,
        node_type: NodeType,
        name: &str,
        value: Decimal,
        owner: Option<&str>,
        extras: NodeExtras,
    ) -> Result<&Node, FlowError> {
        let mut kind = NodeKind::with_defaults(node_type);
        apply_kind_fields(
            &mut kind,
            extras.interest_rate,
            extras.target_weight.map(Some),
            Some(extras.sub_items),
        )?;
        let (x, y) = extras.position.unwrap_or((0.0, 0.0));
        let node = Node {
            id: self.next_id,
            name: name.trim().to_string(),
            value,
            owner: self.resolve_owner(owner)?,
            kind,
            x,
            y,
        };
        check_node(&node)?;

        self.next_id += 1;
        let idx = self.nodes.len();
        self.nodes.push(node);
        Ok(&self.nodes[idx])
    }

    /// Applies every field of `update` or none of them.
    pub fn update_node(&mut self, id: NodeId, update: NodeUpdate) -> Result<&Node, FlowError> {
        let idx = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or(FlowError::NodeNotFound(id))?;

        let mut candidate = self.nodes[idx].clone();
        if let Some(t) = update.node_type {
            candidate.kind = candidate.kind.convert(t);
        }
        apply_kind_fields(
            &mut candidate.kind,
            update.interest_rate,
            update.target_weight,
            update.sub_items,
        )?;
        if let Some(name) = update.name {
            candidate.name = name.trim().to_string();
        }
        if let Some(value) = update.value {
            candidate.value = value;
        }
        if let Some(owner) = update.owner {
            candidate.owner = self.resolve_owner(owner.as_deref())?;
        }
        if let Some((x, y)) = update.position {
            candidate.x = x;
            candidate.y = y;
        }
        check_node(&candidate)?;

        self.nodes[idx] = candidate;
        Ok(&self.nodes[idx])
    }

    /// Removes the node and every link touching it in one step.
    pub fn delete_node(&mut self, id: NodeId) -> Result<Node, FlowError> {
        let idx = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or(FlowError::NodeNotFound(id))?;
        let removed = self.nodes.remove(idx);
        let before = self.links.len();
        self.links.retain(|l| !l.touches(id));
        debug!(node = id, pruned = before - self.links.len(), "deleted node");
        Ok(removed)
    }

    // --- links ---

    pub fn add_link(
        &mut self,
        source: NodeId,
        target: NodeId,
        amount: Decimal,
    ) -> Result<Outcome<&Link>, FlowError> {
        if source == target {
            return Ok(Outcome::Rejected(Rejection::SelfLoop));
        }
        if self.link(source, target).is_some() {
            return Ok(Outcome::Rejected(Rejection::DuplicateLink));
        }
        check_amount(amount)?;
        self.require_node(source)?;
        self.require_node(target)?;

        let idx = self.links.len();
        self.links.push(Link {
            source,
            target,
            amount,
        });
        Ok(Outcome::Done(&self.links[idx]))
    }

    pub fn update_link(
        &mut self,
        source: NodeId,
        target: NodeId,
        update: LinkUpdate,
    ) -> Result<&Link, FlowError> {
        if let Some(amount) = update.amount {
            check_amount(amount)?;
        }
        let link = self
            .links
            .iter_mut()
            .find(|l| l.connects(source, target))
            .ok_or(FlowError::LinkNotFound {
                from: source,
                to: target,
            })?;
        if let Some(amount) = update.amount {
            link.amount = amount;
        }
        Ok(&*link)
    }

    /// Returns whether a link was removed; a missing link is not an error.
    pub fn delete_link(&mut self, source: NodeId, target: NodeId) -> bool {
        let before = self.links.len();
        self.links.retain(|l| !l.connects(source, target));
        before != self.links.len()
    }

    /// Moves a link to a new endpoint pair, keeping its amount unless one is given.
    /// A rejected or invalid move leaves the old link in place.
    pub fn rekey_link(
        &mut self,
        old: (NodeId, NodeId),
        new: (NodeId, NodeId),
        amount: Option<Decimal>,
    ) -> Result<Outcome<&Link>, FlowError> {
        let current = self.link(old.0, old.1).ok_or(FlowError::LinkNotFound {
            from: old.0,
            to: old.1,
        })?;
        let amount = amount.unwrap_or(current.amount);
        if old == new {
            return self
                .update_link(old.0, old.1, LinkUpdate { amount: Some(amount) })
                .map(Outcome::Done);
        }
        if new.0 == new.1 {
            return Ok(Outcome::Rejected(Rejection::SelfLoop));
        }
        if self.link(new.0, new.1).is_some() {
            return Ok(Outcome::Rejected(Rejection::DuplicateLink));
        }
        check_amount(amount)?;
        self.require_node(new.0)?;
        self.require_node(new.1)?;

        self.delete_link(old.0, old.1);
        self.add_link(new.0, new.1, amount)
    }

    // --- profiles ---

    pub fn add_owner(&mut self, name: &str) -> Outcome<String> {
        let name = name.trim();
        if name.is_empty() {
            return Outcome::Rejected(Rejection::EmptyProfileName);
        }
        if self.owners.iter().any(|o| o == name) {
            return Outcome::Rejected(Rejection::DuplicateProfile);
        }
        self.owners.push(name.to_string());
        Outcome::Done(name.to_string())
    }

    /// Removing a profile turns its nodes into shared nodes.
    pub fn delete_owner(&mut self, name: &str) -> Result<Outcome<()>, FlowError> {
        let name = name.trim();
        let idx = self
            .owners
            .iter()
            .position(|o| o == name)
            .ok_or_else(|| FlowError::ProfileNotFound(name.to_string()))?;
        if self.owners.len() <= 1 {
            return Ok(Outcome::Rejected(Rejection::LastProfile));
        }
        self.owners.remove(idx);
        for node in self.nodes.iter_mut() {
            if node.owner.as_deref() == Some(name) {
                node.owner = None;
            }
        }
        if self.current_profile == name {
            self.current_profile = self.owners[0].clone();
        }
        Ok(Outcome::Done(()))
    }

    pub fn switch_profile(&mut self, name: &str) -> Result<(), FlowError> {
        let name = name.trim();
        if !self.owners.iter().any(|o| o == name) {
            return Err(FlowError::ProfileNotFound(name.to_string()));
        }
        self.current_profile = name.to_string();
        Ok(())
    }

    // --- settings ---

    pub fn set_horizon(&mut self, months: u32) {
        self.simulation.months = months;
        self.simulation.enabled = months > 0;
    }

    pub fn set_inflation_rate(&mut self, rate: Decimal) -> Result<(), FlowError> {
        check_rate(rate, "Inflation rate")?;
        self.simulation.inflation_rate = rate;
        Ok(())
    }

    pub fn set_real_value(&mut self, real: bool) {
        self.simulation.is_real_value = real;
    }

    pub fn set_strategy(&mut self, summary: &str, at: DateTime<Utc>) {
        self.strategy.summary = summary.to_string();
        self.strategy.updated_at = Some(at);
    }

    fn require_node(&self, id: NodeId) -> Result<(), FlowError> {
        self.node(id).map(|_| ()).ok_or(FlowError::NodeNotFound(id))
    }

    fn resolve_owner(&self, owner: Option<&str>) -> Result<Option<String>, FlowError> {
        match owner.map(str::trim) {
            None | Some("") => Ok(None),
            Some(o) if self.owners.iter().any(|known| known == o) => Ok(Some(o.to_string())),
            Some(o) => Err(FlowError::ProfileNotFound(o.to_string())),
        }
    }
}

fn apply_kind_fields(
    kind: &mut NodeKind,
    interest_rate: Option<Decimal>,
    target_weight: Option<Option<Decimal>>,
    sub_items: Option<Vec<SubItem>>,
) -> Result<(), FlowError> {
    let asset_only = target_weight.is_some_and(|w| w.is_some())
        || sub_items.as_ref().is_some_and(|s| !s.is_empty());
    match kind {
        NodeKind::Asset(a) => {
            if let Some(rate) = interest_rate {
                a.interest_rate = rate;
            }
            if let Some(weight) = target_weight {
                a.target_weight = weight;
            }
            if let Some(items) = sub_items {
                a.sub_items = normalize_sub_items(items);
            }
        }
        NodeKind::Bucket { interest_rate: r } => {
            if asset_only {
                return Err(FlowError::Validation(
                    "Target weight and sub-items only apply to asset nodes".into(),
                ));
            }
            if let Some(rate) = interest_rate {
                *r = rate;
            }
        }
        NodeKind::Income | NodeKind::Expense => {
            if asset_only {
                return Err(FlowError::Validation(
                    "Target weight and sub-items only apply to asset nodes".into(),
                ));
            }
            if interest_rate.is_some_and(|r| !r.is_zero()) {
                return Err(FlowError::Validation(
                    "Interest rate only applies to asset and bucket nodes".into(),
                ));
            }
        }
    }
    Ok(())
}

/// Trims names and orders by ratio, largest first.
pub(crate) fn normalize_sub_items(items: Vec<SubItem>) -> Vec<SubItem> {
    let mut out: Vec<SubItem> = items
        .into_iter()
        .map(|s| SubItem {
            name: s.name.trim().to_string(),
            ratio: s.ratio,
        })
        .collect();
    out.sort_by(|a, b| b.ratio.cmp(&a.ratio));
    out
}

/// Invariants every stored node satisfies.
pub(crate) fn check_node(node: &Node) -> Result<(), FlowError> {
    if node.name.trim().is_empty() {
        return Err(FlowError::Validation("Node name must not be empty".into()));
    }
    if !node.holds_balance() && node.value < Decimal::ZERO {
        return Err(FlowError::Validation(format!(
            "Monthly {} amount must not be negative (got {})",
            node.node_type(),
            node.value
        )));
    }
    check_rate(node.kind.interest_rate(), "Interest rate")?;
    if let Some(w) = node.kind.target_weight() {
        if w < Decimal::ZERO || w > HUNDRED {
            return Err(FlowError::Validation(format!(
                "Target weight must be between 0 and 100 (got {})",
                w
            )));
        }
    }
    let mut total = Decimal::ZERO;
    for item in node.kind.sub_items() {
        if item.name.trim().is_empty() {
            return Err(FlowError::Validation("Sub-item name must not be empty".into()));
        }
        if item.ratio < Decimal::ZERO || item.ratio > HUNDRED {
            return Err(FlowError::Validation(format!(
                "Sub-item '{}' ratio must be between 0 and 100 (got {})",
                item.name, item.ratio
            )));
        }
        total += item.ratio;
    }
    if total > HUNDRED {
        return Err(FlowError::Validation(format!(
            "Sub-item ratios of '{}' add up to {} (max 100)",
            node.name, total
        )));
    }
    Ok(())
}

pub(crate) fn check_amount(amount: Decimal) -> Result<(), FlowError> {
    if amount < Decimal::ZERO {
        return Err(FlowError::Validation(format!(
            "Link amount must not be negative (got {})",
            amount
        )));
    }
    Ok(())
}

fn check_rate(rate: Decimal, what: &str) -> Result<(), FlowError> {
    if rate < Decimal::ZERO {
        return Err(FlowError::Validation(format!(
            "{} must not be negative (got {})",
            what, rate
        )));
    }
    Ok(())
}
