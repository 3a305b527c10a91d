// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::FlowError;
use crate::graph::FlowModel;
use crate::models::{NodeId, NodeType};
use crate::projection::project;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NodeBalance {
    #[serde(rename = "in")]
    pub inflow: Decimal,
    #[serde(rename = "out")]
    pub outflow: Decimal,
    pub net: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowStats {
    pub total_income: Decimal,
    pub total_invested: Decimal,
    pub total_expenses: Decimal,
    pub node_balances: BTreeMap<NodeId, NodeBalance>,
    pub future_values: BTreeMap<NodeId, Decimal>,
}

impl FlowStats {
    pub fn balance(&self, id: NodeId) -> NodeBalance {
        self.node_balances.get(&id).copied().unwrap_or_default()
    }

    pub fn future_value(&self, id: NodeId) -> Option<Decimal> {
        self.future_values.get(&id).copied()
    }
}

/// Per-node in/out/net for one profile, plus category totals and projected
/// values. Recomputed from scratch on every call.
///
/// A link counts when either endpoint is visible from `active_profile`; the
/// totals only count targets that are visible.
pub fn calculate_flows(model: &FlowModel, active_profile: &str) -> Result<FlowStats, FlowError> {
    let visible: HashSet<NodeId> = model.nodes_for(active_profile).map(|n| n.id).collect();
    let mut stats = FlowStats::default();

    for node in model.nodes() {
        stats.node_balances.insert(node.id, NodeBalance::default());
        if node.node_type() == NodeType::Income && visible.contains(&node.id) {
            stats.total_income = plus(stats.total_income, node.value, "Total income")?;
        }
    }

    for link in model.links() {
        let target_visible = visible.contains(&link.target);
        if !target_visible && !visible.contains(&link.source) {
            continue;
        }
        if let Some(b) = stats.node_balances.get_mut(&link.target) {
            b.inflow = plus(b.inflow, link.amount, "Node inflow")?;
        }
        if let Some(b) = stats.node_balances.get_mut(&link.source) {
            b.outflow = plus(b.outflow, link.amount, "Node outflow")?;
        }
        if target_visible {
            match model.node(link.target).map(|n| n.node_type()) {
                Some(NodeType::Asset) => {
                    stats.total_invested =
                        plus(stats.total_invested, link.amount, "Total invested")?;
                }
                Some(NodeType::Expense) => {
                    stats.total_expenses =
                        plus(stats.total_expenses, link.amount, "Total expenses")?;
                }
                _ => {}
            }
        }
    }

    for b in stats.node_balances.values_mut() {
        b.net = minus(b.inflow, b.outflow, "Node net flow")?;
    }

    let sim = model.simulation();
    for node in model.nodes() {
        let fv = if sim.is_active() {
            project(
                node,
                stats.balance(node.id).net,
                sim.months,
                sim.inflation_rate,
                sim.is_real_value,
            )?
        } else {
            node.value
        };
        stats.future_values.insert(node.id, fv);
    }

    Ok(stats)
}

fn plus(a: Decimal, b: Decimal, what: &str) -> Result<Decimal, FlowError> {
    a.checked_add(b).ok_or_else(|| out_of_range(what))
}

fn minus(a: Decimal, b: Decimal, what: &str) -> Result<Decimal, FlowError> {
    a.checked_sub(b).ok_or_else(|| out_of_range(what))
}

fn out_of_range(what: &str) -> FlowError {
    FlowError::OutOfRange(what.to_string())
}

impl FlowModel {
    /// Flows as seen from the current profile.
    pub fn calculate_flows(&self) -> Result<FlowStats, FlowError> {
        calculate_flows(self, self.current_profile())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub profile: String,
    pub horizon_months: u32,
    pub real_value: bool,
    pub net_worth: Decimal,
    pub total_income: Decimal,
    pub total_invested: Decimal,
    pub total_expenses: Decimal,
    /// Income not routed anywhere visible: `total_income − invested − expenses`.
    pub unallocated: Decimal,
}

/// Sum of (projected) balances of the buckets and assets visible from `profile`.
pub fn net_worth(
    model: &FlowModel,
    profile: &str,
    stats: &FlowStats,
) -> Result<Decimal, FlowError> {
    model
        .nodes_for(profile)
        .filter(|n| n.holds_balance())
        .map(|n| stats.future_value(n.id).unwrap_or(n.value))
        .try_fold(Decimal::ZERO, |acc, v| plus(acc, v, "Net worth"))
}

pub fn summarize(
    model: &FlowModel,
    profile: &str,
    stats: &FlowStats,
) -> Result<Summary, FlowError> {
    let sim = model.simulation();
    let routed = plus(stats.total_invested, stats.total_expenses, "Unallocated income")?;
    Ok(Summary {
        profile: profile.to_string(),
        horizon_months: sim.months,
        real_value: sim.is_active() && sim.is_real_value,
        net_worth: net_worth(model, profile, stats)?,
        total_income: stats.total_income,
        total_invested: stats.total_invested,
        total_expenses: stats.total_expenses,
        unallocated: minus(stats.total_income, routed, "Unallocated income")?,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubItemValue {
    pub name: String,
    pub ratio: Decimal,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRow {
    pub id: NodeId,
    pub name: String,
    pub value: Decimal,
    /// Percent of all visible asset value.
    pub share: Decimal,
    pub target_weight: Option<Decimal>,
    /// `share − target_weight`, in percentage points.
    pub drift: Option<Decimal>,
    pub sub_items: Vec<SubItemValue>,
}

/// `part` as a percentage of `whole`; divides first so large values stay in range.
fn percent_of(part: Decimal, whole: Decimal, what: &str) -> Result<Decimal, FlowError> {
    if whole.is_zero() {
        return Ok(Decimal::ZERO);
    }
    part.checked_div(whole)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or_else(|| out_of_range(what))
}

/// Asset mix for `profile`, using projected values when a horizon is set.
pub fn allocation(
    model: &FlowModel,
    profile: &str,
    stats: &FlowStats,
) -> Result<Vec<AllocationRow>, FlowError> {
    let assets: Vec<_> = model
        .nodes_for(profile)
        .filter(|n| n.node_type() == NodeType::Asset)
        .map(|n| (n, stats.future_value(n.id).unwrap_or(n.value)))
        .collect();
    let total = assets
        .iter()
        .try_fold(Decimal::ZERO, |acc, (_, v)| plus(acc, *v, "Total asset value"))?;

    let mut rows = Vec::with_capacity(assets.len());
    for (n, value) in assets {
        let share = percent_of(value, total, "Asset share")?;
        let target_weight = n.kind.target_weight();
        let drift = target_weight
            .map(|t| minus(share, t, "Allocation drift"))
            .transpose()?;
        let sub_items = n
            .kind
            .sub_items()
            .iter()
            .map(|s| {
                let value = (value / Decimal::ONE_HUNDRED)
                    .checked_mul(s.ratio)
                    .ok_or_else(|| out_of_range("Sub-item value"))?;
                Ok(SubItemValue {
                    name: s.name.clone(),
                    ratio: s.ratio,
                    value,
                })
            })
            .collect::<Result<Vec<_>, FlowError>>()?;
        rows.push(AllocationRow {
            id: n.id,
            name: n.name.clone(),
            value,
            share,
            target_weight,
            drift,
            sub_items,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NodeExtras, SubItem};

    fn d(v: i64) -> Decimal {
        Decimal::from(v)
    }

    fn add(m: &mut FlowModel, t: NodeType, name: &str, value: i64, owner: Option<&str>) -> NodeId {
        m.add_node(t, name, d(value), owner, NodeExtras::default())
            .unwrap()
            .id
    }

    #[test]
    fn income_into_bucket() {
        let mut m = FlowModel::new();
        let salary = add(&mut m, NodeType::Income, "Salary", 5_000_000, Some("me"));
        let bucket = add(&mut m, NodeType::Bucket, "Main", 0, Some("me"));
        let _ = m.add_link(salary, bucket, d(1_000_000)).unwrap();

        let stats = m.calculate_flows().unwrap();
        assert_eq!(stats.total_income, d(5_000_000));
        assert_eq!(stats.balance(bucket).inflow, d(1_000_000));
        assert_eq!(stats.balance(bucket).net, d(1_000_000));
        assert_eq!(stats.balance(salary).net, d(-1_000_000));
        assert_eq!(stats.future_value(bucket), Some(d(0)));
    }

    #[test]
    fn totals_split_by_target_type() {
        let mut m = FlowModel::new();
        let main = add(&mut m, NodeType::Bucket, "Main", 0, None);
        let etf = add(&mut m, NodeType::Asset, "ETF", 0, None);
        let rent = add(&mut m, NodeType::Expense, "Rent", 700, None);
        let _ = m.add_link(main, etf, d(300)).unwrap();
        let _ = m.add_link(main, rent, d(700)).unwrap();

        let stats = calculate_flows(&m, "me").unwrap();
        assert_eq!(stats.total_invested, d(300));
        assert_eq!(stats.total_expenses, d(700));
        assert_eq!(stats.balance(main).outflow, d(1_000));
    }

    #[test]
    fn other_profiles_are_filtered_out() {
        let mut m = FlowModel::new();
        assert!(m.add_owner("partner").is_done());
        let mine = add(&mut m, NodeType::Income, "Mine", 100, Some("me"));
        let theirs = add(&mut m, NodeType::Income, "Theirs", 200, Some("partner"));
        let their_fund = add(&mut m, NodeType::Asset, "Their fund", 0, Some("partner"));
        let joint = add(&mut m, NodeType::Bucket, "Joint", 0, None);
        let _ = m.add_link(mine, joint, d(50)).unwrap();
        let _ = m.add_link(theirs, their_fund, d(80)).unwrap();
        // Crosses profiles: counted for "me" because the source is visible.
        let _ = m.add_link(joint, their_fund, d(10)).unwrap();

        let stats = calculate_flows(&m, "me").unwrap();
        assert_eq!(stats.total_income, d(100));
        assert_eq!(stats.total_invested, d(0));
        assert_eq!(stats.balance(their_fund).inflow, d(10));
        assert_eq!(stats.balance(theirs).outflow, d(0));

        let stats = calculate_flows(&m, "partner").unwrap();
        assert_eq!(stats.total_income, d(200));
        assert_eq!(stats.total_invested, d(90));
    }

    #[test]
    fn net_is_in_minus_out_and_inflows_balance() {
        let mut m = FlowModel::seeded().unwrap();
        assert!(m.add_owner("partner").is_done());
        let side = add(&mut m, NodeType::Income, "Side job", 10, Some("partner"));
        let _ = m.add_link(side, 2, d(7)).unwrap();

        let profile = m.current_profile().to_string();
        let stats = calculate_flows(&m, &profile).unwrap();
        for b in stats.node_balances.values() {
            assert_eq!(b.net, b.inflow - b.outflow);
        }
        let link_total: Decimal = m.links_for(&profile).map(|l| l.amount).sum();
        let inflow_total: Decimal = stats.node_balances.values().map(|b| b.inflow).sum();
        assert_eq!(link_total, inflow_total);
    }

    #[test]
    fn horizon_projects_balances_only() {
        let mut m = FlowModel::new();
        let salary = add(&mut m, NodeType::Income, "Salary", 1_000, None);
        let cash = add(&mut m, NodeType::Bucket, "Cash", 500, None);
        let _ = m.add_link(salary, cash, d(100)).unwrap();
        m.set_horizon(12);

        let stats = m.calculate_flows().unwrap();
        assert_eq!(stats.future_value(cash), Some(d(1_700)));
        assert_eq!(stats.future_value(salary), Some(d(1_000)));
        assert_eq!(net_worth(&m, "me", &stats).unwrap(), d(1_700));
    }

    #[test]
    fn allocation_reports_share_and_drift() {
        let mut m = FlowModel::new();
        let extras = NodeExtras {
            target_weight: Some(d(50)),
            sub_items: vec![SubItem { name: "KOSPI".into(), ratio: d(40) }],
            ..NodeExtras::default()
        };
        let a = m
            .add_node(NodeType::Asset, "Stocks", d(300), None, extras)
            .unwrap()
            .id;
        add(&mut m, NodeType::Asset, "Bonds", 100, None);
        add(&mut m, NodeType::Bucket, "Cash", 1_000, None);

        let stats = m.calculate_flows().unwrap();
        let rows = allocation(&m, "me", &stats).unwrap();
        assert_eq!(rows.len(), 2);
        let stocks = rows.iter().find(|r| r.id == a).unwrap();
        assert_eq!(stocks.share, d(75));
        assert_eq!(stocks.drift, Some(d(25)));
        assert_eq!(stocks.sub_items[0].value, d(120));
    }

    #[test]
    fn summary_reports_unallocated_income() {
        let mut m = FlowModel::new();
        let salary = add(&mut m, NodeType::Income, "Salary", 1_000, None);
        let rent = add(&mut m, NodeType::Expense, "Rent", 400, None);
        let _ = m.add_link(salary, rent, d(400)).unwrap();
        let stats = m.calculate_flows().unwrap();
        let s = summarize(&m, "me", &stats).unwrap();
        assert_eq!(s.unallocated, d(600));
        assert_eq!(s.horizon_months, 0);
    }

    #[test]
    fn overflowing_totals_are_errors() {
        let mut m = FlowModel::new();
        m.add_node(NodeType::Income, "Big", Decimal::MAX, None, NodeExtras::default())
            .unwrap();
        m.add_node(NodeType::Income, "Bigger", Decimal::MAX, None, NodeExtras::default())
            .unwrap();
        assert!(matches!(
            m.calculate_flows(),
            Err(FlowError::OutOfRange(_))
        ));
    }

    #[test]
    fn overflowing_link_sums_are_errors() {
        let mut m = FlowModel::new();
        let a = add(&mut m, NodeType::Bucket, "A", 0, None);
        let b = add(&mut m, NodeType::Bucket, "B", 0, None);
        let c = add(&mut m, NodeType::Bucket, "C", 0, None);
        let _ = m.add_link(a, c, Decimal::MAX).unwrap();
        let _ = m.add_link(b, c, Decimal::MAX).unwrap();
        assert!(matches!(
            m.calculate_flows(),
            Err(FlowError::OutOfRange(_))
        ));
    }

    #[test]
    fn overflowing_net_worth_is_an_error() {
        let mut m = FlowModel::new();
        m.add_node(NodeType::Bucket, "A", Decimal::MAX, None, NodeExtras::default())
            .unwrap();
        m.add_node(NodeType::Asset, "B", Decimal::MAX, None, NodeExtras::default())
            .unwrap();
        let stats = m.calculate_flows().unwrap();
        assert!(summarize(&m, "me", &stats).is_err());
        assert!(allocation(&m, "me", &stats).is_ok());
    }
}
