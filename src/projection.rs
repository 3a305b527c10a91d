// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::error::FlowError;
use crate::models::Node;

/// Future value of `node` after `months` of a constant `net_monthly_flow`,
/// compounded monthly at the node's annual rate.
///
/// Income and expense nodes are rates, not balances, and come back unchanged,
/// as does every node when `months == 0`.
pub fn project(
    node: &Node,
    net_monthly_flow: Decimal,
    months: u32,
    annual_inflation: Decimal,
    use_real_value: bool,
) -> Result<Decimal, FlowError> {
    if months == 0 || !node.holds_balance() {
        return Ok(node.value);
    }
    let rate = node.kind.interest_rate();
    let nominal = if rate.is_zero() {
        // Linear accumulation, exact in decimal.
        Decimal::from(months)
            .checked_mul(net_monthly_flow)
            .and_then(|c| c.checked_add(node.value))
            .ok_or_else(|| overflow(node))?
    } else {
        let r = to_f64(rate)? / 12.0;
        let fv = annuity_future_value(to_f64(node.value)?, to_f64(net_monthly_flow)?, r, months);
        from_f64(fv, node)?
    };
    if !use_real_value {
        return Ok(nominal);
    }
    let monthly_inflation = to_f64(annual_inflation)? / 12.0;
    let discount = (1.0 + monthly_inflation).powf(f64::from(months));
    from_f64(to_f64(nominal)? / discount, node)
}

/// `P·(1+r)^n + PMT·((1+r)^n − 1)/r` for a non-zero monthly rate `r`.
fn annuity_future_value(principal: f64, payment: f64, r: f64, months: u32) -> f64 {
    let factor = (1.0 + r).powf(f64::from(months));
    principal * factor + payment * ((factor - 1.0) / r)
}

fn to_f64(d: Decimal) -> Result<f64, FlowError> {
    d.to_f64()
        .ok_or_else(|| FlowError::Projection(format!("{} is not representable as f64", d)))
}

fn from_f64(v: f64, node: &Node) -> Result<Decimal, FlowError> {
    Decimal::from_f64(v).ok_or_else(|| overflow(node))
}

fn overflow(node: &Node) -> FlowError {
    FlowError::Projection(format!(
        "projected value of '{}' (#{}) is out of range",
        node.name, node.id
    ))
}
