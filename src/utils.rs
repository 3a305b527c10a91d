// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow, bail};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rust_decimal::Decimal;

use crate::error::Outcome;
use crate::models::{NodeId, SubItem};

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Monthly amount or balance entered by the user; must not be negative.
pub fn parse_amount(s: &str) -> Result<Decimal> {
    let d = parse_decimal(s)?;
    if d < Decimal::ZERO {
        bail!("Amount must not be negative (got {})", d);
    }
    Ok(d)
}

/// Annual rate entered in percent ("2.5") stored as a fraction (0.025).
pub fn parse_rate_percent(s: &str) -> Result<Decimal> {
    let pct = parse_decimal(s)?;
    if pct < Decimal::ZERO {
        bail!("Rate must not be negative (got {}%)", pct);
    }
    Ok(pct / Decimal::ONE_HUNDRED)
}

/// Percentage between 0 and 100, kept as percent.
pub fn parse_weight(s: &str) -> Result<Decimal> {
    let w = parse_decimal(s)?;
    if w < Decimal::ZERO || w > Decimal::ONE_HUNDRED {
        bail!("Percentage must be between 0 and 100 (got {})", w);
    }
    Ok(w)
}

/// "NAME=PCT", e.g. "S&P 500=60".
pub fn parse_sub_item(s: &str) -> Result<SubItem> {
    let (name, ratio) = s
        .rsplit_once('=')
        .ok_or_else(|| anyhow!("Invalid sub-item '{}', expected NAME=PCT", s))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("Invalid sub-item '{}', name is empty", s);
    }
    Ok(SubItem {
        name: name.to_string(),
        ratio: parse_weight(ratio)?,
    })
}

pub fn arg_str<'a>(m: &'a clap::ArgMatches, id: &str) -> Result<&'a str> {
    m.get_one::<String>(id)
        .map(|s| s.trim())
        .ok_or_else(|| anyhow!("Missing --{}", id))
}

pub fn arg_id(m: &clap::ArgMatches, id: &str) -> Result<NodeId> {
    m.get_one::<NodeId>(id)
        .copied()
        .ok_or_else(|| anyhow!("Missing --{}", id))
}

/// Turns a rejected outcome into an error naming `what` was refused.
pub fn require_done<T>(outcome: Outcome<T>, what: &str) -> Result<T> {
    match outcome {
        Outcome::Done(v) => Ok(v),
        Outcome::Rejected(r) => Err(anyhow!("{} not performed: {}", what, r)),
    }
}

pub fn fmt_amount(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn fmt_rate(rate: &Decimal) -> String {
    format!("{:.2}%", (*rate * Decimal::ONE_HUNDRED).round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_percent_becomes_fraction() {
        assert_eq!(parse_rate_percent(" 2.5 ").unwrap(), Decimal::new(25, 3));
        assert!(parse_rate_percent("-1").is_err());
    }

    #[test]
    fn sub_item_splits_on_last_equals() {
        let item = parse_sub_item("A=B fund = 40").unwrap();
        assert_eq!(item.name, "A=B fund");
        assert_eq!(item.ratio, Decimal::from(40));
        assert!(parse_sub_item("Bonds").is_err());
        assert!(parse_sub_item("Bonds=120").is_err());
    }

    #[test]
    fn amounts_are_formatted_with_two_places() {
        assert_eq!(fmt_amount(&Decimal::new(12345, 1)), "1234.50");
        assert_eq!(fmt_rate(&Decimal::new(25, 3)), "2.50%");
    }
}
