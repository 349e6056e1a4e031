use alloy::primitives::Address;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Resolution, Underlying, USD_DECIMALS};
use crate::utils::fixed_point::{mul_div_floor, to_decimal};

/// USD value of a node. `Unknown` is never folded into zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Valuation {
    Known(Decimal),
    Unknown,
}

impl Valuation {
    pub fn known(&self) -> Option<Decimal> {
        match self {
            Valuation::Known(value) => Some(*value),
            Valuation::Unknown => None,
        }
    }
}

/// Known USD total of a set of trees plus the leaves that could not be valued
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeValuation {
    pub known_usd: Decimal,
    pub unresolved: Vec<Address>,
}

impl TreeValuation {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Value a single node; decomposed nodes are unknown if any descendant is
pub fn value_usd(node: &Underlying) -> Valuation {
    match node.resolution() {
        Resolution::Priced => priced_value(node),
        Resolution::Decomposed => node
            .tokens
            .iter()
            .flatten()
            .map(value_usd)
            .try_fold(Decimal::ZERO, |total, value| {
                value.known().and_then(|value| total.checked_add(value))
            })
            .map_or(Valuation::Unknown, Valuation::Known),
        Resolution::Unresolved => Valuation::Unknown,
    }
}

/// Sum every valued leaf and collect the unresolved ones.
///
/// A leaf whose value would overflow the running total is listed as
/// unresolved rather than added.
pub fn summarize(nodes: &[Underlying]) -> TreeValuation {
    nodes
        .iter()
        .flat_map(Underlying::leaves)
        .fold(TreeValuation::default(), |mut summary, leaf| {
            match leaf.resolution() {
                Resolution::Priced => {
                    let total = priced_value(leaf)
                        .known()
                        .and_then(|value| summary.known_usd.checked_add(value));
                    match total {
                        Some(total) => summary.known_usd = total,
                        None => summary.unresolved.push(leaf.address()),
                    }
                }
                // A decomposed leaf has no children and holds nothing
                Resolution::Decomposed => {}
                Resolution::Unresolved => summary.unresolved.push(leaf.address()),
            }
            summary
        })
}

fn priced_value(node: &Underlying) -> Valuation {
    node.price_raw
        .and_then(|price_raw| mul_div_floor(node.balance_raw(), price_raw, node.decimals()))
        .and_then(|usd_raw| to_decimal(usd_raw, USD_DECIMALS))
        .map_or(Valuation::Unknown, Valuation::Known)
}
