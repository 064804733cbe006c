//! Greedy, margin-ranked allocation of supply to buyers.
//!
//! Within each period, buyers are ranked by margin and filled up to their caps until the period's
//! supply runs out. Supply is not carried between periods.
use super::{AllocationEntry, AllocationResult};
use crate::buyer::{BuyerID, BuyerMap, FinalCostMap};
use crate::caps::CapacityCaps;
use crate::period::{PeriodID, PeriodSet};
use crate::supply::SupplySchedule;
use crate::units::{Dimensionless, MoneyPerQuantity, Quantity};
use log::{debug, warn};
use std::cmp::Ordering;

/// A buyer which may receive supply in a period
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// The buyer
    pub buyer_id: BuyerID,
    /// Price less final cost
    pub margin: MoneyPerQuantity,
    /// The buyer's probability of default, used to break ties in margin
    pub probability_of_default: Dimensionless,
    /// The buyer's cap for the period
    pub cap: Quantity,
}

/// Collect the candidates for a period, in buyer input order.
///
/// A buyer is a candidate if it is active and has a positive cap, a defined price and a final
/// cost for its group. Candidates with a negative margin are dropped unless `sell_at_loss` is set.
/// With `sell_at_loss` set this is the unfiltered candidate set: every active buyer with a
/// positive cap, a defined price and a final cost.
pub fn candidates(
    period_id: &PeriodID,
    buyers: &BuyerMap,
    caps: &CapacityCaps,
    final_costs: &FinalCostMap,
    sell_at_loss: bool,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for buyer in buyers.values().filter(|buyer| buyer.active) {
        let cap = caps.get(period_id, &buyer.id);
        if cap <= Quantity(0.0) {
            continue;
        }

        let Some(price) = buyer.price(period_id) else {
            debug!("Buyer {} has no price in period {period_id}", buyer.id);
            continue;
        };
        let Some(final_cost) = final_costs.get(&(period_id.clone(), buyer.group_id.clone()))
        else {
            warn!(
                "No final cost for group {} in period {period_id}; skipping buyer {}",
                buyer.group_id, buyer.id
            );
            continue;
        };

        let margin = price - *final_cost;
        if margin < MoneyPerQuantity(0.0) && !sell_at_loss {
            debug!(
                "Buyer {} has negative margin {margin} in period {period_id}",
                buyer.id
            );
            continue;
        }

        candidates.push(Candidate {
            buyer_id: buyer.id.clone(),
            margin,
            probability_of_default: buyer.probability_of_default,
            cap,
        });
    }

    candidates
}

/// Order candidates by margin (highest first), then by probability of default (lowest first).
///
/// The sort is stable, so candidates which are equal on both keys keep their input order.
pub fn rank(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.margin
            .partial_cmp(&a.margin)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                a.probability_of_default
                    .partial_cmp(&b.probability_of_default)
                    .unwrap_or(Ordering::Equal)
            })
    });
}

/// Fill ranked candidates from `supply`.
///
/// Returns the quantity taken by each candidate, in the same order as `ranked`. Candidates which
/// are not reached before supply runs out take nothing.
pub fn fill(ranked: &[Candidate], supply: Quantity) -> Vec<Quantity> {
    let mut remaining_supply = supply;
    let mut remaining_caps: Vec<Quantity> = ranked.iter().map(|c| c.cap).collect();
    let mut takes = vec![Quantity(0.0); ranked.len()];
    for (take, remaining_cap) in takes.iter_mut().zip(remaining_caps.iter_mut()) {
        if remaining_supply <= Quantity(0.0) {
            break;
        }

        let amount = remaining_cap.min(remaining_supply);
        if amount <= Quantity(0.0) {
            continue;
        }

        *take = amount;
        *remaining_cap -= amount;
        remaining_supply -= amount;
    }

    takes
}

/// Allocate each period's supply greedily across buyers.
///
/// `caps` is only read: the walk consumes a working copy of each period's caps.
pub fn allocate_buyers(
    periods: &PeriodSet,
    buyers: &BuyerMap,
    caps: &CapacityCaps,
    final_costs: &FinalCostMap,
    supply: &SupplySchedule,
    sell_at_loss: bool,
) -> AllocationResult<BuyerID> {
    let mut result = AllocationResult::default();
    for period_id in periods.iter() {
        let mut ranked = candidates(period_id, buyers, caps, final_costs, sell_at_loss);
        if ranked.is_empty() {
            debug!("No candidate buyers in period {period_id}");
            continue;
        }
        rank(&mut ranked);

        let takes = fill(&ranked, supply.get(period_id));
        for (candidate, take) in ranked.iter().zip(takes) {
            if take <= Quantity(0.0) {
                continue;
            }

            let entry = AllocationEntry::new(
                take,
                candidate.margin,
                candidate.probability_of_default,
                Dimensionless(1.0),
            );
            result.insert(period_id.clone(), candidate.buyer_id.clone(), entry);
        }
        debug!(
            "Period {period_id}: {} candidate buyers, {} allocated",
            ranked.len(),
            result.iter_period(period_id).count()
        );
    }

    result
}
