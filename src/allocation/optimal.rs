//! Code for performing the optimal (LP) allocation of supply to destinations.
//!
//! For each period we solve:
//!
//! ```text
//! maximise   sum_d profit[d] * x[d]
//! subject to 0 <= x[d] <= capacity[d]   for all d
//!            sum_d x[d] <= supply
//! ```
use super::{AllocationEntry, AllocationResult};
use crate::destination::{DestinationID, DestinationMap};
use crate::economics::UnitEconomicsTable;
use crate::period::PeriodSet;
use crate::supply::SupplySchedule;
use crate::units::{Dimensionless, Money, MoneyPerQuantity, Quantity};
use anyhow::{Result, anyhow, ensure};
use highs::{RowProblem as Problem, Sense};
use indexmap::IndexMap;
use log::debug;
use std::hash::Hash;

/// A decision variable in the optimisation
///
/// Note that this type does **not** include the value of the variable; it just refers to a
/// particular column of the problem.
type Variable = highs::Col;

/// Something which can receive supply in the LP
#[derive(Debug, Clone, PartialEq)]
pub struct LpItem<K> {
    /// Identifies the item in the solution
    pub key: K,
    /// Objective coefficient
    pub unit_profit: MoneyPerQuantity,
    /// Upper bound on the item's allocation
    pub capacity: Quantity,
}

/// The solution to an allocation LP
#[derive(Debug, Clone, PartialEq)]
pub struct LpSolution<K: Hash + Eq> {
    /// Optimal allocation for each item, in the order the items were given
    pub allocation: IndexMap<K, Quantity>,
    /// `sum(unit_profit * allocation)`
    pub objective: Money,
}

/// Solve the allocation LP for a set of items sharing a single supply budget.
///
/// An empty set of items gives an empty solution without calling the solver.
pub fn solve_allocation_lp<K>(items: &[LpItem<K>], supply: Quantity) -> Result<LpSolution<K>>
where
    K: Hash + Eq + Clone,
{
    ensure!(
        supply.is_finite() && supply >= Quantity(0.0),
        "Supply must be a finite, non-negative number"
    );
    for item in items {
        ensure!(
            item.capacity.is_finite() && item.capacity >= Quantity(0.0),
            "Capacities must be finite, non-negative numbers"
        );
        ensure!(
            item.unit_profit.is_finite(),
            "Unit profits must be finite numbers"
        );
    }

    if items.is_empty() {
        return Ok(LpSolution {
            allocation: IndexMap::new(),
            objective: Money(0.0),
        });
    }

    // Set up problem
    let mut problem = Problem::default();
    let variables: Vec<Variable> = items
        .iter()
        .map(|item| problem.add_column(item.unit_profit.value(), 0.0..=item.capacity.value()))
        .collect();

    // Supply limit
    problem.add_row(..=supply.value(), variables.iter().map(|var| (*var, 1.0)));

    // Solve model
    let mut model = problem.optimise(Sense::Maximise);
    model.set_option("output_flag", false);
    let solution = model
        .try_solve()
        .map_err(|status| anyhow!("Could not solve: {status:?}"))?
        .get_solution();
    let values = solution.columns();
    let mut allocation = IndexMap::new();
    let mut objective = Money(0.0);
    for (i, item) in items.iter().enumerate() {
        // A missing value is treated as no allocation. Tiny negative values from the solver's
        // tolerances are clamped.
        let value = values.get(i).copied().unwrap_or(0.0).max(0.0);
        let quantity = Quantity(value);
        objective += item.unit_profit * quantity;
        allocation.insert(item.key.clone(), quantity);
    }

    Ok(LpSolution {
        allocation,
        objective,
    })
}

/// Perform the optimal allocation of each period's supply across destinations.
///
/// Destinations with an undefined profit in a period are left out of that period's problem
/// entirely.
pub fn allocate_destinations(
    periods: &PeriodSet,
    destinations: &DestinationMap,
    economics: &UnitEconomicsTable,
    supply: &SupplySchedule,
) -> Result<AllocationResult<DestinationID>> {
    let mut result = AllocationResult::default();
    for period_id in periods.iter() {
        let mut items = Vec::new();
        let mut delivered = IndexMap::new();
        for (destination_id, destination) in destinations {
            let Some(economics) = economics.get(&(period_id.clone(), destination_id.clone()))
            else {
                continue;
            };
            let Some(unit_profit) = economics.unit_profit else {
                continue;
            };

            items.push(LpItem {
                key: destination_id.clone(),
                unit_profit,
                capacity: destination.capacity,
            });
            delivered.insert(destination_id.clone(), economics.delivered_fraction);
        }

        let period_supply = supply.get(period_id);
        let solution = solve_allocation_lp(&items, period_supply)?;
        debug!(
            "Period {period_id}: {} destinations, objective {}",
            items.len(),
            solution.objective
        );

        for item in &items {
            let quantity = solution.allocation[&item.key];
            let entry = AllocationEntry::new(
                quantity,
                item.unit_profit,
                Dimensionless(0.0),
                delivered[&item.key],
            );
            result.insert(period_id.clone(), item.key.clone(), entry);
        }
        result.set_objective(period_id.clone(), solution.objective);
    }

    Ok(result)
}
