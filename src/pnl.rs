//! Profit and loss metrics for allocation results.
use crate::allocation::AllocationResult;
use crate::period::{PeriodID, PeriodSet};
use crate::supply::SupplySchedule;
use crate::units::{Money, Quantity};
use indexmap::IndexMap;
use std::hash::Hash;

/// Aggregate metrics for an allocation
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PnlSummary {
    /// Total quantity allocated
    pub total_quantity: Quantity,
    /// Total gross profit
    pub gross_profit: Money,
    /// Total profit after adjusting for counterparty default
    pub adjusted_profit: Money,
    /// Quantity expected to arrive, after boil-off
    pub expected_delivered: Quantity,
    /// Supply left unallocated
    pub unallocated_supply: Quantity,
    /// Solver objective, for allocations made by optimisation
    pub objective: Option<Money>,
}

impl PnlSummary {
    fn add(&mut self, other: &PnlSummary) {
        self.total_quantity += other.total_quantity;
        self.gross_profit += other.gross_profit;
        self.adjusted_profit += other.adjusted_profit;
        self.expected_delivered += other.expected_delivered;
        self.unallocated_supply += other.unallocated_supply;
        self.objective = match (self.objective, other.objective) {
            (Some(a), Some(b)) => Some(a + b),
            (a, b) => a.or(b),
        };
    }
}

/// Per-period and overall metrics for one allocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PnlReport {
    /// Metrics for each period, in chronological order
    pub periods: IndexMap<PeriodID, PnlSummary>,
    /// Metrics summed over every period
    pub total: PnlSummary,
}

/// Summarise an allocation for a single period
pub fn summarise_period<K>(
    result: &AllocationResult<K>,
    period_id: &PeriodID,
    supply: Quantity,
) -> PnlSummary
where
    K: Hash + Eq + Clone,
{
    let mut summary = PnlSummary::default();
    for (_, entry) in result.iter_period(period_id) {
        summary.total_quantity += entry.quantity;
        summary.gross_profit += entry.gross_profit;
        summary.adjusted_profit += entry.adjusted_profit;
        summary.expected_delivered += entry.quantity * entry.delivered_fraction;
    }
    summary.unallocated_supply = (supply - summary.total_quantity).max(Quantity(0.0));
    summary.objective = result.objective(period_id);

    summary
}

/// Summarise an allocation for every period, plus an overall total.
///
/// Periods with no allocations are still reported, with all of their supply unallocated.
pub fn summarise<K>(
    result: &AllocationResult<K>,
    periods: &PeriodSet,
    supply: &SupplySchedule,
) -> PnlReport
where
    K: Hash + Eq + Clone,
{
    let mut report = PnlReport::default();
    for period_id in periods.iter() {
        let summary = summarise_period(result, period_id, supply.get(period_id));
        report.total.add(&summary);
        report.periods.insert(period_id.clone(), summary);
    }

    report
}
