//! Rebuilding every derived table from a model.
//!
//! Nothing is updated incrementally: [`recompute`] builds unit economics, demand, caps and both
//! allocations from scratch. A [`Session`] owns a model and its latest [`Outcome`], and only
//! recomputes after the model has been marked dirty.
use crate::allocation::AllocationResult;
use crate::allocation::greedy::allocate_buyers;
use crate::allocation::optimal::allocate_destinations;
use crate::buyer::BuyerID;
use crate::caps::{CapacityCaps, build_caps};
use crate::demand::DemandHierarchy;
use crate::destination::DestinationID;
use crate::economics::{UnitEconomicsTable, build_unit_economics};
use crate::model::Model;
use crate::pnl::{PnlReport, summarise};
use anyhow::Result;
use log::info;

/// Everything derived from a model in a single recompute
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Unit economics for every period and destination
    pub unit_economics: UnitEconomicsTable,
    /// Optimal allocation to destinations
    pub destination_allocation: AllocationResult<DestinationID>,
    /// Metrics for the destination allocation
    pub destination_pnl: PnlReport,
    /// Derived demand for every period and group
    pub demand: DemandHierarchy,
    /// Normalised buyer caps
    pub caps: CapacityCaps,
    /// Greedy allocation to buyers
    pub buyer_allocation: AllocationResult<BuyerID>,
    /// Metrics for the buyer allocation
    pub buyer_pnl: PnlReport,
}

/// Rebuild every derived table from the model
pub fn recompute(model: &Model) -> Result<Outcome> {
    let unit_economics = build_unit_economics(
        &model.periods,
        &model.destinations,
        &model.destination_prices,
        &model.cost_assumptions(),
    );
    let destination_allocation = allocate_destinations(
        &model.periods,
        &model.destinations,
        &unit_economics,
        &model.supply,
    )?;
    let destination_pnl = summarise(&destination_allocation, &model.periods, &model.supply);

    let demand = DemandHierarchy::build(&model.market_demand);
    let caps = build_caps(&model.cap_inputs, &model.periods, &demand, &model.buyers);
    let buyer_allocation = allocate_buyers(
        &model.periods,
        &model.buyers,
        &caps,
        &model.final_costs,
        &model.supply,
        model.parameters.sell_at_loss,
    );
    let buyer_pnl = summarise(&buyer_allocation, &model.periods, &model.supply);

    info!(
        "Destination allocation: gross profit {}; buyer allocation: adjusted profit {}",
        destination_pnl.total.gross_profit, buyer_pnl.total.adjusted_profit
    );

    Ok(Outcome {
        unit_economics,
        destination_allocation,
        destination_pnl,
        demand,
        caps,
        buyer_allocation,
        buyer_pnl,
    })
}

/// A model together with its most recent outcome
#[derive(Debug)]
pub struct Session {
    model: Model,
    dirty: bool,
    outcome: Option<Outcome>,
}

impl Session {
    /// Start a session. Nothing is computed until [`Session::outcome`] is called.
    pub fn new(model: Model) -> Self {
        Self {
            model,
            dirty: true,
            outcome: None,
        }
    }

    /// The current model
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Edit the model. The session is marked dirty.
    pub fn model_mut(&mut self) -> &mut Model {
        self.dirty = true;
        &mut self.model
    }

    /// Request a recompute on the next call to [`Session::outcome`]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether the outcome is out of date
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The outcome for the current model, recomputing it if the session is dirty.
    ///
    /// The previous outcome is replaced only once a recompute succeeds. If it fails, the previous
    /// outcome is discarded and the session stays dirty.
    pub fn outcome(&mut self) -> Result<&Outcome> {
        let outcome = match self.outcome.take() {
            Some(outcome) if !self.dirty => outcome,
            _ => recompute(&self.model)?,
        };
        self.dirty = false;

        Ok(self.outcome.insert(outcome))
    }
}
