//! The model: a snapshot of every input needed to run an allocation.
use crate::buyer::{BuyerMap, FinalCostMap};
use crate::caps::CapInputs;
use crate::demand::MarketDemandMap;
use crate::destination::{DestinationMap, DestinationPriceMap};
use crate::period::PeriodSet;
use crate::supply::SupplySchedule;
use std::path::PathBuf;

pub mod parameters;
pub use parameters::{BuyerPricing, CapSource, CostAssumptions, ModelParameters};

/// Model definition
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// Path to model folder
    pub model_path: PathBuf,
    /// Parameters from the model TOML file
    pub parameters: ModelParameters,
    /// Periods to allocate over, in chronological order
    pub periods: PeriodSet,
    /// Supply available in each period
    pub supply: SupplySchedule,
    /// Destinations for the optimal allocation
    pub destinations: DestinationMap,
    /// Destination prices by period
    pub destination_prices: DestinationPriceMap,
    /// Buyers for the greedy allocation, with prices resolved
    pub buyers: BuyerMap,
    /// Final delivered cost per unit for each group and period
    pub final_costs: FinalCostMap,
    /// Market demand for each group and period
    pub market_demand: MarketDemandMap,
    /// Inputs from which buyer caps are built
    pub cap_inputs: CapInputs,
}

impl Model {
    /// The cost assumptions for calculating unit economics
    pub fn cost_assumptions(&self) -> CostAssumptions {
        self.parameters.cost_assumptions()
    }
}
