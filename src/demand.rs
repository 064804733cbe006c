//! The demand hierarchy: market demand, the open (contestable) part of it and the part of open
//! demand attributable to the tracked buyers.
use crate::buyer::{BuyerID, BuyerMap, GroupID};
use crate::period::PeriodID;
use crate::units::{Dimensionless, Quantity};
use indexmap::IndexMap;

/// Demand inputs for a group in a period
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketDemand {
    /// Total market demand
    pub market_demand: Quantity,
    /// Fraction of market demand which is open to the allocator
    pub open_pct: Dimensionless,
    /// Fraction of open demand attributable to the tracked buyers
    pub buyer_of_open_pct: Dimensionless,
}

/// Demand inputs keyed by period and group
pub type MarketDemandMap = IndexMap<(PeriodID, GroupID), MarketDemand>;

/// A map of percentage-of-open values (0 to 100) for each period and buyer
pub type PctOfOpenMap = IndexMap<(PeriodID, BuyerID), Dimensionless>;

/// The derived demand levels for a group in a period.
///
/// `buyer_total <= open_demand <= market_demand` always holds for percentages in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupDemand {
    /// Total market demand
    pub market_demand: Quantity,
    /// Demand open to the allocator
    pub open_demand: Quantity,
    /// Open demand attributable to the tracked buyers, collectively
    pub buyer_total: Quantity,
}

/// Derive open demand and the buyer total from market demand
pub fn derive(
    market_demand: Quantity,
    open_pct: Dimensionless,
    buyer_of_open_pct: Dimensionless,
) -> (Quantity, Quantity) {
    let open_demand = market_demand * open_pct;
    let buyer_total = open_demand * buyer_of_open_pct;
    (open_demand, buyer_total)
}

/// Derived demand for every period and group with demand inputs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemandHierarchy(IndexMap<(PeriodID, GroupID), GroupDemand>);

impl DemandHierarchy {
    /// Build the hierarchy from market demand inputs
    pub fn build(market: &MarketDemandMap) -> Self {
        Self(
            market
                .iter()
                .map(|(key, input)| {
                    let (open_demand, buyer_total) =
                        derive(input.market_demand, input.open_pct, input.buyer_of_open_pct);
                    let demand = GroupDemand {
                        market_demand: input.market_demand,
                        open_demand,
                        buyer_total,
                    };
                    (key.clone(), demand)
                })
                .collect(),
        )
    }

    /// Get the demand for a group in a period, if there is any
    pub fn get(&self, period_id: &PeriodID, group_id: &GroupID) -> Option<&GroupDemand> {
        self.0.get(&(period_id.clone(), group_id.clone()))
    }

    /// Open demand for a group in a period (zero if there is no demand data)
    pub fn open_demand(&self, period_id: &PeriodID, group_id: &GroupID) -> Quantity {
        self.get(period_id, group_id)
            .map_or(Quantity(0.0), |demand| demand.open_demand)
    }

    /// Buyer total for a group in a period (zero if there is no demand data)
    pub fn buyer_total(&self, period_id: &PeriodID, group_id: &GroupID) -> Quantity {
        self.get(period_id, group_id)
            .map_or(Quantity(0.0), |demand| demand.buyer_total)
    }

    /// Iterate over period, group and derived demand
    pub fn iter(&self) -> impl Iterator<Item = (&PeriodID, &GroupID, &GroupDemand)> {
        self.0
            .iter()
            .map(|((period_id, group_id), demand)| (period_id, group_id, demand))
    }
}

/// Default percentage-of-open values which share each group's buyer total equally between the
/// group's active buyers.
///
/// Groups with no open demand or no active buyers get no entries.
pub fn equal_split_pct_of_open(demand: &DemandHierarchy, buyers: &BuyerMap) -> PctOfOpenMap {
    let mut map = PctOfOpenMap::new();
    for (period_id, group_id, group_demand) in demand.iter() {
        if group_demand.open_demand <= Quantity(0.0) {
            continue;
        }

        let active: Vec<_> = buyers
            .values()
            .filter(|buyer| buyer.active && buyer.group_id == *group_id)
            .collect();
        if active.is_empty() {
            continue;
        }

        let share = group_demand.buyer_total / Dimensionless(active.len() as f64);
        let pct = (share / group_demand.open_demand) * Dimensionless(100.0);
        for buyer in active {
            map.insert((period_id.clone(), buyer.id.clone()), pct);
        }
    }

    map
}
