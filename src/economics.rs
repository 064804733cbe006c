//! Unit economics for destinations.
//!
//! Converts prices, voyage distances and cost assumptions into a profit per unit loaded, taking
//! boil-off during the voyage into account.
use crate::destination::{Destination, DestinationID, DestinationMap, DestinationPriceMap};
use crate::model::parameters::CostAssumptions;
use crate::period::{PeriodID, PeriodSet};
use crate::units::{Dimensionless, Distance, MoneyPerQuantity};
use indexmap::IndexMap;
use log::warn;

/// The fraction of a loaded cargo which arrives at its destination.
///
/// Boil-off is approximated as linear in distance: `boiloff_rate` is lost for every
/// `reference_distance` travelled. The result is floored at zero.
pub fn delivered_fraction(
    distance: Distance,
    boiloff_rate: Dimensionless,
    reference_distance: Distance,
) -> Dimensionless {
    let loss = (distance / reference_distance) * boiloff_rate;
    (Dimensionless(1.0) - loss).max(Dimensionless(0.0))
}

/// The total cost per unit loaded of shipping to a destination
pub fn unit_cost(destination: &Destination, assumptions: &CostAssumptions) -> MoneyPerQuantity {
    let freight = assumptions.freight_cost_per_distance_per_unit * destination.distance;
    assumptions.variable_cost_per_unit
        + destination.handling_fee
        + freight
        + assumptions.carbon_cost_per_unit
}

/// Profit per unit loaded: revenue is only earned on the delivered fraction of the cargo
pub fn unit_profit(
    price: MoneyPerQuantity,
    delivered_fraction: Dimensionless,
    unit_cost: MoneyPerQuantity,
) -> MoneyPerQuantity {
    price * delivered_fraction - unit_cost
}

/// Unit economics for one destination in one period
#[derive(Debug, Clone, PartialEq)]
pub struct UnitEconomics {
    /// Price per delivered unit, if known
    pub price: Option<MoneyPerQuantity>,
    /// Fraction of each loaded unit which is delivered
    pub delivered_fraction: Dimensionless,
    /// Cost per loaded unit
    pub unit_cost: MoneyPerQuantity,
    /// Profit per loaded unit. `None` when the price is undefined.
    pub unit_profit: Option<MoneyPerQuantity>,
}

/// Unit economics for every combination of period and destination
pub type UnitEconomicsTable = IndexMap<(PeriodID, DestinationID), UnitEconomics>;

/// Build the unit economics table from scratch.
///
/// Destinations without a price in a period get an entry with an undefined profit, so they are
/// reported but cannot be allocated to.
pub fn build_unit_economics(
    periods: &PeriodSet,
    destinations: &DestinationMap,
    prices: &DestinationPriceMap,
    assumptions: &CostAssumptions,
) -> UnitEconomicsTable {
    let mut table = UnitEconomicsTable::new();
    for period_id in periods.iter() {
        for (destination_id, destination) in destinations {
            let price = prices
                .get(&(period_id.clone(), destination_id.clone()))
                .copied();
            if price.is_none() {
                warn!(
                    "No price for destination {destination_id} in period {period_id}; \
                    it will be excluded from allocation"
                );
            }

            let delivered_fraction = delivered_fraction(
                destination.distance,
                assumptions.boiloff_rate,
                assumptions.reference_distance,
            );
            let unit_cost = unit_cost(destination, assumptions);
            table.insert(
                (period_id.clone(), destination_id.clone()),
                UnitEconomics {
                    price,
                    delivered_fraction,
                    unit_cost,
                    unit_profit: price.map(|p| unit_profit(p, delivered_fraction, unit_cost)),
                },
            );
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{cost_assumptions, destinations, periods};
    use float_cmp::assert_approx_eq;
    use indexmap::indexmap;
    use rstest::rstest;

    #[rstest]
    #[case(1000.0, 0.02, 0.98)]
    #[case(2000.0, 0.02, 0.96)]
    #[case(0.0, 0.02, 1.0)]
    #[case(60_000.0, 0.02, 0.0)] // loss would exceed the cargo
    fn test_delivered_fraction(
        #[case] distance: f64,
        #[case] boiloff_rate: f64,
        #[case] expected: f64,
    ) {
        let frac = delivered_fraction(
            Distance(distance),
            Dimensionless(boiloff_rate),
            Distance(1000.0),
        );
        assert_approx_eq!(Dimensionless, frac, Dimensionless(expected));
    }

    #[rstest]
    fn test_unit_cost_and_profit(cost_assumptions: CostAssumptions, destinations: DestinationMap) {
        // variable 1.0 + handling 0.5 + freight 0.001 * 1000 + carbon 0.25
        let cost = unit_cost(&destinations["JP"], &cost_assumptions);
        assert_approx_eq!(MoneyPerQuantity, cost, MoneyPerQuantity(2.75));

        let profit = unit_profit(MoneyPerQuantity(10.0), Dimensionless(0.98), cost);
        assert_approx_eq!(MoneyPerQuantity, profit, MoneyPerQuantity(7.05));
    }

    #[rstest]
    fn test_build_unit_economics_missing_price(
        periods: PeriodSet,
        destinations: DestinationMap,
        cost_assumptions: CostAssumptions,
    ) {
        let prices = indexmap! {
            ("2025-01".into(), "JP".into()) => MoneyPerQuantity(10.0),
        };
        let table = build_unit_economics(&periods, &destinations, &prices, &cost_assumptions);
        assert_eq!(table.len(), periods.len() * destinations.len());

        let jp = &table[&(PeriodID::from("2025-01"), DestinationID::from("JP"))];
        assert_approx_eq!(
            MoneyPerQuantity,
            jp.unit_profit.unwrap(),
            MoneyPerQuantity(7.05)
        );

        // Undefined, not zero
        let cn = &table[&(PeriodID::from("2025-01"), DestinationID::from("CN"))];
        assert_eq!(cn.price, None);
        assert_eq!(cn.unit_profit, None);
    }
}
