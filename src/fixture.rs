//! Fixtures for tests

use crate::buyer::{
    BuyerBase, BuyerID, BuyerMap, CreditRating, ExplicitPrices, FinalCostMap, GroupID, build_buyers,
};
use crate::caps::CapInputs;
use crate::demand::{MarketDemand, MarketDemandMap};
use crate::destination::{Destination, DestinationMap, DestinationPriceMap};
use crate::model::{BuyerPricing, CapSource, CostAssumptions, Model, ModelParameters};
use crate::period::{PeriodID, PeriodSet};
use crate::supply::SupplySchedule;
use crate::units::{
    Dimensionless, Distance, MoneyPerDistancePerQuantity, MoneyPerQuantity, Quantity,
};
use indexmap::{IndexMap, indexmap};
use rstest::fixture;
use std::path::PathBuf;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

#[fixture]
pub fn periods() -> PeriodSet {
    PeriodSet::new(["2025-01", "2025-02"]).unwrap()
}

#[fixture]
pub fn buyer_base() -> BuyerBase {
    BuyerBase {
        id: "buyer1".into(),
        name: "Buyer 1".into(),
        group_id: "JP".into(),
        profile: "utility".into(),
        credit_rating: CreditRating::Bb,
        negotiation_factor: Dimensionless(0.5),
        probability_of_default: None,
        active: true,
    }
}

/// Three buyers in JP (one of them inactive) and one in CN, with prices in every period
#[fixture]
pub fn buyers(periods: PeriodSet) -> BuyerMap {
    let base = |id: &str, group_id: &str, credit_rating, active| BuyerBase {
        id: id.into(),
        name: id.to_uppercase(),
        group_id: group_id.into(),
        profile: "utility".into(),
        credit_rating,
        negotiation_factor: Dimensionless(0.5),
        probability_of_default: None,
        active,
    };
    let bases = [
        base("jp_a", "JP", CreditRating::A, true),
        base("jp_b", "JP", CreditRating::Bbb, true),
        base("jp_inactive", "JP", CreditRating::Aa, false),
        base("cn_a", "CN", CreditRating::Bb, true),
    ];

    let mut prices: IndexMap<(PeriodID, BuyerID), MoneyPerQuantity> = IndexMap::new();
    for period_id in periods.iter() {
        let period_prices = [
            ("jp_a", 10.0),
            ("jp_b", 9.0),
            ("jp_inactive", 12.0),
            ("cn_a", 8.0),
        ];
        for (buyer_id, price) in period_prices {
            prices.insert(
                (period_id.clone(), buyer_id.into()),
                MoneyPerQuantity(price),
            );
        }
    }

    build_buyers(&bases, &periods, &ExplicitPrices(prices))
}

#[fixture]
pub fn destinations() -> DestinationMap {
    [
        Destination {
            id: "JP".into(),
            name: "Japan".into(),
            distance: Distance(1000.0),
            capacity: Quantity(80.0),
            handling_fee: MoneyPerQuantity(0.5),
        },
        Destination {
            id: "CN".into(),
            name: "China".into(),
            distance: Distance(2500.0),
            capacity: Quantity(120.0),
            handling_fee: MoneyPerQuantity(0.4),
        },
    ]
    .into_iter()
    .map(|destination| (destination.id.clone(), destination))
    .collect()
}

#[fixture]
pub fn cost_assumptions() -> CostAssumptions {
    CostAssumptions {
        boiloff_rate: Dimensionless(0.02),
        reference_distance: Distance(1000.0),
        freight_cost_per_distance_per_unit: MoneyPerDistancePerQuantity(0.001),
        variable_cost_per_unit: MoneyPerQuantity(1.0),
        carbon_cost_per_unit: MoneyPerQuantity(0.25),
    }
}

/// A small model with both destinations and buyers, and 100 units of supply in each period
#[fixture]
pub fn model(periods: PeriodSet, destinations: DestinationMap, buyers: BuyerMap) -> Model {
    let parameters = ModelParameters {
        periods: periods.iter().map(ToString::to_string).collect(),
        supply: Quantity(100.0),
        boiloff_rate: Dimensionless(0.02),
        reference_distance: Distance(1000.0),
        freight_cost_per_distance_per_unit: MoneyPerDistancePerQuantity(0.001),
        variable_cost_per_unit: MoneyPerQuantity(1.0),
        carbon_cost_per_unit: MoneyPerQuantity(0.25),
        buyer_pricing: BuyerPricing::Explicit,
        cap_source: CapSource::EqualSplit,
        sell_at_loss: false,
    };
    let supply = SupplySchedule::new(&periods, parameters.supply, &IndexMap::new());
    let destination_prices: DestinationPriceMap = indexmap! {
        ("2025-01".into(), "JP".into()) => MoneyPerQuantity(10.0),
        ("2025-01".into(), "CN".into()) => MoneyPerQuantity(9.0),
        ("2025-02".into(), "JP".into()) => MoneyPerQuantity(11.0),
    };

    let mut final_costs = FinalCostMap::new();
    let mut market_demand = MarketDemandMap::new();
    for period_id in periods.iter() {
        for (group_id, market, buyer_of_open_pct) in [("JP", 1000.0, 0.18), ("CN", 400.0, 0.5)] {
            let key = (period_id.clone(), GroupID::from(group_id));
            final_costs.insert(key.clone(), MoneyPerQuantity(5.0));
            market_demand.insert(
                key,
                MarketDemand {
                    market_demand: Quantity(market),
                    open_pct: Dimensionless(0.5),
                    buyer_of_open_pct: Dimensionless(buyer_of_open_pct),
                },
            );
        }
    }

    Model {
        model_path: PathBuf::from("model"),
        parameters,
        periods,
        supply,
        destinations,
        destination_prices,
        buyers,
        final_costs,
        market_demand,
        cap_inputs: CapInputs::EqualSplit,
    }
}
