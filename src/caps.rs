//! Capacity caps for buyers.
//!
//! Caps are constructed per period and buyer from one of several sources, then normalised so that
//! the caps within any (period, group) never exceed that group's buyer total. Caps are always
//! returned as new maps; the inputs are never modified.
use crate::buyer::{BuyerID, BuyerMap, GroupID};
use crate::demand::{DemandHierarchy, PctOfOpenMap, equal_split_pct_of_open};
use crate::period::{PeriodID, PeriodSet};
use crate::units::{Dimensionless, Quantity};
use indexmap::IndexMap;
use log::{debug, warn};

/// Absolute cap values read from input, keyed by period and buyer
pub type AbsoluteCapMap = IndexMap<(PeriodID, BuyerID), Quantity>;

/// Relative weights for sharing a group's buyer total, keyed by period and buyer
pub type WeightMap = IndexMap<(PeriodID, BuyerID), Dimensionless>;

/// The inputs from which caps are constructed
#[derive(Debug, Clone, PartialEq)]
pub enum CapInputs {
    /// Share each group's buyer total equally between its active buyers
    EqualSplit,
    /// Percentages of open demand for each buyer
    PctOfOpen(PctOfOpenMap),
    /// Absolute caps for each buyer
    Absolute(AbsoluteCapMap),
    /// Weighted shares of each group's buyer total
    Weighted(WeightMap),
}

/// Maximum quantity each buyer may receive in each period
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapacityCaps(IndexMap<(PeriodID, BuyerID), Quantity>);

impl CapacityCaps {
    /// The cap for a buyer in a period. Buyers without a cap get zero.
    pub fn get(&self, period_id: &PeriodID, buyer_id: &BuyerID) -> Quantity {
        self.0
            .get(&(period_id.clone(), buyer_id.clone()))
            .copied()
            .unwrap_or(Quantity(0.0))
    }

    /// Iterate over period, buyer and cap
    pub fn iter(&self) -> impl Iterator<Item = (&PeriodID, &BuyerID, Quantity)> {
        self.0
            .iter()
            .map(|((period_id, buyer_id), cap)| (period_id, buyer_id, *cap))
    }

    /// The number of caps
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no caps
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total of the caps for every buyer in `group_id` during `period_id`
    pub fn group_total(
        &self,
        period_id: &PeriodID,
        group_id: &GroupID,
        buyers: &BuyerMap,
    ) -> Quantity {
        self.iter()
            .filter(|(p, buyer_id, _)| {
                *p == period_id && buyers.get(*buyer_id).is_some_and(|b| b.group_id == *group_id)
            })
            .map(|(_, _, cap)| cap)
            .sum()
    }
}

impl FromIterator<((PeriodID, BuyerID), Quantity)> for CapacityCaps {
    fn from_iter<I: IntoIterator<Item = ((PeriodID, BuyerID), Quantity)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Raw caps from percentages of open demand: `open_demand * max(0, pct) / 100`.
///
/// Entries for inactive or unknown buyers are skipped.
pub fn caps_from_pct_of_open(
    pcts: &PctOfOpenMap,
    demand: &DemandHierarchy,
    buyers: &BuyerMap,
) -> CapacityCaps {
    pcts.iter()
        .filter_map(|((period_id, buyer_id), pct)| {
            let buyer = buyers.get(buyer_id).filter(|buyer| buyer.active)?;
            let open_demand = demand.open_demand(period_id, &buyer.group_id);
            let fraction = pct.max(Dimensionless(0.0)) / Dimensionless(100.0);
            Some(((period_id.clone(), buyer_id.clone()), open_demand * fraction))
        })
        .collect()
}

/// Raw caps taken directly from a table of absolute values.
///
/// Every active buyer gets a cap in every period: values are clamped to be non-negative and
/// missing entries default to zero.
pub fn caps_from_absolute(
    table: &AbsoluteCapMap,
    periods: &PeriodSet,
    buyers: &BuyerMap,
) -> CapacityCaps {
    let mut caps = IndexMap::new();
    for period_id in periods.iter() {
        for buyer in buyers.values().filter(|buyer| buyer.active) {
            let key = (period_id.clone(), buyer.id.clone());
            let cap = table
                .get(&key)
                .map_or(Quantity(0.0), |cap| cap.max(Quantity(0.0)));
            caps.insert(key, cap);
        }
    }

    CapacityCaps(caps)
}

/// Caps which partition each group's buyer total according to buyer weights.
///
/// Only active buyers with a positive weight receive a cap. Groups whose weights sum to zero, or
/// whose buyer total is not positive, get no caps.
pub fn caps_from_weights(
    weights: &WeightMap,
    demand: &DemandHierarchy,
    buyers: &BuyerMap,
) -> CapacityCaps {
    let mut caps = IndexMap::new();
    for (period_id, group_id, group_demand) in demand.iter() {
        if group_demand.buyer_total <= Quantity(0.0) {
            continue;
        }

        let weighted: Vec<_> = buyers
            .values()
            .filter(|buyer| buyer.active && buyer.group_id == *group_id)
            .filter_map(|buyer| {
                let weight = *weights.get(&(period_id.clone(), buyer.id.clone()))?;
                (weight > Dimensionless(0.0)).then_some((&buyer.id, weight))
            })
            .collect();
        let weight_sum: Dimensionless = weighted.iter().map(|(_, weight)| *weight).sum();
        if weight_sum <= Dimensionless(0.0) {
            debug!("No positive weights for group {group_id} in period {period_id}");
            continue;
        }

        for (buyer_id, weight) in weighted {
            caps.insert(
                (period_id.clone(), buyer_id.clone()),
                group_demand.buyer_total * (weight / weight_sum),
            );
        }
    }

    CapacityCaps(caps)
}

/// Scale caps down so that no (period, group) exceeds its buyer total.
///
/// Where the caps in a group sum to more than the group's buyer total, every cap in the group is
/// multiplied by `buyer_total / cap_sum`. Groups within their limit are left unchanged. Applying
/// this to already-normalised caps gives the same caps back.
pub fn normalise(raw: &CapacityCaps, demand: &DemandHierarchy, buyers: &BuyerMap) -> CapacityCaps {
    let mut sums: IndexMap<(PeriodID, GroupID), Quantity> = IndexMap::new();
    for (period_id, buyer_id, cap) in raw.iter() {
        let Some(buyer) = buyers.get(buyer_id) else {
            continue;
        };
        *sums
            .entry((period_id.clone(), buyer.group_id.clone()))
            .or_default() += cap;
    }

    let mut scales: IndexMap<(PeriodID, GroupID), Dimensionless> = IndexMap::new();
    for ((period_id, group_id), cap_sum) in &sums {
        let limit = demand.buyer_total(period_id, group_id).max(Quantity(0.0));
        if *cap_sum > limit && *cap_sum > Quantity(0.0) {
            warn!(
                "Caps for group {group_id} in period {period_id} sum to {cap_sum}, which exceeds \
                the buyer total of {limit}; scaling down"
            );
            scales.insert((period_id.clone(), group_id.clone()), limit / *cap_sum);
        }
    }

    raw.iter()
        .filter_map(|(period_id, buyer_id, cap)| {
            let buyer = buyers.get(buyer_id)?;
            let scale = scales
                .get(&(period_id.clone(), buyer.group_id.clone()))
                .copied()
                .unwrap_or(Dimensionless(1.0));
            Some(((period_id.clone(), buyer_id.clone()), cap * scale))
        })
        .collect()
}

/// Build normalised caps from the given inputs
pub fn build_caps(
    inputs: &CapInputs,
    periods: &PeriodSet,
    demand: &DemandHierarchy,
    buyers: &BuyerMap,
) -> CapacityCaps {
    let raw = match inputs {
        CapInputs::EqualSplit => {
            let pcts = equal_split_pct_of_open(demand, buyers);
            caps_from_pct_of_open(&pcts, demand, buyers)
        }
        CapInputs::PctOfOpen(pcts) => caps_from_pct_of_open(pcts, demand, buyers),
        CapInputs::Absolute(table) => caps_from_absolute(table, periods, buyers),
        CapInputs::Weighted(weights) => caps_from_weights(weights, demand, buyers),
    };

    normalise(&raw, demand, buyers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demand::{MarketDemand, MarketDemandMap};
    use crate::fixture::{buyers, periods};
    use float_cmp::{approx_eq, assert_approx_eq};
    use indexmap::indexmap;
    use rstest::{fixture, rstest};

    /// JP: open demand 500, buyer total 90. CN: open demand 200, buyer total 100.
    #[fixture]
    fn demand() -> DemandHierarchy {
        let market: MarketDemandMap = indexmap! {
            ("2025-01".into(), "JP".into()) => MarketDemand {
                market_demand: Quantity(1000.0),
                open_pct: Dimensionless(0.5),
                buyer_of_open_pct: Dimensionless(0.18),
            },
            ("2025-01".into(), "CN".into()) => MarketDemand {
                market_demand: Quantity(400.0),
                open_pct: Dimensionless(0.5),
                buyer_of_open_pct: Dimensionless(0.5),
            },
        };
        DemandHierarchy::build(&market)
    }

    fn assert_within_group_totals(
        caps: &CapacityCaps,
        demand: &DemandHierarchy,
        buyers: &BuyerMap,
    ) {
        for (period_id, group_id, group_demand) in demand.iter() {
            let total = caps.group_total(period_id, group_id, buyers);
            assert!(
                total.value() <= group_demand.buyer_total.value() + 1e-9,
                "Caps for {group_id} in {period_id} sum to {total}"
            );
        }
    }

    #[rstest]
    fn test_normalise_scales_down(buyers: BuyerMap, demand: DemandHierarchy) {
        let raw: CapacityCaps = [
            (("2025-01".into(), "jp_a".into()), Quantity(60.0)),
            (("2025-01".into(), "jp_b".into()), Quantity(60.0)),
        ]
        .into_iter()
        .collect();
        let caps = normalise(&raw, &demand, &buyers);

        assert_approx_eq!(Quantity, caps.get(&"2025-01".into(), &"jp_a".into()), Quantity(45.0));
        assert_approx_eq!(Quantity, caps.get(&"2025-01".into(), &"jp_b".into()), Quantity(45.0));

        // Input is untouched
        assert_eq!(raw.get(&"2025-01".into(), &"jp_a".into()), Quantity(60.0));
    }

    #[rstest]
    fn test_normalise_within_limit_unchanged(buyers: BuyerMap, demand: DemandHierarchy) {
        let raw: CapacityCaps = [
            (("2025-01".into(), "jp_a".into()), Quantity(30.0)),
            (("2025-01".into(), "cn_a".into()), Quantity(100.0)),
        ]
        .into_iter()
        .collect();
        assert_eq!(normalise(&raw, &demand, &buyers), raw);
    }

    #[rstest]
    fn test_normalise_idempotent(buyers: BuyerMap, demand: DemandHierarchy) {
        let raw: CapacityCaps = [
            (("2025-01".into(), "jp_a".into()), Quantity(70.0)),
            (("2025-01".into(), "jp_b".into()), Quantity(50.0)),
            (("2025-01".into(), "cn_a".into()), Quantity(130.0)),
        ]
        .into_iter()
        .collect();
        let once = normalise(&raw, &demand, &buyers);
        let twice = normalise(&once, &demand, &buyers);

        assert_within_group_totals(&once, &demand, &buyers);
        for (period_id, buyer_id, cap) in once.iter() {
            let again = twice.get(period_id, buyer_id);
            assert!(approx_eq!(f64, cap.value(), again.value(), epsilon = 1e-9));
        }
    }

    #[rstest]
    fn test_normalise_no_group_total(buyers: BuyerMap, demand: DemandHierarchy) {
        // No demand data for February, so the limit is zero
        let raw: CapacityCaps = [(("2025-02".into(), "jp_a".into()), Quantity(10.0))]
            .into_iter()
            .collect();
        let caps = normalise(&raw, &demand, &buyers);
        assert_eq!(caps.get(&"2025-02".into(), &"jp_a".into()), Quantity(0.0));
    }

    #[rstest]
    fn test_caps_from_pct_of_open(buyers: BuyerMap, demand: DemandHierarchy) {
        let pcts = indexmap! {
            ("2025-01".into(), "jp_a".into()) => Dimensionless(10.0),
            ("2025-01".into(), "jp_b".into()) => Dimensionless(-5.0),
            ("2025-01".into(), "jp_inactive".into()) => Dimensionless(50.0),
        };
        let caps = caps_from_pct_of_open(&pcts, &demand, &buyers);

        assert_approx_eq!(Quantity, caps.get(&"2025-01".into(), &"jp_a".into()), Quantity(50.0));
        assert_eq!(caps.get(&"2025-01".into(), &"jp_b".into()), Quantity(0.0));
        assert_eq!(caps.len(), 2);
    }

    #[rstest]
    fn test_caps_from_absolute(buyers: BuyerMap, periods: PeriodSet) {
        let table = indexmap! {
            ("2025-01".into(), "jp_a".into()) => Quantity(25.0),
            ("2025-01".into(), "cn_a".into()) => Quantity(-3.0),
        };
        let caps = caps_from_absolute(&table, &periods, &buyers);

        assert_eq!(caps.get(&"2025-01".into(), &"jp_a".into()), Quantity(25.0));
        assert_eq!(caps.get(&"2025-01".into(), &"cn_a".into()), Quantity(0.0));
        assert_eq!(caps.get(&"2025-02".into(), &"jp_a".into()), Quantity(0.0));

        // Three active buyers in each of two periods
        assert_eq!(caps.len(), 6);
    }

    #[rstest]
    fn test_caps_from_weights(buyers: BuyerMap, demand: DemandHierarchy) {
        let weights = indexmap! {
            ("2025-01".into(), "jp_a".into()) => Dimensionless(2.0),
            ("2025-01".into(), "jp_b".into()) => Dimensionless(1.0),
            ("2025-01".into(), "cn_a".into()) => Dimensionless(0.0),
        };
        let caps = caps_from_weights(&weights, &demand, &buyers);

        assert_approx_eq!(Quantity, caps.get(&"2025-01".into(), &"jp_a".into()), Quantity(60.0));
        assert_approx_eq!(Quantity, caps.get(&"2025-01".into(), &"jp_b".into()), Quantity(30.0));

        // Zero weight sum for CN: no caps at all
        assert_eq!(caps.len(), 2);
        assert_within_group_totals(&caps, &demand, &buyers);
    }

    #[rstest]
    fn test_build_caps_equal_split(buyers: BuyerMap, periods: PeriodSet, demand: DemandHierarchy) {
        let caps = build_caps(&CapInputs::EqualSplit, &periods, &demand, &buyers);

        let cap = |buyer_id: &str| caps.get(&"2025-01".into(), &buyer_id.into());
        assert_approx_eq!(Quantity, cap("jp_a"), Quantity(45.0), epsilon = 1e-9);
        assert_approx_eq!(Quantity, cap("jp_b"), Quantity(45.0), epsilon = 1e-9);
        assert_approx_eq!(Quantity, cap("cn_a"), Quantity(100.0), epsilon = 1e-9);
        assert_eq!(caps.get(&"2025-01".into(), &"jp_inactive".into()), Quantity(0.0));
        assert_within_group_totals(&caps, &demand, &buyers);
    }
}
