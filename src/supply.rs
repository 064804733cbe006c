//! Supply available for allocation in each period.
use crate::period::{PeriodID, PeriodSet};
use crate::units::Quantity;
use indexmap::IndexMap;

/// The supply available in each period.
///
/// Every period in the model has an entry. Unsold supply is not carried over to later periods.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupplySchedule(IndexMap<PeriodID, Quantity>);

impl SupplySchedule {
    /// A schedule with the same supply in every period, except where `overrides` gives a value
    pub fn new(
        periods: &PeriodSet,
        base: Quantity,
        overrides: &IndexMap<PeriodID, Quantity>,
    ) -> Self {
        Self(
            periods
                .iter()
                .map(|period_id| {
                    let supply = overrides.get(period_id).copied().unwrap_or(base);
                    (period_id.clone(), supply)
                })
                .collect(),
        )
    }

    /// The supply in a period. Unknown periods have no supply.
    pub fn get(&self, period_id: &PeriodID) -> Quantity {
        self.0.get(period_id).copied().unwrap_or(Quantity(0.0))
    }

    /// Iterate over periods and their supply
    pub fn iter(&self) -> impl Iterator<Item = (&PeriodID, Quantity)> {
        self.0.iter().map(|(period_id, supply)| (period_id, *supply))
    }
}

impl FromIterator<(PeriodID, Quantity)> for SupplySchedule {
    fn from_iter<I: IntoIterator<Item = (PeriodID, Quantity)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::periods;
    use indexmap::indexmap;
    use rstest::rstest;

    #[rstest]
    fn test_supply_schedule_overrides(periods: PeriodSet) {
        let overrides = indexmap! {"2025-02".into() => Quantity(40.0)};
        let supply = SupplySchedule::new(&periods, Quantity(100.0), &overrides);

        assert_eq!(supply.get(&"2025-01".into()), Quantity(100.0));
        assert_eq!(supply.get(&"2025-02".into()), Quantity(40.0));
        assert_eq!(supply.get(&"2030-01".into()), Quantity(0.0));
        assert_eq!(supply.iter().count(), periods.len());
    }
}
