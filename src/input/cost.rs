//! Code for reading the final delivered costs for each group.
use super::*;
use crate::buyer::{FinalCostMap, GroupID};
use crate::id::IDCollection;
use crate::units::MoneyPerQuantity;
use serde::Deserialize;

const FINAL_COSTS_FILE_NAME: &str = "final_costs.csv";

#[derive(Debug, PartialEq, Deserialize)]
struct FinalCostRaw {
    period_id: String,
    group_id: String,
    cost: MoneyPerQuantity,
}

/// Read final costs from `final_costs.csv`.
///
/// Every group with buyers must have a cost for every period.
pub fn read_final_costs(
    model_dir: &Path,
    periods: &PeriodSet,
    group_ids: &IndexSet<GroupID>,
) -> Result<FinalCostMap> {
    let file_path = model_dir.join(FINAL_COSTS_FILE_NAME);
    let iter = read_csv(&file_path)?;
    read_final_costs_from_iter(iter, periods, group_ids).with_context(|| input_err_msg(&file_path))
}

fn read_final_costs_from_iter<I>(
    iter: I,
    periods: &PeriodSet,
    group_ids: &IndexSet<GroupID>,
) -> Result<FinalCostMap>
where
    I: Iterator<Item = FinalCostRaw>,
{
    let mut costs = FinalCostMap::new();
    for raw in iter {
        let period_id = periods.ids().get_id(&raw.period_id)?;
        let group_id = group_ids.get_id(&raw.group_id)?;
        check_non_negative("cost", raw.cost.value())?;
        try_insert(&mut costs, (period_id, group_id), raw.cost)?;
    }

    for period_id in periods.iter() {
        for group_id in group_ids {
            ensure!(
                costs.contains_key(&(period_id.clone(), group_id.clone())),
                "Missing final cost for group {group_id} in period {period_id}"
            );
        }
    }

    Ok(costs)
}
