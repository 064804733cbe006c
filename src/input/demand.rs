//! Code for reading market demand from a CSV file.
use super::*;
use crate::buyer::GroupID;
use crate::demand::{MarketDemand, MarketDemandMap};
use crate::id::IDCollection;
use crate::units::Quantity;
use serde::Deserialize;

const MARKET_DEMAND_FILE_NAME: &str = "market_demand.csv";

#[derive(Debug, PartialEq, Deserialize)]
struct MarketDemandRaw {
    period_id: String,
    group_id: String,
    market_demand: Quantity,
    #[serde(deserialize_with = "deserialise_proportion")]
    open_pct: Dimensionless,
    #[serde(deserialize_with = "deserialise_proportion")]
    buyer_of_open_pct: Dimensionless,
}

/// Read market demand from `market_demand.csv`.
///
/// Groups with no entry for a period have no demand in that period.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `periods` - The model's periods
/// * `group_ids` - The groups which have buyers
pub fn read_market_demand(
    model_dir: &Path,
    periods: &PeriodSet,
    group_ids: &IndexSet<GroupID>,
) -> Result<MarketDemandMap> {
    let file_path = model_dir.join(MARKET_DEMAND_FILE_NAME);
    let iter = read_csv(&file_path)?;
    read_market_demand_from_iter(iter, periods, group_ids)
        .with_context(|| input_err_msg(&file_path))
}

fn read_market_demand_from_iter<I>(
    iter: I,
    periods: &PeriodSet,
    group_ids: &IndexSet<GroupID>,
) -> Result<MarketDemandMap>
where
    I: Iterator<Item = MarketDemandRaw>,
{
    let mut map = MarketDemandMap::new();
    for raw in iter {
        let period_id = periods.ids().get_id(&raw.period_id)?;
        let group_id = group_ids.get_id(&raw.group_id)?;
        check_non_negative("market_demand", raw.market_demand.value())?;

        let demand = MarketDemand {
            market_demand: raw.market_demand,
            open_pct: raw.open_pct,
            buyer_of_open_pct: raw.buyer_of_open_pct,
        };
        try_insert(&mut map, (period_id, group_id), demand)?;
    }

    Ok(map)
}
