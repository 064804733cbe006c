//! Code for reading the inputs from which buyer caps are built.
use super::*;
use crate::buyer::{BuyerID, BuyerMap};
use crate::id::IDCollection;
use crate::model::CapSource;
use crate::period::PeriodID;
use crate::units::Quantity;
use serde::Deserialize;

const PCT_OF_OPEN_FILE_NAME: &str = "buyer_caps_pct.csv";
const ABSOLUTE_CAPS_FILE_NAME: &str = "buyer_caps.csv";
const WEIGHTS_FILE_NAME: &str = "buyer_weights.csv";

/// A value for a buyer in a period. The value column is named after what it holds.
#[derive(Debug, PartialEq, Deserialize)]
struct BuyerValueRaw {
    period_id: String,
    buyer_id: String,
    #[serde(alias = "pct_of_open", alias = "cap", alias = "weight")]
    value: f64,
}

/// Read the cap inputs required by `cap_source`
pub fn read_cap_inputs(
    model_dir: &Path,
    cap_source: CapSource,
    periods: &PeriodSet,
    buyers: &BuyerMap,
) -> Result<CapInputs> {
    let read = |file_name: &str, name: &str, max: Option<f64>| {
        read_buyer_values(&model_dir.join(file_name), periods, buyers, name, max)
    };

    let inputs = match cap_source {
        CapSource::EqualSplit => CapInputs::EqualSplit,
        CapSource::PctOfOpen => CapInputs::PctOfOpen(
            read(PCT_OF_OPEN_FILE_NAME, "pct_of_open", Some(100.0))?
                .into_iter()
                .map(|(key, pct)| (key, Dimensionless(pct)))
                .collect(),
        ),
        CapSource::Absolute => CapInputs::Absolute(
            read(ABSOLUTE_CAPS_FILE_NAME, "cap", None)?
                .into_iter()
                .map(|(key, cap)| (key, Quantity(cap)))
                .collect(),
        ),
        CapSource::Weighted => CapInputs::Weighted(
            read(WEIGHTS_FILE_NAME, "weight", None)?
                .into_iter()
                .map(|(key, weight)| (key, Dimensionless(weight)))
                .collect(),
        ),
    };

    Ok(inputs)
}

/// Read a value for each buyer and period, checking it lies between zero and `max`
fn read_buyer_values(
    file_path: &Path,
    periods: &PeriodSet,
    buyers: &BuyerMap,
    name: &str,
    max: Option<f64>,
) -> Result<IndexMap<(PeriodID, BuyerID), f64>> {
    let iter = read_csv(file_path)?;
    read_buyer_values_from_iter(iter, periods, buyers, name, max)
        .with_context(|| input_err_msg(file_path))
}

fn read_buyer_values_from_iter<I>(
    iter: I,
    periods: &PeriodSet,
    buyers: &BuyerMap,
    name: &str,
    max: Option<f64>,
) -> Result<IndexMap<(PeriodID, BuyerID), f64>>
where
    I: Iterator<Item = BuyerValueRaw>,
{
    let mut values = IndexMap::new();
    for raw in iter {
        let period_id = periods.ids().get_id(&raw.period_id)?;
        let buyer_id = buyers.get_id(&raw.buyer_id)?;
        check_non_negative(name, raw.value)?;
        if let Some(max) = max {
            ensure!(
                raw.value <= max,
                "{name} must not exceed {max} (got {} for buyer {buyer_id})",
                raw.value
            );
        }
        try_insert(&mut values, (period_id, buyer_id), raw.value)?;
    }

    Ok(values)
}
