//! Code for reading per-period supply overrides.
use super::*;
use crate::id::IDCollection;
use crate::period::PeriodID;
use crate::units::Quantity;
use serde::Deserialize;

const SUPPLY_FILE_NAME: &str = "supply.csv";

#[derive(Debug, PartialEq, Deserialize)]
struct SupplyRaw {
    period_id: String,
    supply: Quantity,
}

/// Read supply overrides from `supply.csv`, if present.
///
/// Periods without an override use the supply given in `model.toml`.
pub fn read_supply_overrides(
    model_dir: &Path,
    periods: &PeriodSet,
) -> Result<IndexMap<PeriodID, Quantity>> {
    let file_path = model_dir.join(SUPPLY_FILE_NAME);
    let Some(iter) = read_csv_optional(&file_path)? else {
        return Ok(IndexMap::new());
    };

    read_supply_overrides_from_iter(iter, periods).with_context(|| input_err_msg(&file_path))
}

fn read_supply_overrides_from_iter<I>(
    iter: I,
    periods: &PeriodSet,
) -> Result<IndexMap<PeriodID, Quantity>>
where
    I: Iterator<Item = SupplyRaw>,
{
    let mut overrides = IndexMap::new();
    for raw in iter {
        let period_id = periods.ids().get_id(&raw.period_id)?;
        check_non_negative("supply", raw.supply.value())?;
        try_insert(&mut overrides, period_id, raw.supply)?;
    }

    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, periods};
    use rstest::rstest;
    use tempfile::tempdir;

    #[rstest]
    fn test_read_supply_overrides_no_file(periods: PeriodSet) {
        let dir = tempdir().unwrap();
        assert!(
            read_supply_overrides(dir.path(), &periods)
                .unwrap()
                .is_empty()
        );
    }

    #[rstest]
    fn test_read_supply_overrides(periods: PeriodSet) {
        let raw = SupplyRaw {
            period_id: "2025-02".into(),
            supply: Quantity(80.0),
        };
        let overrides = read_supply_overrides_from_iter(std::iter::once(raw), &periods).unwrap();
        assert_eq!(overrides[&PeriodID::from("2025-02")], Quantity(80.0));

        let raw = SupplyRaw {
            period_id: "2025-02".into(),
            supply: Quantity(-80.0),
        };
        assert_error!(
            read_supply_overrides_from_iter(std::iter::once(raw), &periods),
            "supply must be a finite number greater than or equal to zero (got -80)"
        );
    }
}
