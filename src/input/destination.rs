//! Code for reading destinations and their prices from CSV files.
use super::*;
use crate::destination::{Destination, DestinationMap, DestinationPriceMap};
use crate::id::IDCollection;
use crate::units::MoneyPerQuantity;
use log::warn;
use serde::Deserialize;

const DESTINATIONS_FILE_NAME: &str = "destinations.csv";
const DESTINATION_PRICES_FILE_NAME: &str = "destination_prices.csv";

#[derive(Debug, PartialEq, Deserialize)]
struct DestinationPriceRaw {
    period_id: String,
    destination_id: String,
    price: MoneyPerQuantity,
}

/// Read destinations from `destinations.csv`, if present.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
pub fn read_destinations(model_dir: &Path) -> Result<Option<DestinationMap>> {
    let file_path = model_dir.join(DESTINATIONS_FILE_NAME);
    let Some(iter) = read_csv_optional::<Destination>(&file_path)? else {
        return Ok(None);
    };

    read_destinations_from_iter(iter)
        .with_context(|| input_err_msg(&file_path))
        .map(Some)
}

fn read_destinations_from_iter<I>(iter: I) -> Result<DestinationMap>
where
    I: Iterator<Item = Destination>,
{
    let mut destinations = DestinationMap::new();
    for destination in iter {
        check_non_negative("distance", destination.distance.value())?;
        check_non_negative("capacity", destination.capacity.value())?;
        check_non_negative("handling_fee", destination.handling_fee.value())?;
        try_insert(&mut destinations, destination.id.clone(), destination)?;
    }

    Ok(destinations)
}

/// Read destination prices from `destination_prices.csv`.
///
/// If the file is absent, every price is undefined.
pub fn read_destination_prices(
    model_dir: &Path,
    periods: &PeriodSet,
    destinations: &DestinationMap,
) -> Result<DestinationPriceMap> {
    let file_path = model_dir.join(DESTINATION_PRICES_FILE_NAME);
    let Some(iter) = read_csv_optional(&file_path)? else {
        warn!("{DESTINATION_PRICES_FILE_NAME} not found; no destinations can be allocated to");
        return Ok(DestinationPriceMap::new());
    };

    read_destination_prices_from_iter(iter, periods, destinations)
        .with_context(|| input_err_msg(&file_path))
}

fn read_destination_prices_from_iter<I>(
    iter: I,
    periods: &PeriodSet,
    destinations: &DestinationMap,
) -> Result<DestinationPriceMap>
where
    I: Iterator<Item = DestinationPriceRaw>,
{
    let mut prices = DestinationPriceMap::new();
    for raw in iter {
        let period_id = periods.ids().get_id(&raw.period_id)?;
        let destination_id = destinations.get_id(&raw.destination_id)?;
        ensure!(
            raw.price.is_finite(),
            "Price for destination {destination_id} in period {period_id} must be finite"
        );
        try_insert(&mut prices, (period_id, destination_id), raw.price)?;
    }

    Ok(prices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::DestinationID;
    use crate::fixture::{assert_error, destinations, periods};
    use crate::period::PeriodID;
    use crate::units::{Distance, Quantity};
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_read_destinations() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(DESTINATIONS_FILE_NAME)).unwrap();
            writeln!(
                file,
                "id,name,distance,capacity,handling_fee
JP,Japan,1000,80,0.5
CN,China,2500,120,0.4"
            )
            .unwrap();
        }

        let destinations = read_destinations(dir.path()).unwrap().unwrap();
        assert_eq!(destinations.len(), 2);
        assert_eq!(destinations["CN"].distance, Distance(2500.0));
        assert_eq!(destinations["JP"].capacity, Quantity(80.0));
        assert_eq!(destinations["JP"].name, "Japan");
    }

    #[test]
    fn test_read_destinations_missing_file() {
        let dir = tempdir().unwrap();
        assert!(read_destinations(dir.path()).unwrap().is_none());
    }

    #[rstest]
    fn test_read_destinations_invalid(destinations: DestinationMap) {
        let mut bad = destinations["JP"].clone();
        bad.capacity = Quantity(-1.0);
        assert_error!(
            read_destinations_from_iter(std::iter::once(bad)),
            "capacity must be a finite number greater than or equal to zero (got -1)"
        );

        let duplicate = destinations["JP"].clone();
        assert!(read_destinations_from_iter([duplicate.clone(), duplicate].into_iter()).is_err());
    }

    #[rstest]
    fn test_read_destination_prices(periods: PeriodSet, destinations: DestinationMap) {
        let raw = DestinationPriceRaw {
            period_id: "2025-01".into(),
            destination_id: "JP".into(),
            price: MoneyPerQuantity(10.0),
        };
        let prices =
            read_destination_prices_from_iter(std::iter::once(raw), &periods, &destinations)
                .unwrap();
        assert_eq!(
            prices[&(PeriodID::from("2025-01"), DestinationID::from("JP"))],
            MoneyPerQuantity(10.0)
        );
    }

    #[rstest]
    fn test_read_destination_prices_unknown_id(periods: PeriodSet, destinations: DestinationMap) {
        let raw = DestinationPriceRaw {
            period_id: "2025-01".into(),
            destination_id: "XX".into(),
            price: MoneyPerQuantity(10.0),
        };
        assert_error!(
            read_destination_prices_from_iter(std::iter::once(raw), &periods, &destinations),
            "Unknown ID XX found"
        );

        let raw = DestinationPriceRaw {
            period_id: "1999-12".into(),
            destination_id: "JP".into(),
            price: MoneyPerQuantity(10.0),
        };
        assert_error!(
            read_destination_prices_from_iter(std::iter::once(raw), &periods, &destinations),
            "Unknown ID 1999-12 found"
        );
    }
}
