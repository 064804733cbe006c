//! Code for reading buyers and buyer pricing from CSV files.
use super::*;
use crate::buyer::{BuyerBase, BuyerID, GroupID, GroupPricing, IndexID, IndexLinkedPrices};
use crate::id::IDCollection;
use crate::period::PeriodID;
use crate::units::MoneyPerQuantity;
use log::warn;
use serde::Deserialize;

const BUYERS_FILE_NAME: &str = "buyers.csv";
const BUYER_PRICES_FILE_NAME: &str = "buyer_prices.csv";
const MARKET_INDICES_FILE_NAME: &str = "market_indices.csv";
const GROUP_PRICING_FILE_NAME: &str = "group_pricing.csv";

#[derive(Debug, PartialEq, Deserialize)]
struct BuyerPriceRaw {
    period_id: String,
    buyer_id: String,
    price: MoneyPerQuantity,
}

#[derive(Debug, PartialEq, Deserialize)]
struct MarketIndexRaw {
    period_id: String,
    index_id: IndexID,
    value: MoneyPerQuantity,
}

#[derive(Debug, PartialEq, Deserialize)]
struct GroupPricingRaw {
    group_id: String,
    index_id: IndexID,
    slope: Dimensionless,
    premium_low: MoneyPerQuantity,
    premium_high: MoneyPerQuantity,
}

/// Read the base data for buyers from `buyers.csv`, if present.
///
/// Input order is preserved, as it is used to break ties in the greedy allocation.
pub fn read_buyer_bases(model_dir: &Path) -> Result<Option<Vec<BuyerBase>>> {
    let file_path = model_dir.join(BUYERS_FILE_NAME);
    let Some(iter) = read_csv_optional::<BuyerBase>(&file_path)? else {
        return Ok(None);
    };

    read_buyer_bases_from_iter(iter)
        .with_context(|| input_err_msg(&file_path))
        .map(Some)
}

fn read_buyer_bases_from_iter<I>(iter: I) -> Result<Vec<BuyerBase>>
where
    I: Iterator<Item = BuyerBase>,
{
    let mut ids = IndexSet::new();
    let mut bases = Vec::new();
    for base in iter {
        check_proportion("negotiation_factor", &base.id, base.negotiation_factor)?;
        if let Some(pd) = base.probability_of_default {
            check_proportion("probability_of_default", &base.id, pd)?;
        }
        ensure!(
            ids.insert(base.id.clone()),
            "Buyer {} is listed more than once",
            base.id
        );
        bases.push(base);
    }

    Ok(bases)
}

fn check_proportion(name: &str, buyer_id: &BuyerID, value: Dimensionless) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&value.value()),
        "{name} for buyer {buyer_id} must be between 0 and 1"
    );

    Ok(())
}

/// Read explicit buyer prices from `buyer_prices.csv`
pub fn read_explicit_prices(
    model_dir: &Path,
    periods: &PeriodSet,
    bases: &[BuyerBase],
) -> Result<IndexMap<(PeriodID, BuyerID), MoneyPerQuantity>> {
    let file_path = model_dir.join(BUYER_PRICES_FILE_NAME);
    let iter = read_csv(&file_path)?;
    read_explicit_prices_from_iter(iter, periods, bases).with_context(|| input_err_msg(&file_path))
}

fn read_explicit_prices_from_iter<I>(
    iter: I,
    periods: &PeriodSet,
    bases: &[BuyerBase],
) -> Result<IndexMap<(PeriodID, BuyerID), MoneyPerQuantity>>
where
    I: Iterator<Item = BuyerPriceRaw>,
{
    let buyer_ids: IndexSet<BuyerID> = bases.iter().map(|base| base.id.clone()).collect();
    let mut prices = IndexMap::new();
    for raw in iter {
        let period_id = periods.ids().get_id(&raw.period_id)?;
        let buyer_id = buyer_ids.get_id(&raw.buyer_id)?;
        ensure!(
            raw.price.is_finite(),
            "Price for buyer {buyer_id} in period {period_id} must be finite"
        );
        try_insert(&mut prices, (period_id, buyer_id), raw.price)?;
    }

    Ok(prices)
}

/// Read index-linked pricing from `market_indices.csv` and `group_pricing.csv`
pub fn read_index_linked_prices(
    model_dir: &Path,
    periods: &PeriodSet,
    bases: &[BuyerBase],
) -> Result<IndexLinkedPrices> {
    let group_ids: IndexSet<GroupID> = bases.iter().map(|base| base.group_id.clone()).collect();

    let file_path = model_dir.join(GROUP_PRICING_FILE_NAME);
    let groups = read_group_pricing_from_iter(read_csv(&file_path)?, &group_ids)
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = model_dir.join(MARKET_INDICES_FILE_NAME);
    let indices = read_market_indices_from_iter(read_csv(&file_path)?, periods)
        .with_context(|| input_err_msg(&file_path))?;

    Ok(IndexLinkedPrices { indices, groups })
}

fn read_group_pricing_from_iter<I>(
    iter: I,
    group_ids: &IndexSet<GroupID>,
) -> Result<IndexMap<GroupID, GroupPricing>>
where
    I: Iterator<Item = GroupPricingRaw>,
{
    let mut groups = IndexMap::new();
    for raw in iter {
        let group_id = group_ids.get_id(&raw.group_id)?;
        ensure!(
            raw.premium_low <= raw.premium_high,
            "premium_low must not exceed premium_high for group {group_id}"
        );
        let pricing = GroupPricing {
            index_id: raw.index_id,
            slope: raw.slope,
            premium_low: raw.premium_low,
            premium_high: raw.premium_high,
        };
        try_insert(&mut groups, group_id, pricing)?;
    }

    for group_id in group_ids {
        if !groups.contains_key(group_id) {
            warn!("No pricing given for group {group_id}; its buyers will have no prices");
        }
    }

    Ok(groups)
}

fn read_market_indices_from_iter<I>(
    iter: I,
    periods: &PeriodSet,
) -> Result<IndexMap<(PeriodID, IndexID), MoneyPerQuantity>>
where
    I: Iterator<Item = MarketIndexRaw>,
{
    let mut indices = IndexMap::new();
    for raw in iter {
        let period_id = periods.ids().get_id(&raw.period_id)?;
        ensure!(
            raw.value.is_finite(),
            "Value of index {} in period {period_id} must be finite",
            raw.index_id
        );
        try_insert(&mut indices, (period_id, raw.index_id), raw.value)?;
    }

    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buyer::CreditRating;
    use crate::fixture::{assert_error, buyer_base, periods};
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_read_buyer_bases() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(BUYERS_FILE_NAME)).unwrap();
            writeln!(
                file,
                "id,name,group_id,profile,credit_rating,negotiation_factor,probability_of_default,active
kogas,KOGAS,KR,utility,AA,0.4,,true
trader1,Trader One,JP,trader,unrated,0.8,0.03,false"
            )
            .unwrap();
        }

        let bases = read_buyer_bases(dir.path()).unwrap().unwrap();
        assert_eq!(bases.len(), 2);
        assert_eq!(bases[0].id, "kogas".into());
        assert_eq!(bases[0].credit_rating, CreditRating::Aa);
        assert_eq!(bases[0].probability_of_default, None);
        assert!(bases[0].active);
        assert_eq!(bases[1].probability_of_default, Some(Dimensionless(0.03)));
        assert!(!bases[1].active);
    }

    #[rstest]
    fn test_read_buyer_bases_invalid(buyer_base: BuyerBase) {
        let mut bad = buyer_base.clone();
        bad.negotiation_factor = Dimensionless(1.5);
        assert_error!(
            read_buyer_bases_from_iter(std::iter::once(bad)),
            "negotiation_factor for buyer buyer1 must be between 0 and 1"
        );

        assert_error!(
            read_buyer_bases_from_iter([buyer_base.clone(), buyer_base].into_iter()),
            "Buyer buyer1 is listed more than once"
        );
    }

    #[rstest]
    fn test_read_explicit_prices(periods: PeriodSet, buyer_base: BuyerBase) {
        let raw = BuyerPriceRaw {
            period_id: "2025-02".into(),
            buyer_id: "buyer1".into(),
            price: MoneyPerQuantity(11.0),
        };
        let prices =
            read_explicit_prices_from_iter(std::iter::once(raw), &periods, &[buyer_base]).unwrap();
        assert_eq!(
            prices[&(PeriodID::from("2025-02"), BuyerID::from("buyer1"))],
            MoneyPerQuantity(11.0)
        );
    }

    #[rstest]
    fn test_read_explicit_prices_unknown_buyer(periods: PeriodSet, buyer_base: BuyerBase) {
        let raw = BuyerPriceRaw {
            period_id: "2025-02".into(),
            buyer_id: "nobody".into(),
            price: MoneyPerQuantity(11.0),
        };
        assert_error!(
            read_explicit_prices_from_iter(std::iter::once(raw), &periods, &[buyer_base]),
            "Unknown ID nobody found"
        );
    }

    #[test]
    fn test_read_group_pricing() {
        let group_ids: IndexSet<GroupID> = ["JP".into(), "CN".into()].into_iter().collect();
        let raw = GroupPricingRaw {
            group_id: "JP".into(),
            index_id: "JKM".into(),
            slope: Dimensionless(1.0),
            premium_low: MoneyPerQuantity(0.2),
            premium_high: MoneyPerQuantity(0.8),
        };
        let groups = read_group_pricing_from_iter(std::iter::once(raw), &group_ids).unwrap();
        assert_eq!(groups[&GroupID::from("JP")].index_id, IndexID::from("JKM"));

        let raw = GroupPricingRaw {
            group_id: "JP".into(),
            index_id: "JKM".into(),
            slope: Dimensionless(1.0),
            premium_low: MoneyPerQuantity(0.8),
            premium_high: MoneyPerQuantity(0.2),
        };
        assert_error!(
            read_group_pricing_from_iter(std::iter::once(raw), &group_ids),
            "premium_low must not exceed premium_high for group JP"
        );
    }

    #[rstest]
    fn test_read_market_indices(periods: PeriodSet) {
        let raw = [
            MarketIndexRaw {
                period_id: "2025-01".into(),
                index_id: "JKM".into(),
                value: MoneyPerQuantity(12.0),
            },
            MarketIndexRaw {
                period_id: "2025-01".into(),
                index_id: "JKM".into(),
                value: MoneyPerQuantity(13.0),
            },
        ];
        assert!(read_market_indices_from_iter(raw.into_iter(), &periods).is_err());
    }
}
