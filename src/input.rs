//! Common routines for handling input data.
use crate::buyer::{BuyerMap, ExplicitPrices, PricingRule, build_buyers};
use crate::caps::CapInputs;
use crate::model::{BuyerPricing, Model, ModelParameters};
use crate::period::PeriodSet;
use crate::supply::SupplySchedule;
use crate::units::Dimensionless;
use anyhow::{Context, Result, bail, ensure};
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use log::info;
use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use std::fs;
use std::hash::Hash;
use std::path::Path;

mod buyer;
use buyer::{read_buyer_bases, read_explicit_prices, read_index_linked_prices};
mod caps;
use caps::read_cap_inputs;
mod cost;
use cost::read_final_costs;
mod demand;
use demand::read_market_demand;
mod destination;
use destination::{read_destination_prices, read_destinations};
mod supply;
use supply::read_supply_overrides;

/// Read a series of type `T`s from a CSV file.
///
/// Will raise an error if the file is empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<'a, T: DeserializeOwned + 'a>(
    file_path: &'a Path,
) -> Result<impl Iterator<Item = T> + 'a> {
    let vec = read_csv_internal(file_path)?;
    if vec.is_empty() {
        bail!("CSV file {} cannot be empty", file_path.display());
    }

    Ok(vec.into_iter())
}

/// Read a series of type `T`s from a CSV file.
///
/// Returns `None` if the file is not present. An empty file is still an error.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv_optional<'a, T: DeserializeOwned + 'a>(
    file_path: &'a Path,
) -> Result<Option<impl Iterator<Item = T> + 'a>> {
    if !file_path.exists() {
        return Ok(None);
    }

    Ok(Some(read_csv(file_path)?))
}

fn read_csv_internal<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let vec = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?
        .into_deserialize()
        .process_results(|iter| iter.collect_vec())
        .with_context(|| input_err_msg(file_path))?;

    Ok(vec)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Read a [`Dimensionless`] value, checking that it is between 0 and 1
pub fn deserialise_proportion<'de, D>(deserialiser: D) -> Result<Dimensionless, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserialiser)?;
    if !(0.0..=1.0).contains(&value) {
        Err(serde::de::Error::custom("Value must be between 0 and 1"))?;
    }

    Ok(Dimensionless(value))
}

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Check that a value read from file is a finite number greater than or equal to zero
pub fn check_non_negative(name: &str, value: f64) -> Result<()> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "{name} must be a finite number greater than or equal to zero (got {value})"
    );

    Ok(())
}

/// Inserts a key-value pair into an `IndexMap` if the key does not already exist.
///
/// If the key already exists, it returns an error with a message indicating the key's existence.
pub fn try_insert<K, V>(map: &mut IndexMap<K, V>, key: K, value: V) -> Result<()>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
{
    let existing = map.insert(key.clone(), value).is_some();
    ensure!(!existing, "Key {key:?} already exists in the map");
    Ok(())
}

/// Read a model from the specified directory.
///
/// Every input file is read and validated before anything is computed.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The static model data ([`Model`]) or an error.
pub fn load_model<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
    let model_dir = model_dir.as_ref();
    let parameters = ModelParameters::from_path(model_dir)?;
    let periods = PeriodSet::new(&parameters.periods)
        .with_context(|| input_err_msg(model_dir.join("model.toml")))?;

    let overrides = read_supply_overrides(model_dir, &periods)?;
    let supply = SupplySchedule::new(&periods, parameters.supply, &overrides);

    let destinations = read_destinations(model_dir)?.unwrap_or_default();
    let destination_prices = if destinations.is_empty() {
        IndexMap::new()
    } else {
        read_destination_prices(model_dir, &periods, &destinations)?
    };

    let bases = read_buyer_bases(model_dir)?.unwrap_or_default();
    ensure!(
        !destinations.is_empty() || !bases.is_empty(),
        "Model in {} has neither destinations nor buyers",
        model_dir.display()
    );

    let buyers = if bases.is_empty() {
        BuyerMap::new()
    } else {
        let rule: Box<dyn PricingRule> = match parameters.buyer_pricing {
            BuyerPricing::Explicit => Box::new(ExplicitPrices(read_explicit_prices(
                model_dir, &periods, &bases,
            )?)),
            BuyerPricing::IndexLinked => {
                Box::new(read_index_linked_prices(model_dir, &periods, &bases)?)
            }
        };
        build_buyers(&bases, &periods, rule.as_ref())
    };

    let group_ids: IndexSet<_> = buyers
        .values()
        .map(|buyer| buyer.group_id.clone())
        .collect();
    let (final_costs, market_demand, cap_inputs) = if buyers.is_empty() {
        (IndexMap::new(), IndexMap::new(), CapInputs::EqualSplit)
    } else {
        (
            read_final_costs(model_dir, &periods, &group_ids)?,
            read_market_demand(model_dir, &periods, &group_ids)?,
            read_cap_inputs(model_dir, parameters.cap_source, &periods, &buyers)?,
        )
    };

    info!(
        "Loaded model with {} periods, {} destinations and {} buyers",
        periods.len(),
        destinations.len(),
        buyers.len()
    );

    Ok(Model {
        model_path: model_dir.to_path_buf(),
        parameters,
        periods,
        supply,
        destinations,
        destination_prices,
        buyers,
        final_costs,
        market_demand,
        cap_inputs,
    })
}
