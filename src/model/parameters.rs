//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::input::{check_non_negative, input_err_msg, read_toml};
use crate::units::{
    Dimensionless, Distance, MoneyPerDistancePerQuantity, MoneyPerQuantity, Quantity,
};
use anyhow::{Context, Result, ensure};
use log::warn;
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

macro_rules! define_unit_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            <$type>::new($value)
        }
    };
}

define_unit_param_default!(default_reference_distance, Distance, 1000.0);
define_unit_param_default!(default_carbon_cost_per_unit, MoneyPerQuantity, 0.0);

/// Represents the contents of the entire model file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelParameters {
    /// Names of the periods to allocate over, in chronological order
    pub periods: Vec<String>,
    /// Supply available in each period, unless overridden in `supply.csv`
    pub supply: Quantity,
    /// Fraction of a cargo lost to boil-off for every `reference_distance` travelled
    pub boiloff_rate: Dimensionless,
    /// The distance over which `boiloff_rate` applies
    #[serde(default = "default_reference_distance")]
    pub reference_distance: Distance,
    /// Freight cost per unit of distance per unit loaded
    pub freight_cost_per_distance_per_unit: MoneyPerDistancePerQuantity,
    /// Variable cost per unit loaded
    pub variable_cost_per_unit: MoneyPerQuantity,
    /// Carbon cost per unit loaded
    #[serde(default = "default_carbon_cost_per_unit")]
    pub carbon_cost_per_unit: MoneyPerQuantity,
    /// How buyer prices are obtained
    #[serde(default)]
    pub buyer_pricing: BuyerPricing,
    /// Where buyer caps come from
    #[serde(default)]
    pub cap_source: CapSource,
    /// Whether buyers whose price is below the final cost may still be allocated to
    #[serde(default)]
    pub sell_at_loss: bool,
}

/// The way in which buyer prices are obtained
#[derive(DeserializeLabeledStringEnum, Debug, Clone, Copy, PartialEq, Default)]
pub enum BuyerPricing {
    /// Prices are read from `buyer_prices.csv`
    #[default]
    #[string = "explicit"]
    Explicit,
    /// Prices are derived from market indices, group pricing and negotiation factors
    #[string = "index_linked"]
    IndexLinked,
}

/// The source of buyer caps
#[derive(DeserializeLabeledStringEnum, Debug, Clone, Copy, PartialEq, Default)]
pub enum CapSource {
    /// Share each group's buyer total equally between its active buyers
    #[default]
    #[string = "equal_split"]
    EqualSplit,
    /// Percentages of open demand from `buyer_caps_pct.csv`
    #[string = "pct_of_open"]
    PctOfOpen,
    /// Absolute caps from `buyer_caps.csv`
    #[string = "absolute"]
    Absolute,
    /// Weighted shares of the buyer total from `buyer_weights.csv`
    #[string = "weighted"]
    Weighted,
}

/// The cost assumptions used to calculate unit economics for destinations
#[derive(Debug, Clone, PartialEq)]
pub struct CostAssumptions {
    /// Fraction lost to boil-off per `reference_distance`
    pub boiloff_rate: Dimensionless,
    /// Distance over which `boiloff_rate` applies
    pub reference_distance: Distance,
    /// Freight cost per unit of distance per unit loaded
    pub freight_cost_per_distance_per_unit: MoneyPerDistancePerQuantity,
    /// Variable cost per unit loaded
    pub variable_cost_per_unit: MoneyPerQuantity,
    /// Carbon cost per unit loaded
    pub carbon_cost_per_unit: MoneyPerQuantity,
}

/// Check that the `reference_distance` parameter is valid
fn check_reference_distance(value: Distance) -> Result<()> {
    ensure!(
        value.is_finite() && value > Distance(0.0),
        "reference_distance must be a finite number greater than zero"
    );

    Ok(())
}

/// Check that the `boiloff_rate` parameter is valid
fn check_boiloff_rate(value: Dimensionless) -> Result<()> {
    check_non_negative("boiloff_rate", value.value())?;
    if value > Dimensionless(1.0) {
        warn!("boiloff_rate is greater than one; any voyage will lose the whole cargo");
    }

    Ok(())
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// Validate parameters after reading in file.
    ///
    /// Period names are validated when the [`PeriodSet`](crate::period::PeriodSet) is built.
    fn validate(&self) -> Result<()> {
        check_non_negative("supply", self.supply.value())?;
        check_boiloff_rate(self.boiloff_rate)?;
        check_reference_distance(self.reference_distance)?;
        check_non_negative(
            "freight_cost_per_distance_per_unit",
            self.freight_cost_per_distance_per_unit.value(),
        )?;
        check_non_negative("variable_cost_per_unit", self.variable_cost_per_unit.value())?;
        check_non_negative("carbon_cost_per_unit", self.carbon_cost_per_unit.value())?;

        Ok(())
    }

    /// The cost assumptions for calculating unit economics
    pub fn cost_assumptions(&self) -> CostAssumptions {
        CostAssumptions {
            boiloff_rate: self.boiloff_rate,
            reference_distance: self.reference_distance,
            freight_cost_per_distance_per_unit: self.freight_cost_per_distance_per_unit,
            variable_cost_per_unit: self.variable_cost_per_unit,
            carbon_cost_per_unit: self.carbon_cost_per_unit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const MINIMAL_MODEL: &str = r#"periods = ["2025-01", "2025-02"]
supply = 100.0
boiloff_rate = 0.02
freight_cost_per_distance_per_unit = 0.001
variable_cost_per_unit = 1.0
"#;

    #[test]
    fn test_model_params_from_path() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
            write!(file, "{MINIMAL_MODEL}").unwrap();
        }

        let model_params = ModelParameters::from_path(dir.path()).unwrap();
        assert_eq!(model_params.periods, ["2025-01", "2025-02"]);
        assert_eq!(model_params.supply, Quantity(100.0));
        assert_eq!(model_params.reference_distance, Distance(1000.0));
        assert_eq!(model_params.carbon_cost_per_unit, MoneyPerQuantity(0.0));
        assert_eq!(model_params.buyer_pricing, BuyerPricing::Explicit);
        assert_eq!(model_params.cap_source, CapSource::EqualSplit);
        assert!(!model_params.sell_at_loss);
    }

    #[test]
    fn test_model_params_enums() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
            write!(
                file,
                "{MINIMAL_MODEL}buyer_pricing = \"index_linked\"\ncap_source = \"weighted\"\n"
            )
            .unwrap();
        }

        let model_params = ModelParameters::from_path(dir.path()).unwrap();
        assert_eq!(model_params.buyer_pricing, BuyerPricing::IndexLinked);
        assert_eq!(model_params.cap_source, CapSource::Weighted);
    }

    #[test]
    fn test_model_params_negative_supply() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
            write!(file, "{}", MINIMAL_MODEL.replace("100.0", "-1.0")).unwrap();
        }

        let file_path = dir.path().join(MODEL_PARAMETERS_FILE_NAME);
        assert_error!(
            ModelParameters::from_path(dir.path()),
            input_err_msg(file_path)
        );
    }

    #[rstest]
    #[case(1000.0, true)]
    #[case(0.0, false)]
    #[case(-5.0, false)]
    fn test_check_reference_distance(#[case] value: f64, #[case] expected_valid: bool) {
        assert_eq!(
            check_reference_distance(Distance(value)).is_ok(),
            expected_valid
        );
    }
}
