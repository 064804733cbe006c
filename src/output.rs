//! The module responsible for writing output data to disk.
use crate::allocation::{AllocationEntry, AllocationResult};
use crate::buyer::{BuyerID, GroupID};
use crate::caps::CapacityCaps;
use crate::demand::DemandHierarchy;
use crate::destination::DestinationID;
use crate::economics::UnitEconomicsTable;
use crate::period::PeriodID;
use crate::pnl::{PnlReport, PnlSummary};
use crate::recompute::Outcome;
use crate::units::{Dimensionless, Money, MoneyPerQuantity, Quantity};
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "lngopt_results";

const UNIT_ECONOMICS_FILE_NAME: &str = "unit_economics.csv";
const DESTINATION_ALLOCATION_FILE_NAME: &str = "destination_allocation.csv";
const DEMAND_HIERARCHY_FILE_NAME: &str = "demand_hierarchy.csv";
const BUYER_CAPS_FILE_NAME: &str = "buyer_caps.csv";
const BUYER_ALLOCATION_FILE_NAME: &str = "buyer_allocation.csv";
const PNL_SUMMARY_FILE_NAME: &str = "pnl_summary.csv";

/// The value of the `period_id` column for rows summed over all periods
const TOTAL_PERIOD_LABEL: &str = "total";

/// Get the default output folder for the model in the specified directory
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Canonicalise in case the user has specified "."
    let model_dir = model_dir
        .canonicalize()
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory.
///
/// An existing directory is only reused if it is empty or `allow_overwrite` is set, in which case
/// its contents are deleted.
///
/// # Returns
///
/// Whether an existing non-empty directory was overwritten
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    if output_dir.is_dir() {
        if fs::read_dir(output_dir)?.next().is_none() {
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Use --overwrite to replace it."
        );
        fs::remove_dir_all(output_dir)?;
        fs::create_dir_all(output_dir)?;
        return Ok(true);
    }

    fs::create_dir_all(output_dir)?;

    Ok(false)
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct UnitEconomicsRow {
    period_id: PeriodID,
    destination_id: DestinationID,
    price: Option<MoneyPerQuantity>,
    delivered_fraction: Dimensionless,
    unit_cost: MoneyPerQuantity,
    unit_profit: Option<MoneyPerQuantity>,
}

/// Quantities shared by both allocation files.
///
/// Written alongside a key naming the period and the destination or buyer.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct AllocationRow {
    quantity: Quantity,
    unit_margin: MoneyPerQuantity,
    gross_profit: Money,
    adjusted_profit: Money,
    delivered_fraction: Dimensionless,
}

impl From<&AllocationEntry> for AllocationRow {
    fn from(entry: &AllocationEntry) -> Self {
        Self {
            quantity: entry.quantity,
            unit_margin: entry.unit_margin,
            gross_profit: entry.gross_profit,
            adjusted_profit: entry.adjusted_profit,
            delivered_fraction: entry.delivered_fraction,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct DestinationKey {
    period_id: PeriodID,
    destination_id: DestinationID,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct BuyerKey {
    period_id: PeriodID,
    buyer_id: BuyerID,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct DemandRow {
    period_id: PeriodID,
    group_id: GroupID,
    market_demand: Quantity,
    open_demand: Quantity,
    buyer_total: Quantity,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct CapRow {
    period_id: PeriodID,
    buyer_id: BuyerID,
    cap: Quantity,
}

/// A row of the PnL summary. `period_id` is `total` for the sum over all periods.
///
/// `objective` is only filled in for the destination allocation, which comes from the LP.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct PnlRow {
    allocation: String,
    period_id: String,
    total_quantity: Quantity,
    gross_profit: Money,
    adjusted_profit: Money,
    expected_delivered: Quantity,
    unallocated_supply: Quantity,
    objective: Option<Money>,
}

impl PnlRow {
    fn new(allocation: &str, period_id: &str, summary: &PnlSummary) -> Self {
        Self {
            allocation: allocation.to_string(),
            period_id: period_id.to_string(),
            total_quantity: summary.total_quantity,
            gross_profit: summary.gross_profit,
            adjusted_profit: summary.adjusted_profit,
            expected_delivered: summary.expected_delivered,
            unallocated_supply: summary.unallocated_supply,
            objective: summary.objective,
        }
    }
}

/// An object for writing allocation results to CSV files
pub struct DataWriter {
    unit_economics_writer: csv::Writer<File>,
    destination_allocation_writer: csv::Writer<File>,
    demand_writer: csv::Writer<File>,
    caps_writer: csv::Writer<File>,
    buyer_allocation_writer: csv::Writer<File>,
    pnl_writer: csv::Writer<File>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    pub fn create(output_path: &Path) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(&file_path)
                .with_context(|| format!("Could not create {}", file_path.display()))
        };

        Ok(Self {
            unit_economics_writer: new_writer(UNIT_ECONOMICS_FILE_NAME)?,
            destination_allocation_writer: new_writer(DESTINATION_ALLOCATION_FILE_NAME)?,
            demand_writer: new_writer(DEMAND_HIERARCHY_FILE_NAME)?,
            caps_writer: new_writer(BUYER_CAPS_FILE_NAME)?,
            buyer_allocation_writer: new_writer(BUYER_ALLOCATION_FILE_NAME)?,
            pnl_writer: new_writer(PNL_SUMMARY_FILE_NAME)?,
        })
    }

    /// Write every table in an outcome
    pub fn write_outcome(&mut self, outcome: &Outcome) -> Result<()> {
        self.write_unit_economics(&outcome.unit_economics)?;
        self.write_destination_allocation(&outcome.destination_allocation)?;
        self.write_demand(&outcome.demand)?;
        self.write_caps(&outcome.caps)?;
        self.write_buyer_allocation(&outcome.buyer_allocation)?;
        self.write_pnl("destination", &outcome.destination_pnl)?;
        self.write_pnl("buyer", &outcome.buyer_pnl)?;

        Ok(())
    }

    /// Write unit economics to a CSV file
    pub fn write_unit_economics(&mut self, table: &UnitEconomicsTable) -> Result<()> {
        for ((period_id, destination_id), economics) in table {
            let row = UnitEconomicsRow {
                period_id: period_id.clone(),
                destination_id: destination_id.clone(),
                price: economics.price,
                delivered_fraction: economics.delivered_fraction,
                unit_cost: economics.unit_cost,
                unit_profit: economics.unit_profit,
            };
            self.unit_economics_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Write the allocation to destinations to a CSV file
    pub fn write_destination_allocation(
        &mut self,
        result: &AllocationResult<DestinationID>,
    ) -> Result<()> {
        for (period_id, destination_id, entry) in result.iter() {
            let key = DestinationKey {
                period_id: period_id.clone(),
                destination_id: destination_id.clone(),
            };
            self.destination_allocation_writer
                .serialize((key, AllocationRow::from(entry)))?;
        }

        Ok(())
    }

    /// Write the demand hierarchy to a CSV file
    pub fn write_demand(&mut self, demand: &DemandHierarchy) -> Result<()> {
        for (period_id, group_id, group_demand) in demand.iter() {
            let row = DemandRow {
                period_id: period_id.clone(),
                group_id: group_id.clone(),
                market_demand: group_demand.market_demand,
                open_demand: group_demand.open_demand,
                buyer_total: group_demand.buyer_total,
            };
            self.demand_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Write normalised buyer caps to a CSV file
    pub fn write_caps(&mut self, caps: &CapacityCaps) -> Result<()> {
        for (period_id, buyer_id, cap) in caps.iter() {
            let row = CapRow {
                period_id: period_id.clone(),
                buyer_id: buyer_id.clone(),
                cap,
            };
            self.caps_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Write the allocation to buyers to a CSV file
    pub fn write_buyer_allocation(&mut self, result: &AllocationResult<BuyerID>) -> Result<()> {
        for (period_id, buyer_id, entry) in result.iter() {
            let key = BuyerKey {
                period_id: period_id.clone(),
                buyer_id: buyer_id.clone(),
            };
            self.buyer_allocation_writer
                .serialize((key, AllocationRow::from(entry)))?;
        }

        Ok(())
    }

    /// Write per-period and total metrics for one allocation to the PnL summary
    pub fn write_pnl(&mut self, allocation: &str, report: &PnlReport) -> Result<()> {
        for (period_id, summary) in &report.periods {
            self.pnl_writer
                .serialize(PnlRow::new(allocation, &period_id.0, summary))?;
        }
        self.pnl_writer
            .serialize(PnlRow::new(allocation, TOTAL_PERIOD_LABEL, &report.total))?;

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.unit_economics_writer.flush()?;
        self.destination_allocation_writer.flush()?;
        self.demand_writer.flush()?;
        self.caps_writer.flush()?;
        self.buyer_allocation_writer.flush()?;
        self.pnl_writer.flush()?;

        Ok(())
    }
}
