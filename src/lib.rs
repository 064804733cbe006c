//! Allocation of monthly LNG supply across delivery destinations and buyers.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod allocation;
pub mod buyer;
pub mod caps;
pub mod cli;
pub mod demand;
pub mod destination;
pub mod economics;
pub mod id;
pub mod input;
pub mod log;
pub mod model;
pub mod output;
pub mod period;
pub mod pnl;
pub mod recompute;
pub mod settings;
pub mod supply;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the user config directory for lngopt, where `settings.toml` lives
pub fn get_lngopt_config_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_default();
    path.push("lngopt");

    path
}
